//! Unit tests for databricks-input capability module

use databricks_input::capability::{
    CapabilityGate, RejectionReason, ReplicationMode, ReplicationRequest,
};
use databricks_input::error::ErrorCategory;
use databricks_input::Error;

// ==================== Raw Query Incremental Tests ====================

#[test]
fn test_raw_query_incremental_rejected_with_valid_columns() {
    let gate = CapabilityGate::default();
    let request = ReplicationRequest::query()
        .with_incremental(["updated_at", "id"])
        .with_last_record(["2020-01-01 00:00:00", "10"])
        .with_raw_query_incremental(true);

    assert_eq!(
        gate.check(&request),
        Err(RejectionReason::RawQueryIncrementalUnsupported)
    );
}

#[test]
fn test_raw_query_flag_rejected_regardless_of_other_fields() {
    let gate = CapabilityGate::default();
    let modes = [ReplicationMode::Table, ReplicationMode::Query];

    for mode in modes {
        for incremental in [false, true] {
            let mut request = ReplicationRequest::new(mode).with_raw_query_incremental(true);
            request.incremental = incremental;
            assert!(
                gate.check(&request).is_err(),
                "mode={} incremental={}",
                mode,
                incremental
            );
        }
    }
}

#[test]
fn test_rejection_is_configuration_fault() {
    let gate = CapabilityGate::default();
    let request = ReplicationRequest::query().with_raw_query_incremental(true);

    let err = gate.validate(&request).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(!err.is_retriable());
    assert!(matches!(
        err,
        Error::CapabilityRejected {
            reason: RejectionReason::RawQueryIncrementalUnsupported
        }
    ));
    assert!(err
        .to_string()
        .contains("use_raw_query_with_incremental option is not supported"));
}

// ==================== Pass-through Tests ====================

#[test]
fn test_plain_incremental_passes_unchanged() {
    let gate = CapabilityGate::default();
    let request = ReplicationRequest::table().with_incremental(["id"]);
    let before = request.clone();

    assert!(gate.validate(&request).is_ok());
    assert_eq!(request, before);
}

#[test]
fn test_incremental_without_columns_is_not_checked_here() {
    let gate = CapabilityGate::default();
    let mut request = ReplicationRequest::query();
    request.incremental = true;

    assert!(gate.validate(&request).is_ok());
}

#[test]
fn test_non_incremental_requests_pass() {
    let gate = CapabilityGate::default();
    assert!(gate.validate(&ReplicationRequest::table()).is_ok());
    assert!(gate.validate(&ReplicationRequest::query()).is_ok());
}

#[test]
fn test_rejection_reason_names_option() {
    assert_eq!(
        RejectionReason::RawQueryIncrementalUnsupported.option(),
        "use_raw_query_with_incremental"
    );
}
