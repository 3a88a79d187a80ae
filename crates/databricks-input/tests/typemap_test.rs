//! Unit tests for databricks-input typemap module

use databricks_input::error::ErrorCategory;
use databricks_input::typemap::{
    ColumnRule, PortableType, RuleLayer, SourceTypeFamily, TypeNormalizer, TypeRules,
};
use databricks_input::Error;

// ==================== Built-in Table Tests ====================

#[test]
fn test_builtin_table() {
    let normalizer = TypeNormalizer::default();
    let cases = [
        ("TINYINT", PortableType::Long),
        ("SMALLINT", PortableType::Long),
        ("INT", PortableType::Long),
        ("BIGINT", PortableType::Long),
        ("FLOAT", PortableType::Double),
        ("DOUBLE", PortableType::Double),
        ("DECIMAL(4,2)", PortableType::Double),
        ("BOOLEAN", PortableType::Boolean),
        ("STRING", PortableType::String),
        ("VARCHAR(10)", PortableType::String),
        ("CHAR(3)", PortableType::String),
        ("DATE", PortableType::Timestamp),
        ("TIMESTAMP", PortableType::Timestamp),
        ("TIMESTAMP_NTZ", PortableType::Timestamp),
        ("ARRAY<INT>", PortableType::String),
        ("MAP<STRING, INT>", PortableType::String),
        ("STRUCT<c1:STRING,c2:INT>", PortableType::String),
        ("INTERVAL YEAR TO MONTH", PortableType::String),
        ("VOID", PortableType::String),
        ("VARIANT", PortableType::String),
    ];

    for (source_type, expected) in cases {
        let rule = normalizer.resolve(source_type, "c").unwrap();
        assert_eq!(rule.value_type, expected, "{}", source_type);
        assert_eq!(rule.layer, RuleLayer::BuiltIn);
        assert!(rule.timestamp_format.is_none());
        assert!(rule.timezone.is_none());
    }
}

#[test]
fn test_resolution_is_total_except_binary() {
    let families = [
        "TINYINT", "SMALLINT", "INT", "BIGINT", "FLOAT", "DOUBLE", "DECIMAL", "BOOLEAN",
        "STRING", "DATE", "TIMESTAMP", "TIMESTAMP_NTZ", "ARRAY", "MAP", "STRUCT", "INTERVAL",
        "VOID", "SOMETHING_NEW",
    ];
    for name in families {
        assert!(
            SourceTypeFamily::parse(name).builtin_type().is_some(),
            "{}",
            name
        );
    }
    assert!(SourceTypeFamily::Binary.builtin_type().is_none());
}

#[test]
fn test_binary_is_unsupported() {
    let err = TypeNormalizer::default()
        .resolve("BINARY", "payload")
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::UnsupportedType);
    match err {
        Error::UnsupportedType { column, type_name } => {
            assert_eq!(column, "payload");
            assert_eq!(type_name, "BINARY");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_binary_ignores_overrides() {
    let rules = TypeRules::new()
        .with_column("payload", ColumnRule::of_type(PortableType::String))
        .with_type("BINARY", ColumnRule::of_type(PortableType::String));

    assert!(TypeNormalizer::new(rules)
        .resolve("BINARY", "payload")
        .is_err());
}

// ==================== Override Layer Tests ====================

#[test]
fn test_column_rule_dominates_type_rule() {
    let rules = TypeRules::new()
        .with_type("BIGINT", ColumnRule::of_type(PortableType::String))
        .with_column("mycol", ColumnRule::of_type(PortableType::Long));
    let normalizer = TypeNormalizer::new(rules);

    let rule = normalizer.resolve("BIGINT", "mycol").unwrap();
    assert_eq!(rule.value_type, PortableType::Long);
    assert_eq!(rule.layer, RuleLayer::Column);

    let rule = normalizer.resolve("BIGINT", "other").unwrap();
    assert_eq!(rule.value_type, PortableType::String);
    assert_eq!(rule.layer, RuleLayer::SourceType);
}

#[test]
fn test_nested_types_are_json_only_on_request() {
    let normalizer = TypeNormalizer::new(
        TypeRules::new().with_column("tags", ColumnRule::of_type(PortableType::Json)),
    );

    let tags = normalizer.resolve("ARRAY<INT>", "tags").unwrap();
    assert_eq!(tags.value_type, PortableType::Json);
    assert_eq!(tags.layer, RuleLayer::Column);

    for nested in ["ARRAY<INT>", "MAP<STRING,INT>", "STRUCT<a:INT>"] {
        let rule = normalizer.resolve(nested, "other").unwrap();
        assert_eq!(rule.value_type, PortableType::String, "{}", nested);
        assert_eq!(rule.layer, RuleLayer::BuiltIn);
    }
}

#[test]
fn test_type_rule_keyed_by_driver_type_name() {
    let rules = TypeRules::new()
        .with_type("REAL", ColumnRule::of_type(PortableType::String))
        .with_type("VARCHAR", ColumnRule::of_type(PortableType::Json))
        .with_type("INTEGER", ColumnRule::of_type(PortableType::Double));
    let normalizer = TypeNormalizer::new(rules);

    assert_eq!(
        normalizer.resolve("FLOAT", "f").unwrap().value_type,
        PortableType::String
    );
    assert_eq!(
        normalizer.resolve("INT", "i").unwrap().value_type,
        PortableType::Double
    );
    for nested in ["STRING", "ARRAY<INT>", "MAP<STRING,INT>", "STRUCT<a:INT>"] {
        assert_eq!(
            normalizer.resolve(nested, "n").unwrap().value_type,
            PortableType::Json,
            "{}",
            nested
        );
    }
    assert_eq!(
        normalizer.resolve("DOUBLE", "d").unwrap().layer,
        RuleLayer::BuiltIn
    );
}

#[test]
fn test_type_rule_keyword_alias_and_case() {
    let rules = TypeRules::new().with_type("timestamp_ntz", ColumnRule::of_type(PortableType::String));
    let normalizer = TypeNormalizer::new(rules);

    // TIMESTAMP_NTZ is reported as TIMESTAMP by the driver; the keyword still matches
    let rule = normalizer.resolve("TIMESTAMP_NTZ", "ts").unwrap();
    assert_eq!(rule.value_type, PortableType::String);

    let rule = normalizer.resolve("TIMESTAMP", "ts").unwrap();
    assert_eq!(rule.layer, RuleLayer::BuiltIn);
}

#[test]
fn test_column_rule_is_case_insensitive_fallback() {
    let rules = TypeRules::new().with_column("CreatedAt", ColumnRule::of_type(PortableType::String));
    let normalizer = TypeNormalizer::new(rules);

    assert_eq!(
        normalizer.resolve("TIMESTAMP", "createdat").unwrap().layer,
        RuleLayer::Column
    );
}

#[test]
fn test_winning_rule_is_not_merged() {
    let type_rule = ColumnRule::of_type(PortableType::String)
        .with_timestamp_format("%Y")
        .unwrap()
        .with_timezone(chrono_tz::Asia::Tokyo);
    let column_rule = ColumnRule::default()
        .with_timestamp_format("%Y/%m/%d %H:%M:%S")
        .unwrap();
    let rules = TypeRules::new()
        .with_type("TIMESTAMP", type_rule)
        .with_column("ts", column_rule);

    let rule = TypeNormalizer::new(rules).resolve("TIMESTAMP", "ts").unwrap();
    assert_eq!(rule.layer, RuleLayer::Column);
    assert_eq!(rule.value_type, PortableType::Timestamp);
    assert_eq!(rule.timestamp_format.as_deref(), Some("%Y/%m/%d %H:%M:%S"));
    assert!(rule.timezone.is_none());
}

#[test]
fn test_resolved_rule_keeps_source_details() {
    let rule = TypeNormalizer::default()
        .resolve("DECIMAL(38,10)", "amount")
        .unwrap();
    assert_eq!(rule.column, "amount");
    assert_eq!(rule.source_type, "DECIMAL(38,10)");
    assert_eq!(rule.family, SourceTypeFamily::Decimal);
}
