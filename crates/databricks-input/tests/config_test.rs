//! Unit tests for databricks-input config module

use std::io::Write;

use databricks_input::prelude::*;

const FULL_YAML: &str = r#"
server_hostname: dbc-1234.cloud.databricks.com
http_path: /sql/1.0/warehouses/abc
personal_access_token: dapi-secret-token
catalog_name: main
schema_name: sales
driver_path: /opt/drivers
user_agent:
  product_name: acme-etl
  product_version: 1.4.2
options:
  EnableArrow: 0
  RowsFetchedPerBlock: "10000"
table: orders
incremental: true
incremental_columns: [updated_at, id]
last_record: ["2020-01-01 00:00:00", "10"]
column_options:
  created_at: { type: string, timestamp_format: "%Y/%m/%d %H:%M:%S", timezone: Asia/Tokyo }
default_column_options:
  VARCHAR: { type: json }
"#;

// ==================== Parsing Tests ====================

#[test]
fn test_full_yaml() {
    let config = DatabricksInputConfig::from_yaml(FULL_YAML).unwrap();

    assert_eq!(config.server_hostname, "dbc-1234.cloud.databricks.com");
    assert_eq!(config.auth_type().unwrap(), AuthType::Pat);
    assert_eq!(
        config.personal_access_token.as_ref().map(|t| t.expose_secret()),
        Some("dapi-secret-token")
    );
    assert_eq!(config.user_agent.entry(), "acme-etl/1.4.2");
    assert_eq!(config.table.as_deref(), Some("orders"));

    let ns = config.namespace();
    assert_eq!(ns.catalog.as_deref(), Some("main"));
    assert_eq!(ns.schema.as_deref(), Some("sales"));

    let request = config.replication_request();
    assert_eq!(request.mode, ReplicationMode::Table);
    assert!(request.incremental);
    assert_eq!(request.incremental_columns, vec!["updated_at", "id"]);
    assert_eq!(
        request.last_record,
        Some(vec!["2020-01-01 00:00:00".to_string(), "10".to_string()])
    );

    let entries: Vec<_> = config.option_entries().collect();
    assert_eq!(
        entries,
        vec![
            ("EnableArrow", "0".to_string()),
            ("RowsFetchedPerBlock", "10000".to_string()),
        ]
    );
}

#[test]
fn test_minimal_yaml_defaults() {
    let yaml = r#"
server_hostname: h
http_path: /p
personal_access_token: t
query: SELECT 1
"#;
    let config = DatabricksInputConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.auth_type, "pat");
    assert_eq!(config.user_agent.entry(), "unknown/0.0.0");
    assert!(config.catalog_name.is_none());
    assert!(!config.incremental);
    assert!(!config.use_raw_query_with_incremental);
    assert_eq!(config.replication_request().mode, ReplicationMode::Query);
}

#[test]
fn test_type_rules_from_yaml() {
    let config = DatabricksInputConfig::from_yaml(FULL_YAML).unwrap();
    let normalizer = TypeNormalizer::new(config.type_rules().unwrap());

    let rule = normalizer.resolve("TIMESTAMP", "created_at").unwrap();
    assert_eq!(rule.layer, RuleLayer::Column);
    assert_eq!(rule.value_type, PortableType::String);
    assert_eq!(rule.timezone, Some(chrono_tz::Asia::Tokyo));

    let rule = normalizer.resolve("STRING", "name").unwrap();
    assert_eq!(rule.layer, RuleLayer::SourceType);
    assert_eq!(rule.value_type, PortableType::Json);
}

#[test]
fn test_oauth_m2m_yaml() {
    let yaml = r#"
server_hostname: h
http_path: /p
auth_type: oauth-m2m
oauth2_client_id: sp-app-id
oauth2_client_secret: sp-secret
table: t
"#;
    let config = DatabricksInputConfig::from_yaml(yaml).unwrap();

    match config.auth().unwrap() {
        AuthStrategy::OAuthM2m {
            client_id,
            client_secret,
        } => {
            assert_eq!(client_id, "sp-app-id");
            assert_eq!(client_secret.expose_secret(), "sp-secret");
        }
        other => panic!("unexpected auth: {other:?}"),
    }
}

#[test]
fn test_oauth_m2m_requires_secret() {
    let yaml = r#"
server_hostname: h
http_path: /p
auth_type: oauth-m2m
oauth2_client_id: sp-app-id
table: t
"#;
    let err = DatabricksInputConfig::from_yaml(yaml).unwrap_err();
    assert_eq!(err.option(), Some("oauth2_client_secret"));
}

// ==================== Environment Expansion Tests ====================

#[test]
fn test_env_var_expansion() {
    std::env::set_var("DATABRICKS_INPUT_TEST_TOKEN", "dapi-from-env");
    let yaml = r#"
server_hostname: ${DATABRICKS_INPUT_TEST_HOST:-dbc-default.cloud.databricks.com}
http_path: /p
personal_access_token: ${DATABRICKS_INPUT_TEST_TOKEN}
table: t
"#;
    let config = DatabricksInputConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.server_hostname, "dbc-default.cloud.databricks.com");
    assert_eq!(
        config.personal_access_token.as_ref().map(|t| t.expose_secret()),
        Some("dapi-from-env")
    );
}

// ==================== Validation Tests ====================

#[test]
fn test_table_and_query_are_exclusive() {
    let both = DatabricksInputConfig::new("h", "/p", "t")
        .with_table("t")
        .with_query("SELECT 1");
    assert!(both.validate_all().is_err());

    let neither = DatabricksInputConfig::new("h", "/p", "t");
    assert!(neither.validate_all().is_err());
}

#[test]
fn test_empty_host_rejected() {
    let config = DatabricksInputConfig::new("", "/p", "t").with_table("t");
    let err = config.validate_all().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_invalid_catalog_names_option() {
    let config = DatabricksInputConfig::new("h", "/p", "t")
        .with_table("t")
        .with_catalog("");
    let err = config.validate_all().unwrap_err();
    assert_eq!(err.option(), Some("catalog_name"));
}

#[test]
fn test_invalid_timezone_names_option_path() {
    let mut config = DatabricksInputConfig::new("h", "/p", "t").with_table("t");
    config.column_options.insert(
        "c1".into(),
        ColumnOptionConfig {
            timezone: Some("Mars/Olympus".into()),
            ..Default::default()
        },
    );

    let err = config.validate_all().unwrap_err();
    assert_eq!(err.option(), Some("column_options.c1.timezone"));
    assert!(err.to_string().contains("Mars/Olympus"));
}

#[test]
fn test_invalid_type_names_option_path() {
    let yaml = r#"
server_hostname: h
http_path: /p
personal_access_token: t
table: t
default_column_options:
  BINARY: { type: bytes }
"#;
    let err = DatabricksInputConfig::from_yaml(yaml).unwrap_err();
    assert_eq!(err.option(), Some("default_column_options.BINARY.type"));
}

#[test]
fn test_invalid_timestamp_format_names_option_path() {
    let mut config = DatabricksInputConfig::new("h", "/p", "t").with_table("t");
    config.column_options.insert(
        "ts".into(),
        ColumnOptionConfig {
            timestamp_format: Some("%Q".into()),
            ..Default::default()
        },
    );

    let err = config.validate_all().unwrap_err();
    assert_eq!(err.option(), Some("column_options.ts.timestamp_format"));
}

#[test]
fn test_malformed_yaml() {
    let err = DatabricksInputConfig::from_yaml("server_hostname: [unclosed").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

// ==================== File and Serialization Tests ====================

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL_YAML.as_bytes()).unwrap();

    let config = DatabricksInputConfig::from_file(file.path()).unwrap();
    assert_eq!(config.catalog_name.as_deref(), Some("main"));
}

#[test]
fn test_from_missing_file() {
    let err = DatabricksInputConfig::from_file("/nonexistent/databricks.yml").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_serialized_config_redacts_token() {
    let config = DatabricksInputConfig::from_yaml(FULL_YAML).unwrap();

    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("dapi-secret-token"));
    assert!(json.contains("***REDACTED***"));

    let debug = format!("{:?}", config);
    assert!(!debug.contains("dapi-secret-token"));
}
