use batch_monitor::config::{ConfigurationError, MonitorConfig};
use std::io::Write;
use std::time::Duration;

// Environment variables are process-wide, so every env-dependent assertion
// lives in this single test.
#[test]
fn environment_layers_over_file_and_defaults() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    writeln!(file, "table_name = \"FromFile\"\nremote_call_timeout_ms = 5000").expect("write config");

    std::env::remove_var("BATCH_MONITOR_WORKSPACE_UID");
    std::env::set_var("WORKSPACE_UID", "legacy-ws");
    std::env::set_var("BATCH_MONITOR_DEFAULT_REGION", "us-east-1");
    std::env::set_var("BATCH_MONITOR_LOGGING__JSON", "true");

    let config = MonitorConfig::load_from(Some(file.path())).expect("config");
    assert_eq!(config.table_name, "FromFile");
    assert_eq!(config.default_region, "us-east-1");
    assert_eq!(config.store_region, "eu-west-1");
    assert_eq!(config.workspace_uid.as_deref(), Some("legacy-ws"));
    assert_eq!(config.remote_call_timeout(), Some(Duration::from_secs(5)));
    assert!(config.logging.json);

    std::env::set_var("BATCH_MONITOR_WORKSPACE_UID", "prefixed-ws");
    let config = MonitorConfig::load_from(Some(file.path())).expect("config");
    assert_eq!(config.workspace_uid.as_deref(), Some("prefixed-ws"));

    std::env::set_var("BATCH_MONITOR_TABLE_NAME", " ");
    let result = MonitorConfig::load_from(Some(file.path()));
    assert!(matches!(result, Err(ConfigurationError::Invalid { .. })));

    for key in [
        "WORKSPACE_UID",
        "BATCH_MONITOR_WORKSPACE_UID",
        "BATCH_MONITOR_DEFAULT_REGION",
        "BATCH_MONITOR_LOGGING__JSON",
        "BATCH_MONITOR_TABLE_NAME",
    ] {
        std::env::remove_var(key);
    }
}
