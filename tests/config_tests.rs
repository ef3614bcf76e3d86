use fibchat::config::{AppConfig, ConfigError, DEFAULT_API_VERSION};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let config = AppConfig::from_file(dir.path().join("appsettings.json")).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_reads_pascal_case_sections() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "AzureOpenAI": {{
                "Endpoint": "https://demo.openai.azure.com/",
                "DeploymentName": "gpt-4o-mini",
                "ApiKey": "secret"
            }},
            "GroupChat": {{
                "MaximumIterations": 4,
                "AutomaticReset": false,
                "MockDelayMs": 0
            }}
        }}"#
    )
    .unwrap();

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.azure_openai.endpoint, "https://demo.openai.azure.com/");
    assert_eq!(config.azure_openai.deployment_name, "gpt-4o-mini");
    assert_eq!(config.azure_openai.api_version, DEFAULT_API_VERSION);
    assert_eq!(config.group_chat.maximum_iterations, 4);
    assert!(!config.group_chat.automatic_reset);
    assert!(!config.group_chat.use_mock_completion);
    assert_eq!(config.group_chat.mock_delay_ms, 0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_file_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = AppConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse"));
}

#[test]
fn test_missing_endpoint_message() {
    let err = AppConfig::default().validate().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Azure OpenAI Endpoint is not configured. Please check your appsettings.json file."
    );
}

#[test]
fn test_environment_overrides_file_values() {
    let mut config = AppConfig::from_json_str(
        r#"{"AzureOpenAI": {"Endpoint": "https://file", "DeploymentName": "file-deploy"}}"#,
    )
    .unwrap();
    config
        .apply_overrides(|key| match key {
            "AZURE_OPENAI_DEPLOYMENT" => Some("env-deploy".to_string()),
            "AZURE_OPENAI_API_KEY" => Some("env-key".to_string()),
            "AZURE_OPENAI_API_VERSION" => Some("2025-01-01".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.azure_openai.endpoint, "https://file");
    assert_eq!(config.azure_openai.deployment_name, "env-deploy");
    assert_eq!(config.azure_openai.api_key, "env-key");
    assert_eq!(config.azure_openai.api_version, "2025-01-01");
}

#[test]
fn test_non_http_endpoint_rejected() {
    let config = AppConfig::from_json_str(
        r#"{"AzureOpenAI": {"Endpoint": "demo.openai.azure.com", "DeploymentName": "d", "ApiKey": "k"}}"#,
    )
    .unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid { setting: "Endpoint", .. })
    ));
}
