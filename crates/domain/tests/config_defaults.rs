use sg_domain::config::{Config, ConfigSeverity, ProviderKind};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn explicit_zero_host_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 3210
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 3210);
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    assert!(config.server.cors.allowed_origins.contains(&"http://localhost:*".to_string()));
    assert!(config.server.cors.allowed_origins.contains(&"http://127.0.0.1:*".to_string()));
}

#[test]
fn api_token_env_default() {
    let config = Config::default();
    assert_eq!(config.server.api_token_env, "SODAI_API_TOKEN");
}

#[test]
fn intake_defaults_target_tokyo() {
    let config = Config::default();
    assert_eq!(config.intake.timezone, "Asia/Tokyo");
    assert_eq!(config.intake.extraction_retries, 2);
    assert!(config.intake.phrasing);
    assert!(config.sessions.state_path.is_none());
}

#[test]
fn full_config_parses_and_validates_clean() {
    let toml_str = r#"
[llm]
default_timeout_ms = 20000

[[llm.providers]]
id = "local"
kind = "openai_compat"
base_url = "http://localhost:8000/v1"
guided_json = true
auth = { mode = "none" }

[llm.roles.extractor]
model = "local/qwen2.5-7b"
require_json = true

[llm.roles.dialogue]
model = "local/qwen2.5-7b"

[sessions]
state_path = "./data"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.llm.providers[0].kind, ProviderKind::OpenaiCompat);
    assert!(config.llm.providers[0].guided_json);
    assert!(config.validate().is_empty(), "{:?}", config.validate());
}

#[test]
fn bedrock_provider_is_rejected() {
    let toml_str = r#"
[[llm.providers]]
id = "bedrock"
kind = "aws_bedrock"
base_url = "https://bedrock-runtime.us-east-1.amazonaws.com"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.severity == ConfigSeverity::Error && e.field.ends_with(".kind")));
}

#[test]
fn role_pointing_at_unknown_provider_is_an_error() {
    let toml_str = r#"
[llm.roles.extractor]
model = "ghost/model"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.field == "llm.roles.extractor.model" && e.severity == ConfigSeverity::Error));
}

#[test]
fn bad_timezone_is_an_error() {
    let mut config = Config::default();
    config.intake.timezone = "Mars/Olympus".into();
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.field == "intake.timezone"));
}
