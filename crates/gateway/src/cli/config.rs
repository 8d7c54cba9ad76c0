use sg_domain::config::{Config, ConfigSeverity};
use sg_domain::capability::ModelRole;

/// Validate the config and print every issue plus a short routing summary.
///
/// Returns `false` when at least one error was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();

    for issue in &issues {
        println!("{issue}");
    }
    for role in [ModelRole::Extractor, ModelRole::Dialogue] {
        match config.llm.roles.get(role.as_str()) {
            Some(r) => println!("{:<10} -> {} (+{} fallback)", role.as_str(), r.model, r.fallbacks.len()),
            None => println!("{:<10} -> (unset)", role.as_str()),
        }
    }
    if !config.intake.phrasing {
        println!("phrasing disabled, replies use the built-in templates");
    }

    if issues.is_empty() {
        println!("Config OK ({config_path})");
    } else {
        println!(
            "\n{errors} error(s), {} warning(s) in {config_path}",
            issues.len() - errors
        );
    }
    errors == 0
}

/// Dump the resolved config as TOML, with inline API keys masked.
pub fn show(config: &Config) -> anyhow::Result<()> {
    print!("{}", render_masked(config)?);
    Ok(())
}

fn render_masked(config: &Config) -> anyhow::Result<String> {
    let mut masked = config.clone();
    for p in &mut masked.llm.providers {
        if p.auth.key.is_some() {
            p.auth.key = Some("********".into());
        }
    }
    toml::to_string_pretty(&masked).map_err(|e| anyhow::anyhow!("serializing config: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_keys_are_masked() {
        let config: Config = toml::from_str(
            r#"
            [[llm.providers]]
            id = "local"
            kind = "openai_compat"
            base_url = "http://localhost:8000/v1"
            auth = { key = "sk-very-secret" }
            "#,
        )
        .unwrap();
        let out = render_masked(&config).unwrap();
        assert!(!out.contains("sk-very-secret"));
        assert!(out.contains("********"));
    }
}
