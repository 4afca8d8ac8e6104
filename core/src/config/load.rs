use std::path::Path;

use crate::errors::ConfigError;

use super::types::AppConfig;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Load `config.toml` from the working directory if present, then apply
/// `KILN_*` environment overrides.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    let cfg = if Path::new(DEFAULT_CONFIG_FILE).exists() {
        load_file(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        AppConfig::default()
    };
    apply_env_overrides(cfg, |key| std::env::var(key).ok())
}

/// Load an explicitly named config file; a missing file is an error here.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let cfg = load_file(path)?;
    apply_env_overrides(cfg, |key| std::env::var(key).ok())
}

fn load_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let cfg = toml::from_str::<AppConfig>(&s).map_err(ConfigError::Parse)?;
    validate(&cfg)?;
    Ok(cfg)
}

pub(crate) fn apply_env_overrides<F>(mut cfg: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("KILN_HOST") {
        cfg.http_server.host = v;
    }
    if let Some(v) = get("KILN_PORT") {
        cfg.http_server.port = v.trim().parse().map_err(|_| ConfigError::EnvInvalid {
            key: "KILN_PORT".into(),
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("KILN_SHELL") {
        cfg.command.shell = v;
    }
    if let Some(v) = get("KILN_COMMAND_TIMEOUT_MS") {
        cfg.command.timeout_ms = v.trim().parse().map_err(|_| ConfigError::EnvInvalid {
            key: "KILN_COMMAND_TIMEOUT_MS".into(),
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("KILN_STAGING_DIR") {
        cfg.deployment.staging_dir = v;
    }

    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &AppConfig) -> Result<(), ConfigError> {
    if cfg.command.shell.trim().is_empty() {
        return Err(ConfigError::Validation("command.shell must not be empty".into()));
    }
    if cfg.deployment.staging_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "deployment.staging_dir must not be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_file_is_sparse() {
        let cfg: AppConfig = toml::from_str("[http_server]\nport = 9000\n").unwrap();
        assert_eq!(cfg.http_server.port, 9000);
        assert_eq!(cfg.http_server.host, "127.0.0.1");
        assert_eq!(cfg.command.timeout_ms, 0);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.deployment.retained_operations, 1024);
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let cfg = apply_env_overrides(
            AppConfig::default(),
            env(&[
                ("KILN_PORT", "9100"),
                ("KILN_COMMAND_TIMEOUT_MS", "2500"),
                ("KILN_STAGING_DIR", "/srv/kiln"),
                ("KILN_HOST", "  "),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.http_server.port, 9100);
        assert_eq!(cfg.command.timeout_ms, 2500);
        assert_eq!(cfg.deployment.staging_dir, "/srv/kiln");
        // blank values are ignored
        assert_eq!(cfg.http_server.host, "127.0.0.1");
    }

    #[test]
    fn invalid_env_port_is_rejected() {
        let err = apply_env_overrides(AppConfig::default(), env(&[("KILN_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvInvalid { ref key, .. } if key == "KILN_PORT"));
    }

    #[test]
    fn load_from_reads_and_validates_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[command]\nshell = \"\"").unwrap();
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let missing = load_from(Path::new("/definitely/not/here/config.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::NotFound(_)));
    }
}
