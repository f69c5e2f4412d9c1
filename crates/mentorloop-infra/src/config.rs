//! Configuration loader for MentorLoop.
//!
//! Reads `config.toml` from the given directory and deserializes it into
//! [`OrchestratorConfig`]. Falls back to defaults when the file is missing
//! or malformed.

use std::path::Path;

use mentorloop_types::config::OrchestratorConfig;

/// Load orchestrator configuration from `{dir}/config.toml`.
///
/// A missing file is the normal case for a fresh checkout and yields the
/// defaults silently; an unreadable or invalid file warns and yields the
/// defaults, so a bad edit never takes the orchestrator down.
pub async fn load_orchestrator_config(dir: &Path) -> OrchestratorConfig {
    let path = dir.join("config.toml");

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return OrchestratorConfig::default();
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "config file unreadable, using defaults");
            return OrchestratorConfig::default();
        }
    };

    toml::from_str(&raw).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), %err, "config file invalid, using defaults");
        OrchestratorConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_orchestrator_config(tmp.path()).await;
        assert_eq!(config.history_window, 20);
        assert_eq!(config.stream_idle_timeout_ms, 30_000);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
history_window = 8
model = "claude-haiku-4-5"
stream_idle_timeout_ms = 5000
"#,
        )
        .await
        .unwrap();

        let config = load_orchestrator_config(tmp.path()).await;
        assert_eq!(config.history_window, 8);
        assert_eq!(config.model, "claude-haiku-4-5");
        assert_eq!(config.stream_idle_timeout_ms, 5000);
        // Unspecified fields keep their defaults.
        assert_eq!(config.max_response_tokens, 1024);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "not { valid toml !!!")
            .await
            .unwrap();

        let config = load_orchestrator_config(tmp.path()).await;
        assert_eq!(config.history_window, 20);
    }
}
