//! Verifier configuration loading for `llmv verify`.
//!
//! Precedence: built-in defaults, then the `--config` file, then flags.
//! The merged result is validated before it is returned.

use std::fs;

use llmv_core::settings::validate_config;
use llmv_core::{ConfigOverrides, VerifierConfig};

use crate::commands::VerifyArgs;
use crate::error::CliError;

/// Translate command-line flags into partial overrides.
///
/// `--deadline-secs 0` removes the deadline.
pub fn overrides_from_args(args: &VerifyArgs) -> ConfigOverrides {
    ConfigOverrides {
        concurrency: args.concurrency,
        probe_timeout_ms: args.probe_timeout_ms,
        global_deadline_secs: args
            .deadline_secs
            .map(|secs| (secs > 0).then_some(secs)),
        cache_ttl_secs: None,
    }
}

/// Build the effective configuration for one run.
pub fn load_verifier_config(args: &VerifyArgs) -> Result<VerifierConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|e| {
                CliError::Config(format!("cannot read {}: {e}", path.display()))
            })?;
            VerifierConfig::from_json_str(&raw)?
        }
        None => VerifierConfig::with_defaults(),
    };

    config.merge(&overrides_from_args(args));
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn config_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file_or_flags() {
        let config = load_verifier_config(&VerifyArgs::default()).unwrap();
        assert_eq!(config, VerifierConfig::with_defaults());
    }

    #[test]
    fn test_flags_override_file_values() {
        let file = config_file(r#"{"concurrency": 2, "probe_timeout_ms": 4000, "cache_ttl_secs": 60}"#);
        let args = VerifyArgs {
            config: Some(file.path().to_path_buf()),
            concurrency: Some(8),
            ..VerifyArgs::default()
        };

        let config = load_verifier_config(&args).unwrap();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.probe_timeout(), Duration::from_millis(4000));
        assert_eq!(config.cache_ttl_secs, 60);
    }

    #[test]
    fn test_zero_deadline_disables_it() {
        let args = VerifyArgs {
            deadline_secs: Some(0),
            ..VerifyArgs::default()
        };
        assert_eq!(load_verifier_config(&args).unwrap().global_deadline(), None);
    }

    #[test]
    fn test_invalid_weights_are_a_config_error() {
        let file = config_file(
            r#"{"weights": {"speed": 0.5, "efficiency": 0.5, "cost": 0.5, "capability": 0.0, "recency": 0.0}}"#,
        );
        let args = VerifyArgs {
            config: Some(file.path().to_path_buf()),
            ..VerifyArgs::default()
        };

        let err = load_verifier_config(&args).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_zero_concurrency_flag_is_rejected() {
        let args = VerifyArgs {
            concurrency: Some(0),
            ..VerifyArgs::default()
        };
        assert!(matches!(load_verifier_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let args = VerifyArgs {
            config: Some(PathBuf::from("/nonexistent/llmv-config.json")),
            ..VerifyArgs::default()
        };
        let err = load_verifier_config(&args).unwrap_err();
        assert!(err.to_string().contains("llmv-config.json"));
    }
}
