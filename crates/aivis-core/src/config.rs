use std::collections::BTreeMap;

use crate::app_config::{AppConfig, Environment, ScoreWeights};
use crate::types::PlatformId;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values are treated as unset so `.env` templates with `KEY=` work.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("AIVIS_ENV", "development"))?;
    let log_level = or_default("AIVIS_LOG_LEVEL", "info");
    let profile_path = PathBuf::from(or_default("AIVIS_PROFILE_PATH", "./config/profile.yaml"));
    let industries_path = PathBuf::from(or_default(
        "AIVIS_INDUSTRIES_PATH",
        "./config/industries.yaml",
    ));

    let max_workers = parse_usize("AIVIS_MAX_WORKERS", "20")?;
    if max_workers == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "AIVIS_MAX_WORKERS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let request_timeout_secs = parse_u64("AIVIS_REQUEST_TIMEOUT_SECS", "30")?;
    let run_deadline_secs = match optional("AIVIS_RUN_DEADLINE_SECS") {
        Some(raw) => Some(raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: "AIVIS_RUN_DEADLINE_SECS".to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    let score_weights = ScoreWeights::new(
        parse_f64("AIVIS_WEIGHT_MENTION_RATE", "0.5")?,
        parse_f64("AIVIS_WEIGHT_POSITION", "0.3")?,
        parse_f64("AIVIS_WEIGHT_SENTIMENT", "0.2")?,
    )?;

    let platform_weights = match optional("AIVIS_PLATFORM_WEIGHTS") {
        Some(raw) => parse_platform_weights(&raw)?,
        None => BTreeMap::new(),
    };

    Ok(AppConfig {
        env,
        log_level,
        profile_path,
        industries_path,
        max_workers,
        request_timeout_secs,
        run_deadline_secs,
        score_weights,
        platform_weights,
        sentiment_model_url: optional("AIVIS_SENTIMENT_MODEL_URL"),
        openai_api_key: optional(PlatformId::OpenAi.api_key_var()),
        gemini_api_key: optional(PlatformId::Gemini.api_key_var()),
        perplexity_api_key: optional(PlatformId::Perplexity.api_key_var()),
    })
}

/// Parse an `AIVIS_ENV` value into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AIVIS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Parse `openai=2,gemini=1` into a per-platform weight map.
fn parse_platform_weights(raw: &str) -> Result<BTreeMap<PlatformId, f64>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "AIVIS_PLATFORM_WEIGHTS".to_string(),
        reason,
    };

    let mut weights = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| invalid(format!("expected platform=weight, got '{pair}'")))?;
        let platform = name.parse::<PlatformId>().map_err(invalid)?;
        let weight = value
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(format!("{pair}: {e}")))?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(invalid(format!("weight for {platform} must be non-negative")));
        }
        weights.insert(platform, weight);
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_known_values() {
        assert_eq!(
            parse_environment("development").unwrap(),
            Environment::Development
        );
        assert_eq!(parse_environment("test").unwrap(), Environment::Test);
        assert_eq!(
            parse_environment("production").unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn parse_environment_unknown_fails() {
        let err = parse_environment("staging").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "AIVIS_ENV"));
    }

    #[test]
    fn build_app_config_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.max_workers, 20);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert!(cfg.run_deadline_secs.is_none());
        assert_eq!(cfg.score_weights, ScoreWeights::default());
        assert!(cfg.platform_weights.is_empty());
        assert!(cfg.sentiment_model_url.is_none());
        assert!(cfg.configured_platforms().is_empty());
    }

    #[test]
    fn build_app_config_reads_api_keys() {
        let mut map = HashMap::new();
        map.insert("OPENAI_API_KEY", "sk-test");
        map.insert("PERPLEXITY_API_KEY", "pplx-test");
        map.insert("GEMINI_API_KEY", "   ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.api_key(PlatformId::OpenAi), Some("sk-test"));
        assert_eq!(cfg.api_key(PlatformId::Gemini), None);
        assert_eq!(
            cfg.configured_platforms(),
            vec![PlatformId::OpenAi, PlatformId::Perplexity]
        );
    }

    #[test]
    fn debug_output_redacts_api_keys() {
        let mut map = HashMap::new();
        map.insert("OPENAI_API_KEY", "sk-very-secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn build_app_config_rejects_zero_workers() {
        let mut map = HashMap::new();
        map.insert("AIVIS_MAX_WORKERS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "AIVIS_MAX_WORKERS"),
            "expected InvalidEnvVar(AIVIS_MAX_WORKERS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_invalid_timeout() {
        let mut map = HashMap::new();
        map.insert("AIVIS_REQUEST_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "AIVIS_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(AIVIS_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_reads_run_deadline() {
        let mut map = HashMap::new();
        map.insert("AIVIS_RUN_DEADLINE_SECS", "120");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.run_deadline_secs, Some(120));
    }

    #[test]
    fn build_app_config_weight_override() {
        let mut map = HashMap::new();
        map.insert("AIVIS_WEIGHT_MENTION_RATE", "0.6");
        map.insert("AIVIS_WEIGHT_POSITION", "0.2");
        map.insert("AIVIS_WEIGHT_SENTIMENT", "0.2");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!((cfg.score_weights.mention_rate - 0.6).abs() < 1e-9);
        assert!((cfg.score_weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn build_app_config_rejects_weights_not_summing_to_one() {
        let mut map = HashMap::new();
        map.insert("AIVIS_WEIGHT_MENTION_RATE", "0.9");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::Validation(_))),
            "expected Validation error, got: {result:?}"
        );
    }

    #[test]
    fn parse_platform_weights_valid() {
        let weights = parse_platform_weights("openai=2, gemini=1").unwrap();
        assert_eq!(weights.get(&PlatformId::OpenAi), Some(&2.0));
        assert_eq!(weights.get(&PlatformId::Gemini), Some(&1.0));
        assert!(!weights.contains_key(&PlatformId::Perplexity));
    }

    #[test]
    fn parse_platform_weights_rejects_unknown_platform() {
        let err = parse_platform_weights("copilot=1").unwrap_err();
        assert!(err.to_string().contains("copilot"));
    }

    #[test]
    fn parse_platform_weights_rejects_missing_equals() {
        let err = parse_platform_weights("openai").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "AIVIS_PLATFORM_WEIGHTS"));
    }
}
