use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::PlatformId;
use crate::ConfigError;

const DEFAULT_PROMPT_COUNT: usize = 20;

fn default_prompt_count() -> usize {
    DEFAULT_PROMPT_COUNT
}

/// What to analyze: the brand, who it competes with, and where to ask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisProfile {
    pub brand: String,
    pub industry: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_prompt_count")]
    pub prompt_count: usize,
    pub platforms: Vec<PlatformId>,
    #[serde(default)]
    pub competitors: Vec<String>,
    /// Also ask head-to-head brand vs competitor questions.
    #[serde(default)]
    pub competitor_prompts: bool,
}

impl AnalysisProfile {
    /// Brand followed by competitors, trimmed.
    #[must_use]
    pub fn entities(&self) -> Vec<String> {
        std::iter::once(&self.brand)
            .chain(self.competitors.iter())
            .map(|name| name.trim().to_string())
            .collect()
    }

    /// Check the profile is complete enough to start a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brand.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        if self.industry.trim().is_empty() {
            return Err(ConfigError::Validation(
                "industry must be non-empty".to_string(),
            ));
        }

        if self.prompt_count == 0 {
            return Err(ConfigError::Validation(
                "prompt_count must be at least 1".to_string(),
            ));
        }

        if self.platforms.is_empty() {
            return Err(ConfigError::Validation(
                "at least one platform must be selected".to_string(),
            ));
        }

        let mut seen_platforms = HashSet::new();
        for platform in &self.platforms {
            if !seen_platforms.insert(*platform) {
                return Err(ConfigError::Validation(format!(
                    "duplicate platform: '{platform}'"
                )));
            }
        }

        let brand_key = name_key(&self.brand);
        let mut seen_names = HashSet::new();
        for competitor in &self.competitors {
            let key = name_key(competitor);
            if key.is_empty() {
                return Err(ConfigError::Validation(
                    "competitor name must be non-empty".to_string(),
                ));
            }
            if key == brand_key {
                return Err(ConfigError::Validation(format!(
                    "competitor '{competitor}' is the brand itself"
                )));
            }
            if !seen_names.insert(key) {
                return Err(ConfigError::Validation(format!(
                    "duplicate competitor name: '{competitor}'"
                )));
            }
        }

        Ok(())
    }
}

/// Comparison key for entity names.
///
/// "Policy Bazaar" and "PolicyBazaar" match the same text, so they must not
/// both appear in one profile.
fn name_key(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

/// Load and validate an analysis profile from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_profile(path: &Path) -> Result<AnalysisProfile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let profile: AnalysisProfile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    profile.validate()?;

    Ok(profile)
}
