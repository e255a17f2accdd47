//! Industry vocabulary used to fill prompt templates.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Term lists for one industry. Every list must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryTemplate {
    pub terms: Vec<String>,
    pub regions: Vec<String>,
    pub business_types: Vec<String>,
    pub pain_points: Vec<String>,
    pub actions: Vec<String>,
    pub needs: Vec<String>,
    pub use_cases: Vec<String>,
    pub features: Vec<String>,
    pub capabilities: Vec<String>,
    pub benefits: Vec<String>,
}

impl IndustryTemplate {
    /// Look up the term list for a template placeholder such as `industry`.
    #[must_use]
    pub fn terms_for(&self, placeholder: &str) -> Option<&[String]> {
        let list = match placeholder {
            "industry" => &self.terms,
            "region" => &self.regions,
            "business_type" => &self.business_types,
            "pain_point" => &self.pain_points,
            "action" => &self.actions,
            "need" => &self.needs,
            "use_case" => &self.use_cases,
            "feature" => &self.features,
            "capability" => &self.capabilities,
            "benefit" => &self.benefits,
            _ => return None,
        };
        Some(list.as_slice())
    }

    /// Generic vocabulary for an industry with no configured template.
    #[must_use]
    pub fn custom(industry: &str, location: Option<&str>) -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();

        let mut regions = owned(&["globally", "internationally", "in the market"]);
        if let Some(loc) = location {
            regions.insert(0, loc.to_string());
        }

        Self {
            terms: vec![
                industry.to_lowercase(),
                industry.to_string(),
                format!("{industry} solutions"),
                format!("{industry} services"),
            ],
            regions,
            business_types: owned(&[
                "startup",
                "enterprise",
                "small business",
                "individual",
                "corporation",
                "SME",
                "organization",
                "company",
            ]),
            pain_points: owned(&[
                "high costs",
                "inefficiency",
                "poor service quality",
                "limited options",
                "complex processes",
                "lack of transparency",
                "scalability issues",
                "integration challenges",
            ]),
            actions: owned(&[
                "find solutions",
                "compare options",
                "get services",
                "improve processes",
                "reduce costs",
                "increase efficiency",
                "solve problems",
                "get started",
            ]),
            needs: owned(&[
                "better solutions",
                "cost optimization",
                "process improvement",
                "quality service",
                "reliable providers",
                "trusted partners",
                "innovative approaches",
                "competitive advantage",
            ]),
            use_cases: owned(&[
                "business operations",
                "service delivery",
                "customer needs",
                "market requirements",
                "industry challenges",
                "growth objectives",
                "efficiency goals",
                "competitive positioning",
            ]),
            features: owned(&[
                "quality service",
                "competitive pricing",
                "reliability",
                "customer support",
                "innovation",
                "flexibility",
                "scalability",
                "expertise",
            ]),
            capabilities: owned(&[
                "service delivery",
                "problem solving",
                "customer satisfaction",
                "operational excellence",
                "market expertise",
                "industry knowledge",
                "proven track record",
                "professional service",
            ]),
            benefits: owned(&[
                "cost savings",
                "better outcomes",
                "improved efficiency",
                "competitive advantage",
                "customer satisfaction",
                "growth potential",
                "market leadership",
                "operational excellence",
            ]),
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        for placeholder in PLACEHOLDERS {
            let empty = self
                .terms_for(placeholder)
                .is_none_or(|list| list.iter().all(|t| t.trim().is_empty()));
            if empty {
                return Err(ConfigError::Validation(format!(
                    "industry '{name}' has no terms for '{placeholder}'"
                )));
            }
        }
        Ok(())
    }
}

/// Placeholders recognised in prompt templates.
pub const PLACEHOLDERS: [&str; 10] = [
    "industry",
    "region",
    "business_type",
    "pain_point",
    "action",
    "need",
    "use_case",
    "feature",
    "capability",
    "benefit",
];

/// All configured industries keyed by display name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct IndustryTemplates {
    industries: BTreeMap<String, IndustryTemplate>,
}

impl IndustryTemplates {
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.industries.keys().map(String::as_str).collect()
    }

    /// Resolve the template for `industry`, falling back to a generated one.
    ///
    /// When `location` is given it is moved to the front of the region list.
    #[must_use]
    pub fn resolve(&self, industry: &str, location: Option<&str>) -> IndustryTemplate {
        let found = self
            .industries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(industry))
            .map(|(_, t)| t.clone());

        let Some(mut template) = found else {
            tracing::debug!(industry, "no configured template, using generic vocabulary");
            return IndustryTemplate::custom(industry, location);
        };

        if let Some(loc) = location {
            template.regions.retain(|r| r != loc);
            template.regions.insert(0, loc.to_string());
        }
        template
    }
}

/// Load and validate industry templates from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or any industry
/// has an empty term list.
pub fn load_industries(path: &Path) -> Result<IndustryTemplates, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let templates: IndustryTemplates =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    for (name, template) in &templates.industries {
        template.validate(name)?;
    }

    Ok(templates)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const YAML: &str = r"
FinTech:
  terms: [fintech, digital banking]
  regions: [India, globally]
  business_types: [startup]
  pain_points: [high fees]
  actions: [transfer money]
  needs: [cost reduction]
  use_cases: [payment processing]
  features: [real-time payments]
  capabilities: [fraud detection]
  benefits: [cost savings]
";

    fn write_yaml(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_configured_industry() {
        let file = write_yaml(YAML);
        let templates = load_industries(file.path()).unwrap();
        assert_eq!(templates.names(), vec!["FinTech"]);
        let t = templates.resolve("fintech", None);
        assert_eq!(t.terms, vec!["fintech", "digital banking"]);
    }

    #[test]
    fn resolve_moves_location_to_front() {
        let file = write_yaml(YAML);
        let templates = load_industries(file.path()).unwrap();
        let t = templates.resolve("FinTech", Some("globally"));
        assert_eq!(t.regions, vec!["globally", "India"]);
    }

    #[test]
    fn unknown_industry_uses_custom_vocabulary() {
        let templates = IndustryTemplates::default();
        let t = templates.resolve("Pet Care", Some("Berlin"));
        assert_eq!(t.terms[1], "Pet Care");
        assert_eq!(t.regions[0], "Berlin");
        assert!(t.validate("Pet Care").is_ok());
    }

    #[test]
    fn empty_term_list_rejected() {
        let file = write_yaml(&YAML.replace("benefits: [cost savings]", "benefits: []"));
        let err = load_industries(file.path()).unwrap_err();
        assert!(err.to_string().contains("benefit"));
    }

    #[test]
    fn unknown_placeholder_has_no_terms() {
        let t = IndustryTemplate::custom("SaaS", None);
        assert!(t.terms_for("price").is_none());
        assert!(t.terms_for("feature").is_some());
    }
}
