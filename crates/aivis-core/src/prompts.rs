//! Prompt generation from industry templates.
//!
//! Prompts are spread evenly across the five template categories, filled with
//! random terms from the industry vocabulary, and de-duplicated into an
//! immutable [`PromptSet`].

use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::industries::{IndustryTemplate, IndustryTemplates, PLACEHOLDERS};
use crate::profile::AnalysisProfile;
use crate::types::{Prompt, PromptCategory};

const TEMPLATE_CATEGORIES: [PromptCategory; 5] = [
    PromptCategory::DirectComparison,
    PromptCategory::Recommendation,
    PromptCategory::ProblemSolving,
    PromptCategory::FeatureSpecific,
    PromptCategory::BuyingJourney,
];

/// Attempts per requested prompt before giving up on finding unique text.
const MAX_ATTEMPTS_PER_PROMPT: usize = 10;

fn located_templates(category: PromptCategory) -> &'static [&'static str] {
    match category {
        PromptCategory::DirectComparison => &[
            "What are the best {industry} companies in {region}?",
            "Which {industry} platforms should I choose in {region}?",
            "Compare the top {industry} services available in {region}",
            "List the leading {industry} providers in {region}",
        ],
        PromptCategory::Recommendation => &[
            "I need recommendations for {industry} solutions in {region}",
            "What {industry} service would you recommend for a {business_type} in {region}?",
            "Help me choose the right {industry} platform in {region}",
            "Which {industry} company offers the best value in {region}?",
        ],
        PromptCategory::ProblemSolving => &[
            "How can I solve {pain_point} using {industry} services in {region}?",
            "What's the best way to {action} in {industry} in {region}?",
            "I'm looking for {industry} solutions in {region} that can help with {need}",
            "How do I choose the right {industry} provider for {use_case} in {region}?",
        ],
        PromptCategory::FeatureSpecific => &[
            "Which {industry} companies in {region} offer {feature}?",
            "What {industry} platforms in {region} have the best {capability}?",
            "Compare {feature} across different {industry} providers in {region}",
            "Find {industry} services in {region} with strong {benefit}",
        ],
        PromptCategory::BuyingJourney => &[
            "How do I get started with {industry} services in {region}?",
            "What should I look for when choosing {industry} providers in {region}?",
            "Steps to implement {industry} solutions in my business in {region}",
            "Beginner's guide to {industry} platforms in {region}",
        ],
        PromptCategory::CompetitorComparison => &[],
    }
}

fn generic_templates(category: PromptCategory) -> &'static [&'static str] {
    match category {
        PromptCategory::DirectComparison => &[
            "What are the best {industry} companies?",
            "Which {industry} platforms should I choose?",
            "Compare the top {industry} services available today",
            "List the leading {industry} providers",
        ],
        PromptCategory::Recommendation => &[
            "I need recommendations for {industry} solutions",
            "What {industry} service would you recommend for a {business_type}?",
            "Help me choose the right {industry} platform",
            "Which {industry} company offers the best value?",
        ],
        PromptCategory::ProblemSolving => &[
            "How can I solve {pain_point} using {industry} services?",
            "What's the best way to {action} in {industry}?",
            "I'm looking for {industry} solutions that can help with {need}",
            "How do I choose the right {industry} provider for {use_case}?",
        ],
        PromptCategory::FeatureSpecific => &[
            "Which {industry} companies offer {feature}?",
            "What {industry} platforms have the best {capability}?",
            "Compare {feature} across different {industry} providers",
            "Find {industry} services with strong {benefit}",
        ],
        PromptCategory::BuyingJourney => &[
            "How do I get started with {industry} services?",
            "What should I look for when choosing {industry} providers?",
            "Steps to implement {industry} solutions in my business",
            "Beginner's guide to {industry} platforms",
        ],
        PromptCategory::CompetitorComparison => &[],
    }
}

/// Ordered, de-duplicated, immutable collection of prompts.
#[derive(Debug, Clone, Default)]
pub struct PromptSet {
    prompts: Vec<Arc<Prompt>>,
}

impl PromptSet {
    /// Build a set from raw `(category, text)` pairs.
    ///
    /// Drops blank prompts, prompts with unfilled `{placeholders}`, and exact
    /// duplicates, then numbers the survivors from `0`.
    #[must_use]
    pub fn new(raw: impl IntoIterator<Item = (PromptCategory, String)>) -> Self {
        let mut seen = HashSet::new();
        let mut prompts = Vec::new();
        for (category, text) in raw {
            let text = text.trim().to_string();
            if text.is_empty() || text.contains('{') || text.contains('}') {
                tracing::debug!(prompt = %text, "dropping invalid prompt");
                continue;
            }
            if !seen.insert(text.clone()) {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)]
            let id = prompts.len() as u32;
            prompts.push(Arc::new(Prompt { id, text, category }));
        }
        Self { prompts }
    }

    /// Generate the prompt set for an analysis profile.
    pub fn for_profile<R: Rng + ?Sized>(
        profile: &AnalysisProfile,
        templates: &IndustryTemplates,
        rng: &mut R,
    ) -> Self {
        let template = templates.resolve(&profile.industry, profile.location.as_deref());
        let generator = PromptGenerator::new(template, profile.location.clone());
        let mut raw = generator.generate(profile.prompt_count, rng);
        if profile.competitor_prompts {
            raw.extend(generator.competitor_prompts(&profile.brand, &profile.competitors, rng));
        }
        Self::new(raw)
    }

    #[must_use]
    pub fn prompts(&self) -> &[Arc<Prompt>] {
        &self.prompts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Prompt> {
        self.prompts.get(id as usize).map(AsRef::as_ref)
    }
}

/// Fills prompt templates from one industry's vocabulary.
#[derive(Debug, Clone)]
pub struct PromptGenerator {
    template: IndustryTemplate,
    location: Option<String>,
}

impl PromptGenerator {
    #[must_use]
    pub fn new(template: IndustryTemplate, location: Option<String>) -> Self {
        let location = location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        Self { template, location }
    }

    /// Generate up to `count` unique prompts spread across template categories.
    ///
    /// Each category first receives `max(1, count / 5)` prompts, then random
    /// categories top up the remainder. Output may be shorter than `count`
    /// when the vocabulary is too small to produce enough distinct prompts.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Vec<(PromptCategory, String)> {
        let per_category = (count / TEMPLATE_CATEGORIES.len()).max(1);
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(count);

        for category in TEMPLATE_CATEGORIES {
            let mut produced = 0;
            let mut attempts = 0;
            while produced < per_category
                && out.len() < count
                && attempts < per_category * MAX_ATTEMPTS_PER_PROMPT
            {
                attempts += 1;
                let prompt = self.fill_category(category, rng);
                if seen.insert(prompt.clone()) {
                    out.push((category, prompt));
                    produced += 1;
                }
            }
        }

        let mut attempts = 0;
        while out.len() < count && attempts < count * MAX_ATTEMPTS_PER_PROMPT {
            attempts += 1;
            let category = TEMPLATE_CATEGORIES[rng.random_range(0..TEMPLATE_CATEGORIES.len())];
            let prompt = self.fill_category(category, rng);
            if seen.insert(prompt.clone()) {
                out.push((category, prompt));
            }
        }

        if out.len() < count {
            tracing::warn!(
                requested = count,
                generated = out.len(),
                "industry vocabulary too small for requested prompt count"
            );
        }

        out
    }

    /// Head-to-head prompts naming the brand and its competitors.
    pub fn competitor_prompts<R: Rng + ?Sized>(
        &self,
        brand: &str,
        competitors: &[String],
        rng: &mut R,
    ) -> Vec<(PromptCategory, String)> {
        if competitors.is_empty() {
            return Vec::new();
        }

        let suffix = self
            .location
            .as_deref()
            .map(|loc| format!(" in {loc}"))
            .unwrap_or_default();
        let mut out = Vec::new();

        for competitor in competitors {
            out.push((
                PromptCategory::CompetitorComparison,
                format!("Compare {brand} vs {competitor}{suffix}"),
            ));
        }

        for feature in self.template.features.iter().take(3) {
            if let Some(competitor) = competitors.choose(rng) {
                out.push((
                    PromptCategory::CompetitorComparison,
                    format!("Which is better for {feature}: {brand} or {competitor}{suffix}?"),
                ));
            }
        }

        for competitor in competitors.iter().take(2) {
            out.push((
                PromptCategory::CompetitorComparison,
                format!("What are the advantages of {brand} over {competitor}{suffix}?"),
            ));
        }

        out
    }

    fn fill_category<R: Rng + ?Sized>(&self, category: PromptCategory, rng: &mut R) -> String {
        let templates = if self.location.is_some() {
            located_templates(category)
        } else {
            generic_templates(category)
        };
        let Some(template) = templates.choose(rng) else {
            return String::new();
        };
        let filled = self.fill(template, rng);
        self.ensure_location(filled)
    }

    fn fill<R: Rng + ?Sized>(&self, template: &str, rng: &mut R) -> String {
        let mut filled = template.to_string();
        for placeholder in PLACEHOLDERS {
            let token = format!("{{{placeholder}}}");
            if !filled.contains(&token) {
                continue;
            }
            let value = self
                .template
                .terms_for(placeholder)
                .and_then(|terms| terms.choose(rng));
            if let Some(value) = value {
                filled = filled.replace(&token, value);
            }
        }
        filled
    }

    fn ensure_location(&self, prompt: String) -> String {
        match self.location.as_deref() {
            Some(loc) if !prompt.contains(loc) => match prompt.strip_suffix('?') {
                Some(stem) => format!("{stem} in {loc}?"),
                None => format!("{prompt} in {loc}"),
            },
            _ => prompt,
        }
    }
}
