//! Brand and competitor mention extraction from free-text responses.

use std::sync::{Arc, LazyLock};

use aivis_core::TaskKey;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::sentiment::{lexicon_score, SentimentScorer};

/// Characters kept on each side of a mention in the context snippet.
const SNIPPET_RADIUS: usize = 50;

/// Characters on each side of a mention fed to the sentiment scorer.
const SENTIMENT_RADIUS: usize = 100;

static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*]\s*)?(?:\*\*)?(\d{1,3})[.)]\s").expect("valid regex")
});

static RANK_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(first|second|third|fourth|fifth)\b|#([1-5])\b|\bnumber (one|two|three|four|five)\b",
    )
    .expect("valid regex")
});

/// One entity found in one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub entity: String,
    pub response_id: TaskKey,
    /// 1-based sentence index of the first occurrence.
    pub position: u32,
    /// Numbered-list rank of the line holding the first occurrence, if any.
    pub list_rank: Option<u32>,
    pub sentiment: f32,
    pub context_snippet: String,
}

#[derive(Debug)]
struct EntityPattern {
    name: String,
    regex: Regex,
}

/// Compiled matchers for the brand and its competitors.
#[derive(Debug)]
pub struct EntitySet {
    patterns: Vec<EntityPattern>,
}

impl EntitySet {
    /// Compile one case-insensitive, word-bounded matcher per entity.
    ///
    /// Order is preserved; mentions come out in the same order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidEntity`] for blank names or names
    /// whose pattern fails to compile.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, AnalysisError> {
        let patterns = names
            .iter()
            .map(|name| {
                let name = name.as_ref().trim();
                if name.is_empty() {
                    return Err(AnalysisError::InvalidEntity {
                        name: name.to_owned(),
                        reason: "entity name is blank".to_owned(),
                    });
                }
                let regex = Regex::new(&entity_pattern(name)).map_err(|e| {
                    AnalysisError::InvalidEntity {
                        name: name.to_owned(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(EntityPattern {
                    name: name.to_owned(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First non-overlapping occurrence of each entity, longest match first.
    ///
    /// Returns `(entity index, start, end)` byte spans ordered by entity.
    fn first_occurrences(&self, text: &str) -> Vec<(usize, usize, usize)> {
        let mut candidates: Vec<(usize, usize, usize)> = self
            .patterns
            .iter()
            .enumerate()
            .flat_map(|(idx, p)| p.regex.find_iter(text).map(move |m| (idx, m.start(), m.end())))
            .collect();

        candidates.sort_by(|a, b| {
            (b.2 - b.1)
                .cmp(&(a.2 - a.1))
                .then(a.1.cmp(&b.1))
                .then(a.0.cmp(&b.0))
        });

        let mut claimed: Vec<(usize, usize, usize)> = Vec::new();
        for cand in candidates {
            if claimed.iter().all(|c| cand.2 <= c.1 || cand.1 >= c.2) {
                claimed.push(cand);
            }
        }

        let mut firsts: Vec<(usize, usize, usize)> = Vec::new();
        for span in claimed {
            match firsts.iter_mut().find(|f| f.0 == span.0) {
                Some(existing) if span.1 < existing.1 => *existing = span,
                Some(_) => {}
                None => firsts.push(span),
            }
        }
        firsts.sort_by_key(|f| f.0);
        firsts
    }
}

/// Alternation of the name and its spacing variants, longest first, with an
/// optional plural or possessive suffix.
fn entity_pattern(name: &str) -> String {
    let mut variants = name_variants(name);
    variants.sort_by_key(|v| std::cmp::Reverse(v.len()));
    let alternation = variants
        .iter()
        .map(|v| regex::escape(v).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");

    let lead = if name.starts_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    let trail = if name.ends_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };

    format!(r"(?i){lead}(?:{alternation})(?:'s|’s|es|s)?{trail}")
}

/// "PolicyBazaar" also matches "Policy Bazaar"; "Policy Bazaar" also matches
/// "PolicyBazaar".
fn name_variants(name: &str) -> Vec<String> {
    let mut variants = vec![name.to_owned()];

    let mut spaced = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_uppercase() && prev.is_some_and(char::is_lowercase) {
            spaced.push(' ');
        }
        spaced.push(c);
        prev = Some(c);
    }
    if spaced != name {
        variants.push(spaced);
    }

    if name.contains(' ') {
        let joined: String = name.split_whitespace().collect();
        variants.push(joined);
    }

    variants.dedup();
    variants
}

/// Scans responses for entity mentions.
pub struct MentionExtractor {
    sentiment: Arc<dyn SentimentScorer>,
}

impl MentionExtractor {
    #[must_use]
    pub fn new(sentiment: Arc<dyn SentimentScorer>) -> Self {
        Self { sentiment }
    }

    #[must_use]
    pub fn sentiment_scorer(&self) -> &'static str {
        self.sentiment.name()
    }

    /// At most one [`Mention`] per entity, in entity order.
    ///
    /// Entities that never occur yield nothing. The same input always yields
    /// the same mentions for a deterministic sentiment scorer.
    pub async fn extract(&self, response_id: TaskKey, text: &str, entities: &EntitySet) -> Vec<Mention> {
        let mut mentions = Vec::new();

        for (idx, start, end) in entities.first_occurrences(text) {
            let entity = &entities.patterns[idx].name;
            let (w_start, w_end) = char_window(text, start, end, SENTIMENT_RADIUS);
            let sentiment = self.score_window(entity, &text[w_start..w_end]).await;

            mentions.push(Mention {
                entity: entity.clone(),
                response_id,
                position: sentence_index(text, start),
                list_rank: list_rank(text, start),
                sentiment,
                context_snippet: context_snippet(text, start, end),
            });
        }

        mentions
    }

    async fn score_window(&self, entity: &str, window: &str) -> f32 {
        match self.sentiment.score(window).await {
            Ok(score) if score.is_finite() => score.clamp(-1.0, 1.0),
            Ok(score) => {
                tracing::warn!(entity, score, "sentiment scorer returned non-finite value, using lexicon");
                lexicon_score(window)
            }
            Err(e) => {
                tracing::warn!(
                    entity,
                    scorer = self.sentiment.name(),
                    error = %e,
                    "sentiment scoring degraded, using lexicon"
                );
                lexicon_score(window)
            }
        }
    }
}

/// 1-based index of the sentence containing byte `offset`.
///
/// Sentences end at `.`, `!` or `?` followed by whitespace, and at newlines.
/// Blank segments and bare list markers such as `1.` do not count.
fn sentence_index(text: &str, offset: usize) -> u32 {
    let mut index = 1_u32;
    let mut segment_start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if i >= offset {
            break;
        }
        let next_is_space = chars.peek().is_some_and(|(_, n)| n.is_whitespace());
        let boundary = match c {
            '\n' => true,
            '.' => {
                let segment = &text[segment_start..i];
                next_is_space && !is_list_marker(segment) && !ends_with_abbreviation(segment)
            }
            '!' | '?' => next_is_space && !is_list_marker(&text[segment_start..i]),
            _ => false,
        };
        if boundary {
            if text[segment_start..i].chars().any(char::is_alphanumeric) {
                index = index.saturating_add(1);
            }
            segment_start = i + c.len_utf8();
        }
    }

    index
}

/// Abbreviations whose trailing period does not end a sentence.
const ABBREVIATIONS: [&str; 10] = ["e.g", "i.e", "vs", "cf", "approx", "incl", "mr", "mrs", "ms", "dr"];

fn ends_with_abbreviation(segment: &str) -> bool {
    segment
        .split_whitespace()
        .next_back()
        .map(|word| word.trim_start_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .is_some_and(|word| ABBREVIATIONS.contains(&word.as_str()))
}

fn is_list_marker(segment: &str) -> bool {
    let trimmed = segment.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

fn list_rank(text: &str, offset: usize) -> Option<u32> {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
    let line = &text[line_start..line_end];

    if let Some(caps) = LIST_MARKER_RE.captures(line) {
        return caps.get(1).and_then(|m| m.as_str().parse().ok());
    }

    let caps = RANK_WORD_RE.captures(line)?;
    let word = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str()
        .to_lowercase();
    match word.as_str() {
        "first" | "1" | "one" => Some(1),
        "second" | "2" | "two" => Some(2),
        "third" | "3" | "three" => Some(3),
        "fourth" | "4" | "four" => Some(4),
        "fifth" | "5" | "five" => Some(5),
        _ => None,
    }
}

/// Byte range covering `radius` characters on each side of `start..end`.
fn char_window(text: &str, start: usize, end: usize, radius: usize) -> (usize, usize) {
    let lo = if radius == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(radius - 1)
            .map_or(0, |(i, _)| i)
    };
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    (lo, hi)
}

fn context_snippet(text: &str, start: usize, end: usize) -> String {
    let (lo, hi) = char_window(text, start, end, SNIPPET_RADIUS);
    let mut snippet = text[lo..hi].trim().to_owned();
    if lo > 0 {
        snippet.insert_str(0, "...");
    }
    if hi < text.len() {
        snippet.push_str("...");
    }
    snippet
}

#[cfg(test)]
mod tests {
    use aivis_core::PlatformId;

    use super::*;
    use crate::sentiment::LexiconSentiment;

    fn key() -> TaskKey {
        TaskKey {
            prompt_id: 0,
            platform: PlatformId::OpenAi,
        }
    }

    fn extractor() -> MentionExtractor {
        MentionExtractor::new(Arc::new(LexiconSentiment))
    }

    async fn extract(text: &str, names: &[&str]) -> Vec<Mention> {
        let entities = EntitySet::new(names).unwrap();
        extractor().extract(key(), text, &entities).await
    }

    #[tokio::test]
    async fn repeated_brand_counts_once() {
        let text = "BrandX is fast. Many teams pick BrandX for payroll, and BrandX support is great.";
        let mentions = extract(text, &["BrandX"]).await;
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].position, 1);
    }

    #[tokio::test]
    async fn longest_match_wins() {
        let mentions = extract("I use PayPal daily", &["Pay", "PayPal"]).await;
        let names: Vec<&str> = mentions.iter().map(|m| m.entity.as_str()).collect();
        assert_eq!(names, vec!["PayPal"]);
    }

    #[tokio::test]
    async fn overlapping_multiword_entities_prefer_longer() {
        let mentions = extract(
            "Bank of America has branches nationwide.",
            &["America", "Bank of America"],
        )
        .await;
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].entity, "Bank of America");
    }

    #[tokio::test]
    async fn no_match_inside_other_words() {
        assert!(extract("This form is revisable later.", &["Visa"]).await.is_empty());
    }

    #[tokio::test]
    async fn tolerates_plural_possessive_and_case() {
        assert_eq!(extract("Visa's network is huge.", &["Visa"]).await.len(), 1);
        assert_eq!(extract("Two VISAS were issued.", &["Visa"]).await.len(), 1);
        assert_eq!(extract("(stripe) works.", &["Stripe"]).await.len(), 1);
    }

    #[tokio::test]
    async fn camel_case_and_spaced_variants_match() {
        assert_eq!(extract("Try Policy Bazaar today.", &["PolicyBazaar"]).await.len(), 1);
        assert_eq!(extract("Try PolicyBazaar today.", &["Policy Bazaar"]).await.len(), 1);
    }

    #[tokio::test]
    async fn absent_entity_yields_nothing() {
        let mentions = extract("Stripe and Adyen lead.", &["Stripe", "Square"]).await;
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].entity, "Stripe");
    }

    #[tokio::test]
    async fn position_is_sentence_of_first_occurrence() {
        let text = "Here are options. Stripe is popular! Consider Square? Square again.\nAdyen too.";
        let mentions = extract(text, &["Stripe", "Square", "Adyen"]).await;
        let positions: Vec<(String, u32)> =
            mentions.iter().map(|m| (m.entity.clone(), m.position)).collect();
        assert_eq!(
            positions,
            vec![
                ("Stripe".to_owned(), 2),
                ("Square".to_owned(), 3),
                ("Adyen".to_owned(), 5),
            ]
        );
    }

    #[tokio::test]
    async fn abbreviations_do_not_end_sentences() {
        let mentions = extract("e.g. BrandX is here", &["BrandX"]).await;
        assert_eq!(mentions[0].position, 1);

        let text = "Big names, i.e. Stripe vs. Square, dominate. Adyen follows.";
        let mentions = extract(text, &["Square", "Adyen"]).await;
        let positions: Vec<u32> = mentions.iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[tokio::test]
    async fn numbered_list_sets_rank_without_inflating_position() {
        let text = "Top picks:\n1. Stripe - reliable\n2. Square - simple\n3. Adyen";
        let mentions = extract(text, &["Square"]).await;
        assert_eq!(mentions[0].list_rank, Some(2));
        assert_eq!(mentions[0].position, 3);
    }

    #[tokio::test]
    async fn rank_words_are_recognised() {
        let mentions = extract("Stripe is the number one choice here.", &["Stripe"]).await;
        assert_eq!(mentions[0].list_rank, Some(1));
        let mentions = extract("Square comes third overall.", &["Square"]).await;
        assert_eq!(mentions[0].list_rank, Some(3));
    }

    #[tokio::test]
    async fn sentiment_stays_in_range() {
        let text = "BrandX is the best, excellent, amazing, outstanding winner and I love it.";
        let mentions = extract(text, &["BrandX"]).await;
        assert!((-1.0..=1.0).contains(&mentions[0].sentiment));
        assert!(mentions[0].sentiment > 0.0);
    }

    #[tokio::test]
    async fn extraction_is_idempotent() {
        let text = "1. Wise is cheap.\n2. Revolut is popular but support is slow.";
        let first = extract(text, &["Wise", "Revolut"]).await;
        let second = extract(text, &["Wise", "Revolut"]).await;
        assert_eq!(first, second);
    }

    #[test]
    fn snippet_marks_truncation_and_respects_utf8() {
        let text = format!("{}BrandX{}", "é".repeat(80), "ü".repeat(80));
        let start = text.find("BrandX").unwrap();
        let snippet = context_snippet(&text, start, start + 6);
        assert!(snippet.starts_with("..."));
        assert!(snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), 3 + 50 + 6 + 50 + 3);
    }

    #[test]
    fn short_text_snippet_has_no_markers() {
        let snippet = context_snippet("Use BrandX.", 4, 10);
        assert_eq!(snippet, "Use BrandX.");
    }

    #[test]
    fn blank_entity_rejected() {
        assert!(EntitySet::new(&["  "]).is_err());
    }

    #[test]
    fn non_word_edges_still_match() {
        let set = EntitySet::new(&["C++"]).unwrap();
        assert_eq!(set.first_occurrences("We rewrote it in C++ last year").len(), 1);
    }

    struct BrokenScorer;

    #[async_trait::async_trait]
    impl SentimentScorer for BrokenScorer {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn score(&self, _text: &str) -> Result<f32, crate::error::SentimentError> {
            Err(crate::error::SentimentError::Status(503))
        }
    }

    #[tokio::test]
    async fn failing_model_falls_back_to_lexicon() {
        let extractor = MentionExtractor::new(Arc::new(BrokenScorer));
        let entities = EntitySet::new(&["BrandX"]).unwrap();
        let mentions = extractor
            .extract(key(), "BrandX is reliable and trusted.", &entities)
            .await;
        assert_eq!(mentions.len(), 1);
        assert!(mentions[0].sentiment > 0.0);
    }
}
