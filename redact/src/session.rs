//! Per-request redaction state.

use crate::catalog::{PiiCatalog, PiiCategory, PiiRule};
use crate::config::RedactionConfig;
use crate::error::RedactError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One `mock -> original` substitution issued by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redaction {
    /// Category that matched.
    pub category: PiiCategory,
    /// Generated stand-in sent to the model.
    pub mock: String,
    /// Text the mock replaced.
    pub original: String,
}

/// Scratch representation used while scanning: masked segments are never
/// rescanned by later rules.
enum Segment {
    Plain(String),
    Masked(String),
}

/// Redaction state scoped to a single request.
///
/// Mock values are unique within the session and the same original text in
/// the same category always maps to the same mock.
pub struct RedactionSession {
    catalog: Arc<PiiCatalog>,
    config: RedactionConfig,
    rng: StdRng,
    redactions: Vec<Redaction>,
    by_mock: HashMap<String, String>,
    by_original: HashMap<(PiiCategory, String), String>,
}

impl RedactionSession {
    /// Session over the standard catalog with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RedactionConfig::default())
    }

    /// Session over the standard catalog.
    #[must_use]
    pub fn with_config(config: RedactionConfig) -> Self {
        Self::with_catalog(PiiCatalog::standard(), config)
    }

    /// Session over a custom catalog.
    #[must_use]
    pub fn with_catalog(catalog: Arc<PiiCatalog>, config: RedactionConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            catalog,
            config,
            rng,
            redactions: Vec::new(),
            by_mock: HashMap::new(),
            by_original: HashMap::new(),
        }
    }

    /// Replaces every catalog match in `text` with a mock value.
    ///
    /// Rules run in catalog order. Text already replaced by an earlier rule
    /// (or already equal to an issued mock) is not scanned again.
    ///
    /// # Errors
    ///
    /// Returns `RedactError::GenerationCollision` if no unique mock could be
    /// generated within the configured number of attempts.
    pub fn redact(&mut self, text: &str) -> Result<String, RedactError> {
        let catalog = Arc::clone(&self.catalog);
        let before = self.redactions.len();
        let mut segments = vec![Segment::Plain(text.to_string())];

        for rule in catalog.rules() {
            let mut next = Vec::with_capacity(segments.len());
            for segment in segments {
                match segment {
                    Segment::Masked(_) => next.push(segment),
                    Segment::Plain(plain) => self.scan(rule, &plain, &mut next)?,
                }
            }
            segments = next;
        }

        let issued = self.redactions.len() - before;
        if issued > 0 {
            tracing::debug!(
                target: "rig_guard",
                event = "redaction_applied",
                issued,
                total = self.redactions.len(),
                "Redacted outbound text"
            );
        }

        Ok(segments
            .into_iter()
            .map(|segment| match segment {
                Segment::Plain(s) | Segment::Masked(s) => s,
            })
            .collect())
    }

    fn scan(
        &mut self,
        rule: &PiiRule,
        plain: &str,
        out: &mut Vec<Segment>,
    ) -> Result<(), RedactError> {
        let mut last = 0;
        for found in rule.pattern().find_iter(plain) {
            if found.is_empty() {
                continue;
            }
            if found.start() > last {
                out.push(Segment::Plain(plain[last..found.start()].to_string()));
            }
            let matched = found.as_str();
            let replacement = if self.by_mock.contains_key(matched) {
                matched.to_string()
            } else {
                self.issue(rule, matched)?
            };
            out.push(Segment::Masked(replacement));
            last = found.end();
        }
        if last < plain.len() {
            out.push(Segment::Plain(plain[last..].to_string()));
        }
        Ok(())
    }

    fn issue(&mut self, rule: &PiiRule, original: &str) -> Result<String, RedactError> {
        let category = rule.category();
        let key = (category, original.to_string());
        if let Some(mock) = self.by_original.get(&key) {
            return Ok(mock.clone());
        }

        for _ in 0..self.config.max_attempts {
            let candidate = rule.generate(&mut self.rng);
            if candidate == original || self.by_mock.contains_key(&candidate) {
                continue;
            }
            self.by_mock.insert(candidate.clone(), original.to_string());
            self.by_original.insert(key, candidate.clone());
            self.redactions.push(Redaction {
                category,
                mock: candidate.clone(),
                original: original.to_string(),
            });
            return Ok(candidate);
        }

        Err(RedactError::GenerationCollision {
            category,
            attempts: self.config.max_attempts,
        })
    }

    /// Restores every issued mock in `text` to its original value.
    ///
    /// Replacement is a single pass with longer mocks taking precedence, so a
    /// mock that is a substring of another never splits it, and restored text
    /// is never scanned again.
    #[must_use]
    pub fn refill(&self, text: &str) -> String {
        if self.by_mock.is_empty() {
            return text.to_string();
        }

        let mut mocks: Vec<&str> = self.by_mock.keys().map(String::as_str).collect();
        mocks.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = mocks
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");

        match Regex::new(&alternation) {
            Ok(pattern) => pattern
                .replace_all(text, |caps: &Captures<'_>| {
                    let found = caps.get(0).map_or("", |m| m.as_str());
                    self.by_mock
                        .get(found)
                        .cloned()
                        .unwrap_or_else(|| found.to_string())
                })
                .into_owned(),
            Err(err) => {
                tracing::warn!(
                    target: "rig_guard",
                    event = "refill_pattern_fallback",
                    error = %err,
                    "Falling back to sequential refill"
                );
                mocks.iter().fold(text.to_string(), |acc, mock| {
                    self.by_mock
                        .get(*mock)
                        .map_or(acc.clone(), |original| acc.replace(mock, original))
                })
            }
        }
    }

    /// Number of distinct substitutions issued so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.redactions.len()
    }

    /// Issued substitutions in the order they were made.
    pub fn redactions(&self) -> impl Iterator<Item = &Redaction> {
        self.redactions.iter()
    }
}

impl Default for RedactionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RedactionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionSession")
            .field("rules", &self.catalog.rules().len())
            .field("redactions", &self.redactions.len())
            .finish_non_exhaustive()
    }
}
