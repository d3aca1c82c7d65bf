//! Ordered PII pattern catalog.
//!
//! The standard catalog is processed in this fixed order:
//!
//! 1. IBAN
//! 2. Email address
//! 3. Credit card number
//! 4. Social security number
//! 5. Driver's license number
//! 6. Passport number
//! 7. International phone number
//! 8. Local phone number
//! 9. Postal address
//!
//! Specific shapes come before looser numeric ones so that, for example, the
//! digits of an IBAN or an international number are never claimed by a shorter
//! pattern first. Reordering this list changes redaction results.

use crate::error::RedactError;
use crate::generators;
use rand::rngs::StdRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Produces a mock value for one category.
///
/// Every value returned must match the category's own pattern.
pub type Generator = fn(&mut StdRng) -> String;

/// The PII classes the standard catalog detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    /// International bank account number.
    Iban,
    /// Email address.
    Email,
    /// Payment card number.
    CreditCard,
    /// Government social security number.
    Ssn,
    /// Driver's license number.
    DriversLicense,
    /// Passport number.
    Passport,
    /// Phone number with a `+` country code.
    InternationalPhone,
    /// Local phone number.
    Phone,
    /// Street address, optionally with city, state and ZIP.
    Address,
}

impl PiiCategory {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iban => "iban",
            Self::Email => "email",
            Self::CreditCard => "credit_card",
            Self::Ssn => "ssn",
            Self::DriversLicense => "drivers_license",
            Self::Passport => "passport",
            Self::InternationalPhone => "international_phone",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detection rule: a category, its pattern and its mock generator.
#[derive(Debug, Clone)]
pub struct PiiRule {
    category: PiiCategory,
    pattern: Regex,
    generate: Generator,
}

impl PiiRule {
    /// Compiles a rule from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns `RedactError::InvalidPattern` if `pattern` is not a valid regex.
    pub fn new(
        category: PiiCategory,
        pattern: &str,
        generate: Generator,
    ) -> Result<Self, RedactError> {
        let pattern =
            Regex::new(pattern).map_err(|source| RedactError::InvalidPattern { category, source })?;
        Ok(Self {
            category,
            pattern,
            generate,
        })
    }

    /// Category this rule detects.
    #[must_use]
    pub const fn category(&self) -> PiiCategory {
        self.category
    }

    /// Detection pattern.
    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Generates one candidate mock value.
    pub fn generate(&self, rng: &mut StdRng) -> String {
        (self.generate)(rng)
    }
}

/// An ordered list of [`PiiRule`]s applied first to last.
#[derive(Debug, Clone)]
pub struct PiiCatalog {
    rules: Vec<PiiRule>,
}

static STANDARD: LazyLock<Arc<PiiCatalog>> = LazyLock::new(|| Arc::new(build_standard()));

impl PiiCatalog {
    /// Builds a catalog applying `rules` in the given order.
    #[must_use]
    pub const fn new(rules: Vec<PiiRule>) -> Self {
        Self { rules }
    }

    /// The shared standard catalog (see the module docs for its order).
    #[must_use]
    pub fn standard() -> Arc<Self> {
        Arc::clone(&STANDARD)
    }

    /// Rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[PiiRule] {
        &self.rules
    }
}

const IBAN: &str = r"\b[A-Z]{2}\d{2}(?: ?[A-Z0-9]{4}){3,7}(?: ?[A-Z0-9]{1,3})?\b";
const EMAIL: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const CREDIT_CARD: &str = r"\b(?:\d{4}[- ]?){3}\d{4}\b|\b3[47]\d{2}[- ]?\d{6}[- ]?\d{5}\b";
const SSN: &str = r"\b\d{3}-\d{2}-\d{4}\b";
const DRIVERS_LICENSE: &str = r"\b[A-Z]\d{3}-\d{4}-\d{4}\b";
const PASSPORT: &str = r"\b[A-Z]\d{8}\b";
const INTERNATIONAL_PHONE: &str = r"\+\d{1,3}[-.\s]?\(?\d{1,4}\)?(?:[-.\s]?\d{2,4}){2,4}\b";
const PHONE: &str = r"(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b";
const ADDRESS: &str = r"\b\d{1,5}(?:\s+[A-Z][a-z]+){1,3}\s+(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl)\b(?:,\s*[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*,\s*[A-Z]{2}\s+\d{5}(?:-\d{4})?\b)?";

#[allow(clippy::expect_used)]
fn build_standard() -> PiiCatalog {
    let table: [(PiiCategory, &str, Generator); 9] = [
        (PiiCategory::Iban, IBAN, generators::iban),
        (PiiCategory::Email, EMAIL, generators::email),
        (PiiCategory::CreditCard, CREDIT_CARD, generators::credit_card),
        (PiiCategory::Ssn, SSN, generators::ssn),
        (PiiCategory::DriversLicense, DRIVERS_LICENSE, generators::drivers_license),
        (PiiCategory::Passport, PASSPORT, generators::passport),
        (PiiCategory::InternationalPhone, INTERNATIONAL_PHONE, generators::international_phone),
        (PiiCategory::Phone, PHONE, generators::phone),
        (PiiCategory::Address, ADDRESS, generators::address),
    ];

    let rules = table
        .into_iter()
        .map(|(category, pattern, generate)| {
            PiiRule::new(category, pattern, generate).expect("valid standard PII pattern")
        })
        .collect();

    PiiCatalog::new(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rule(category: PiiCategory) -> PiiRule {
        PiiCatalog::standard()
            .rules()
            .iter()
            .find(|r| r.category() == category)
            .cloned()
            .unwrap()
    }

    fn full_match(category: PiiCategory, text: &str) -> bool {
        rule(category)
            .pattern()
            .find(text)
            .is_some_and(|m| m.as_str() == text)
    }

    #[test]
    fn test_standard_order() {
        let order: Vec<PiiCategory> = PiiCatalog::standard()
            .rules()
            .iter()
            .map(PiiRule::category)
            .collect();
        assert_eq!(
            order,
            vec![
                PiiCategory::Iban,
                PiiCategory::Email,
                PiiCategory::CreditCard,
                PiiCategory::Ssn,
                PiiCategory::DriversLicense,
                PiiCategory::Passport,
                PiiCategory::InternationalPhone,
                PiiCategory::Phone,
                PiiCategory::Address,
            ]
        );
    }

    #[test]
    fn test_patterns_match_real_shapes() {
        assert!(full_match(PiiCategory::Iban, "GB82WEST12345698765432"));
        assert!(full_match(PiiCategory::Iban, "DE89 3704 0044 0532 0130 00"));
        assert!(full_match(PiiCategory::Email, "brandon@happydata.org"));
        assert!(full_match(PiiCategory::CreditCard, "4111 1111 1111 1111"));
        assert!(full_match(PiiCategory::CreditCard, "4111-1111-1111-1111"));
        assert!(full_match(PiiCategory::CreditCard, "378282246310005"));
        assert!(full_match(PiiCategory::Ssn, "123-45-6789"));
        assert!(full_match(PiiCategory::DriversLicense, "D123-4567-8901"));
        assert!(full_match(PiiCategory::Passport, "X12345678"));
        assert!(full_match(PiiCategory::InternationalPhone, "+44 20 7946 0958"));
        assert!(full_match(PiiCategory::InternationalPhone, "+1 315 444 3211"));
        assert!(full_match(PiiCategory::Phone, "315-444-3211"));
        assert!(full_match(PiiCategory::Phone, "(315) 444-3211"));
        assert!(full_match(PiiCategory::Phone, "315.444.3211"));
        assert!(full_match(PiiCategory::Address, "742 Evergreen Terrace Blvd"));
        assert!(full_match(
            PiiCategory::Address,
            "1600 Pennsylvania Avenue, Washington, DC 20500"
        ));
    }

    #[test]
    fn test_patterns_ignore_plain_text() {
        let text = "The meeting is at 10 o'clock in room 42 with 3 people.";
        for rule in PiiCatalog::standard().rules() {
            assert!(
                !rule.pattern().is_match(text),
                "{} matched plain text",
                rule.category()
            );
        }
    }

    #[test]
    fn test_generated_values_match_own_pattern_only_first() {
        let catalog = PiiCatalog::standard();
        let mut rng = StdRng::seed_from_u64(7);

        for (index, rule) in catalog.rules().iter().enumerate() {
            for _ in 0..200 {
                let mock = rule.generate(&mut rng);
                assert!(
                    full_match(rule.category(), &mock),
                    "{} mock {mock:?} does not match its pattern",
                    rule.category()
                );
                // No earlier rule may claim the mock on a second pass.
                for earlier in &catalog.rules()[..index] {
                    assert!(
                        !earlier.pattern().is_match(&mock),
                        "{} mock {mock:?} shadowed by {}",
                        rule.category(),
                        earlier.category()
                    );
                }
            }
        }
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let result = PiiRule::new(PiiCategory::Ssn, r"(\d{3}", generators::ssn);
        assert!(matches!(
            result,
            Err(RedactError::InvalidPattern {
                category: PiiCategory::Ssn,
                ..
            })
        ));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(PiiCategory::DriversLicense.to_string(), "drivers_license");
        assert_eq!(
            serde_json::to_value(PiiCategory::InternationalPhone).unwrap(),
            serde_json::json!("international_phone")
        );
    }
}
