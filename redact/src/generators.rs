//! Mock value generators, one per standard category.
//!
//! Each generator returns a value that fully matches its own category pattern
//! and no pattern that precedes it in the standard catalog, so a mock left in
//! a model reply is never re-classified differently.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

const FIRST_NAMES: &[&str] = &[
    "alex", "jordan", "casey", "morgan", "taylor", "riley", "jamie", "quinn", "avery", "drew",
];

const LAST_NAMES: &[&str] = &[
    "smith", "johnson", "lee", "garcia", "miller", "davis", "walker", "young", "hall", "king",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.net", "example.org"];

const STREET_NAMES: &[&str] = &[
    "Maple", "Oak", "Cedar", "Elm", "Pine", "Willow", "Lake", "Hill", "Sunset", "Highland",
    "Chestnut", "Meadow",
];

const STREET_SUFFIXES: &[&str] = &[
    "Street",
    "Avenue",
    "Road",
    "Lane",
    "Drive",
    "Court",
    "Way",
    "Place",
    "Boulevard",
];

const CITIES: &[&str] = &[
    "Springfield",
    "Riverton",
    "Fairview",
    "Greenville",
    "Franklin",
    "Clinton",
    "Madison",
    "Georgetown",
    "Salem",
    "Ashland",
];

const STATES: &[&str] = &[
    "AL", "AZ", "CA", "CO", "FL", "GA", "IL", "IN", "MA", "MI", "MN", "NC", "NY", "OH", "OR",
    "PA", "TX", "VA", "WA", "WI",
];

const IBAN_COUNTRIES: &[&str] = &["GB", "DE", "FR", "NL", "IE", "ES"];

const PHONE_COUNTRY_CODES: &[&str] = &["44", "33", "49", "61", "353"];

fn pick(rng: &mut StdRng, items: &[&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn letter(rng: &mut StdRng) -> char {
    char::from(rng.gen_range(b'A'..=b'Z'))
}

fn digits(rng: &mut StdRng, count: usize) -> String {
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// IBAN such as `GB29NWBK60161331926819`.
pub fn iban(rng: &mut StdRng) -> String {
    let bank: String = (0..4).map(|_| letter(rng)).collect();
    format!(
        "{}{:02}{bank}{}",
        pick(rng, IBAN_COUNTRIES),
        rng.gen_range(10..=99),
        digits(rng, 14)
    )
}

/// Email address on a reserved example domain.
pub fn email(rng: &mut StdRng) -> String {
    format!(
        "{}.{}{:02}@{}",
        pick(rng, FIRST_NAMES),
        pick(rng, LAST_NAMES),
        rng.gen_range(10..=99),
        pick(rng, EMAIL_DOMAINS)
    )
}

/// Dash-grouped 16-digit card number.
pub fn credit_card(rng: &mut StdRng) -> String {
    format!(
        "4{}-{}-{}-{}",
        digits(rng, 3),
        digits(rng, 4),
        digits(rng, 4),
        digits(rng, 4)
    )
}

/// Social security number with a valid area, group and serial.
pub fn ssn(rng: &mut StdRng) -> String {
    format!(
        "{:03}-{:02}-{:04}",
        rng.gen_range(100..=665),
        rng.gen_range(1..=99),
        rng.gen_range(1..=9999)
    )
}

/// Driver's license such as `D123-4567-8901`.
pub fn drivers_license(rng: &mut StdRng) -> String {
    format!(
        "{}{}-{}-{}",
        letter(rng),
        digits(rng, 3),
        digits(rng, 4),
        digits(rng, 4)
    )
}

/// Passport number: one letter and eight digits.
pub fn passport(rng: &mut StdRng) -> String {
    format!("{}{}", letter(rng), digits(rng, 8))
}

/// International phone such as `+44 20 7946 0958`.
pub fn international_phone(rng: &mut StdRng) -> String {
    format!(
        "+{} {} {} {}",
        pick(rng, PHONE_COUNTRY_CODES),
        rng.gen_range(10..=99),
        rng.gen_range(1000..=9999),
        rng.gen_range(1000..=9999)
    )
}

/// North American phone number such as `315-444-3211`.
pub fn phone(rng: &mut StdRng) -> String {
    format!(
        "{}{}-{}{}-{}",
        rng.gen_range(2..=9),
        digits(rng, 2),
        rng.gen_range(2..=9),
        digits(rng, 2),
        digits(rng, 4)
    )
}

/// Five-digit ZIP code.
pub fn zipcode(rng: &mut StdRng) -> String {
    rng.gen_range(10_000..=99_999).to_string()
}

/// Two-letter state abbreviation.
pub fn state(rng: &mut StdRng) -> String {
    pick(rng, STATES).to_string()
}

/// Full street address with city, state and ZIP.
pub fn address(rng: &mut StdRng) -> String {
    let number = rng.gen_range(1..=9999);
    let street = pick(rng, STREET_NAMES);
    let suffix = pick(rng, STREET_SUFFIXES);
    let city = pick(rng, CITIES);
    format!(
        "{number} {street} {suffix}, {city}, {} {}",
        state(rng),
        zipcode(rng)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_seeded_generators_are_deterministic() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(address(&mut a), address(&mut b));
        assert_eq!(iban(&mut a), iban(&mut b));
    }

    #[test]
    fn test_shapes() {
        let mut rng = StdRng::seed_from_u64(1);

        let value = iban(&mut rng);
        assert_eq!(value.len(), 22);
        assert!(value[..2].chars().all(|c| c.is_ascii_uppercase()));

        let value = ssn(&mut rng);
        assert_eq!(value.len(), 11);
        assert_eq!(value.matches('-').count(), 2);

        let value = passport(&mut rng);
        assert_eq!(value.len(), 9);

        let value = zipcode(&mut rng);
        assert_eq!(value.len(), 5);

        let value = state(&mut rng);
        assert!(STATES.contains(&value.as_str()));

        let value = email(&mut rng);
        assert!(value.contains("@example."));
    }
}
