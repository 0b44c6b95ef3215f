use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// A plastic card attribute that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CardField {
    Number,
    Cvc,
    ExpirationMonth,
    ExpirationYear,
    Owner,
}

impl fmt::Display for CardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardField::Number => "number",
            CardField::Cvc => "cvc",
            CardField::ExpirationMonth => "expiration_month",
            CardField::ExpirationYear => "expiration_year",
            CardField::Owner => "owner",
        };
        write!(f, "{}", name)
    }
}

/// Raised when one or more card fields are invalid. Carries the full set of
/// offending fields, not just the first one found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("card validation failed, invalid fields: [{}]", field_list(.invalid_fields))]
pub struct CardError {
    pub invalid_fields: BTreeSet<CardField>,
}

fn field_list(fields: &BTreeSet<CardField>) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Card issuing network, detected from the normalized number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brand {
    Visa,
    MasterCard,
    Unknown,
}

// Evaluated in declaration order, first match wins.
static BRAND_RULES: LazyLock<Vec<(Brand, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Brand::Visa,
            Regex::new(r"^4[0-9]{12}(?:[0-9]{3})?$").expect("Visa pattern"),
        ),
        (
            Brand::MasterCard,
            Regex::new(r"^5[1-5][0-9]{14}$").expect("MasterCard pattern"),
        ),
    ]
});

impl Brand {
    /// Detects the issuing network of a normalized card number.
    pub fn detect(number: &str) -> Brand {
        for (brand, pattern) in BRAND_RULES.iter() {
            if pattern.is_match(number) {
                return *brand;
            }
        }
        Brand::Unknown
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Brand::Visa => "VISA",
            Brand::MasterCard => "MASTERCARD",
            Brand::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// A validated payment card.
///
/// Construction is the only validation gate: every `Card` in existence
/// satisfies all five field predicates. The number and cvc are stored in
/// normalized form (whitespace, dots and hyphens stripped).
#[derive(Debug, Clone)]
pub struct Card {
    number: String,
    cvc: String,
    expiration_month: u32,
    expiration_year: i32,
    owner: String,
}

impl Card {
    /// Validates all fields and constructs a card, or fails with the full
    /// set of invalid fields. Expiry is checked against the local date at
    /// the time of the call.
    pub fn new(
        number: &str,
        cvc: &str,
        expiration_month: u32,
        expiration_year: i32,
        owner: &str,
    ) -> Result<Card, CardError> {
        Self::new_at(
            number,
            cvc,
            expiration_month,
            expiration_year,
            owner,
            Local::now().date_naive(),
        )
    }

    fn new_at(
        number: &str,
        cvc: &str,
        expiration_month: u32,
        expiration_year: i32,
        owner: &str,
        today: NaiveDate,
    ) -> Result<Card, CardError> {
        let card = Card {
            number: normalize(number),
            cvc: normalize(cvc),
            expiration_month,
            expiration_year,
            owner: owner.to_string(),
        };

        let mut invalid_fields = BTreeSet::new();
        if !card.is_number_valid() {
            invalid_fields.insert(CardField::Number);
        }
        if !card.is_cvc_valid() {
            invalid_fields.insert(CardField::Cvc);
        }
        if !card.is_expiration_month_valid(today) {
            invalid_fields.insert(CardField::ExpirationMonth);
        }
        if !card.is_expiration_year_valid(today) {
            invalid_fields.insert(CardField::ExpirationYear);
        }
        if !card.is_owner_valid() {
            invalid_fields.insert(CardField::Owner);
        }

        if invalid_fields.is_empty() {
            Ok(card)
        } else {
            Err(CardError { invalid_fields })
        }
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn cvc(&self) -> &str {
        &self.cvc
    }

    pub fn expiration_month(&self) -> u32 {
        self.expiration_month
    }

    pub fn expiration_year(&self) -> i32 {
        self.expiration_year
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Detects the card's issuing network.
    pub fn brand(&self) -> Brand {
        Brand::detect(&self.number)
    }

    /// Last 4 digits of the number.
    pub fn last_digits(&self) -> &str {
        &self.number[self.number.len() - 4..]
    }

    /// Bank identification number, the first 6 digits.
    pub fn bin(&self) -> &str {
        &self.number[..6]
    }

    fn is_number_valid(&self) -> bool {
        // Length bounds per ISO/IEC 7812 issuer identification numbers.
        self.number.chars().all(|c| c.is_ascii_digit())
            && self.number.len() >= 12
            && self.number.len() <= 19
            && check_luhn(&self.number)
    }

    fn is_cvc_valid(&self) -> bool {
        (self.cvc.len() == 3 || self.cvc.len() == 4)
            && self.cvc.chars().all(|c| c.is_ascii_digit())
    }

    fn is_expiration_month_valid(&self, today: NaiveDate) -> bool {
        self.expiration_month >= 1
            && self.expiration_month <= 12
            && (self.expiration_year != today.year() || self.expiration_month >= today.month())
    }

    fn is_expiration_year_valid(&self, today: NaiveDate) -> bool {
        self.expiration_year >= today.year() && self.expiration_year <= 2100
    }

    fn is_owner_valid(&self) -> bool {
        !self.owner.trim().is_empty()
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '-')
        .collect()
}

/// Mod-10 checksum over the digits taken in reverse order: every second
/// digit counting from the end is doubled, digits above 9 reduced by 9.
fn check_luhn(number: &str) -> bool {
    let mut sum = 0;
    for (i, c) in number.chars().rev().enumerate() {
        let mut digit = match c.to_digit(10) {
            Some(d) => d,
            None => return false,
        };
        if i % 2 == 1 {
            digit *= 2;
        }
        sum += if digit > 9 { digit - 9 } else { digit };
    }
    sum % 10 == 0
}
