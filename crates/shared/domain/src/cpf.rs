//! Brazilian CPF value object and check digit validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::CPF_LENGTH;

/// Strip everything but ASCII digits.
pub fn canonical(cpf: &str) -> String {
    cpf.chars().filter(char::is_ascii_digit).collect()
}

/// Render as `ddd.ddd.ddd-dd`.
///
/// Values that do not canonicalize to exactly 11 digits are returned as
/// their canonical digits, unformatted.
pub fn formatted(cpf: &str) -> String {
    let raw = canonical(cpf);
    if raw.len() != CPF_LENGTH {
        return raw;
    }
    format!("{}.{}.{}-{}", &raw[0..3], &raw[3..6], &raw[6..9], &raw[9..11])
}

/// Check length, repetition and both mod-11 check digits.
pub fn is_valid(cpf: &str) -> bool {
    let digits: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != CPF_LENGTH || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let first = check_digit(&digits[..9]);
    let second = check_digit(&digits[..10]);

    digits[9] == first && digits[10] == second
}

/// Weighted mod-11 check digit over `digits`.
///
/// Weights run from `digits.len() + 1` down to 2.
fn check_digit(digits: &[u32]) -> u32 {
    let base = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (base - i as u32))
        .sum();

    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

/// CPF as supplied by the user.
///
/// Keeps the original representation for display; [`Cpf::canonical`] is
/// what gets persisted and searched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cpf(String);

impl Cpf {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Original representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn canonical(&self) -> String {
        canonical(&self.0)
    }

    pub fn formatted(&self) -> String {
        formatted(&self.0)
    }

    pub fn is_valid(&self) -> bool {
        is_valid(&self.0)
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl From<&str> for Cpf {
    fn from(s: &str) -> Self {
        Cpf::new(s)
    }
}

impl From<String> for Cpf {
    fn from(s: String) -> Self {
        Cpf::new(s)
    }
}
