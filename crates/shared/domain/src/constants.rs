//! Domain-level constants.
//!
//! These constants define business rules and wire formats.

// =============================================================================
// Registration
// =============================================================================

/// Minimum age, in whole elapsed years, required to register
pub const MINIMUM_REGISTRATION_AGE: u32 = 18;

// =============================================================================
// CPF
// =============================================================================

/// Number of digits in a canonical CPF
pub const CPF_LENGTH: usize = 11;

// =============================================================================
// Formats
// =============================================================================

/// Birth date format used on the wire (`25/12/1991`)
pub const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";

/// ISO birth date format, accepted as a fallback when parsing
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Locale used for error messages
pub const DEFAULT_LOCALE: &str = "en";
