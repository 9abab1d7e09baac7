//! User domain entity and related types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{BIRTH_DATE_FORMAT, ISO_DATE_FORMAT};
use crate::cpf::Cpf;

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque id, `None` until persisted
    pub id: Option<String>,
    pub name: String,
    pub cpf: Cpf,
    pub email: String,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// `None` until the first update
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new, not yet persisted user
    pub fn new(name: String, cpf: Cpf, email: String, birth_date: NaiveDate) -> Self {
        Self {
            id: None,
            name,
            cpf,
            email,
            birth_date,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Same user with a repository-assigned id
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..self
        }
    }

    /// Whole elapsed years between birth and `today`
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.birth_date).unwrap_or(0)
    }

    /// Check if user is at least `minimum_age` years old on `today`
    pub fn has_valid_age(&self, minimum_age: u32, today: NaiveDate) -> bool {
        self.age_on(today) >= minimum_age
    }

    /// Check the CPF check digits
    pub fn has_valid_cpf(&self) -> bool {
        self.cpf.is_valid()
    }

    /// Mutable field subset, used as the patch target
    pub fn changes(&self) -> UserChanges {
        UserChanges {
            name: self.name.clone(),
            cpf: self.cpf.clone(),
            email: self.email.clone(),
            birth_date: self.birth_date,
        }
    }

    /// New value carrying `changes`, keeping id and creation time
    pub fn with_changes(&self, changes: UserChanges, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: self.id.clone(),
            name: changes.name,
            cpf: changes.cpf,
            email: changes.email,
            birth_date: changes.birth_date,
            created_at: self.created_at,
            updated_at: Some(updated_at),
        }
    }
}

/// Fields a user may change after registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub name: String,
    pub cpf: Cpf,
    pub email: String,
    pub birth_date: NaiveDate,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    /// CPF formatted as `ddd.ddd.ddd-dd`
    pub cpf: String,
    pub email: String,
    #[serde(with = "birth_date_format")]
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            cpf: user.cpf.formatted(),
            id: user.id.unwrap_or_default(),
            name: user.name,
            email: user.email,
            birth_date: user.birth_date,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Parse a birth date in `dd/mm/yyyy`, falling back to ISO `yyyy-mm-dd`.
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, BIRTH_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, ISO_DATE_FORMAT))
        .ok()
}

/// Serde adapter for birth dates on the wire (`dd/mm/yyyy`).
pub mod birth_date_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::constants::BIRTH_DATE_FORMAT;

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(BIRTH_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_birth_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid birth date: {}", raw)))
    }
}
