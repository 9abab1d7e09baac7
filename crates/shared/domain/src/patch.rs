//! Partial updates expressed as ordered replace operations.
//!
//! Patching only reshapes data: the resulting candidate still has to go
//! through update validation before it is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cpf::Cpf;
use crate::error::{DomainError, DomainResult};
use crate::user::{parse_birth_date, User, UserChanges};

const REPLACE_OP: &str = "replace";

/// Patchable user attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchPath {
    Name,
    Cpf,
    Email,
    BirthDate,
}

impl PatchPath {
    pub fn parse(path: &str) -> DomainResult<Self> {
        match path {
            "/name" => Ok(PatchPath::Name),
            "/cpf" => Ok(PatchPath::Cpf),
            "/email" => Ok(PatchPath::Email),
            "/birthDate" => Ok(PatchPath::BirthDate),
            other => Err(DomainError::invalid_patch(format!("unknown path {}", other))),
        }
    }
}

/// Single patch operation, e.g.
/// `{"op": "replace", "path": "/birthDate", "value": "25/12/1991"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: Value,
}

impl PatchOperation {
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: REPLACE_OP.to_string(),
            path: path.into(),
            value: value.into(),
        }
    }

    fn apply_to(&self, changes: &mut UserChanges) -> DomainResult<()> {
        if self.op != REPLACE_OP {
            return Err(DomainError::invalid_patch(format!(
                "unsupported operation {}",
                self.op
            )));
        }

        let path = PatchPath::parse(&self.path)?;
        let value = self.scalar()?;

        match path {
            PatchPath::Name => changes.name = value,
            PatchPath::Cpf => changes.cpf = Cpf::new(value),
            PatchPath::Email => changes.email = value,
            PatchPath::BirthDate => {
                changes.birth_date = parse_birth_date(&value).ok_or_else(|| {
                    DomainError::invalid_patch(format!("invalid birth date {}", value))
                })?
            }
        }

        Ok(())
    }

    /// Value as text; only strings, numbers and booleans are accepted
    fn scalar(&self) -> DomainResult<String> {
        match &self.value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(DomainError::invalid_patch(format!(
                "value for {} must be a scalar",
                self.path
            ))),
        }
    }
}

/// Apply `operations` in order to the mutable fields of `existing`.
///
/// The returned candidate keeps the original id and creation time and is
/// stamped with `now` as its update time.
pub fn apply_patch(
    existing: &User,
    operations: &[PatchOperation],
    now: DateTime<Utc>,
) -> DomainResult<User> {
    let mut changes = existing.changes();

    for operation in operations {
        operation.apply_to(&mut changes)?;
    }

    Ok(existing.with_changes(changes, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn existing() -> User {
        User::new(
            "Billy".to_string(),
            Cpf::new("130.877.567-92"),
            "billy@x.com".to_string(),
            NaiveDate::from_ymd_opt(1990, 1, 21).unwrap(),
        )
        .with_id("user-1")
    }

    #[test]
    fn test_replace_birth_date_keeps_other_fields() {
        let user = existing();
        let now = Utc::now();

        let patched = apply_patch(
            &user,
            &[PatchOperation::replace("/birthDate", "25/12/1991")],
            now,
        )
        .unwrap();

        assert_eq!(
            patched.birth_date,
            NaiveDate::from_ymd_opt(1991, 12, 25).unwrap()
        );
        assert_eq!(patched.id, user.id);
        assert_eq!(patched.name, user.name);
        assert_eq!(patched.cpf, user.cpf);
        assert_eq!(patched.email, user.email);
        assert_eq!(patched.created_at, user.created_at);
        assert_eq!(patched.updated_at, Some(now));
    }

    #[test]
    fn test_operations_apply_in_order() {
        let ops = [
            PatchOperation::replace("/name", "William"),
            PatchOperation::replace("/name", "Will"),
            PatchOperation::replace("/email", "will@x.com"),
        ];

        let patched = apply_patch(&existing(), &ops, Utc::now()).unwrap();

        assert_eq!(patched.name, "Will");
        assert_eq!(patched.email, "will@x.com");
    }

    #[test]
    fn test_patch_does_not_validate_business_rules() {
        let patched = apply_patch(
            &existing(),
            &[PatchOperation::replace("/cpf", "111.111.111-11")],
            Utc::now(),
        )
        .unwrap();

        assert!(!patched.has_valid_cpf());
    }

    #[test]
    fn test_unknown_path_is_rejected() {
        let err = apply_patch(
            &existing(),
            &[PatchOperation::replace("/createdAt", "01/01/2000")],
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::InvalidPatch(_)));
    }

    #[test]
    fn test_non_replace_operation_is_rejected() {
        let op: PatchOperation =
            serde_json::from_value(json!({"op": "remove", "path": "/name"})).unwrap();

        let err = apply_patch(&existing(), &[op], Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidPatch(_)));
    }

    #[test]
    fn test_non_scalar_and_bad_dates_are_rejected() {
        let object = PatchOperation::replace("/name", json!({"first": "Billy"}));
        assert!(apply_patch(&existing(), &[object], Utc::now()).is_err());

        let missing: PatchOperation =
            serde_json::from_value(json!({"op": "replace", "path": "/email"})).unwrap();
        assert!(apply_patch(&existing(), &[missing], Utc::now()).is_err());

        let date = PatchOperation::replace("/birthDate", "31/02/1990");
        assert!(apply_patch(&existing(), &[date], Utc::now()).is_err());
    }
}
