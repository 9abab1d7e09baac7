//! User service - registration pipeline and user lookups.
//!
//! Every write is preceded by validation, in a fixed order: age, then CPF,
//! then (on create) uniqueness. The uniqueness pre-check is a repository round
//! trip, so it only runs once the local checks pass.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use common::{AppError, AppResult, OptionExt};
use domain::{
    apply_patch, DomainError, DomainResult, LogicalOperator, PatchOperation, QueryBuilder, User,
    UserFilter, MINIMUM_REGISTRATION_AGE,
};

use crate::repository::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Validate and persist a new user, returning its id
    async fn create_user(&self, user: User) -> AppResult<String>;

    /// Validate and persist a full replacement of an existing user
    async fn update_user(&self, user: User) -> AppResult<()>;

    /// Apply replace operations to a stored user and update it
    async fn patch_user(&self, id: &str, operations: Vec<PatchOperation>) -> AppResult<()>;

    /// Get user by ID
    async fn get_user(&self, id: &str) -> AppResult<User>;

    /// Find users matching a filter
    async fn search_users(&self, filter: UserFilter) -> AppResult<Vec<User>>;

    /// List all users
    async fn list_users(&self) -> AppResult<Vec<User>>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
    minimum_age: u32,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self {
            repo,
            minimum_age: MINIMUM_REGISTRATION_AGE,
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn validate_age(&self, user: &User) -> DomainResult<()> {
        if !user.has_valid_age(self.minimum_age, Self::today()) {
            tracing::error!(birth_date = %user.birth_date, "The user is below the allowed age");
            return Err(DomainError::AgeBelow);
        }
        Ok(())
    }

    fn validate_cpf(&self, user: &User) -> DomainResult<()> {
        if !user.has_valid_cpf() {
            tracing::error!("CPF is invalid");
            return Err(DomainError::CpfInvalid);
        }
        Ok(())
    }

    /// Fail with `AlreadyExists` if the CPF or email is already registered
    async fn validate_uniqueness(&self, user: &User) -> AppResult<()> {
        let filter = UserFilter::new()
            .operator(LogicalOperator::Or)
            .cpf(user.cpf.canonical())
            .email(user.email.clone());
        let query = QueryBuilder::build(&filter);

        if query.is_unrestricted() {
            return Err(AppError::internal("Uniqueness check built an unrestricted query"));
        }

        if !self.repo.find(&query).await?.is_empty() {
            tracing::warn!("User is already registered");
            return Err(DomainError::AlreadyExists.into());
        }
        Ok(())
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn create_user(&self, user: User) -> AppResult<String> {
        self.validate_age(&user)?;
        self.validate_cpf(&user)?;
        self.validate_uniqueness(&user).await?;

        let id = self.repo.create(user).await?;
        tracing::info!(user_id = %id, "User has been created");
        Ok(id)
    }

    async fn update_user(&self, user: User) -> AppResult<()> {
        self.validate_age(&user)?;
        self.validate_cpf(&user)?;

        let id = user.id.clone().unwrap_or_default();
        self.repo.update(user).await?;
        tracing::info!(user_id = %id, "User has been updated");
        Ok(())
    }

    async fn patch_user(&self, id: &str, operations: Vec<PatchOperation>) -> AppResult<()> {
        let existing = self.get_user(id).await?;

        let candidate = apply_patch(&existing, &operations, Utc::now()).map_err(|e| {
            tracing::error!(user_id = %id, error = %e, "Could not apply patch on user");
            e
        })?;

        self.update_user(candidate).await
    }

    async fn get_user(&self, id: &str) -> AppResult<User> {
        self.repo.find_by_id(id).await?.ok_or_not_found(id).map_err(|e| {
            tracing::error!(user_id = %id, "User not found");
            e
        })
    }

    async fn search_users(&self, filter: UserFilter) -> AppResult<Vec<User>> {
        let query = QueryBuilder::build(&filter);
        self.repo.find(&query).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repo.find_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, Months};
    use domain::{Cpf, FilterField, Query};

    use crate::repository::MockUserRepository;

    fn birth_date_for_age(years: u32) -> NaiveDate {
        UserManager::today()
            .checked_sub_months(Months::new(years * 12))
            .unwrap()
    }

    fn candidate(cpf: &str, email: &str, birth_date: NaiveDate) -> User {
        User::new(
            "Billy".to_string(),
            Cpf::new(cpf),
            email.to_string(),
            birth_date,
        )
    }

    fn billy() -> User {
        candidate(
            "130.877.567-92",
            "billy@x.com",
            NaiveDate::from_ymd_opt(1990, 1, 21).unwrap(),
        )
    }

    fn stored(id: &str) -> User {
        billy().with_id(id)
    }

    fn service(repo: MockUserRepository) -> UserManager {
        UserManager::new(Arc::new(repo))
    }

    fn domain_err(result: AppResult<impl std::fmt::Debug>) -> DomainError {
        result
            .unwrap_err()
            .as_domain()
            .cloned()
            .expect("expected a domain error")
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let expected_query = Query::Or(vec![
            Query::eq(FilterField::Cpf, "13087756792"),
            Query::eq(FilterField::Email, "billy@x.com"),
        ]);

        let mut repo = MockUserRepository::new();
        repo.expect_find()
            .withf(move |query| *query == expected_query)
            .times(1)
            .returning(|_| Ok(vec![]));
        repo.expect_create()
            .times(1)
            .returning(|_| Ok("new-id".to_string()));

        let id = service(repo).create_user(billy()).await.unwrap();

        assert_eq!(id, "new-id");
    }

    #[tokio::test]
    async fn test_create_user_exactly_eighteen_succeeds() {
        let mut repo = MockUserRepository::new();
        repo.expect_find().returning(|_| Ok(vec![]));
        repo.expect_create()
            .times(1)
            .returning(|_| Ok("new-id".to_string()));

        let user = candidate("130.877.567-92", "billy@x.com", birth_date_for_age(18));

        assert!(service(repo).create_user(user).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_user_one_day_short_fails() {
        let mut repo = MockUserRepository::new();
        repo.expect_find().times(0);
        repo.expect_create().times(0);

        let birth_date = birth_date_for_age(18).checked_add_days(Days::new(1)).unwrap();
        let user = candidate("130.877.567-92", "billy@x.com", birth_date);

        let err = domain_err(service(repo).create_user(user).await);
        assert_eq!(err, DomainError::AgeBelow);
    }

    #[tokio::test]
    async fn test_create_user_invalid_cpf_skips_repository() {
        let mut repo = MockUserRepository::new();
        repo.expect_find().times(0);
        repo.expect_create().times(0);

        let user = candidate("130.877.567-93", "billy@x.com", birth_date_for_age(30));

        let err = domain_err(service(repo).create_user(user).await);
        assert_eq!(err, DomainError::CpfInvalid);
    }

    #[tokio::test]
    async fn test_create_user_age_checked_before_cpf() {
        let repo = MockUserRepository::new();

        let user = candidate("111.111.111-11", "kid@x.com", birth_date_for_age(10));

        let err = domain_err(service(repo).create_user(user).await);
        assert_eq!(err, DomainError::AgeBelow);
    }

    #[tokio::test]
    async fn test_create_user_existing_cpf_conflicts() {
        let mut repo = MockUserRepository::new();
        repo.expect_find().returning(|_| {
            Ok(vec![candidate(
                "13087756792",
                "someone-else@x.com",
                NaiveDate::from_ymd_opt(1980, 5, 5).unwrap(),
            )
            .with_id("other")])
        });
        repo.expect_create().times(0);

        let err = domain_err(service(repo).create_user(billy()).await);
        assert_eq!(err, DomainError::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_user_existing_email_conflicts() {
        let mut repo = MockUserRepository::new();
        repo.expect_find().returning(|_| {
            Ok(vec![candidate(
                "529.982.247-25",
                "billy@x.com",
                NaiveDate::from_ymd_opt(1980, 5, 5).unwrap(),
            )
            .with_id("other")])
        });
        repo.expect_create().times(0);

        let err = domain_err(service(repo).create_user(billy()).await);
        assert_eq!(err, DomainError::AlreadyExists);
    }

    #[tokio::test]
    async fn test_update_user_revalidates_without_uniqueness() {
        let mut repo = MockUserRepository::new();
        repo.expect_find().times(0);
        repo.expect_update().times(1).returning(|_| Ok(()));

        assert!(service(repo).update_user(stored("user-1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_user_rejects_invalid_cpf() {
        let mut repo = MockUserRepository::new();
        repo.expect_update().times(0);

        let user = candidate("123.456.789-00", "billy@x.com", birth_date_for_age(30)).with_id("u");

        let err = domain_err(service(repo).update_user(user).await);
        assert_eq!(err, DomainError::CpfInvalid);
    }

    #[tokio::test]
    async fn test_patch_user_replaces_birth_date() {
        let original = stored("user-1");
        let created_at = original.created_at;

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .withf(|id| id == "user-1")
            .returning(move |_| Ok(Some(original.clone())));
        repo.expect_update()
            .withf(move |user| {
                user.id.as_deref() == Some("user-1")
                    && user.birth_date == NaiveDate::from_ymd_opt(1991, 12, 25).unwrap()
                    && user.name == "Billy"
                    && user.email == "billy@x.com"
                    && user.created_at == created_at
                    && user.updated_at.is_some()
            })
            .times(1)
            .returning(|_| Ok(()));

        let ops = vec![PatchOperation::replace("/birthDate", "25/12/1991")];

        assert!(service(repo).patch_user("user-1", ops).await.is_ok());
    }

    #[tokio::test]
    async fn test_patch_user_revalidates_age() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(stored(id))));
        repo.expect_update().times(0);

        let too_young = birth_date_for_age(5).format("%d/%m/%Y").to_string();
        let ops = vec![PatchOperation::replace("/birthDate", too_young)];

        let err = domain_err(service(repo).patch_user("user-1", ops).await);
        assert_eq!(err, DomainError::AgeBelow);
    }

    #[tokio::test]
    async fn test_patch_user_rejects_malformed_patch() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(stored(id))));
        repo.expect_update().times(0);

        let ops = vec![PatchOperation::replace("/id", "hijack")];

        let err = domain_err(service(repo).patch_user("user-1", ops).await);
        assert!(matches!(err, DomainError::InvalidPatch(_)));
    }

    #[tokio::test]
    async fn test_patch_user_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_update().times(0);

        let ops = vec![PatchOperation::replace("/name", "Will")];

        let err = domain_err(service(repo).patch_user("missing", ops).await);
        assert_eq!(err, DomainError::not_found("missing"));
    }

    #[tokio::test]
    async fn test_get_user_success() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(stored(id))));

        let user = service(repo).get_user("user-1").await.unwrap();

        assert_eq!(user.id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_search_users_builds_query_from_filter() {
        let mut repo = MockUserRepository::new();
        repo.expect_find()
            .withf(|query| {
                *query == Query::And(vec![Query::eq(FilterField::Name, "Billy")])
            })
            .returning(|_| Ok(vec![stored("user-1")]));

        let users = service(repo)
            .search_users(UserFilter::new().name("Billy"))
            .await
            .unwrap();

        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_list_users() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_all()
            .returning(|| Ok(vec![stored("a"), stored("b")]));

        let users = service(repo).list_users().await.unwrap();

        assert_eq!(users.len(), 2);
    }
}
