//! User repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{ActiveModel, Column, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{DomainError, Query, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Storage must enforce uniqueness of CPF and email; the service layer's
/// own check is only a pre-check.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user and return its id
    async fn create(&self, user: User) -> AppResult<String>;

    /// Replace a stored user with the given value
    async fn update(&self, user: User) -> AppResult<()>;

    /// Find users matching a query expression
    async fn find(&self, query: &Query) -> AppResult<Vec<User>>;

    /// Find user by ID
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    /// List all users
    async fn find_all(&self) -> AppResult<Vec<User>>;
}

/// Translate a query expression into a SeaORM condition.
pub fn condition_for(query: &Query) -> Condition {
    match query {
        Query::All => Condition::all(),
        Query::Eq { .. } => add_predicate(Condition::all(), query),
        Query::And(predicates) => predicates.iter().fold(Condition::all(), add_predicate),
        Query::Or(predicates) => predicates.iter().fold(Condition::any(), add_predicate),
    }
}

fn add_predicate(condition: Condition, query: &Query) -> Condition {
    match query {
        Query::Eq { field, value } => condition.add(Column::from(*field).eq(value.as_str())),
        nested => condition.add(condition_for(nested)),
    }
}

/// Map write failures, turning unique index violations into `AlreadyExists`
fn map_write_err(err: DbErr) -> AppError {
    classify_write_err(err.sql_err(), err)
}

fn classify_write_err(sql_err: Option<SqlErr>, err: DbErr) -> AppError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::warn!(%detail, "Unique constraint rejected user write");
            DomainError::AlreadyExists.into()
        }
        _ => AppError::from(err),
    }
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn create(&self, user: User) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let active_model = ActiveModel::from_user(id, &user);

        let model = active_model.insert(&self.db).await.map_err(map_write_err)?;
        Ok(model.id)
    }

    async fn update(&self, user: User) -> AppResult<()> {
        let id = user
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Cannot update a user without id"))?;

        match ActiveModel::from_user(id.clone(), &user).update(&self.db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(DomainError::not_found(id).into()),
            Err(e) => Err(map_write_err(e)),
        }
    }

    async fn find(&self, query: &Query) -> AppResult<Vec<User>> {
        if query.is_unrestricted() {
            return self.find_all().await;
        }

        tracing::debug!(%query, "Searching users");

        let models = UserEntity::find()
            .filter(condition_for(query))
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }
}
