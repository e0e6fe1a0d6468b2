use async_trait::async_trait;
use bulletin_common::{
    context::{Cancelled, Context},
    error::DomainError,
    model::{
        Id, ModelValidationError,
        post::{NewPost, Post, PostMarker, PostPatch},
    },
};
use thiserror::Error;

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    Domain(#[from] DomainError),
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Migrating the database failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Persistence of posts.
///
/// Soft-deleted posts are invisible to every read, and `update` treats them as absent.
/// Absence is reported as `Ok(None)`; deciding whether that is an error is up to the caller.
///
/// The `mocks` feature exports a generated `MockPostStorage` for other crates' tests.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait PostStorage: Send + Sync {
    async fn create(&self, ctx: &Context, post: &NewPost) -> Result<Post>;

    /// No particular order is promised.
    async fn list(&self, ctx: &Context) -> Result<Vec<Post>>;

    async fn get(&self, ctx: &Context, id: Id<PostMarker>) -> Result<Option<Post>>;

    /// Fails with [`DomainError::empty_input`] if `patch` carries no field.
    async fn update(
        &self,
        ctx: &Context,
        id: Id<PostMarker>,
        patch: &PostPatch,
    ) -> Result<Option<Post>>;

    /// Deleting an absent or already deleted post succeeds.
    async fn delete(&self, ctx: &Context, id: Id<PostMarker>) -> Result<()>;
}
