//! Business rules between the HTTP controllers and storage.

mod post;

pub use post::PostServiceImpl;

use async_trait::async_trait;
use bulletin_common::{
    context::Context,
    error::{DomainError, ErrorKind},
    model::{
        Id,
        post::{Post, PostContent, PostMarker, PostTitle},
    },
};
use bulletin_db::storage::StorageError;
use thiserror::Error;

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Domain(#[from] DomainError),
    #[error("failed to {action}: {source}")]
    Storage {
        action: &'static str,
        #[source]
        source: StorageError,
    },
}

impl ServiceError {
    /// Domain errors reported by storage are passed on as they are; anything else gets
    /// `action` attached.
    #[must_use]
    pub fn from_storage(action: &'static str, err: StorageError) -> Self {
        match err {
            StorageError::Domain(domain) => Self::Domain(domain),
            source => Self::Storage { action, source },
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::of(self)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePostOpt {
    pub title: PostTitle,
    pub content: PostContent,
}

/// `None` fields are left untouched.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct UpdatePostOpt {
    pub title: Option<PostTitle>,
    pub content: Option<PostContent>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostService: Send + Sync {
    async fn create(&self, ctx: &Context, opt: CreatePostOpt) -> Result<Post>;

    async fn list(&self, ctx: &Context) -> Result<Vec<Post>>;

    /// Fails with [`DomainError::post_not_found`] if there is no such post.
    async fn get(&self, ctx: &Context, id: Id<PostMarker>) -> Result<Post>;

    /// Fails with [`DomainError::post_not_found`] if there is no such post.
    async fn update(
        &self,
        ctx: &Context,
        id: Id<PostMarker>,
        opt: UpdatePostOpt,
    ) -> Result<Post>;

    async fn delete(&self, ctx: &Context, id: Id<PostMarker>) -> Result<()>;
}
