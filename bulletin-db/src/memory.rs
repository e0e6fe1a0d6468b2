use crate::storage::{PostStorage, Result, StorageError};
use async_trait::async_trait;
use bulletin_common::{
    context::{Cancelled, Context},
    error::DomainError,
    model::{
        Id,
        post::{NewPost, Post, PostMarker, PostPatch},
    },
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use tracing::debug;

/// [`PostStorage`] kept in process memory. Posts are listed in insertion order.
#[derive(Debug, Default)]
pub struct MemoryPostStorage {
    posts: Mutex<Vec<Post>>,
}

impl MemoryPostStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored posts, soft-deleted ones included.
    #[must_use]
    pub fn stored_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Post>> {
        self.posts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(ctx: &Context) -> Result<()> {
        if ctx.is_cancelled() {
            Err(Cancelled.into())
        } else {
            Ok(())
        }
    }
}

fn is_live(post: &Post, id: Id<PostMarker>) -> bool {
    post.id == id && post.deleted_at.is_none()
}

#[async_trait]
impl PostStorage for MemoryPostStorage {
    async fn create(&self, ctx: &Context, post: &NewPost) -> Result<Post> {
        Self::check(ctx)?;

        let now = OffsetDateTime::now_utc();
        let post = Post {
            id: Id::generate(),
            title: post.title.clone(),
            content: post.content.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.lock().push(post.clone());
        debug!(id = %post.id, "Inserted post");
        Ok(post)
    }

    async fn list(&self, ctx: &Context) -> Result<Vec<Post>> {
        Self::check(ctx)?;

        let posts: Vec<Post> = self
            .lock()
            .iter()
            .filter(|post| post.deleted_at.is_none())
            .cloned()
            .collect();
        Ok(posts)
    }

    async fn get(&self, ctx: &Context, id: Id<PostMarker>) -> Result<Option<Post>> {
        Self::check(ctx)?;

        let post = self.lock().iter().find(|post| is_live(post, id)).cloned();
        Ok(post)
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Id<PostMarker>,
        patch: &PostPatch,
    ) -> Result<Option<Post>> {
        Self::check(ctx)?;
        if patch.is_empty() {
            return Err(StorageError::Domain(DomainError::empty_input()));
        }

        let mut posts = self.lock();
        let Some(post) = posts.iter_mut().find(|post| is_live(post, id)) else {
            debug!(%id, "No post to update");
            return Ok(None);
        };

        patch.apply_to(post);
        post.updated_at = OffsetDateTime::now_utc();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, ctx: &Context, id: Id<PostMarker>) -> Result<()> {
        Self::check(ctx)?;

        if let Some(post) = self.lock().iter_mut().find(|post| is_live(post, id)) {
            post.deleted_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }
}
