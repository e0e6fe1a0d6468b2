use crate::{
    record::PostRecord,
    storage::{PostStorage, Result, StorageError},
};
use async_trait::async_trait;
use bulletin_common::{
    context::Context,
    error::DomainError,
    model::{
        Id,
        post::{NewPost, Post, PostContent, PostMarker, PostPatch, PostTitle},
    },
};
use sqlx::{PgPool, postgres::PgPoolOptions, query, query_as};
use tracing::{debug, info};

/// PostgreSQL backed [`PostStorage`].
#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        info!("Database migrations applied");

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PostStorage for DbClient {
    async fn create(&self, ctx: &Context, post: &NewPost) -> Result<Post> {
        let record = ctx
            .run(
                query_as::<_, PostRecord>(
                    "
                    INSERT INTO posts.posts (title, content)
                    VALUES ($1, $2)
                    RETURNING
                        post_id, title, content, created_at, updated_at, deleted_at
                    ",
                )
                .bind(post.title.get())
                .bind(post.content.get())
                .fetch_one(&self.pool),
            )
            .await??;

        let post = Post::try_from(record)?;
        debug!(id = %post.id, "Inserted post");
        Ok(post)
    }

    async fn list(&self, ctx: &Context) -> Result<Vec<Post>> {
        let records = ctx
            .run(
                query_as::<_, PostRecord>(
                    "
                    SELECT
                        post_id, title, content, created_at, updated_at, deleted_at
                    FROM
                        posts.posts
                    WHERE
                        deleted_at IS NULL
                    ORDER BY
                        created_at
                    ",
                )
                .fetch_all(&self.pool),
            )
            .await??;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = posts.len(), "Listed posts");
        Ok(posts)
    }

    async fn get(&self, ctx: &Context, id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = ctx
            .run(
                query_as::<_, PostRecord>(
                    "
                    SELECT
                        post_id, title, content, created_at, updated_at, deleted_at
                    FROM
                        posts.posts
                    WHERE
                        post_id = $1 AND deleted_at IS NULL
                    ",
                )
                .bind(id.uuid())
                .fetch_optional(&self.pool),
            )
            .await??;

        if record.is_none() {
            debug!(%id, "Post not found");
        }

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Id<PostMarker>,
        patch: &PostPatch,
    ) -> Result<Option<Post>> {
        if patch.is_empty() {
            return Err(StorageError::Domain(DomainError::empty_input()));
        }

        let record = ctx
            .run(
                query_as::<_, PostRecord>(
                    "
                    UPDATE posts.posts
                    SET
                        title = COALESCE($2, title),
                        content = COALESCE($3, content),
                        updated_at = now()
                    WHERE
                        post_id = $1 AND deleted_at IS NULL
                    RETURNING
                        post_id, title, content, created_at, updated_at, deleted_at
                    ",
                )
                .bind(id.uuid())
                .bind(patch.title.as_ref().map(PostTitle::get))
                .bind(patch.content.as_ref().map(PostContent::get))
                .fetch_optional(&self.pool),
            )
            .await??;

        if record.is_none() {
            debug!(%id, "No post to update");
        }

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn delete(&self, ctx: &Context, id: Id<PostMarker>) -> Result<()> {
        let result = ctx
            .run(
                query(
                    "
                    UPDATE posts.posts
                    SET deleted_at = now()
                    WHERE post_id = $1 AND deleted_at IS NULL
                    ",
                )
                .bind(id.uuid())
                .execute(&self.pool),
            )
            .await??;

        debug!(%id, rows = result.rows_affected(), "Soft-deleted post");
        Ok(())
    }
}
