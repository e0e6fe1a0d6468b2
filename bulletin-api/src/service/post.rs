use crate::service::{CreatePostOpt, PostService, Result, ServiceError, UpdatePostOpt};
use async_trait::async_trait;
use bulletin_common::{
    context::Context,
    error::DomainError,
    model::{
        Id,
        post::{NewPost, Post, PostMarker, PostPatch},
    },
};
use bulletin_db::storage::{PostStorage, StorageError};
use std::sync::Arc;
use tracing::{error, info};

pub struct PostServiceImpl {
    storage: Arc<dyn PostStorage>,
}

impl PostServiceImpl {
    #[must_use]
    pub fn new(storage: Arc<dyn PostStorage>) -> Self {
        Self { storage }
    }
}

fn storage_error(action: &'static str) -> impl FnOnce(StorageError) -> ServiceError {
    move |err| {
        let err = ServiceError::from_storage(action, err);
        match &err {
            ServiceError::Domain(domain) => {
                info!(action, error = %domain, "Storage rejected input");
            }
            ServiceError::Storage { .. } => error!(action, error = %err, "Storage failed"),
        }
        err
    }
}

#[async_trait]
impl PostService for PostServiceImpl {
    async fn create(&self, ctx: &Context, opt: CreatePostOpt) -> Result<Post> {
        let new_post = NewPost {
            title: opt.title,
            content: opt.content,
        };

        let created = self
            .storage
            .create(ctx, &new_post)
            .await
            .map_err(storage_error("create post"))?;

        info!(id = %created.id, "Successfully created post");
        Ok(created)
    }

    async fn list(&self, ctx: &Context) -> Result<Vec<Post>> {
        let posts = self
            .storage
            .list(ctx)
            .await
            .map_err(storage_error("list posts"))?;

        info!(count = posts.len(), "Successfully listed posts");
        Ok(posts)
    }

    async fn get(&self, ctx: &Context, id: Id<PostMarker>) -> Result<Post> {
        let Some(post) = self
            .storage
            .get(ctx, id)
            .await
            .map_err(storage_error("get post"))?
        else {
            info!(%id, "Post not found");
            return Err(DomainError::post_not_found().into());
        };

        info!(%id, "Successfully got post");
        Ok(post)
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Id<PostMarker>,
        opt: UpdatePostOpt,
    ) -> Result<Post> {
        let patch = PostPatch {
            title: opt.title,
            content: opt.content,
        };

        let Some(updated) = self
            .storage
            .update(ctx, id, &patch)
            .await
            .map_err(storage_error("update post"))?
        else {
            info!(%id, "Post to update not found");
            return Err(DomainError::post_not_found().into());
        };

        info!(%id, "Successfully updated post");
        Ok(updated)
    }

    async fn delete(&self, ctx: &Context, id: Id<PostMarker>) -> Result<()> {
        self.storage
            .delete(ctx, id)
            .await
            .map_err(storage_error("delete post"))?;

        info!(%id, "Successfully deleted post");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::service::{
        CreatePostOpt, PostService, PostServiceImpl, ServiceError, UpdatePostOpt,
    };
    use bulletin_common::{
        context::{Cancelled, Context},
        error::{DomainError, ErrorKind, POST_NOT_FOUND_CODE, code_of, is_domain_error},
        model::{
            Id,
            post::{Post, PostContent, PostTitle},
        },
    };
    use bulletin_db::{
        memory::MemoryPostStorage,
        storage::{MockPostStorage, StorageError},
    };
    use std::sync::Arc;
    use time::OffsetDateTime;

    fn memory_service() -> PostServiceImpl {
        PostServiceImpl::new(Arc::new(MemoryPostStorage::new()))
    }

    fn create_opt(title: &str, content: &str) -> CreatePostOpt {
        CreatePostOpt {
            title: PostTitle::new(title.into()).unwrap(),
            content: PostContent::new(content.into()).unwrap(),
        }
    }

    #[tokio::test]
    async fn get_absent_is_post_not_found() {
        let service = memory_service();

        let err = service
            .get(&Context::new(), Id::generate())
            .await
            .unwrap_err();

        assert!(is_domain_error(&err));
        assert_eq!(code_of(&err), POST_NOT_FOUND_CODE);
        assert_eq!(err.kind(), ErrorKind::Client);
    }

    #[tokio::test]
    async fn update_absent_is_post_not_found() {
        let service = memory_service();
        let opt = UpdatePostOpt {
            title: Some(PostTitle::new("t".into()).unwrap()),
            content: None,
        };

        let err = service
            .update(&Context::new(), Id::generate(), opt)
            .await
            .unwrap_err();

        assert_eq!(code_of(&err), POST_NOT_FOUND_CODE);
    }

    #[tokio::test]
    async fn update_one_field_keeps_the_other() {
        let service = memory_service();
        let ctx = Context::new();
        let created = service.create(&ctx, create_opt("t", "c")).await.unwrap();

        let opt = UpdatePostOpt {
            title: Some(PostTitle::new("new title".into()).unwrap()),
            content: None,
        };
        service.update(&ctx, created.id, opt).await.unwrap();

        let fetched = service.get(&ctx, created.id).await.unwrap();
        assert_eq!(fetched.title.get(), "new title");
        assert_eq!(fetched.content.get(), "c");
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let service = memory_service();
        let ctx = Context::new();
        let created = service.create(&ctx, create_opt("t", "c")).await.unwrap();

        service.delete(&ctx, created.id).await.unwrap();
        service.delete(&ctx, created.id).await.unwrap();

        let err = service.get(&ctx, created.id).await.unwrap_err();
        assert_eq!(code_of(&err), POST_NOT_FOUND_CODE);
    }

    #[tokio::test]
    async fn create_hands_input_to_storage() {
        let mut storage = MockPostStorage::new();
        storage
            .expect_create()
            .withf(|_, post| post.title.get() == "t" && post.content.get() == "c")
            .times(1)
            .returning(|_, post| {
                let now = OffsetDateTime::now_utc();
                Ok(Post {
                    id: Id::generate(),
                    title: post.title.clone(),
                    content: post.content.clone(),
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                })
            });
        let service = PostServiceImpl::new(Arc::new(storage));

        let created = service
            .create(&Context::new(), create_opt("t", "c"))
            .await
            .unwrap();

        assert_eq!(created.title.get(), "t");
        assert_eq!(created.content.get(), "c");
    }

    #[tokio::test]
    async fn storage_domain_errors_pass_unchanged() {
        let mut storage = MockPostStorage::new();
        storage.expect_list().times(1).returning(|_| {
            Err(StorageError::Domain(DomainError::new(
                "quota reached",
                Some("quota"),
            )))
        });
        let service = PostServiceImpl::new(Arc::new(storage));

        let err = service.list(&Context::new()).await.unwrap_err();

        assert!(
            matches!(&err, ServiceError::Domain(domain) if domain.message() == "quota reached")
        );
        assert_eq!(err.to_string(), "quota reached");
        assert_eq!(code_of(&err), "quota");
    }

    #[tokio::test]
    async fn unexpected_storage_errors_get_context() {
        let mut storage = MockPostStorage::new();
        storage
            .expect_get()
            .times(1)
            .returning(|_, _| Err(StorageError::Cancelled(Cancelled)));
        let service = PostServiceImpl::new(Arc::new(storage));

        let err = service
            .get(&Context::new(), Id::generate())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Storage {
                action: "get post",
                ..
            }
        ));
        assert!(err.to_string().starts_with("failed to get post: "));
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(code_of(&err), "");
    }

    #[tokio::test]
    async fn list_returns_every_created_post() {
        let service = memory_service();
        let ctx = Context::new();

        for i in 0..5 {
            service
                .create(&ctx, create_opt(&format!("t{i}"), "c"))
                .await
                .unwrap();
        }

        assert_eq!(service.list(&ctx).await.unwrap().len(), 5);
    }
}
