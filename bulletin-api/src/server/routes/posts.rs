use crate::{
    server::{
        ErrorResponse, ServerError, ServerRouter,
        context::RequestContext,
        decorator::decorate,
        json::Json,
        validation::{Rule, ValidationErrors},
    },
    service::{CreatePostOpt, PostService, UpdatePostOpt},
};
use axum::{extract::State, response::Response};
use axum_extra::routing::{RouterExt, TypedPath};
use bulletin_common::model::{
    Id,
    post::{Post, PostContent, PostMarker, PostTitle},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;
use utoipa::{OpenApi, ToSchema};

#[derive(OpenApi)]
#[openapi(
    paths(create_post, list_posts, get_post, update_post, delete_post),
    components(schemas(
        PostDto,
        PostResponse,
        ListPostsResponse,
        DeletePostResponse,
        CreatePostBody,
        UpdatePostBody,
        ErrorResponse
    )),
    tags((name = "posts", description = "Posts with soft delete"))
)]
pub struct PostsApi;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_get(list_posts)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct PostsPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: String,
}

impl PostPath {
    fn id(&self) -> Result<Id<PostMarker>, ValidationErrors> {
        let id = self
            .id
            .parse()
            .map_err(|_| ValidationErrors::single("invalid path params", "id", Rule::UUID))?;

        debug!(%id, "Parsed path params");
        Ok(id)
    }
}

/// A post as clients see it. The deletion marker is never exposed.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct PostDto {
    #[schema(value_type = String, format = Uuid)]
    id: Id<PostMarker>,
    #[schema(value_type = String, max_length = 50)]
    title: PostTitle,
    #[schema(value_type = String, max_length = 200)]
    content: PostContent,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    updated_at: OffsetDateTime,
}

impl From<Post> for PostDto {
    fn from(value: Post) -> Self {
        Self {
            id: value.id,
            title: value.title,
            content: value.content,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, ToSchema)]
struct PostResponse {
    post: PostDto,
}

impl From<Post> for PostResponse {
    fn from(value: Post) -> Self {
        Self { post: value.into() }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, ToSchema)]
struct ListPostsResponse {
    posts: Vec<PostDto>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Serialize, ToSchema)]
struct DeletePostResponse {}

/// Missing and `null` fields count as empty. Unknown fields, `id` included, are ignored.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, ToSchema)]
struct CreatePostBody {
    #[schema(max_length = 50)]
    title: Option<String>,
    #[schema(max_length = 200)]
    content: Option<String>,
}

impl CreatePostBody {
    fn validate(self) -> Result<CreatePostOpt, ValidationErrors> {
        let mut errors = ValidationErrors::new("invalid request body");
        let title = errors.check("title", PostTitle::new(self.title.unwrap_or_default()));
        let content = errors.check(
            "content",
            PostContent::new(self.content.unwrap_or_default()),
        );

        match (title, content) {
            (Some(title), Some(content)) => Ok(CreatePostOpt { title, content }),
            _ => Err(errors),
        }
    }
}

/// Fields that are missing, `null` or empty are left unchanged.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, ToSchema)]
struct UpdatePostBody {
    #[schema(max_length = 50)]
    title: Option<String>,
    #[schema(max_length = 200)]
    content: Option<String>,
}

impl UpdatePostBody {
    fn validate(self) -> Result<UpdatePostOpt, ValidationErrors> {
        let mut errors = ValidationErrors::new("invalid request body");
        let title =
            non_empty(self.title).and_then(|title| errors.check("title", PostTitle::new(title)));
        let content = non_empty(self.content)
            .and_then(|content| errors.check("content", PostContent::new(content)));

        if errors.is_empty() {
            Ok(UpdatePostOpt { title, content })
        } else {
            Err(errors)
        }
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.is_empty())
}

#[utoipa::path(
    post,
    path = "/posts",
    tag = "posts",
    operation_id = "createPost",
    request_body = CreatePostBody,
    responses(
        (status = 200, description = "The created post", body = PostResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn create_post(
    _: PostsPath,
    State(posts): State<Arc<dyn PostService>>,
    RequestContext(ctx): RequestContext,
    body: Result<Json<CreatePostBody>, ServerError>,
) -> Response {
    decorate("create post", async move {
        let Json(body) = body?;
        let opt = body.validate()?;
        debug!(?opt, "Parsed request body");

        let post = posts.create(&ctx, opt).await?;
        Ok(PostResponse::from(post))
    })
    .await
}

#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    operation_id = "listPosts",
    responses(
        (status = 200, description = "Posts that are not deleted", body = ListPostsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn list_posts(
    _: PostsPath,
    State(posts): State<Arc<dyn PostService>>,
    RequestContext(ctx): RequestContext,
) -> Response {
    decorate("list posts", async move {
        let posts = posts.list(&ctx).await?;
        Ok(ListPostsResponse {
            posts: posts.into_iter().map(PostDto::from).collect(),
        })
    })
    .await
}

#[utoipa::path(
    get,
    path = "/posts/{id}",
    tag = "posts",
    operation_id = "getPost",
    params(("id" = String, Path, description = "Post ID, a UUID")),
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 422, description = "Invalid ID or post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn get_post(
    path: PostPath,
    State(posts): State<Arc<dyn PostService>>,
    RequestContext(ctx): RequestContext,
) -> Response {
    decorate("get post", async move {
        let id = path.id()?;

        let post = posts.get(&ctx, id).await?;
        Ok(PostResponse::from(post))
    })
    .await
}

#[utoipa::path(
    put,
    path = "/posts/{id}",
    tag = "posts",
    operation_id = "updatePost",
    params(("id" = String, Path, description = "Post ID, a UUID")),
    request_body = UpdatePostBody,
    responses(
        (status = 200, description = "The updated post", body = PostResponse),
        (status = 422, description = "Invalid input or no such post", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn update_post(
    path: PostPath,
    State(posts): State<Arc<dyn PostService>>,
    RequestContext(ctx): RequestContext,
    body: Result<Json<UpdatePostBody>, ServerError>,
) -> Response {
    decorate("update post", async move {
        let id = path.id()?;
        let Json(body) = body?;
        let opt = body.validate()?;
        debug!(?opt, "Parsed request body");

        let post = posts.update(&ctx, id, opt).await?;
        Ok(PostResponse::from(post))
    })
    .await
}

/// Deleting a post that does not exist is not an error.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = "posts",
    operation_id = "deletePost",
    params(("id" = String, Path, description = "Post ID, a UUID")),
    responses(
        (status = 200, description = "The post is gone", body = DeletePostResponse),
        (status = 422, description = "Invalid ID", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn delete_post(
    path: PostPath,
    State(posts): State<Arc<dyn PostService>>,
    RequestContext(ctx): RequestContext,
) -> Response {
    decorate("delete post", async move {
        let id = path.id()?;

        posts.delete(&ctx, id).await?;
        Ok(DeletePostResponse {})
    })
    .await
}
