use crate::server::ServerRouter;

mod posts;

pub use posts::PostsApi;

pub fn routes() -> ServerRouter {
    ServerRouter::new().merge(posts::routes())
}
