use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use bulletin_common::context::Context;
use std::convert::Infallible;

/// Per-request [`Context`], derived from the server's root context.
#[derive(Clone, Debug)]
pub struct RequestContext(pub Context);

impl<S> FromRequestParts<S> for RequestContext
where
    Context: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Context::from_ref(state).child()))
    }
}
