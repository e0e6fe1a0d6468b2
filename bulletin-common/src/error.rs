//! Classification of errors into the ones a client caused and everything else.
//!
//! A [`DomainError`] anywhere in an error's `source()` chain makes the whole
//! error client-caused: its message and code are safe to show to callers.
//! Any other error is server-caused and only ever shows up in server logs.

use std::{borrow::Cow, error::Error, iter};
use thiserror::Error;

pub const POST_NOT_FOUND_CODE: &str = "post_not_found";

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
#[error("{message}")]
pub struct DomainError {
    message: Cow<'static, str>,
    code: Option<&'static str>,
}

impl DomainError {
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>, code: Option<&'static str>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    #[must_use]
    pub fn post_not_found() -> Self {
        Self::new("post not found", Some(POST_NOT_FOUND_CODE))
    }

    #[must_use]
    pub fn empty_input() -> Self {
        Self::new("empty input", None)
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        self.code
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ErrorKind {
    Client,
    Server,
}

impl ErrorKind {
    #[must_use]
    pub fn of(err: &(dyn Error + 'static)) -> Self {
        if is_domain_error(err) {
            Self::Client
        } else {
            Self::Server
        }
    }
}

#[must_use]
pub fn find_domain_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a DomainError> {
    iter::successors(Some(err), |&err| err.source()).find_map(|err| err.downcast_ref())
}

#[must_use]
pub fn is_domain_error(err: &(dyn Error + 'static)) -> bool {
    find_domain_error(err).is_some()
}

/// The code of the domain error in `err`'s chain, or `""`.
#[must_use]
pub fn code_of(err: &(dyn Error + 'static)) -> &'static str {
    find_domain_error(err)
        .and_then(DomainError::code)
        .unwrap_or_default()
}
