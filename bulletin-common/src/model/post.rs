use crate::model::Id;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use time::OffsetDateTime;

pub const POST_TITLE_MAX_LEN: usize = 50;
pub const POST_CONTENT_MAX_LEN: usize = 200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum TextFieldError {
    #[error("The text is empty")]
    Empty,
    #[error("The text is longer than {max} characters")]
    TooLong { max: usize },
}

macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident, max = $max:ident) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(text: String) -> Result<Self, TextFieldError> {
                if text.is_empty() {
                    Err(TextFieldError::Empty)
                } else if text.chars().count() > $max {
                    Err(TextFieldError::TooLong { max: $max })
                } else {
                    Ok(Self(text))
                }
            }

            #[must_use]
            pub fn get(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TextFieldError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

bounded_text!(
    /// Non-empty, at most [`POST_TITLE_MAX_LEN`] characters.
    PostTitle,
    max = POST_TITLE_MAX_LEN
);
bounded_text!(
    /// Non-empty, at most [`POST_CONTENT_MAX_LEN`] characters.
    PostContent,
    max = POST_CONTENT_MAX_LEN
);

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: PostTitle,
    pub content: PostContent,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    /// Set once the post has been soft-deleted. Reads never return such posts.
    pub deleted_at: Option<OffsetDateTime>,
}

/// Everything a caller may decide about a post that does not exist yet.
/// Id and timestamps are assigned by storage.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewPost {
    pub title: PostTitle,
    pub content: PostContent,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostPatch {
    pub title: Option<PostTitle>,
    pub content: Option<PostContent>,
}

impl PostPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Overwrites the fields this patch carries.
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
    }
}
