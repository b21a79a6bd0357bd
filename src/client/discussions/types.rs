use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shown when the author account no longer exists.
pub const DELETED_USER: &str = "Deleted user";
/// Shown when the author never filled in a name.
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscussionAuthor {
    pub id: Uuid,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reply {
    pub id: Uuid,
    /// `None` once the author deleted their account.
    pub author: Option<DiscussionAuthor>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Discussion {
    pub id: Uuid,
    pub author: Option<DiscussionAuthor>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Discussion {
    #[must_use]
    pub fn author_name(&self) -> String {
        author_name(self.author.as_ref())
    }

    /// True when `user_id` wrote this discussion; a deleted author matches nobody.
    #[must_use]
    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author.as_ref().is_some_and(|author| author.id == user_id)
    }
}

impl Reply {
    #[must_use]
    pub fn author_name(&self) -> String {
        author_name(self.author.as_ref())
    }

    #[must_use]
    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author.as_ref().is_some_and(|author| author.id == user_id)
    }
}

#[derive(Serialize)]
pub(super) struct BodyPayload<'a> {
    pub body: &'a str,
}

/// Display name for an author reference.
#[must_use]
pub fn author_name(author: Option<&DiscussionAuthor>) -> String {
    let Some(author) = author else {
        return DELETED_USER.to_string();
    };
    let name = [author.first_name.trim(), author.last_name.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        ANONYMOUS.to_string()
    } else {
        name
    }
}
