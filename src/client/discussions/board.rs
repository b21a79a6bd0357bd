use super::types::{Discussion, Reply};
use uuid::Uuid;

/// Read-through copy of a project's discussions, newest first, updated in place
/// after create, reply and delete calls succeed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscussionBoard {
    discussions: Vec<Discussion>,
}

impl DiscussionBoard {
    #[must_use]
    pub const fn new(discussions: Vec<Discussion>) -> Self {
        Self { discussions }
    }

    #[must_use]
    pub fn discussions(&self) -> &[Discussion] {
        &self.discussions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.discussions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.discussions.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&Discussion> {
        self.discussions.iter().find(|discussion| discussion.id == id)
    }

    /// Replaces the board with a fresh listing.
    pub fn reset(&mut self, discussions: Vec<Discussion>) {
        self.discussions = discussions;
    }

    pub fn prepend(&mut self, discussion: Discussion) {
        self.discussions.insert(0, discussion);
    }

    /// Appends a reply to its parent. Returns `false` if the parent is not on the board.
    pub fn append_reply(&mut self, discussion_id: Uuid, reply: Reply) -> bool {
        match self
            .discussions
            .iter_mut()
            .find(|discussion| discussion.id == discussion_id)
        {
            Some(discussion) => {
                discussion.replies.push(reply);
                true
            }
            None => false,
        }
    }

    /// Removes a root discussion, or a reply from whichever discussion holds it.
    /// Returns `false` if nothing matched.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.discussions.len();
        self.discussions.retain(|discussion| discussion.id != id);
        if self.discussions.len() != before {
            return true;
        }

        for discussion in &mut self.discussions {
            if let Some(index) = discussion.replies.iter().position(|reply| reply.id == id) {
                discussion.replies.remove(index);
                return true;
            }
        }
        false
    }
}
