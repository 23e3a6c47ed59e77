use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Post entity - a blog post with an optional cover image URL.
///
/// Serialized with the document-style field names the front end expects
/// (`_id`, `createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post from a validated draft.
    pub fn new(draft: PostDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            image: draft.image,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a set of changes in place, bumping `updated_at`.
    pub fn apply(&mut self, changes: &PostChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        if let Some(image) = &changes.image {
            self.image = image.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Validated fields for a post that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub image: String,
}

/// Validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.image.is_none()
    }
}

/// Unvalidated post fields as received from a client.
///
/// Create and update both go through [`PostInput::check`], so the two paths
/// can never disagree about what a valid title or body is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Update,
}

impl PostInput {
    /// Validate for creation: `title` and `content` are required.
    pub fn into_draft(self) -> Result<PostDraft, DomainError> {
        let changes = self.check(Mode::Create)?;
        Ok(PostDraft {
            title: changes.title.unwrap_or_default(),
            content: changes.content.unwrap_or_default(),
            image: changes.image.unwrap_or_default(),
        })
    }

    /// Validate for a partial update: every provided field must be valid and
    /// at least one field must be provided.
    pub fn into_changes(self) -> Result<PostChanges, DomainError> {
        self.check(Mode::Update)
    }

    fn check(self, mode: Mode) -> Result<PostChanges, DomainError> {
        let changes = PostChanges {
            title: self.title.map(|s| s.trim().to_string()),
            content: self.content.map(|s| s.trim().to_string()),
            image: self.image.map(|s| s.trim().to_string()),
        };

        let mut errors = Vec::new();
        for (field, value) in [("title", &changes.title), ("content", &changes.content)] {
            match value {
                None if mode == Mode::Create => errors.push(format!("{field} is required")),
                Some(v) if v.is_empty() => errors.push(format!("{field} must not be empty")),
                _ => {}
            }
        }
        if mode == Mode::Update && changes.is_empty() {
            errors.push("at least one of title, content or image must be provided".to_string());
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}
