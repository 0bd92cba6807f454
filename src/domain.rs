use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles a user can hold in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reader,
    Journalist,
    Editor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Journalist => "journalist",
            Role::Editor => "editor",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "reader" => Some(Role::Reader),
            "journalist" => Some(Role::Journalist),
            "editor" => Some(Role::Editor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account. Subscriptions are only ever populated for readers;
/// journalists and editors produce content rather than follow it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<Uuid>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub bio: String,
    pub subscribed_publisher_ids: Vec<Uuid>,
    pub subscribed_journalist_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public representation safe to hand out over the API.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            bio: self.bio.clone(),
        }
    }
}

/// User fields exposed through the API (no credentials)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Option<Uuid>,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
}

/// A publishing house grouping editors and journalists.
/// The owner is an editor and is always a member of `editor_ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publisher {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub editor_ids: Vec<Uuid>,
    pub journalist_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Publisher {
    pub fn is_staff_editor(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id || self.editor_ids.contains(&user_id)
    }

    pub fn has_journalist(&self, user_id: Uuid) -> bool {
        self.journalist_ids.contains(&user_id)
    }
}

/// A news article. Publisher-bound articles start unapproved and go through
/// editorial review; independent articles are live from creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub journalist_id: Uuid,
    pub publisher_id: Option<Uuid>,
    pub is_approved: bool,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn requires_approval(&self) -> bool {
        self.publisher_id.is_some()
    }
}

/// A newsletter authored by a journalist, optionally under a publisher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Newsletter {
    pub id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub created_by: Uuid,
    pub publisher_id: Option<Uuid>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// An authenticated session backing a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Article as rendered by the API, with author/publisher names denormalized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Article,
    pub journalist_name: String,
    pub publisher_name: Option<String>,
}

/// Newsletter as rendered by the API, with creator/publisher names denormalized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterView {
    #[serde(flatten)]
    pub newsletter: Newsletter,
    pub created_by_name: String,
    pub publisher_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Reader, Role::Journalist, Role::Editor] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn independent_articles_skip_approval() {
        let now = Utc::now();
        let article = Article {
            id: None,
            title: "t".into(),
            content: "c".into(),
            journalist_id: Uuid::new_v4(),
            publisher_id: None,
            is_approved: true,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!article.requires_approval());
    }
}
