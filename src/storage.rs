use crate::domain::{Article, Newsletter, Publisher, Role, Session, User};
use crate::error::{NewsError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Storage trait for persisting newsroom data
#[async_trait]
pub trait Storage: Send + Sync {
    // User operations
    async fn create_user(&self, user: &mut User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;
    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>>;

    // Session operations
    async fn create_session(&self, session: &Session) -> Result<()>;
    async fn get_session(&self, token: &str) -> Result<Option<Session>>;
    async fn delete_session(&self, token: &str) -> Result<()>;

    // Publisher operations
    async fn create_publisher(&self, publisher: &mut Publisher) -> Result<()>;
    async fn get_publisher(&self, id: Uuid) -> Result<Option<Publisher>>;
    async fn update_publisher(&self, publisher: &Publisher) -> Result<()>;
    async fn list_publishers(&self) -> Result<Vec<Publisher>>;

    // Article operations
    async fn create_article(&self, article: &mut Article) -> Result<()>;
    async fn get_article(&self, id: Uuid) -> Result<Option<Article>>;
    async fn update_article(&self, article: &Article) -> Result<()>;
    async fn delete_article(&self, id: Uuid) -> Result<()>;
    async fn list_approved_articles(&self, limit: Option<usize>) -> Result<Vec<Article>>;
    async fn list_articles_by_journalist(&self, journalist_id: Uuid) -> Result<Vec<Article>>;
    async fn list_pending_articles(&self, publisher_ids: &[Uuid]) -> Result<Vec<Article>>;
    async fn list_publisher_articles(
        &self,
        publisher_ids: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Article>>;
    async fn list_feed_articles(
        &self,
        publisher_ids: &[Uuid],
        journalist_ids: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Article>>;

    // Newsletter operations
    async fn create_newsletter(&self, newsletter: &mut Newsletter) -> Result<()>;
    async fn get_newsletter(&self, id: Uuid) -> Result<Option<Newsletter>>;
    async fn update_newsletter(&self, newsletter: &Newsletter) -> Result<()>;
    async fn delete_newsletter(&self, id: Uuid) -> Result<()>;
    async fn list_published_newsletters(&self, limit: Option<usize>) -> Result<Vec<Newsletter>>;
    async fn list_newsletters_by_creator(&self, creator_id: Uuid) -> Result<Vec<Newsletter>>;
    async fn list_feed_newsletters(
        &self,
        publisher_ids: &[Uuid],
        journalist_ids: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Newsletter>>;
}

/// In-memory storage implementation for development/testing
pub struct InMemoryStorage {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    publishers: Arc<Mutex<HashMap<Uuid, Publisher>>>,
    articles: Arc<Mutex<HashMap<Uuid, Article>>>,
    newsletters: Arc<Mutex<HashMap<Uuid, Newsletter>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            publishers: Arc::new(Mutex::new(HashMap::new())),
            articles: Arc::new(Mutex::new(HashMap::new())),
            newsletters: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first_articles(mut articles: Vec<Article>) -> Vec<Article> {
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    articles
}

fn newest_first_newsletters(mut newsletters: Vec<Newsletter>) -> Vec<Newsletter> {
    newsletters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    newsletters
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: &mut User) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(NewsError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }

        let id = Uuid::new_v4();
        user.id = Some(id);
        users.insert(id, user.clone());

        debug!("Created user: {} with id {}", user.username, id);
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        let user = users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned();
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let user_id = user
            .id
            .ok_or_else(|| NewsError::Database("cannot update user without ID".to_string()))?;

        let mut users = self.users.lock().unwrap();
        users.insert(user_id, user.clone());

        debug!("Updated user: {} with id {}", user.username, user_id);
        Ok(())
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>> {
        let users = self.users.lock().unwrap();
        let mut matched: Vec<User> = users.values().filter(|u| u.role == role).cloned().collect();
        matched.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(matched)
    }

    async fn create_session(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session.token.clone(), session.clone());

        debug!("Created session for user {}", session.user_id);
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(token);
        Ok(())
    }

    async fn create_publisher(&self, publisher: &mut Publisher) -> Result<()> {
        let id = Uuid::new_v4();
        publisher.id = Some(id);

        let mut publishers = self.publishers.lock().unwrap();
        publishers.insert(id, publisher.clone());

        debug!("Created publisher: {} with id {}", publisher.name, id);
        Ok(())
    }

    async fn get_publisher(&self, id: Uuid) -> Result<Option<Publisher>> {
        let publishers = self.publishers.lock().unwrap();
        Ok(publishers.get(&id).cloned())
    }

    async fn update_publisher(&self, publisher: &Publisher) -> Result<()> {
        let publisher_id = publisher
            .id
            .ok_or_else(|| NewsError::Database("cannot update publisher without ID".to_string()))?;

        let mut publishers = self.publishers.lock().unwrap();
        publishers.insert(publisher_id, publisher.clone());

        debug!("Updated publisher: {} with id {}", publisher.name, publisher_id);
        Ok(())
    }

    async fn list_publishers(&self) -> Result<Vec<Publisher>> {
        let publishers = self.publishers.lock().unwrap();
        let mut all: Vec<Publisher> = publishers.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn create_article(&self, article: &mut Article) -> Result<()> {
        let id = Uuid::new_v4();
        article.id = Some(id);

        let mut articles = self.articles.lock().unwrap();
        articles.insert(id, article.clone());

        debug!("Created article: {} with id {}", article.title, id);
        Ok(())
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
        let articles = self.articles.lock().unwrap();
        Ok(articles.get(&id).cloned())
    }

    async fn update_article(&self, article: &Article) -> Result<()> {
        let article_id = article
            .id
            .ok_or_else(|| NewsError::Database("cannot update article without ID".to_string()))?;

        let mut articles = self.articles.lock().unwrap();
        articles.insert(article_id, article.clone());

        debug!("Updated article: {} with id {}", article.title, article_id);
        Ok(())
    }

    async fn delete_article(&self, id: Uuid) -> Result<()> {
        let mut articles = self.articles.lock().unwrap();
        articles.remove(&id);

        debug!("Deleted article {}", id);
        Ok(())
    }

    async fn list_approved_articles(&self, limit: Option<usize>) -> Result<Vec<Article>> {
        let articles = self.articles.lock().unwrap();
        let approved: Vec<Article> = articles
            .values()
            .filter(|a| a.is_approved)
            .cloned()
            .collect();
        let mut sorted = newest_first_articles(approved);
        if let Some(limit) = limit {
            sorted.truncate(limit);
        }
        Ok(sorted)
    }

    async fn list_articles_by_journalist(&self, journalist_id: Uuid) -> Result<Vec<Article>> {
        let articles = self.articles.lock().unwrap();
        let authored: Vec<Article> = articles
            .values()
            .filter(|a| a.journalist_id == journalist_id)
            .cloned()
            .collect();
        Ok(newest_first_articles(authored))
    }

    async fn list_pending_articles(&self, publisher_ids: &[Uuid]) -> Result<Vec<Article>> {
        let articles = self.articles.lock().unwrap();
        let pending: Vec<Article> = articles
            .values()
            .filter(|a| {
                !a.is_approved
                    && a.publisher_id
                        .map_or(false, |pid| publisher_ids.contains(&pid))
            })
            .cloned()
            .collect();
        Ok(newest_first_articles(pending))
    }

    async fn list_publisher_articles(
        &self,
        publisher_ids: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Article>> {
        let articles = self.articles.lock().unwrap();
        let matched: Vec<Article> = articles
            .values()
            .filter(|a| {
                a.publisher_id
                    .map_or(false, |pid| publisher_ids.contains(&pid))
            })
            .cloned()
            .collect();
        let mut sorted = newest_first_articles(matched);
        sorted.truncate(limit);
        Ok(sorted)
    }

    async fn list_feed_articles(
        &self,
        publisher_ids: &[Uuid],
        journalist_ids: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Article>> {
        let articles = self.articles.lock().unwrap();
        let matched: Vec<Article> = articles
            .values()
            .filter(|a| {
                a.is_approved
                    && (a
                        .publisher_id
                        .map_or(false, |pid| publisher_ids.contains(&pid))
                        || journalist_ids.contains(&a.journalist_id))
            })
            .cloned()
            .collect();
        let mut sorted = newest_first_articles(matched);
        sorted.truncate(limit);
        Ok(sorted)
    }

    async fn create_newsletter(&self, newsletter: &mut Newsletter) -> Result<()> {
        let id = Uuid::new_v4();
        newsletter.id = Some(id);

        let mut newsletters = self.newsletters.lock().unwrap();
        newsletters.insert(id, newsletter.clone());

        debug!("Created newsletter: {} with id {}", newsletter.title, id);
        Ok(())
    }

    async fn get_newsletter(&self, id: Uuid) -> Result<Option<Newsletter>> {
        let newsletters = self.newsletters.lock().unwrap();
        Ok(newsletters.get(&id).cloned())
    }

    async fn update_newsletter(&self, newsletter: &Newsletter) -> Result<()> {
        let newsletter_id = newsletter.id.ok_or_else(|| {
            NewsError::Database("cannot update newsletter without ID".to_string())
        })?;

        let mut newsletters = self.newsletters.lock().unwrap();
        newsletters.insert(newsletter_id, newsletter.clone());

        debug!(
            "Updated newsletter: {} with id {}",
            newsletter.title, newsletter_id
        );
        Ok(())
    }

    async fn delete_newsletter(&self, id: Uuid) -> Result<()> {
        let mut newsletters = self.newsletters.lock().unwrap();
        newsletters.remove(&id);

        debug!("Deleted newsletter {}", id);
        Ok(())
    }

    async fn list_published_newsletters(&self, limit: Option<usize>) -> Result<Vec<Newsletter>> {
        let newsletters = self.newsletters.lock().unwrap();
        let published: Vec<Newsletter> = newsletters
            .values()
            .filter(|n| n.is_published)
            .cloned()
            .collect();
        let mut sorted = newest_first_newsletters(published);
        if let Some(limit) = limit {
            sorted.truncate(limit);
        }
        Ok(sorted)
    }

    async fn list_newsletters_by_creator(&self, creator_id: Uuid) -> Result<Vec<Newsletter>> {
        let newsletters = self.newsletters.lock().unwrap();
        let authored: Vec<Newsletter> = newsletters
            .values()
            .filter(|n| n.created_by == creator_id)
            .cloned()
            .collect();
        Ok(newest_first_newsletters(authored))
    }

    async fn list_feed_newsletters(
        &self,
        publisher_ids: &[Uuid],
        journalist_ids: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Newsletter>> {
        let newsletters = self.newsletters.lock().unwrap();
        let matched: Vec<Newsletter> = newsletters
            .values()
            .filter(|n| {
                n.is_published
                    && (n
                        .publisher_id
                        .map_or(false, |pid| publisher_ids.contains(&pid))
                        || journalist_ids.contains(&n.created_by))
            })
            .cloned()
            .collect();
        let mut sorted = newest_first_newsletters(matched);
        sorted.truncate(limit);
        Ok(sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(username: &str, role: Role) -> User {
        User {
            id: None,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "salt$digest".to_string(),
            role,
            bio: String::new(),
            subscribed_publisher_ids: Vec::new(),
            subscribed_journalist_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn test_article(journalist_id: Uuid, publisher_id: Option<Uuid>, approved: bool) -> Article {
        let now = Utc::now();
        Article {
            id: None,
            title: "Title".to_string(),
            content: "Content".to_string(),
            journalist_id,
            publisher_id,
            is_approved: approved,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected_case_insensitively() {
        let storage = InMemoryStorage::new();
        let mut first = test_user("Alice", Role::Reader);
        storage.create_user(&mut first).await.unwrap();

        let mut second = test_user("alice", Role::Editor);
        let err = storage.create_user(&mut second).await.unwrap_err();
        assert!(matches!(err, NewsError::Conflict(_)));
    }

    #[tokio::test]
    async fn feed_articles_filter_on_subscriptions_and_approval() {
        let storage = InMemoryStorage::new();
        let journalist = Uuid::new_v4();
        let other_journalist = Uuid::new_v4();
        let publisher = Uuid::new_v4();

        let mut subscribed = test_article(journalist, None, true);
        let mut unsubscribed = test_article(other_journalist, None, true);
        let mut pending = test_article(journalist, Some(publisher), false);
        storage.create_article(&mut subscribed).await.unwrap();
        storage.create_article(&mut unsubscribed).await.unwrap();
        storage.create_article(&mut pending).await.unwrap();

        let feed = storage
            .list_feed_articles(&[publisher], &[journalist], 10)
            .await
            .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, subscribed.id);
    }

    #[tokio::test]
    async fn pending_articles_are_scoped_to_publishers() {
        let storage = InMemoryStorage::new();
        let journalist = Uuid::new_v4();
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();

        let mut own_pending = test_article(journalist, Some(mine), false);
        let mut foreign_pending = test_article(journalist, Some(theirs), false);
        storage.create_article(&mut own_pending).await.unwrap();
        storage.create_article(&mut foreign_pending).await.unwrap();

        let pending = storage.list_pending_articles(&[mine]).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, own_pending.id);
    }
}
