use crate::auth;
use crate::domain::{
    Article, ArticleView, Newsletter, NewsletterView, Publisher, Role, Session, User, UserProfile,
};
use crate::error::{NewsError, Result};
use crate::notify::ShareNotifier;
use crate::storage::Storage;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// How many items the home page and reader feed return
pub const DEFAULT_FEED_LIMIT: usize = 10;

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub publisher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterDraft {
    pub title: String,
    pub content: String,
    pub publisher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Staff management operations on a publishing house
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StaffAction {
    AddEditor { username: String },
    RemoveEditor { user_id: Uuid },
    AddJournalist { username: String },
    RemoveJournalist { user_id: Uuid },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    pub publisher_ids: Vec<Uuid>,
    pub journalist_ids: Vec<Uuid>,
}

/// Role-shaped dashboard payload
#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Reader {
        articles: Vec<ArticleView>,
        newsletters: Vec<NewsletterView>,
        subscribed_publishers: Vec<Publisher>,
        subscribed_journalists: Vec<UserProfile>,
    },
    Journalist {
        articles: Vec<ArticleView>,
        newsletters: Vec<NewsletterView>,
        publishers: Vec<Publisher>,
    },
    Editor {
        pending: Vec<ArticleView>,
        recent: Vec<ArticleView>,
        publishers: Vec<Publisher>,
    },
}

/// Business rules for the newsroom: registration, the editorial approval
/// workflow, publisher staffing, and subscription feeds.
pub struct NewsService {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn ShareNotifier>,
}

impl NewsService {
    pub fn new(storage: Arc<dyn Storage>, notifier: Arc<dyn ShareNotifier>) -> Self {
        Self { storage, notifier }
    }

    // ----- accounts and sessions -----

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse> {
        auth::validate_registration(&req.username, &req.email, &req.password)?;

        let mut user = User {
            id: None,
            username: req.username,
            email: req.email,
            password_hash: auth::hash_password(&req.password),
            role: req.role,
            bio: req.bio,
            // Content producers never carry subscriptions
            subscribed_publisher_ids: Vec::new(),
            subscribed_journalist_ids: Vec::new(),
            created_at: Utc::now(),
        };
        self.storage.create_user(&mut user).await?;
        info!("Registered {} account '{}'", user.role, user.username);

        self.open_session(&user).await
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse> {
        let user = self
            .storage
            .get_user_by_username(&req.username)
            .await?
            .filter(|u| auth::verify_password(&u.password_hash, &req.password))
            .ok_or_else(|| {
                NewsError::Unauthorized("invalid username or password".to_string())
            })?;
        self.open_session(&user).await
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.storage.delete_session(token).await
    }

    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let session = self
            .storage
            .get_session(token)
            .await?
            .ok_or_else(|| NewsError::Unauthorized("invalid or expired token".to_string()))?;
        self.storage
            .get_user(session.user_id)
            .await?
            .ok_or_else(|| NewsError::Unauthorized("session user no longer exists".to_string()))
    }

    async fn open_session(&self, user: &User) -> Result<AuthResponse> {
        let session = Session {
            token: auth::new_session_token(),
            user_id: user.id.expect("stored user always has an id"),
            created_at: Utc::now(),
        };
        self.storage.create_session(&session).await?;
        Ok(AuthResponse {
            token: session.token,
            user: user.profile(),
        })
    }

    // ----- public content -----

    /// Latest approved articles, visible without authentication.
    pub async fn home_feed(&self, limit: usize) -> Result<Vec<ArticleView>> {
        let articles = self.storage.list_approved_articles(Some(limit)).await?;
        self.render_articles(articles).await
    }

    // ----- dashboard -----

    pub async fn dashboard(&self, user: &User) -> Result<Dashboard> {
        match user.role {
            Role::Reader => {
                let articles = self
                    .storage
                    .list_feed_articles(
                        &user.subscribed_publisher_ids,
                        &user.subscribed_journalist_ids,
                        DEFAULT_FEED_LIMIT,
                    )
                    .await?;
                let newsletters = self
                    .storage
                    .list_feed_newsletters(
                        &user.subscribed_publisher_ids,
                        &user.subscribed_journalist_ids,
                        DEFAULT_FEED_LIMIT,
                    )
                    .await?;

                let mut subscribed_publishers = Vec::new();
                for pid in &user.subscribed_publisher_ids {
                    if let Some(publisher) = self.storage.get_publisher(*pid).await? {
                        subscribed_publishers.push(publisher);
                    }
                }
                let mut subscribed_journalists = Vec::new();
                for jid in &user.subscribed_journalist_ids {
                    if let Some(journalist) = self.storage.get_user(*jid).await? {
                        subscribed_journalists.push(journalist.profile());
                    }
                }

                Ok(Dashboard::Reader {
                    articles: self.render_articles(articles).await?,
                    newsletters: self.render_newsletters(newsletters).await?,
                    subscribed_publishers,
                    subscribed_journalists,
                })
            }
            Role::Journalist => {
                let user_id = user.id.expect("stored user always has an id");
                let articles = self.storage.list_articles_by_journalist(user_id).await?;
                let newsletters = self.storage.list_newsletters_by_creator(user_id).await?;
                let publishers = self.storage.list_publishers().await?;
                Ok(Dashboard::Journalist {
                    articles: self.render_articles(articles).await?,
                    newsletters: self.render_newsletters(newsletters).await?,
                    publishers,
                })
            }
            Role::Editor => {
                let (publishers, publisher_ids) = self.editor_publishers(user).await?;
                let pending = self.storage.list_pending_articles(&publisher_ids).await?;
                let recent = self
                    .storage
                    .list_publisher_articles(&publisher_ids, DEFAULT_FEED_LIMIT)
                    .await?;
                Ok(Dashboard::Editor {
                    pending: self.render_articles(pending).await?,
                    recent: self.render_articles(recent).await?,
                    publishers,
                })
            }
        }
    }

    // ----- articles -----

    pub async fn create_article(&self, author: &User, draft: ArticleDraft) -> Result<ArticleView> {
        if author.role != Role::Journalist {
            return Err(NewsError::Forbidden(
                "only journalists can create articles".to_string(),
            ));
        }
        validate_content(&draft.title, &draft.content)?;

        let author_id = author.id.expect("stored user always has an id");
        if let Some(pid) = draft.publisher_id {
            let publisher = self
                .storage
                .get_publisher(pid)
                .await?
                .ok_or_else(|| NewsError::NotFound("publisher".to_string()))?;
            if !publisher.has_journalist(author_id) {
                return Err(NewsError::Forbidden(
                    "you are not a journalist of this publishing house".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let mut article = Article {
            id: None,
            title: draft.title,
            content: draft.content,
            journalist_id: author_id,
            publisher_id: draft.publisher_id,
            // Publisher-bound articles wait for editorial approval;
            // independent ones go live immediately.
            is_approved: draft.publisher_id.is_none(),
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };
        self.storage.create_article(&mut article).await?;
        info!(
            "Article '{}' created by {} (approved: {})",
            article.title, author.username, article.is_approved
        );
        self.article_view(article).await
    }

    pub async fn update_article(
        &self,
        actor: &User,
        article_id: Uuid,
        draft: ArticleDraft,
    ) -> Result<ArticleView> {
        validate_content(&draft.title, &draft.content)?;
        let mut article = self.require_article(article_id).await?;
        self.require_article_write(actor, &article)?;

        if draft.publisher_id != article.publisher_id {
            if let Some(pid) = draft.publisher_id {
                let publisher = self
                    .storage
                    .get_publisher(pid)
                    .await?
                    .ok_or_else(|| NewsError::NotFound("publisher".to_string()))?;
                // Same gate as on create: journalists can only move an
                // article into a house they belong to.
                let actor_id = actor.id.expect("stored user always has an id");
                if actor.role == Role::Journalist && !publisher.has_journalist(actor_id) {
                    return Err(NewsError::Forbidden(
                        "you are not a journalist of this publishing house".to_string(),
                    ));
                }
            }
            // Moving an article under a publisher re-enters review unless an
            // editor already signed off on it.
            if draft.publisher_id.is_some() && article.approved_by.is_none() {
                article.is_approved = false;
            }
            article.publisher_id = draft.publisher_id;
        }

        article.title = draft.title;
        article.content = draft.content;
        article.updated_at = Utc::now();
        self.storage.update_article(&article).await?;
        self.article_view(article).await
    }

    pub async fn delete_article(&self, actor: &User, article_id: Uuid) -> Result<()> {
        let article = self.require_article(article_id).await?;
        self.require_article_write(actor, &article)?;
        self.storage.delete_article(article_id).await?;
        info!("Article '{}' deleted by {}", article.title, actor.username);
        Ok(())
    }

    /// Approve a publisher-bound article. Editors may only approve articles
    /// from publishing houses they own or staff.
    pub async fn approve_article(&self, editor: &User, article_id: Uuid) -> Result<ArticleView> {
        if editor.role != Role::Editor {
            return Err(NewsError::Forbidden(
                "only editors can approve articles".to_string(),
            ));
        }
        let mut article = self.require_article(article_id).await?;
        if article.is_approved {
            return Err(NewsError::Conflict("article is already approved".to_string()));
        }

        let editor_id = editor.id.expect("stored user always has an id");
        if let Some(pid) = article.publisher_id {
            let publisher = self
                .storage
                .get_publisher(pid)
                .await?
                .ok_or_else(|| NewsError::NotFound("publisher".to_string()))?;
            if !publisher.is_staff_editor(editor_id) {
                return Err(NewsError::Forbidden(
                    "you can only approve articles from your publishing house".to_string(),
                ));
            }
        }

        article.is_approved = true;
        article.approved_by = Some(editor_id);
        article.approved_at = Some(Utc::now());
        article.updated_at = Utc::now();
        self.storage.update_article(&article).await?;
        info!("Article '{}' approved by {}", article.title, editor.username);

        // Approval stands even if the announcement hook fails.
        if let Some(author) = self.storage.get_user(article.journalist_id).await? {
            if let Err(e) = self.notifier.share_article(&article, &author).await {
                warn!("Share hook failed for '{}': {}", article.title, e);
            }
        }

        self.article_view(article).await
    }

    /// Fetch one article. Unapproved articles are visible only to their
    /// author and to editors staffing the article's publisher.
    pub async fn get_article(&self, user: &User, article_id: Uuid) -> Result<ArticleView> {
        let article = self.require_article(article_id).await?;
        if !article.is_approved {
            let user_id = user.id.expect("stored user always has an id");
            let is_author = article.journalist_id == user_id;
            let is_reviewing_editor = match (user.role, article.publisher_id) {
                (Role::Editor, Some(pid)) => self
                    .storage
                    .get_publisher(pid)
                    .await?
                    .map_or(false, |p| p.is_staff_editor(user_id)),
                _ => false,
            };
            if !is_author && !is_reviewing_editor {
                return Err(NewsError::Forbidden(
                    "you don't have permission to view this article".to_string(),
                ));
            }
        }
        self.article_view(article).await
    }

    /// REST collection semantics: readers see approved articles from their
    /// subscriptions; journalists and editors see all approved articles.
    pub async fn list_articles(&self, user: &User) -> Result<Vec<ArticleView>> {
        let articles = match user.role {
            Role::Reader => {
                self.storage
                    .list_feed_articles(
                        &user.subscribed_publisher_ids,
                        &user.subscribed_journalist_ids,
                        DEFAULT_FEED_LIMIT,
                    )
                    .await?
            }
            // Journalists and editors browse the full approved collection
            _ => self.storage.list_approved_articles(None).await?,
        };
        self.render_articles(articles).await
    }

    // ----- newsletters -----

    pub async fn create_newsletter(
        &self,
        author: &User,
        draft: NewsletterDraft,
    ) -> Result<NewsletterView> {
        if author.role != Role::Journalist {
            return Err(NewsError::Forbidden(
                "only journalists can create newsletters".to_string(),
            ));
        }
        validate_content(&draft.title, &draft.content)?;
        if let Some(pid) = draft.publisher_id {
            self.storage
                .get_publisher(pid)
                .await?
                .ok_or_else(|| NewsError::NotFound("publisher".to_string()))?;
        }

        let mut newsletter = Newsletter {
            id: None,
            title: draft.title,
            content: draft.content,
            created_by: author.id.expect("stored user always has an id"),
            publisher_id: draft.publisher_id,
            is_published: false,
            created_at: Utc::now(),
        };
        self.storage.create_newsletter(&mut newsletter).await?;
        info!(
            "Newsletter '{}' created by {}",
            newsletter.title, author.username
        );
        self.newsletter_view(newsletter).await
    }

    pub async fn update_newsletter(
        &self,
        actor: &User,
        newsletter_id: Uuid,
        draft: NewsletterDraft,
    ) -> Result<NewsletterView> {
        validate_content(&draft.title, &draft.content)?;
        let mut newsletter = self.require_newsletter(newsletter_id).await?;
        self.require_newsletter_write(actor, &newsletter)?;

        if let Some(pid) = draft.publisher_id {
            self.storage
                .get_publisher(pid)
                .await?
                .ok_or_else(|| NewsError::NotFound("publisher".to_string()))?;
        }
        newsletter.title = draft.title;
        newsletter.content = draft.content;
        newsletter.publisher_id = draft.publisher_id;
        self.storage.update_newsletter(&newsletter).await?;
        self.newsletter_view(newsletter).await
    }

    pub async fn delete_newsletter(&self, actor: &User, newsletter_id: Uuid) -> Result<()> {
        let newsletter = self.require_newsletter(newsletter_id).await?;
        self.require_newsletter_write(actor, &newsletter)?;
        self.storage.delete_newsletter(newsletter_id).await?;
        info!(
            "Newsletter '{}' deleted by {}",
            newsletter.title, actor.username
        );
        Ok(())
    }

    /// Publish a newsletter: its creator, or an editor staffing its
    /// publisher, may release it to subscribers.
    pub async fn publish_newsletter(
        &self,
        actor: &User,
        newsletter_id: Uuid,
    ) -> Result<NewsletterView> {
        let mut newsletter = self.require_newsletter(newsletter_id).await?;
        if newsletter.is_published {
            return Err(NewsError::Conflict(
                "newsletter is already published".to_string(),
            ));
        }

        let actor_id = actor.id.expect("stored user always has an id");
        let is_creator = newsletter.created_by == actor_id;
        let is_publisher_editor = match (actor.role, newsletter.publisher_id) {
            (Role::Editor, Some(pid)) => self
                .storage
                .get_publisher(pid)
                .await?
                .map_or(false, |p| p.is_staff_editor(actor_id)),
            _ => false,
        };
        if !is_creator && !is_publisher_editor {
            return Err(NewsError::Forbidden(
                "you don't have permission to publish this newsletter".to_string(),
            ));
        }

        newsletter.is_published = true;
        self.storage.update_newsletter(&newsletter).await?;
        info!(
            "Newsletter '{}' published by {}",
            newsletter.title, actor.username
        );
        self.newsletter_view(newsletter).await
    }

    pub async fn get_newsletter(&self, user: &User, newsletter_id: Uuid) -> Result<NewsletterView> {
        let newsletter = self.require_newsletter(newsletter_id).await?;
        if !newsletter.is_published {
            let user_id = user.id.expect("stored user always has an id");
            if newsletter.created_by != user_id && user.role != Role::Editor {
                return Err(NewsError::Forbidden(
                    "you don't have permission to view this newsletter".to_string(),
                ));
            }
        }
        self.newsletter_view(newsletter).await
    }

    pub async fn list_newsletters(&self, user: &User) -> Result<Vec<NewsletterView>> {
        let newsletters = match user.role {
            Role::Reader => {
                self.storage
                    .list_feed_newsletters(
                        &user.subscribed_publisher_ids,
                        &user.subscribed_journalist_ids,
                        DEFAULT_FEED_LIMIT,
                    )
                    .await?
            }
            _ => self.storage.list_published_newsletters(None).await?,
        };
        self.render_newsletters(newsletters).await
    }

    // ----- publishers -----

    pub async fn register_publisher(
        &self,
        owner: &User,
        draft: PublisherDraft,
    ) -> Result<Publisher> {
        if owner.role != Role::Editor {
            return Err(NewsError::Forbidden(
                "only editors can register publishing houses".to_string(),
            ));
        }
        if draft.name.trim().is_empty() || draft.name.chars().count() > MAX_TITLE_LEN {
            return Err(NewsError::Validation(
                "publisher name must be 1-200 characters".to_string(),
            ));
        }

        let owner_id = owner.id.expect("stored user always has an id");
        let mut publisher = Publisher {
            id: None,
            name: draft.name,
            description: draft.description,
            owner_id,
            editor_ids: vec![owner_id],
            journalist_ids: Vec::new(),
            created_at: Utc::now(),
        };
        self.storage.create_publisher(&mut publisher).await?;
        info!(
            "Publishing house '{}' registered by {}",
            publisher.name, owner.username
        );
        Ok(publisher)
    }

    /// Editors join as editors, journalists as journalists.
    pub async fn join_publisher(&self, user: &User, publisher_id: Uuid) -> Result<Publisher> {
        let mut publisher = self.require_publisher(publisher_id).await?;
        let user_id = user.id.expect("stored user always has an id");
        match user.role {
            Role::Editor => {
                if !publisher.editor_ids.contains(&user_id) {
                    publisher.editor_ids.push(user_id);
                }
            }
            Role::Journalist => {
                if !publisher.journalist_ids.contains(&user_id) {
                    publisher.journalist_ids.push(user_id);
                }
            }
            Role::Reader => {
                return Err(NewsError::Forbidden(
                    "only editors and journalists can join publishing houses".to_string(),
                ))
            }
        }
        self.storage.update_publisher(&publisher).await?;
        info!("{} joined publisher '{}'", user.username, publisher.name);
        Ok(publisher)
    }

    pub async fn list_publishers(&self) -> Result<Vec<Publisher>> {
        self.storage.list_publishers().await
    }

    pub async fn get_publisher(&self, publisher_id: Uuid) -> Result<Publisher> {
        self.require_publisher(publisher_id).await
    }

    pub async fn manage_staff(
        &self,
        actor: &User,
        publisher_id: Uuid,
        action: StaffAction,
    ) -> Result<Publisher> {
        let mut publisher = self.require_publisher(publisher_id).await?;
        let actor_id = actor.id.expect("stored user always has an id");
        if !publisher.is_staff_editor(actor_id) {
            return Err(NewsError::Forbidden(
                "you don't have permission to manage this publishing house".to_string(),
            ));
        }

        match action {
            StaffAction::AddEditor { username } => {
                let editor = self.require_user_in_role(&username, Role::Editor).await?;
                let editor_id = editor.id.expect("stored user always has an id");
                if !publisher.editor_ids.contains(&editor_id) {
                    publisher.editor_ids.push(editor_id);
                }
            }
            StaffAction::RemoveEditor { user_id } => {
                if user_id == publisher.owner_id {
                    return Err(NewsError::Validation(
                        "the owner cannot be removed from their publishing house".to_string(),
                    ));
                }
                publisher.editor_ids.retain(|id| *id != user_id);
            }
            StaffAction::AddJournalist { username } => {
                let journalist = self
                    .require_user_in_role(&username, Role::Journalist)
                    .await?;
                let journalist_id = journalist.id.expect("stored user always has an id");
                if !publisher.journalist_ids.contains(&journalist_id) {
                    publisher.journalist_ids.push(journalist_id);
                }
            }
            StaffAction::RemoveJournalist { user_id } => {
                publisher.journalist_ids.retain(|id| *id != user_id);
            }
        }

        self.storage.update_publisher(&publisher).await?;
        Ok(publisher)
    }

    // ----- subscriptions -----

    pub async fn get_subscriptions(&self, user: &User) -> Result<SubscriptionUpdate> {
        if user.role != Role::Reader {
            return Err(NewsError::Forbidden(
                "only readers can manage subscriptions".to_string(),
            ));
        }
        Ok(SubscriptionUpdate {
            publisher_ids: user.subscribed_publisher_ids.clone(),
            journalist_ids: user.subscribed_journalist_ids.clone(),
        })
    }

    pub async fn set_subscriptions(
        &self,
        user: &User,
        update: SubscriptionUpdate,
    ) -> Result<SubscriptionUpdate> {
        if user.role != Role::Reader {
            return Err(NewsError::Forbidden(
                "only readers can manage subscriptions".to_string(),
            ));
        }

        for pid in &update.publisher_ids {
            self.require_publisher(*pid).await?;
        }
        for jid in &update.journalist_ids {
            let target = self
                .storage
                .get_user(*jid)
                .await?
                .ok_or_else(|| NewsError::NotFound("journalist".to_string()))?;
            if target.role != Role::Journalist {
                return Err(NewsError::Validation(format!(
                    "'{}' is not a journalist",
                    target.username
                )));
            }
        }

        let mut updated = user.clone();
        updated.subscribed_publisher_ids = dedup(update.publisher_ids);
        updated.subscribed_journalist_ids = dedup(update.journalist_ids);
        self.storage.update_user(&updated).await?;
        info!("Subscriptions updated for {}", user.username);
        Ok(SubscriptionUpdate {
            publisher_ids: updated.subscribed_publisher_ids,
            journalist_ids: updated.subscribed_journalist_ids,
        })
    }

    // ----- helpers -----

    async fn require_article(&self, id: Uuid) -> Result<Article> {
        self.storage
            .get_article(id)
            .await?
            .ok_or_else(|| NewsError::NotFound("article".to_string()))
    }

    async fn require_newsletter(&self, id: Uuid) -> Result<Newsletter> {
        self.storage
            .get_newsletter(id)
            .await?
            .ok_or_else(|| NewsError::NotFound("newsletter".to_string()))
    }

    async fn require_publisher(&self, id: Uuid) -> Result<Publisher> {
        self.storage
            .get_publisher(id)
            .await?
            .ok_or_else(|| NewsError::NotFound("publisher".to_string()))
    }

    async fn require_user_in_role(&self, username: &str, role: Role) -> Result<User> {
        let user = self
            .storage
            .get_user_by_username(username)
            .await?
            .filter(|u| u.role == role)
            .ok_or_else(|| NewsError::NotFound(role.to_string()))?;
        Ok(user)
    }

    /// The original author, or any editor, may modify an article.
    fn require_article_write(&self, actor: &User, article: &Article) -> Result<()> {
        let actor_id = actor.id.expect("stored user always has an id");
        if article.journalist_id == actor_id || actor.role == Role::Editor {
            Ok(())
        } else {
            Err(NewsError::Forbidden(
                "you don't have permission to modify this article".to_string(),
            ))
        }
    }

    fn require_newsletter_write(&self, actor: &User, newsletter: &Newsletter) -> Result<()> {
        let actor_id = actor.id.expect("stored user always has an id");
        if newsletter.created_by == actor_id || actor.role == Role::Editor {
            Ok(())
        } else {
            Err(NewsError::Forbidden(
                "you don't have permission to modify this newsletter".to_string(),
            ))
        }
    }

    /// Publishers an editor owns or staffs, with their ids.
    async fn editor_publishers(&self, editor: &User) -> Result<(Vec<Publisher>, Vec<Uuid>)> {
        let editor_id = editor.id.expect("stored user always has an id");
        let publishers: Vec<Publisher> = self
            .storage
            .list_publishers()
            .await?
            .into_iter()
            .filter(|p| p.is_staff_editor(editor_id))
            .collect();
        let ids = publishers.iter().filter_map(|p| p.id).collect();
        Ok((publishers, ids))
    }

    async fn article_view(&self, article: Article) -> Result<ArticleView> {
        let journalist_name = self
            .storage
            .get_user(article.journalist_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| "unknown".to_string());
        let publisher_name = match article.publisher_id {
            Some(pid) => self.storage.get_publisher(pid).await?.map(|p| p.name),
            None => None,
        };
        Ok(ArticleView {
            article,
            journalist_name,
            publisher_name,
        })
    }

    async fn newsletter_view(&self, newsletter: Newsletter) -> Result<NewsletterView> {
        let created_by_name = self
            .storage
            .get_user(newsletter.created_by)
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| "unknown".to_string());
        let publisher_name = match newsletter.publisher_id {
            Some(pid) => self.storage.get_publisher(pid).await?.map(|p| p.name),
            None => None,
        };
        Ok(NewsletterView {
            newsletter,
            created_by_name,
            publisher_name,
        })
    }

    async fn render_articles(&self, articles: Vec<Article>) -> Result<Vec<ArticleView>> {
        let mut views = Vec::with_capacity(articles.len());
        for article in articles {
            views.push(self.article_view(article).await?);
        }
        Ok(views)
    }

    async fn render_newsletters(
        &self,
        newsletters: Vec<Newsletter>,
    ) -> Result<Vec<NewsletterView>> {
        let mut views = Vec::with_capacity(newsletters.len());
        for newsletter in newsletters {
            views.push(self.newsletter_view(newsletter).await?);
        }
        Ok(views)
    }
}

fn validate_content(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(NewsError::Validation(
            "title must be 1-200 characters".to_string(),
        ));
    }
    if content.trim().is_empty() {
        return Err(NewsError::Validation("content must not be empty".to_string()));
    }
    Ok(())
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids.dedup();
    ids
}
