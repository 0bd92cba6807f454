use crate::domain::{Article, Newsletter, Publisher, Role, Session, User};
use crate::error::{NewsError, Result};
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, ToSql};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

const ARTICLE_COLS: &str =
    "id, title, content, journalist_id, publisher_id, is_approved, approved_by, approved_at, created_at, updated_at";
const NEWSLETTER_COLS: &str =
    "id, title, content, created_by, publisher_id, is_published, created_at";

/// SQLite-backed storage. rusqlite is synchronous; the connection sits behind
/// a mutex and queries run inline on the async executor, which is fine for
/// the write rates this service sees.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply the schema. Idempotent; safe to run on every startup.
    pub fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(include_str!("../migrations/001_init.sql"))?;
        info!("Database migrations completed successfully");
        Ok(())
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| NewsError::Database(format!("invalid uuid '{s}': {e}")))
}

fn parse_opt_uuid(s: &Option<String>) -> Result<Option<Uuid>> {
    s.as_deref().map(parse_uuid).transpose()
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| NewsError::Database(format!("invalid timestamp '{s}': {e}")))
}

fn parse_opt_ts(s: &Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_ts).transpose()
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Placeholder list and text params for an `IN (...)` clause. An empty id set
/// becomes `IN (NULL)`, which matches nothing.
fn in_clause(ids: &[Uuid]) -> (String, Vec<String>) {
    if ids.is_empty() {
        ("NULL".to_string(), Vec::new())
    } else {
        (
            vec!["?"; ids.len()].join(", "),
            ids.iter().map(|id| id.to_string()).collect(),
        )
    }
}

struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    bio: String,
    created_at: String,
}

struct ArticleRow {
    id: String,
    title: String,
    content: String,
    journalist_id: String,
    publisher_id: Option<String>,
    is_approved: bool,
    approved_by: Option<String>,
    approved_at: Option<String>,
    created_at: String,
    updated_at: String,
}

struct NewsletterRow {
    id: String,
    title: String,
    content: String,
    created_by: String,
    publisher_id: Option<String>,
    is_published: bool,
    created_at: String,
}

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
        bio: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn read_article_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArticleRow> {
    Ok(ArticleRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        journalist_id: row.get(3)?,
        publisher_id: row.get(4)?,
        is_approved: row.get::<_, i64>(5)? != 0,
        approved_by: row.get(6)?,
        approved_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn read_newsletter_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NewsletterRow> {
    Ok(NewsletterRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_by: row.get(3)?,
        publisher_id: row.get(4)?,
        is_published: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

fn to_article(raw: ArticleRow) -> Result<Article> {
    Ok(Article {
        id: Some(parse_uuid(&raw.id)?),
        title: raw.title,
        content: raw.content,
        journalist_id: parse_uuid(&raw.journalist_id)?,
        publisher_id: parse_opt_uuid(&raw.publisher_id)?,
        is_approved: raw.is_approved,
        approved_by: parse_opt_uuid(&raw.approved_by)?,
        approved_at: parse_opt_ts(&raw.approved_at)?,
        created_at: parse_ts(&raw.created_at)?,
        updated_at: parse_ts(&raw.updated_at)?,
    })
}

fn to_newsletter(raw: NewsletterRow) -> Result<Newsletter> {
    Ok(Newsletter {
        id: Some(parse_uuid(&raw.id)?),
        title: raw.title,
        content: raw.content,
        created_by: parse_uuid(&raw.created_by)?,
        publisher_id: parse_opt_uuid(&raw.publisher_id)?,
        is_published: raw.is_published,
        created_at: parse_ts(&raw.created_at)?,
    })
}

fn load_id_list(conn: &Connection, sql: &str, key: &str) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(parse_uuid(&row?)?);
    }
    Ok(ids)
}

fn to_user(conn: &Connection, raw: UserRow) -> Result<User> {
    let subscribed_publisher_ids = load_id_list(
        conn,
        "SELECT publisher_id FROM publisher_subscriptions WHERE user_id = ?1",
        &raw.id,
    )?;
    let subscribed_journalist_ids = load_id_list(
        conn,
        "SELECT journalist_id FROM journalist_subscriptions WHERE user_id = ?1",
        &raw.id,
    )?;
    let role = Role::parse(&raw.role)
        .ok_or_else(|| NewsError::Database(format!("unknown role '{}'", raw.role)))?;
    Ok(User {
        id: Some(parse_uuid(&raw.id)?),
        username: raw.username,
        email: raw.email,
        password_hash: raw.password_hash,
        role,
        bio: raw.bio,
        subscribed_publisher_ids,
        subscribed_journalist_ids,
        created_at: parse_ts(&raw.created_at)?,
    })
}

fn write_subscriptions(conn: &Connection, user: &User, user_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM publisher_subscriptions WHERE user_id = ?1",
        params![user_id],
    )?;
    conn.execute(
        "DELETE FROM journalist_subscriptions WHERE user_id = ?1",
        params![user_id],
    )?;
    for pid in &user.subscribed_publisher_ids {
        conn.execute(
            "INSERT OR IGNORE INTO publisher_subscriptions (user_id, publisher_id) VALUES (?1, ?2)",
            params![user_id, pid.to_string()],
        )?;
    }
    for jid in &user.subscribed_journalist_ids {
        conn.execute(
            "INSERT OR IGNORE INTO journalist_subscriptions (user_id, journalist_id) VALUES (?1, ?2)",
            params![user_id, jid.to_string()],
        )?;
    }
    Ok(())
}

fn write_staff(conn: &Connection, publisher: &Publisher, publisher_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM publisher_editors WHERE publisher_id = ?1",
        params![publisher_id],
    )?;
    conn.execute(
        "DELETE FROM publisher_journalists WHERE publisher_id = ?1",
        params![publisher_id],
    )?;
    for eid in &publisher.editor_ids {
        conn.execute(
            "INSERT OR IGNORE INTO publisher_editors (publisher_id, user_id) VALUES (?1, ?2)",
            params![publisher_id, eid.to_string()],
        )?;
    }
    for jid in &publisher.journalist_ids {
        conn.execute(
            "INSERT OR IGNORE INTO publisher_journalists (publisher_id, user_id) VALUES (?1, ?2)",
            params![publisher_id, jid.to_string()],
        )?;
    }
    Ok(())
}

fn load_publisher(conn: &Connection, id: &str) -> Result<Option<Publisher>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, owner_id, created_at FROM publishers WHERE id = ?1",
    )?;
    let raw = stmt
        .query_map(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .next()
        .transpose()?;
    let Some((id, name, description, owner_id, created_at)) = raw else {
        return Ok(None);
    };
    let editor_ids = load_id_list(
        conn,
        "SELECT user_id FROM publisher_editors WHERE publisher_id = ?1",
        &id,
    )?;
    let journalist_ids = load_id_list(
        conn,
        "SELECT user_id FROM publisher_journalists WHERE publisher_id = ?1",
        &id,
    )?;
    Ok(Some(Publisher {
        id: Some(parse_uuid(&id)?),
        name,
        description,
        owner_id: parse_uuid(&owner_id)?,
        editor_ids,
        journalist_ids,
        created_at: parse_ts(&created_at)?,
    }))
}

fn query_articles<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Article>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, read_article_row)?;
    let mut articles = Vec::new();
    for row in rows {
        articles.push(to_article(row?)?);
    }
    Ok(articles)
}

fn query_newsletters<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Newsletter>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, read_newsletter_row)?;
    let mut newsletters = Vec::new();
    for row in rows {
        newsletters.push(to_newsletter(row?)?);
    }
    Ok(newsletters)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_user(&self, user: &mut User) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4();
        let result = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, role, bio, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                user.username,
                user.email,
                user.password_hash,
                user.role.as_str(),
                user.bio,
                user.created_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(NewsError::Conflict(format!(
                    "username '{}' already exists",
                    user.username
                )))
            }
            Err(e) => return Err(e.into()),
        }
        user.id = Some(id);
        write_subscriptions(&conn, user, &id.to_string())?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let raw = {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password_hash, role, bio, created_at
                 FROM users WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id.to_string()], read_user_row)?;
            rows.next().transpose()?
        };
        raw.map(|r| to_user(&conn, r)).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let raw = {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password_hash, role, bio, created_at
                 FROM users WHERE username = ?1 COLLATE NOCASE",
            )?;
            let mut rows = stmt.query_map(params![username], read_user_row)?;
            rows.next().transpose()?
        };
        raw.map(|r| to_user(&conn, r)).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let user_id = user
            .id
            .ok_or_else(|| NewsError::Database("cannot update user without ID".to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET username = ?2, email = ?3, password_hash = ?4, role = ?5, bio = ?6
             WHERE id = ?1",
            params![
                user_id.to_string(),
                user.username,
                user.email,
                user.password_hash,
                user.role.as_str(),
                user.bio,
            ],
        )?;
        write_subscriptions(&conn, user, &user_id.to_string())?;
        Ok(())
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>> {
        let conn = self.conn.lock().unwrap();
        let raws: Vec<UserRow> = {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password_hash, role, bio, created_at
                 FROM users WHERE role = ?1 ORDER BY username",
            )?;
            let rows = stmt.query_map(params![role.as_str()], read_user_row)?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        raws.into_iter().map(|r| to_user(&conn, r)).collect()
    }

    async fn create_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                session.token,
                session.user_id.to_string(),
                session.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT token, user_id, created_at FROM sessions WHERE token = ?1")?;
        let raw = stmt
            .query_map(params![token], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .next()
            .transpose()?;
        let Some((token, user_id, created_at)) = raw else {
            return Ok(None);
        };
        Ok(Some(Session {
            token,
            user_id: parse_uuid(&user_id)?,
            created_at: parse_ts(&created_at)?,
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    async fn create_publisher(&self, publisher: &mut Publisher) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO publishers (id, name, description, owner_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                publisher.name,
                publisher.description,
                publisher.owner_id.to_string(),
                publisher.created_at.to_rfc3339(),
            ],
        )?;
        publisher.id = Some(id);
        write_staff(&conn, publisher, &id.to_string())?;
        Ok(())
    }

    async fn get_publisher(&self, id: Uuid) -> Result<Option<Publisher>> {
        let conn = self.conn.lock().unwrap();
        load_publisher(&conn, &id.to_string())
    }

    async fn update_publisher(&self, publisher: &Publisher) -> Result<()> {
        let publisher_id = publisher
            .id
            .ok_or_else(|| NewsError::Database("cannot update publisher without ID".to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE publishers SET name = ?2, description = ?3, owner_id = ?4 WHERE id = ?1",
            params![
                publisher_id.to_string(),
                publisher.name,
                publisher.description,
                publisher.owner_id.to_string(),
            ],
        )?;
        write_staff(&conn, publisher, &publisher_id.to_string())?;
        Ok(())
    }

    async fn list_publishers(&self) -> Result<Vec<Publisher>> {
        let conn = self.conn.lock().unwrap();
        let ids: Vec<String> = {
            let mut stmt = conn.prepare("SELECT id FROM publishers ORDER BY name")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        let mut publishers = Vec::new();
        for id in ids {
            if let Some(publisher) = load_publisher(&conn, &id)? {
                publishers.push(publisher);
            }
        }
        Ok(publishers)
    }

    async fn create_article(&self, article: &mut Article) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4();
        conn.execute(
            &format!("INSERT INTO articles ({ARTICLE_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                id.to_string(),
                article.title,
                article.content,
                article.journalist_id.to_string(),
                article.publisher_id.map(|p| p.to_string()),
                article.is_approved as i64,
                article.approved_by.map(|u| u.to_string()),
                article.approved_at.map(|t| t.to_rfc3339()),
                article.created_at.to_rfc3339(),
                article.updated_at.to_rfc3339(),
            ],
        )?;
        article.id = Some(id);
        Ok(())
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
        let conn = self.conn.lock().unwrap();
        let articles = query_articles(
            &conn,
            &format!("SELECT {ARTICLE_COLS} FROM articles WHERE id = ?1"),
            params![id.to_string()],
        )?;
        Ok(articles.into_iter().next())
    }

    async fn update_article(&self, article: &Article) -> Result<()> {
        let article_id = article
            .id
            .ok_or_else(|| NewsError::Database("cannot update article without ID".to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE articles SET title = ?2, content = ?3, publisher_id = ?4, is_approved = ?5,
                 approved_by = ?6, approved_at = ?7, updated_at = ?8
             WHERE id = ?1",
            params![
                article_id.to_string(),
                article.title,
                article.content,
                article.publisher_id.map(|p| p.to_string()),
                article.is_approved as i64,
                article.approved_by.map(|u| u.to_string()),
                article.approved_at.map(|t| t.to_rfc3339()),
                article.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn delete_article(&self, id: Uuid) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM articles WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    async fn list_approved_articles(&self, limit: Option<usize>) -> Result<Vec<Article>> {
        let conn = self.conn.lock().unwrap();
        match limit {
            Some(limit) => query_articles(
                &conn,
                &format!(
                    "SELECT {ARTICLE_COLS} FROM articles WHERE is_approved = 1
                     ORDER BY created_at DESC LIMIT ?1"
                ),
                params![limit as i64],
            ),
            None => query_articles(
                &conn,
                &format!(
                    "SELECT {ARTICLE_COLS} FROM articles WHERE is_approved = 1
                     ORDER BY created_at DESC"
                ),
                [],
            ),
        }
    }

    async fn list_articles_by_journalist(&self, journalist_id: Uuid) -> Result<Vec<Article>> {
        let conn = self.conn.lock().unwrap();
        query_articles(
            &conn,
            &format!(
                "SELECT {ARTICLE_COLS} FROM articles WHERE journalist_id = ?1
                 ORDER BY created_at DESC"
            ),
            params![journalist_id.to_string()],
        )
    }

    async fn list_pending_articles(&self, publisher_ids: &[Uuid]) -> Result<Vec<Article>> {
        let conn = self.conn.lock().unwrap();
        let (clause, ids) = in_clause(publisher_ids);
        query_articles(
            &conn,
            &format!(
                "SELECT {ARTICLE_COLS} FROM articles
                 WHERE is_approved = 0 AND publisher_id IN ({clause})
                 ORDER BY created_at DESC"
            ),
            params_from_iter(ids),
        )
    }

    async fn list_publisher_articles(
        &self,
        publisher_ids: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Article>> {
        let conn = self.conn.lock().unwrap();
        let (clause, ids) = in_clause(publisher_ids);
        let mut params: Vec<Box<dyn ToSql>> = ids
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn ToSql>)
            .collect();
        params.push(Box::new(limit as i64));
        query_articles(
            &conn,
            &format!(
                "SELECT {ARTICLE_COLS} FROM articles WHERE publisher_id IN ({clause})
                 ORDER BY created_at DESC LIMIT ?"
            ),
            params_from_iter(params),
        )
    }

    async fn list_feed_articles(
        &self,
        publisher_ids: &[Uuid],
        journalist_ids: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Article>> {
        let conn = self.conn.lock().unwrap();
        let (pub_clause, pub_ids) = in_clause(publisher_ids);
        let (journo_clause, journo_ids) = in_clause(journalist_ids);
        let mut params: Vec<Box<dyn ToSql>> = pub_ids
            .into_iter()
            .chain(journo_ids)
            .map(|s| Box::new(s) as Box<dyn ToSql>)
            .collect();
        params.push(Box::new(limit as i64));
        query_articles(
            &conn,
            &format!(
                "SELECT {ARTICLE_COLS} FROM articles
                 WHERE is_approved = 1
                   AND (publisher_id IN ({pub_clause}) OR journalist_id IN ({journo_clause}))
                 ORDER BY created_at DESC LIMIT ?"
            ),
            params_from_iter(params),
        )
    }

    async fn create_newsletter(&self, newsletter: &mut Newsletter) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4();
        conn.execute(
            &format!("INSERT INTO newsletters ({NEWSLETTER_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                id.to_string(),
                newsletter.title,
                newsletter.content,
                newsletter.created_by.to_string(),
                newsletter.publisher_id.map(|p| p.to_string()),
                newsletter.is_published as i64,
                newsletter.created_at.to_rfc3339(),
            ],
        )?;
        newsletter.id = Some(id);
        Ok(())
    }

    async fn get_newsletter(&self, id: Uuid) -> Result<Option<Newsletter>> {
        let conn = self.conn.lock().unwrap();
        let newsletters = query_newsletters(
            &conn,
            &format!("SELECT {NEWSLETTER_COLS} FROM newsletters WHERE id = ?1"),
            params![id.to_string()],
        )?;
        Ok(newsletters.into_iter().next())
    }

    async fn update_newsletter(&self, newsletter: &Newsletter) -> Result<()> {
        let newsletter_id = newsletter.id.ok_or_else(|| {
            NewsError::Database("cannot update newsletter without ID".to_string())
        })?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE newsletters SET title = ?2, content = ?3, publisher_id = ?4, is_published = ?5
             WHERE id = ?1",
            params![
                newsletter_id.to_string(),
                newsletter.title,
                newsletter.content,
                newsletter.publisher_id.map(|p| p.to_string()),
                newsletter.is_published as i64,
            ],
        )?;
        Ok(())
    }

    async fn delete_newsletter(&self, id: Uuid) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM newsletters WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    async fn list_published_newsletters(&self, limit: Option<usize>) -> Result<Vec<Newsletter>> {
        let conn = self.conn.lock().unwrap();
        match limit {
            Some(limit) => query_newsletters(
                &conn,
                &format!(
                    "SELECT {NEWSLETTER_COLS} FROM newsletters WHERE is_published = 1
                     ORDER BY created_at DESC LIMIT ?1"
                ),
                params![limit as i64],
            ),
            None => query_newsletters(
                &conn,
                &format!(
                    "SELECT {NEWSLETTER_COLS} FROM newsletters WHERE is_published = 1
                     ORDER BY created_at DESC"
                ),
                [],
            ),
        }
    }

    async fn list_newsletters_by_creator(&self, creator_id: Uuid) -> Result<Vec<Newsletter>> {
        let conn = self.conn.lock().unwrap();
        query_newsletters(
            &conn,
            &format!(
                "SELECT {NEWSLETTER_COLS} FROM newsletters WHERE created_by = ?1
                 ORDER BY created_at DESC"
            ),
            params![creator_id.to_string()],
        )
    }

    async fn list_feed_newsletters(
        &self,
        publisher_ids: &[Uuid],
        journalist_ids: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Newsletter>> {
        let conn = self.conn.lock().unwrap();
        let (pub_clause, pub_ids) = in_clause(publisher_ids);
        let (journo_clause, journo_ids) = in_clause(journalist_ids);
        let mut params: Vec<Box<dyn ToSql>> = pub_ids
            .into_iter()
            .chain(journo_ids)
            .map(|s| Box::new(s) as Box<dyn ToSql>)
            .collect();
        params.push(Box::new(limit as i64));
        query_newsletters(
            &conn,
            &format!(
                "SELECT {NEWSLETTER_COLS} FROM newsletters
                 WHERE is_published = 1
                   AND (publisher_id IN ({pub_clause}) OR created_by IN ({journo_clause}))
                 ORDER BY created_at DESC LIMIT ?"
            ),
            params_from_iter(params),
        )
    }
}
