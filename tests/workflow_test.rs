use anyhow::Result;
use newsroom::domain::Role;
use newsroom::error::NewsError;
use newsroom::notify::NoopNotifier;
use newsroom::service::{
    ArticleDraft, Dashboard, NewsService, NewsletterDraft, PublisherDraft, RegisterRequest,
    StaffAction, SubscriptionUpdate, DEFAULT_FEED_LIMIT,
};
use newsroom::storage::InMemoryStorage;
use std::sync::Arc;

fn service() -> NewsService {
    NewsService::new(Arc::new(InMemoryStorage::new()), Arc::new(NoopNotifier))
}

fn register_req(username: &str, role: Role) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "testpass123".to_string(),
        role,
        bio: String::new(),
    }
}

#[tokio::test]
async fn publisher_article_approval_workflow() -> Result<()> {
    let service = service();

    let editor_auth = service.register(register_req("editor", Role::Editor)).await?;
    let journo_auth = service
        .register(register_req("journalist", Role::Journalist))
        .await?;
    let reader_auth = service.register(register_req("reader", Role::Reader)).await?;

    let editor = service.authenticate(&editor_auth.token).await?;
    let journalist = service.authenticate(&journo_auth.token).await?;
    let reader = service.authenticate(&reader_auth.token).await?;

    // Editor opens a publishing house; journalist joins it
    let publisher = service
        .register_publisher(
            &editor,
            PublisherDraft {
                name: "Daily Bugle".to_string(),
                description: "city desk".to_string(),
            },
        )
        .await?;
    let publisher_id = publisher.id.unwrap();
    assert!(publisher.is_staff_editor(editor.id.unwrap()));

    service.join_publisher(&journalist, publisher_id).await?;

    // A publisher-bound article waits for approval
    let article = service
        .create_article(
            &journalist,
            ArticleDraft {
                title: "Big story".to_string(),
                content: "Something happened.".to_string(),
                publisher_id: Some(publisher_id),
            },
        )
        .await?;
    assert!(!article.article.is_approved);
    assert_eq!(article.publisher_name.as_deref(), Some("Daily Bugle"));

    // Reader subscribes to the publisher but sees nothing yet
    service
        .set_subscriptions(
            &reader,
            SubscriptionUpdate {
                publisher_ids: vec![publisher_id],
                journalist_ids: vec![],
            },
        )
        .await?;
    let reader = service.authenticate(&reader_auth.token).await?;
    assert!(service.list_articles(&reader).await?.is_empty());

    // Editor's queue shows the pending article
    match service.dashboard(&editor).await? {
        Dashboard::Editor { pending, .. } => {
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].article.title, "Big story");
        }
        _ => panic!("expected editor dashboard"),
    }

    // Approval publishes it to subscribers
    let approved = service
        .approve_article(&editor, article.article.id.unwrap())
        .await?;
    assert!(approved.article.is_approved);
    assert_eq!(approved.article.approved_by, editor.id);
    assert!(approved.article.approved_at.is_some());

    let feed = service.list_articles(&reader).await?;
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].article.title, "Big story");

    // Approving twice is a conflict
    let err = service
        .approve_article(&editor, article.article.id.unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, NewsError::Conflict(_)));

    Ok(())
}

#[tokio::test]
async fn independent_articles_are_live_immediately() -> Result<()> {
    let service = service();
    let journo_auth = service
        .register(register_req("indie", Role::Journalist))
        .await?;
    let journalist = service.authenticate(&journo_auth.token).await?;

    let article = service
        .create_article(
            &journalist,
            ArticleDraft {
                title: "Solo piece".to_string(),
                content: "No publisher involved.".to_string(),
                publisher_id: None,
            },
        )
        .await?;
    assert!(article.article.is_approved);
    assert!(article.article.approved_by.is_none());

    let home = service.home_feed(10).await?;
    assert_eq!(home.len(), 1);
    assert_eq!(home[0].journalist_name, "indie");
    Ok(())
}

#[tokio::test]
async fn role_checks_guard_the_workflow() -> Result<()> {
    let service = service();
    let reader_auth = service.register(register_req("reader", Role::Reader)).await?;
    let journo_auth = service
        .register(register_req("journo", Role::Journalist))
        .await?;
    let editor_auth = service.register(register_req("editor", Role::Editor)).await?;
    let outsider_auth = service
        .register(register_req("outsider", Role::Editor))
        .await?;

    let reader = service.authenticate(&reader_auth.token).await?;
    let journalist = service.authenticate(&journo_auth.token).await?;
    let editor = service.authenticate(&editor_auth.token).await?;
    let outsider = service.authenticate(&outsider_auth.token).await?;

    // Readers cannot author content or register publishers
    let draft = ArticleDraft {
        title: "t".to_string(),
        content: "c".to_string(),
        publisher_id: None,
    };
    assert!(matches!(
        service.create_article(&reader, draft.clone()).await,
        Err(NewsError::Forbidden(_))
    ));
    assert!(matches!(
        service
            .register_publisher(
                &reader,
                PublisherDraft {
                    name: "Nope".to_string(),
                    description: String::new()
                }
            )
            .await,
        Err(NewsError::Forbidden(_))
    ));

    let publisher = service
        .register_publisher(
            &editor,
            PublisherDraft {
                name: "House".to_string(),
                description: String::new(),
            },
        )
        .await?;
    let publisher_id = publisher.id.unwrap();

    // A journalist cannot submit to a house they have not joined
    assert!(matches!(
        service
            .create_article(
                &journalist,
                ArticleDraft {
                    title: "t".to_string(),
                    content: "c".to_string(),
                    publisher_id: Some(publisher_id),
                }
            )
            .await,
        Err(NewsError::Forbidden(_))
    ));

    service.join_publisher(&journalist, publisher_id).await?;
    let article = service
        .create_article(
            &journalist,
            ArticleDraft {
                title: "t".to_string(),
                content: "c".to_string(),
                publisher_id: Some(publisher_id),
            },
        )
        .await?;
    let article_id = article.article.id.unwrap();

    // Journalists cannot approve; editors of other houses cannot approve
    assert!(matches!(
        service.approve_article(&journalist, article_id).await,
        Err(NewsError::Forbidden(_))
    ));
    assert!(matches!(
        service.approve_article(&outsider, article_id).await,
        Err(NewsError::Forbidden(_))
    ));

    // The pending article is invisible to the reader, visible to its
    // author and to the reviewing editor
    assert!(matches!(
        service.get_article(&reader, article_id).await,
        Err(NewsError::Forbidden(_))
    ));
    assert!(service.get_article(&journalist, article_id).await.is_ok());
    assert!(service.get_article(&editor, article_id).await.is_ok());

    Ok(())
}

#[tokio::test]
async fn attaching_a_publisher_on_update_requires_membership() -> Result<()> {
    let service = service();
    let editor_auth = service.register(register_req("editor", Role::Editor)).await?;
    let journo_auth = service
        .register(register_req("journo", Role::Journalist))
        .await?;
    let editor = service.authenticate(&editor_auth.token).await?;
    let journalist = service.authenticate(&journo_auth.token).await?;

    let publisher = service
        .register_publisher(
            &editor,
            PublisherDraft {
                name: "House".to_string(),
                description: String::new(),
            },
        )
        .await?;
    let publisher_id = publisher.id.unwrap();

    // An independent article is live from creation
    let article = service
        .create_article(
            &journalist,
            ArticleDraft {
                title: "Solo".to_string(),
                content: "c".to_string(),
                publisher_id: None,
            },
        )
        .await?;
    let article_id = article.article.id.unwrap();
    assert!(article.article.is_approved);

    // Moving it into a house the author never joined is refused
    let attach = ArticleDraft {
        title: "Solo".to_string(),
        content: "c".to_string(),
        publisher_id: Some(publisher_id),
    };
    assert!(matches!(
        service
            .update_article(&journalist, article_id, attach.clone())
            .await,
        Err(NewsError::Forbidden(_))
    ));

    // After joining, the move lands in the approval queue
    service.join_publisher(&journalist, publisher_id).await?;
    let moved = service
        .update_article(&journalist, article_id, attach)
        .await?;
    assert!(!moved.article.is_approved);

    Ok(())
}

#[tokio::test]
async fn edits_keep_approval_once_an_editor_signed_off() -> Result<()> {
    let service = service();
    let editor_auth = service.register(register_req("editor", Role::Editor)).await?;
    let journo_auth = service
        .register(register_req("journo", Role::Journalist))
        .await?;
    let editor = service.authenticate(&editor_auth.token).await?;
    let journalist = service.authenticate(&journo_auth.token).await?;

    let first = service
        .register_publisher(
            &editor,
            PublisherDraft {
                name: "First House".to_string(),
                description: String::new(),
            },
        )
        .await?;
    let second = service
        .register_publisher(
            &editor,
            PublisherDraft {
                name: "Second House".to_string(),
                description: String::new(),
            },
        )
        .await?;
    service.join_publisher(&journalist, first.id.unwrap()).await?;
    service
        .join_publisher(&journalist, second.id.unwrap())
        .await?;

    let article = service
        .create_article(
            &journalist,
            ArticleDraft {
                title: "Story".to_string(),
                content: "c".to_string(),
                publisher_id: first.id,
            },
        )
        .await?;
    let article_id = article.article.id.unwrap();
    service.approve_article(&editor, article_id).await?;

    // A reviewed article stays approved when it moves to another house
    let moved = service
        .update_article(
            &journalist,
            article_id,
            ArticleDraft {
                title: "Story, revised".to_string(),
                content: "c".to_string(),
                publisher_id: second.id,
            },
        )
        .await?;
    assert!(moved.article.is_approved);
    assert_eq!(moved.article.approved_by, editor.id);

    Ok(())
}

#[tokio::test]
async fn staff_collections_are_not_capped() -> Result<()> {
    let service = service();
    let editor_auth = service.register(register_req("editor", Role::Editor)).await?;
    let journo_auth = service
        .register(register_req("prolific", Role::Journalist))
        .await?;
    let editor = service.authenticate(&editor_auth.token).await?;
    let journalist = service.authenticate(&journo_auth.token).await?;

    let total = DEFAULT_FEED_LIMIT + 2;
    for n in 0..total {
        service
            .create_article(
                &journalist,
                ArticleDraft {
                    title: format!("Piece {n}"),
                    content: "c".to_string(),
                    publisher_id: None,
                },
            )
            .await?;
    }

    // Journalists and editors see the whole approved collection
    assert_eq!(service.list_articles(&journalist).await?.len(), total);
    assert_eq!(service.list_articles(&editor).await?.len(), total);

    // The public home feed keeps its cap
    assert_eq!(
        service.home_feed(DEFAULT_FEED_LIMIT).await?.len(),
        DEFAULT_FEED_LIMIT
    );

    Ok(())
}

#[tokio::test]
async fn staff_management_rules() -> Result<()> {
    let service = service();
    let owner_auth = service.register(register_req("owner", Role::Editor)).await?;
    let helper_auth = service.register(register_req("helper", Role::Editor)).await?;
    let journo_auth = service
        .register(register_req("scribe", Role::Journalist))
        .await?;

    let owner = service.authenticate(&owner_auth.token).await?;
    let helper = service.authenticate(&helper_auth.token).await?;
    let journalist = service.authenticate(&journo_auth.token).await?;

    let publisher = service
        .register_publisher(
            &owner,
            PublisherDraft {
                name: "House".to_string(),
                description: String::new(),
            },
        )
        .await?;
    let publisher_id = publisher.id.unwrap();

    // A non-staff editor cannot manage the house
    assert!(matches!(
        service
            .manage_staff(
                &helper,
                publisher_id,
                StaffAction::AddJournalist {
                    username: "scribe".to_string()
                }
            )
            .await,
        Err(NewsError::Forbidden(_))
    ));

    // Owner staffs the house
    let publisher = service
        .manage_staff(
            &owner,
            publisher_id,
            StaffAction::AddEditor {
                username: "helper".to_string(),
            },
        )
        .await?;
    assert!(publisher.is_staff_editor(helper.id.unwrap()));

    let publisher = service
        .manage_staff(
            &helper,
            publisher_id,
            StaffAction::AddJournalist {
                username: "scribe".to_string(),
            },
        )
        .await?;
    assert!(publisher.has_journalist(journalist.id.unwrap()));

    // Unknown usernames are a not-found error
    assert!(matches!(
        service
            .manage_staff(
                &owner,
                publisher_id,
                StaffAction::AddEditor {
                    username: "ghost".to_string()
                }
            )
            .await,
        Err(NewsError::NotFound(_))
    ));

    // The owner cannot be removed
    assert!(matches!(
        service
            .manage_staff(
                &helper,
                publisher_id,
                StaffAction::RemoveEditor {
                    user_id: owner.id.unwrap()
                }
            )
            .await,
        Err(NewsError::Validation(_))
    ));

    Ok(())
}

#[tokio::test]
async fn subscription_rules() -> Result<()> {
    let service = service();
    let reader_auth = service.register(register_req("reader", Role::Reader)).await?;
    let journo_auth = service
        .register(register_req("journo", Role::Journalist))
        .await?;
    let other_reader_auth = service.register(register_req("other", Role::Reader)).await?;

    let reader = service.authenticate(&reader_auth.token).await?;
    let journalist = service.authenticate(&journo_auth.token).await?;
    let other_reader = service.authenticate(&other_reader_auth.token).await?;

    // Only readers manage subscriptions
    assert!(matches!(
        service
            .set_subscriptions(
                &journalist,
                SubscriptionUpdate {
                    publisher_ids: vec![],
                    journalist_ids: vec![]
                }
            )
            .await,
        Err(NewsError::Forbidden(_))
    ));

    // Subscribing to a non-journalist is rejected
    assert!(matches!(
        service
            .set_subscriptions(
                &reader,
                SubscriptionUpdate {
                    publisher_ids: vec![],
                    journalist_ids: vec![other_reader.id.unwrap()],
                }
            )
            .await,
        Err(NewsError::Validation(_))
    ));

    let subs = service
        .set_subscriptions(
            &reader,
            SubscriptionUpdate {
                publisher_ids: vec![],
                journalist_ids: vec![journalist.id.unwrap()],
            },
        )
        .await?;
    assert_eq!(subs.journalist_ids, vec![journalist.id.unwrap()]);

    // The feed follows the subscription
    let article = service
        .create_article(
            &journalist,
            ArticleDraft {
                title: "Followed".to_string(),
                content: "c".to_string(),
                publisher_id: None,
            },
        )
        .await?;
    let reader = service.authenticate(&reader_auth.token).await?;
    let feed = service.list_articles(&reader).await?;
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].article.id, article.article.id);

    // An unsubscribed reader sees nothing
    assert!(service.list_articles(&other_reader).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn newsletter_publish_flow() -> Result<()> {
    let service = service();
    let journo_auth = service
        .register(register_req("writer", Role::Journalist))
        .await?;
    let reader_auth = service.register(register_req("fan", Role::Reader)).await?;

    let journalist = service.authenticate(&journo_auth.token).await?;
    let reader = service.authenticate(&reader_auth.token).await?;

    service
        .set_subscriptions(
            &reader,
            SubscriptionUpdate {
                publisher_ids: vec![],
                journalist_ids: vec![journalist.id.unwrap()],
            },
        )
        .await?;
    let reader = service.authenticate(&reader_auth.token).await?;

    let newsletter = service
        .create_newsletter(
            &journalist,
            NewsletterDraft {
                title: "Weekly digest".to_string(),
                content: "This week...".to_string(),
                publisher_id: None,
            },
        )
        .await?;
    assert!(!newsletter.newsletter.is_published);

    // Unpublished newsletters stay out of the reader's feed
    assert!(service.list_newsletters(&reader).await?.is_empty());

    // Readers cannot publish someone else's newsletter
    let newsletter_id = newsletter.newsletter.id.unwrap();
    assert!(matches!(
        service.publish_newsletter(&reader, newsletter_id).await,
        Err(NewsError::Forbidden(_))
    ));

    let published = service
        .publish_newsletter(&journalist, newsletter_id)
        .await?;
    assert!(published.newsletter.is_published);

    let feed = service.list_newsletters(&reader).await?;
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].created_by_name, "writer");

    Ok(())
}

#[tokio::test]
async fn login_and_logout() -> Result<()> {
    let service = service();
    service.register(register_req("alice", Role::Reader)).await?;

    // Wrong password fails without leaking which part was wrong
    let err = service
        .login(newsroom::service::LoginRequest {
            username: "alice".to_string(),
            password: "wrongpassword".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, NewsError::Unauthorized(_)));

    let auth = service
        .login(newsroom::service::LoginRequest {
            username: "alice".to_string(),
            password: "testpass123".to_string(),
        })
        .await?;
    assert!(service.authenticate(&auth.token).await.is_ok());

    service.logout(&auth.token).await?;
    assert!(matches!(
        service.authenticate(&auth.token).await,
        Err(NewsError::Unauthorized(_))
    ));

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let service = service();
    service.register(register_req("taken", Role::Reader)).await?;
    let err = service
        .register(register_req("taken", Role::Editor))
        .await
        .unwrap_err();
    assert!(matches!(err, NewsError::Conflict(_)));
    Ok(())
}
