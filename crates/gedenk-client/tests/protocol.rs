//! The deferred-toggle flow from click to replay, over a real server.

use std::sync::Arc;

use uuid::Uuid;

use gedenk_api::auth::{AppState, AppStateInner};
use gedenk_client::ApiClient;
use gedenk_core::{
    ClickOutcome, DeferredAction, DeferredKind, DeferredQueue, FileSlot, ReactionBackend,
    ReactionPanel,
};
use gedenk_db::Database;
use gedenk_types::models::{MemorialKind, PrivacyLevel};
use gedenk_types::reaction::ReactionType;

async fn spawn_server() -> String {
    let db = Database::open_in_memory().expect("in-memory db");
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: "test-geheimnis".into(),
    });
    let app = gedenk_api::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn slot_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("gedenk-slot-{}.json", Uuid::new_v4()))
}

#[tokio::test]
async fn anonymous_click_is_replayed_after_authentication() {
    let base = spawn_server().await;

    let creator = ApiClient::new(base.as_str());
    let registered = creator.register("ersteller", "korrekt-pferd-batterie").await.unwrap();
    let creator = creator.with_bearer(registered.token);
    let memorial = creator
        .create_memorial("Anna Beispiel", MemorialKind::Person, PrivacyLevel::Public)
        .await
        .unwrap();

    // Anonymous visitor clicks: deferred, no store call.
    let slot = slot_path();
    let anon_panel = ReactionPanel::new(
        memorial.id,
        ApiClient::new(base.as_str()),
        DeferredQueue::new(FileSlot::new(&slot)),
    );
    anon_panel.load().await.unwrap();
    let outcome = anon_panel.click(None, ReactionType::Liebe).await.unwrap();
    assert_eq!(outcome, ClickOutcome::AuthRequired);
    let server_view = ApiClient::new(base.as_str()).fetch(memorial.id).await.unwrap();
    assert_eq!(server_view.count(ReactionType::Liebe), 0);

    // Thirty seconds later, so to speak: the visitor comes back authenticated,
    // still viewing the same memorial. The record replays exactly once.
    let visitor = ApiClient::new(base.as_str());
    let registered = visitor.register("besucherin", "korrekt-pferd-batterie").await.unwrap();
    let visitor = visitor.with_bearer(registered.token);

    let panel = ReactionPanel::new(memorial.id, visitor, DeferredQueue::new(FileSlot::new(&slot)));
    panel.load().await.unwrap();

    assert!(panel.on_authenticated(registered.user_id).await);
    let snap = panel.snapshot();
    assert_eq!(snap.count(ReactionType::Liebe), 1);
    assert!(snap.is_active(ReactionType::Liebe));

    // Consumed: a second transition replays nothing.
    assert!(!panel.on_authenticated(registered.user_id).await);
    assert_eq!(panel.snapshot().count(ReactionType::Liebe), 1);
}

#[tokio::test]
async fn expired_deferred_click_is_discarded() {
    let base = spawn_server().await;

    let creator = ApiClient::new(base.as_str());
    let registered = creator.register("ersteller", "korrekt-pferd-batterie").await.unwrap();
    let creator = creator.with_bearer(registered.token);
    let memorial = creator
        .create_memorial("Bello", MemorialKind::Pet, PrivacyLevel::Public)
        .await
        .unwrap();

    // A record from six minutes ago, as if authentication took too long.
    let slot = slot_path();
    let queue = DeferredQueue::new(FileSlot::new(&slot));
    queue
        .enqueue(&DeferredAction {
            memorial_id: memorial.id,
            kind: DeferredKind::ToggleReaction(ReactionType::Liebe),
            created_at: chrono::Utc::now() - chrono::Duration::minutes(6),
        })
        .unwrap();

    let visitor = ApiClient::new(base.as_str());
    let registered = visitor.register("spaet", "korrekt-pferd-batterie").await.unwrap();
    let visitor = visitor.with_bearer(registered.token);

    let panel = ReactionPanel::new(memorial.id, visitor, DeferredQueue::new(FileSlot::new(&slot)));
    panel.load().await.unwrap();

    assert!(!panel.on_authenticated(registered.user_id).await);
    assert_eq!(panel.snapshot().count(ReactionType::Liebe), 0);
    assert!(!slot.exists());
}

#[tokio::test]
async fn optimistic_toggle_reconciles_with_the_server() {
    let base = spawn_server().await;

    let client = ApiClient::new(base.as_str());
    let registered = client.register("besucher", "korrekt-pferd-batterie").await.unwrap();
    let client = client.with_bearer(registered.token);
    let memorial = client
        .create_memorial("Anna Beispiel", MemorialKind::Person, PrivacyLevel::Public)
        .await
        .unwrap();

    let panel = ReactionPanel::new(
        memorial.id,
        client,
        DeferredQueue::new(FileSlot::new(slot_path())),
    );
    panel.load().await.unwrap();

    let actor = Some(registered.user_id);
    assert_eq!(
        panel.click(actor, ReactionType::Kerze).await.unwrap(),
        ClickOutcome::Applied
    );
    assert_eq!(panel.snapshot().count(ReactionType::Kerze), 1);

    // The pair law holds across the wire too.
    assert_eq!(
        panel.click(actor, ReactionType::Kerze).await.unwrap(),
        ClickOutcome::Applied
    );
    assert_eq!(panel.snapshot().count(ReactionType::Kerze), 0);
    assert!(!panel.snapshot().is_active(ReactionType::Kerze));
}
