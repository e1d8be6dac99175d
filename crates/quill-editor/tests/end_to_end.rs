use std::sync::Arc;

use axum::{Json, Router, routing::post};
use serde_json::{Value, json};

use quill_ai::{GeminiClient, GeminiConfig};
use quill_api::auth::AppStateInner;
use quill_db::Database;
use quill_editor::{
    ApiClient, Editor, EditorConfig, EditorError, MemorySurface, Outcome, SaveStatus,
};
use quill_types::api::RegisterRequest;
use quill_types::{DocumentStore, StoreError, TransformKind};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Gemini stand-in that simplifies "the cat sat" and echoes anything else
/// in upper case.
async fn mock_gemini() -> GeminiClient {
    let router = Router::new().route(
        "/v1beta/models/{*rest}",
        post(|Json(body): Json<Value>| async move {
            let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
            let answer = if prompt.contains("\"the cat sat\"") {
                "the cat sits".to_string()
            } else {
                "DONE".to_string()
            };
            Json(json!({ "candidates": [{ "content": { "parts": [{ "text": answer }] } }] }))
        }),
    );
    let mut config = GeminiConfig::new("test-key");
    config.base_url = serve(router).await;
    GeminiClient::new(config).unwrap()
}

async fn quill_server() -> String {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "end-to-end-secret".into(),
        token_days: 1,
        ai: Some(mock_gemini().await),
    });
    serve(quill_api::router(state)).await
}

async fn signed_in(base_url: &str, username: &str) -> ApiClient {
    let mut client = ApiClient::new(base_url);
    client
        .register(&RegisterRequest {
            username: username.into(),
            name: "End To End".into(),
            email: format!("{}@example.com", username),
            password: "correct horse battery".into(),
        })
        .await
        .unwrap();
    client
}

#[tokio::test]
async fn edit_transform_and_save_against_a_live_server() {
    let base_url = quill_server().await;
    let client = signed_in(&base_url, "writer").await;
    let owner = client.user().unwrap().id;

    let mut editor = Editor::new(
        owner,
        MemorySurface::default(),
        client.clone(),
        client.clone(),
        EditorConfig::default(),
    );

    // A new account gets a blank document.
    let id = editor.bootstrap().await.unwrap();
    assert_eq!(editor.session().title(), "Untitled Document");

    editor.surface_mut().type_markup("<p>the cat sat on the mat</p>");
    editor.content_changed();
    editor.set_title("Cats");
    assert_eq!(editor.save_status(), SaveStatus::Unsaved);

    assert!(editor.surface_mut().select_text("the cat sat"));
    editor.selection_changed();
    let outcome = editor
        .transform_selection(TransformKind::Simplify)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Applied(()));
    assert_eq!(editor.surface().markup(), "<p>the cat sits on the mat</p>");
    assert_eq!(editor.history().undo_depth(), 1);

    assert!(editor.save().await.unwrap().is_applied());
    assert_eq!(editor.save_status(), SaveStatus::Saved);

    // The server has what the editor saved.
    let stored = client.fetch_one(id, owner).await.unwrap().unwrap();
    assert_eq!(stored.title, "Cats");
    assert_eq!(stored.content, "<p>the cat sits on the mat</p>");

    // A second session for the same user opens the saved document.
    let mut second = Editor::new(
        owner,
        MemorySurface::default(),
        client.clone(),
        client,
        EditorConfig::default(),
    );
    assert_eq!(second.bootstrap().await.unwrap(), id);
    assert_eq!(second.surface().markup(), "<p>the cat sits on the mat</p>");
    assert_eq!(second.stats().words, 6);
}

#[tokio::test]
async fn documents_stay_private_to_their_owner() {
    let base_url = quill_server().await;
    let alice = signed_in(&base_url, "alice").await;
    let bob = signed_in(&base_url, "bobby").await;
    let alice_id = alice.user().unwrap().id;
    let bob_id = bob.user().unwrap().id;

    let doc = alice.create(alice_id, "Secret", "<p>hi</p>").await.unwrap();

    assert!(bob.fetch_one(doc.id, bob_id).await.unwrap().is_none());
    assert!(!bob.soft_delete(doc.id, bob_id).await.unwrap());
    assert!(matches!(
        bob.fetch_one(doc.id, alice_id).await,
        Err(StoreError::OwnerMismatch(_))
    ));

    let mut editor = Editor::new(
        bob_id,
        MemorySurface::default(),
        bob.clone(),
        bob,
        EditorConfig::default(),
    );
    let err = editor.open_document(doc.id).await.unwrap_err();
    assert!(matches!(err, EditorError::NotFound));
}

#[tokio::test]
async fn login_resumes_an_account() {
    let base_url = quill_server().await;
    let registered = signed_in(&base_url, "returning").await;

    let mut client = ApiClient::new(&base_url);
    let user = client
        .login("returning@example.com", "correct horse battery")
        .await
        .unwrap();
    assert_eq!(user.id, registered.user().unwrap().id);

    let mut bad = ApiClient::new(&base_url);
    assert!(matches!(
        bad.login("returning", "wrong password").await,
        Err(StoreError::Unauthorized)
    ));
}
