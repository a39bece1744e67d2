mod common;

use mathleap::{
    app::build_app,
    client::{MemoryStore, Method, SessionClient, SessionState, SessionStore, TOKEN_KEY, USER_KEY},
};
use serde_json::{json, Value};

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_app(common::test_state());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn client_drives_a_full_session_against_the_server() {
    let base = spawn_server().await;

    let mut client = SessionClient::new(&base, MemoryStore::new());
    let user = client
        .register("Alex", "alex@example.com", "secret1")
        .await
        .unwrap();
    assert_eq!(user.name, "Alex");
    assert!(user.avatar.as_deref().unwrap().ends_with("text=A"));

    let updated: Value = client
        .authorized_request(
            Method::PATCH,
            &format!("/api/users/{}", user.id),
            Some(&json!({ "biography": "Loves algebra" })),
        )
        .await
        .unwrap();
    assert_eq!(updated["biography"], "Loves algebra");

    client.logout().unwrap();
    assert_eq!(client.state(), &SessionState::Unauthenticated);

    let err = client
        .login("alex@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Email or password incorrect");

    client.login("ALEX@example.com", "secret1").await.unwrap();
    let me: Value = client
        .authorized_request::<(), _>(Method::GET, "/api/auth/me", None)
        .await
        .unwrap();
    assert_eq!(me["biography"], "Loves algebra");
}

#[tokio::test]
async fn stale_token_is_dropped_on_revalidation() {
    let base = spawn_server().await;
    let mut client = SessionClient::new(&base, MemoryStore::new());
    client
        .register("Alex", "alex@example.com", "secret1")
        .await
        .unwrap();

    // a fresh server does not know this account, but the token still verifies
    let other = spawn_server().await;
    let store = MemoryStore::new();
    store.set(TOKEN_KEY, client.token().unwrap()).unwrap();
    store
        .set(USER_KEY, &serde_json::to_string(client.user().unwrap()).unwrap())
        .unwrap();

    let mut restored = SessionClient::new(&other, store);
    assert_eq!(restored.bootstrap(true).await, &SessionState::Unauthenticated);
}
