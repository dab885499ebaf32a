//! End-to-end HTTP tests: the server is spawned on an ephemeral port and
//! exercised with a real client, asserting the status-code contract of every
//! endpoint (401/403/404/400/409 mapping, 201 + Location, 204 on empty).

use taskdeck::config::Config;
use taskdeck::registry::ensure_default_admin;
use taskdeck::server::router;
use taskdeck::storage::SharedStore;

const ADMIN_PASSWORD: &str = "correct-admin";

fn test_config() -> Config {
    Config {
        http_port: 0,
        token_key: "http-test-key".to_string(),
        issuer: "taskdeck".to_string(),
        audience: "taskdeck-api".to_string(),
        token_ttl_secs: 300,
        admin_password: ADMIN_PASSWORD.to_string(),
    }
}

/// Spawn the app on an ephemeral port and return its base URL.
async fn spawn_app() -> String {
    let cfg = test_config();
    let store = SharedStore::new();
    ensure_default_admin(&store, &cfg.admin_password).expect("bootstrap admin");
    let app = router(store, &cfg);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

async fn login(client: &reqwest::Client, base: &str, username: &str, password: &str) -> String {
    let resp = client
        .post(format!("{base}/api/login"))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("login request");
    assert_eq!(resp.status(), 200, "login {username}");
    let token = resp.text().await.expect("token body");
    assert_eq!(token.split('.').count(), 3, "compact JWT expected");
    token
}

/// POST /api/users anonymously and return nothing; asserts 201.
async fn signup(client: &reqwest::Client, base: &str, id: &str, password: &str) {
    let resp = client
        .post(format!("{base}/api/users"))
        .json(&serde_json::json!({ "id": id, "name": format!("{id} name"), "password": password }))
        .send()
        .await
        .expect("signup request");
    assert_eq!(resp.status(), 201, "signup {id}");
    let location = resp.headers().get("location").and_then(|v| v.to_str().ok()).map(String::from);
    assert_eq!(location.as_deref(), Some(format!("/api/users/{id}").as_str()));
}

#[tokio::test]
async fn health_line_is_served() {
    let base = spawn_app().await;
    let body = reqwest::get(&base).await.expect("get").text().await.expect("body");
    assert_eq!(body, "taskdeck ok");
}

#[tokio::test]
async fn login_rejects_bad_credentials_with_401() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/api/login"))
        .json(&serde_json::json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 401);
    let resp = client
        .post(format!("{base}/api/login"))
        .json(&serde_json::json!({ "username": "ghost", "password": "wrong" }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn task_routes_require_a_valid_token() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/api/tasks")).send().await.expect("anon list");
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{base}/api/tasks"))
        .bearer_auth("not.a.token")
        .send()
        .await
        .expect("garbage token");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn full_task_lifecycle_over_http() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    signup(&client, &base, "bob", "pw-bob").await;
    signup(&client, &base, "carol", "pw-carol").await;
    let admin = login(&client, &base, "admin", ADMIN_PASSWORD).await;
    let bob = login(&client, &base, "bob", "pw-bob").await;
    let carol = login(&client, &base, "carol", "pw-carol").await;

    // Empty listing is a 204 for bob.
    let resp = client
        .get(format!("{base}/api/tasks"))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("empty list");
    assert_eq!(resp.status(), 204);

    // Admin creates "buy milk" for bob: 201, Location header, owner forced to bob.
    let resp = client
        .post(format!("{base}/api/tasks"))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "description": "buy milk", "owner_id": "bob" }))
        .send()
        .await
        .expect("create");
    assert_eq!(resp.status(), 201);
    let location = resp.headers().get("location").and_then(|v| v.to_str().ok()).map(String::from);
    let task: serde_json::Value = resp.json().await.expect("task body");
    assert_eq!(task["owner_id"], "bob");
    assert_eq!(task["completed"], false);
    let id = task["id"].as_i64().expect("task id");
    assert_eq!(location.as_deref(), Some(format!("/api/tasks/{id}").as_str()));

    // Carol is neither admin nor owner: 403, and the body never leaks more.
    let resp = client
        .get(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&carol)
        .send()
        .await
        .expect("carol get");
    assert_eq!(resp.status(), 403);

    // Bob completes it, then a second PATCH is a 400.
    let resp = client
        .patch(format!("{base}/api/tasks/{id}/complete"))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("complete");
    assert_eq!(resp.status(), 200);
    let done: serde_json::Value = resp.json().await.expect("completed body");
    assert_eq!(done["completed"], true);

    let resp = client
        .patch(format!("{base}/api/tasks/{id}/complete"))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("double complete");
    assert_eq!(resp.status(), 400);

    // PUT with a mismatched payload id is a 400; owner change is a 400.
    let resp = client
        .put(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&bob)
        .json(&serde_json::json!({ "id": id + 1, "description": "buy milk", "completed": true }))
        .send()
        .await
        .expect("id mismatch");
    assert_eq!(resp.status(), 400);
    let resp = client
        .put(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&bob)
        .json(&serde_json::json!({ "id": id, "description": "buy milk", "completed": true, "owner_id": "carol" }))
        .send()
        .await
        .expect("owner change");
    assert_eq!(resp.status(), 400);

    // Deleting an unknown id is a 404; deleting the real one succeeds once.
    let resp = client
        .delete(format!("{base}/api/tasks/9999"))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("missing delete");
    assert_eq!(resp.status(), 404);
    let resp = client
        .delete(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("delete");
    assert_eq!(resp.status(), 200);
    let resp = client
        .get(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("gone");
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn user_routes_enforce_roles_and_hide_digests() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    signup(&client, &base, "bob", "pw-bob").await;
    let admin = login(&client, &base, "admin", ADMIN_PASSWORD).await;
    let bob = login(&client, &base, "bob", "pw-bob").await;

    // Registry listing is admin only.
    let resp = client
        .get(format!("{base}/api/users"))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("bob list");
    assert_eq!(resp.status(), 403);
    let resp = client
        .get(format!("{base}/api/users"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("admin list");
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.expect("list body");
    assert!(!body.contains("password"));

    // Self or admin for single lookups.
    let resp = client
        .get(format!("{base}/api/users/admin"))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("bob reads admin");
    assert_eq!(resp.status(), 403);
    let resp = client
        .get(format!("{base}/api/users/bob"))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("bob reads self");
    assert_eq!(resp.status(), 200);

    // Duplicate registration conflicts.
    let resp = client
        .post(format!("{base}/api/users"))
        .json(&serde_json::json!({ "id": "BOB", "name": "Bob Again", "password": "pw" }))
        .send()
        .await
        .expect("duplicate");
    assert_eq!(resp.status(), 409);

    // Role escalation: 401 anonymous, 403 authenticated non-admin.
    let resp = client
        .post(format!("{base}/api/users"))
        .json(&serde_json::json!({ "id": "eve", "name": "Eve", "password": "pw", "role": "admin" }))
        .send()
        .await
        .expect("anon escalation");
    assert_eq!(resp.status(), 401);
    let resp = client
        .post(format!("{base}/api/users"))
        .bearer_auth(&bob)
        .json(&serde_json::json!({ "id": "eve", "name": "Eve", "password": "pw", "role": "admin" }))
        .send()
        .await
        .expect("bob escalation");
    assert_eq!(resp.status(), 403);
    let resp = client
        .post(format!("{base}/api/users"))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "id": "eve", "name": "Eve", "password": "pw", "role": "admin" }))
        .send()
        .await
        .expect("admin assigns role");
    assert_eq!(resp.status(), 201);
}
