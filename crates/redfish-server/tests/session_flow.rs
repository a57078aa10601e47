use base64::{Engine, engine::general_purpose::STANDARD};
use redfish_server::config::{AppConfig, BootstrapAccount};
use redfish_server::build_app;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

const SESSIONS: &str = "/redfish/v1/SessionService/Sessions";

fn account(username: &str, password: &str, role: &str) -> BootstrapAccount {
    BootstrapAccount {
        username: username.into(),
        password: password.into(),
        role: role.into(),
        enabled: true,
    }
}

fn create_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.bootstrap.accounts = vec![
        account("admin", "admin-pw", "Administrator"),
        account("alice", "correct", "ReadOnly"),
        account("mallory", "mallory-pw", "NoAccess"),
    ];
    config
}

async fn start_server(
    config: &AppConfig,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let (app, _state) = build_app(config).await.expect("build app");

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

fn claims(token: &str) -> Value {
    let payload = token.split('.').nth(1).expect("jwt payload");
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .expect("base64 payload");
    serde_json::from_slice(&bytes).expect("json payload")
}

async fn login(client: &reqwest::Client, base: &str, user: &str, pass: &str) -> reqwest::Response {
    client
        .post(format!("{base}{SESSIONS}"))
        .json(&json!({ "UserName": user, "Password": pass }))
        .send()
        .await
        .expect("login request")
}

#[tokio::test]
async fn login_use_and_logout_flow() {
    let (base, shutdown_tx, handle) = start_server(&create_config()).await;
    let client = reqwest::Client::new();

    let response = login(&client, &base, "alice", "correct").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = response.headers()["x-auth-token"]
        .to_str()
        .unwrap()
        .to_string();
    let location = response.headers()["location"].to_str().unwrap().to_string();
    assert!(location.starts_with(&format!("{SESSIONS}/")));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["UserName"], "alice");
    assert_eq!(body["@odata.id"], location.as_str());
    assert!(body.get("token_secret").is_none());

    let claims = claims(&token);
    assert_eq!(claims["sub"], "alice");
    assert_eq!(claims["sessionuri"], location.as_str());
    let mut privileges: Vec<String> =
        serde_json::from_value(claims["privileges"].clone()).unwrap();
    privileges.sort();
    assert_eq!(
        privileges,
        vec!["ConfigureSelf_alice", "Login", "Unauthenticated"]
    );

    // The token works like credentials.
    let response = client
        .get(format!("{base}/redfish/v1/SessionService"))
        .header("X-Auth-Token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Owners may delete their own session.
    let response = client
        .delete(format!("{base}{location}"))
        .header("X-Auth-Token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The token is dead from now on.
    let response = client
        .get(format!("{base}/redfish/v1/SessionService"))
        .header("X-Auth-Token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("www-authenticate"));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn privileges_are_enforced_per_identity() {
    let (base, shutdown_tx, handle) = start_server(&create_config()).await;
    let client = reqwest::Client::new();
    let url = format!("{base}/redfish/v1/SessionService");

    let anonymous = client.get(&url).send().await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let alice = client
        .get(&url)
        .header("Authorization", basic("alice", "correct"))
        .send()
        .await
        .unwrap();
    assert_eq!(alice.status(), StatusCode::OK);

    let mallory = client
        .get(&url)
        .header("Authorization", basic("mallory", "mallory-pw"))
        .send()
        .await
        .unwrap();
    assert_eq!(mallory.status(), StatusCode::FORBIDDEN);

    let wrong = client
        .get(&url)
        .header("Authorization", basic("alice", "wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    // The service root is public.
    let root = client.get(format!("{base}/redfish/v1")).send().await.unwrap();
    assert_eq!(root.status(), StatusCode::OK);

    let missing = client
        .get(format!("{base}/redfish/v1/Chassis"))
        .header("Authorization", basic("alice", "correct"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn other_users_cannot_delete_a_session() {
    let (base, shutdown_tx, handle) = start_server(&create_config()).await;
    let client = reqwest::Client::new();

    let response = login(&client, &base, "admin", "admin-pw").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()["location"].to_str().unwrap().to_string();

    let response = client
        .delete(format!("{base}{location}"))
        .header("Authorization", basic("alice", "correct"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Administrators see every session.
    let collection: Value = client
        .get(format!("{base}{SESSIONS}"))
        .header("Authorization", basic("admin", "admin-pw"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(collection["Members@odata.count"], 1);
    assert_eq!(collection["Members"][0]["@odata.id"], location.as_str());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn login_rejects_bad_input() {
    let (base, shutdown_tx, handle) = start_server(&create_config()).await;
    let client = reqwest::Client::new();

    let response = login(&client, &base, "alice", "nope").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post(format!("{base}{SESSIONS}"))
        .json(&json!({ "UserName": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "Base.1.0.MalformedJSON");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn credentials_never_narrow_public_access() {
    let (base, shutdown_tx, handle) = start_server(&create_config()).await;
    let client = reqwest::Client::new();

    for (user, pass) in [("admin", "admin-pw"), ("mallory", "mallory-pw")] {
        let root = client
            .get(format!("{base}/redfish/v1"))
            .header("Authorization", basic(user, pass))
            .send()
            .await
            .unwrap();
        assert_eq!(root.status(), StatusCode::OK, "{user} on service root");
    }

    let response = client
        .post(format!("{base}{SESSIONS}"))
        .header("Authorization", basic("admin", "admin-pw"))
        .json(&json!({ "UserName": "alice", "Password": "correct" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
