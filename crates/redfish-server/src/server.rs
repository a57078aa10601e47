use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::get,
};
use redfish_auth::{
    AuthState, InMemoryAccountStorage, SecretSource, SessionManager, enforce_privileges,
    login_handler, logout_handler,
};
use redfish_core::EventBus;
use redfish_db_memory::InMemoryStore;
use tower_http::trace::TraceLayer;

use crate::bootstrap::{seed_accounts, seed_resource_tree};
use crate::config::AppConfig;
use crate::error::ServerError;
use crate::handlers::get_resource;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub store: Arc<InMemoryStore>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Wires the store, account storage, session manager and auth state, and
/// seeds the resource tree.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, ServerError> {
    cfg.validate().map_err(ServerError::Config)?;

    let events = EventBus::new();
    let store = InMemoryStore::new_shared(events.clone());
    seed_resource_tree(store.as_ref(), &cfg.auth, &cfg.bootstrap).await?;

    let accounts = InMemoryAccountStorage::with_default_roles();
    seed_accounts(&accounts, &cfg.bootstrap).await?;
    let accounts = Arc::new(accounts);

    let sessions = Arc::new(SessionManager::new(
        &cfg.auth,
        accounts.clone(),
        store.clone(),
        store.clone(),
        events.clone(),
        SecretSource::from_entropy(),
    ));

    let auth = AuthState::new(cfg.auth.clone(), accounts, store.clone(), sessions, events)?;
    Ok(AppState { auth, store })
}

pub fn build_router(state: AppState) -> Router {
    let sessions = state.auth.config.session.collection_uri.clone();
    let session_member = format!("{}/{{id}}", sessions.trim_end_matches('/'));

    Router::new()
        .route(&sessions, get(get_resource).post(login_handler))
        .route(&session_member, get(get_resource).delete(logout_handler))
        .route("/{*path}", get(get_resource))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            enforce_privileges,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn build_app(cfg: &AppConfig) -> Result<(Router, AppState), ServerError> {
    let state = build_state(cfg).await?;
    Ok((build_router(state.clone()), state))
}

/// Serves until Ctrl+C, then stops every session watchdog.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let addr = cfg.addr().map_err(ServerError::Config)?;
    let (app, state) = build_app(&cfg).await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.auth.sessions.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
