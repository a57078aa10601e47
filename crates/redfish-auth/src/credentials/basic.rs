//! HTTP Basic credential resolver.
//!
//! Stateless: every request re-checks the account and re-derives its
//! privileges. Nothing is created or mutated on the server.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use base64::{Engine, engine::general_purpose::STANDARD};

use super::{CredentialResolver, verify_account};
use crate::AuthResult;
use crate::error::AuthError;
use crate::identity::Identity;
use crate::storage::AccountStorage;

/// Resolves `Authorization: Basic <base64(user:pass)>`.
#[derive(Clone)]
pub struct BasicCredentialResolver {
    accounts: Arc<dyn AccountStorage>,
}

impl BasicCredentialResolver {
    pub fn new(accounts: Arc<dyn AccountStorage>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl CredentialResolver for BasicCredentialResolver {
    async fn resolve(&self, headers: &HeaderMap) -> AuthResult<Option<Identity>> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };
        let value = value
            .to_str()
            .map_err(|_| AuthError::unauthorized("Authorization header is not valid ASCII"))?;

        if !value.starts_with("Basic ") {
            return Ok(None);
        }

        let (username, password) = parse_basic_auth(value).map_err(AuthError::unauthorized)?;
        let privileges = verify_account(self.accounts.as_ref(), &username, &password).await?;

        tracing::debug!(username = %username, "basic credentials verified");
        Ok(Some(Identity::basic(username, privileges)))
    }

    fn scheme(&self) -> &'static str {
        "basic"
    }
}

/// Parse Basic Auth header.
///
/// Extracts credentials from "Basic <base64>" format.
fn parse_basic_auth(header: &str) -> Result<(String, String), String> {
    let credentials = header
        .strip_prefix("Basic ")
        .ok_or_else(|| "Authorization header must start with 'Basic '".to_string())?;

    let decoded = STANDARD
        .decode(credentials.trim())
        .map_err(|_| "Invalid base64 encoding in Authorization header".to_string())?;

    let credentials_str = String::from_utf8(decoded)
        .map_err(|_| "Invalid UTF-8 in decoded credentials".to_string())?;

    let (username, password) = credentials_str
        .split_once(':')
        .ok_or_else(|| "Credentials must be in format 'user:password'".to_string())?;

    Ok((username.to_string(), password.to_string()))
}
