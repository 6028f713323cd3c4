//! Authorization callback endpoint.
//!
//! `GET /auth?userid=<caller>&token=<token>` is opened by the human user once
//! the orchestrator surfaces the authorization request. A valid token
//! registers the caller; anything else is a bare `401 Unauthorized` that does
//! not say which check failed. A repeated parameter takes its last value.

use crate::store::SecretStore;
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use latchkey_core::CallerId;
use latchkey_token::TokenAuthority;
use std::sync::Arc;
use url::Url;

/// Result of redeeming a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Token verified; the caller is registered.
    Authorized,
    /// Missing parameter or failed verification.
    Unauthorized,
}

impl IntoResponse for CallbackOutcome {
    fn into_response(self) -> Response {
        match self {
            CallbackOutcome::Authorized => (StatusCode::OK, "User authorized").into_response(),
            CallbackOutcome::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            }
        }
    }
}

/// Redeems authorization tokens against the secret store.
#[derive(Debug, Clone)]
pub struct AuthCallback {
    store: Arc<SecretStore>,
    authority: Arc<TokenAuthority>,
}

impl AuthCallback {
    pub fn new(store: Arc<SecretStore>, authority: Arc<TokenAuthority>) -> Self {
        Self { store, authority }
    }

    /// Verify `token` for `userid` and register the caller on success.
    ///
    /// Replaying a valid pair is a no-op success and keeps any stored secret.
    pub fn redeem(&self, userid: Option<&str>, token: Option<&str>) -> CallbackOutcome {
        let (Some(userid), Some(token)) = (userid, token) else {
            tracing::debug!("Authorization callback missing userid or token");
            return CallbackOutcome::Unauthorized;
        };

        if userid.is_empty() || token.is_empty() {
            tracing::debug!("Authorization callback with empty userid or token");
            return CallbackOutcome::Unauthorized;
        }

        if !self.authority.verify(userid, token) {
            tracing::warn!(caller = %userid, "Authorization callback token rejected");
            return CallbackOutcome::Unauthorized;
        }

        let caller = CallerId::new(userid);
        if self.store.register(&caller) {
            tracing::info!(caller = %caller, "Caller registered");
        } else {
            tracing::debug!(caller = %caller, "Caller already registered");
        }
        CallbackOutcome::Authorized
    }

    /// Redeem the parameters of a callback request.
    pub fn redeem_query(&self, query: &AuthQuery) -> CallbackOutcome {
        self.redeem(query.userid.as_deref(), query.token.as_deref())
    }
}

/// Callback parameters, already percent-decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthQuery {
    pub userid: Option<String>,
    pub token: Option<String>,
}

impl FromIterator<(String, String)> for AuthQuery {
    /// Later occurrences of a parameter replace earlier ones.
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = AuthQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "userid" => query.userid = Some(value),
                "token" => query.token = Some(value),
                _ => {}
            }
        }
        query
    }
}

/// Handle `GET /auth`.
///
/// An undecodable query string is treated like missing parameters.
pub async fn handle_auth(
    State(callback): State<AuthCallback>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> CallbackOutcome {
    match query {
        Ok(Query(pairs)) => callback.redeem_query(&pairs.into_iter().collect::<AuthQuery>()),
        Err(e) => {
            tracing::debug!(error = %e, "Authorization callback query rejected");
            CallbackOutcome::Unauthorized
        }
    }
}

/// Build the callback URL the user should open to authorize `caller`.
pub fn authorization_url(base: &Url, caller: &CallerId, token: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("userid", caller.as_str())
        .append_pair("token", token);
    url
}
