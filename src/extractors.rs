use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Method;

use crate::auth::cookies::get_cookie_value;
use crate::auth::session::resolve_session;
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Extractor that requires authentication.
/// Anonymous requests are redirected to the login page.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await?.0 {
            Some(user) => Ok(user),
            None => {
                // A form post cannot be replayed after login
                let next = match parts.uri.path_and_query() {
                    Some(pq) if parts.method == Method::GET => pq.as_str().to_string(),
                    _ => "/".to_string(),
                };
                Err(AppError::LoginRequired(next))
            }
        }
    }
}

/// Optional user extractor: returns None instead of redirecting when not
/// authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = get_cookie_value(&parts.headers, &state.config.auth.cookie_name) else {
            return Ok(MaybeUser(None));
        };

        let conn = state.db.get()?;
        let user = resolve_session(&conn, token)?.map(|u| CurrentUser {
            id: u.id,
            username: u.username,
        });
        if user.is_none() {
            tracing::debug!("Session cookie did not resolve to a user");
        }
        Ok(MaybeUser(user))
    }
}
