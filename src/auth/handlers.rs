use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::cookies::{clear_cookie, get_cookie_value, session_cookie};
use crate::auth::{session, users};
use crate::db::RepositoryError;
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::flash::{redirect_with, Flash, IncomingFlash};
use crate::routes::home::Html;
use crate::routes::{local_path, query_pair, PageContext};
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub register_url: String,
    pub username: String,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub username: String,
}

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub next: Option<String>,
    pub username: Option<String>,
}

impl AuthQuery {
    fn next_target(&self) -> String {
        local_path(self.next.as_deref(), "/")
    }

    /// `path` with the `next` parameter carried over.
    fn url(&self, path: &str) -> String {
        match self.next.as_deref() {
            Some(next) => format!("{}?{}", path, query_pair("next", next)),
            None => path.to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

// -- Register --

/// GET /auth/register
pub async fn register_page(
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    uri: Uri,
    Query(query): Query<AuthQuery>,
) -> Html<RegisterTemplate> {
    Html(RegisterTemplate {
        ctx: PageContext::new(user.as_ref(), &uri, flash),
        action: query.url("/auth/register"),
        username: query.username.clone().unwrap_or_default(),
    })
}

/// POST /auth/register: validate, store a bcrypt hash, send to login
pub async fn register(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();
    let retry_url = query.url("/auth/register");

    if let Err(problem) = users::validate_registration(&username, &form.password1, &form.password2)
    {
        tracing::debug!("Registration rejected: {}", problem);
        return Ok(redirect_with(&retry_url, problem.into()));
    }

    let cost = state.config.auth.bcrypt_cost;
    let password = form.password1;
    let hash = tokio::task::spawn_blocking(move || users::hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let conn = state.db.get()?;
    match users::create_user(&conn, &username, &hash) {
        Ok(id) => {
            tracing::info!("Registered user {} ({})", username, id);
            let mut login_url = query.url("/auth/login");
            login_url.push(if login_url.contains('?') { '&' } else { '?' });
            login_url.push_str(&query_pair("username", &username));
            Ok(redirect_with(&login_url, Flash::Registered))
        }
        Err(RepositoryError::Conflict(_)) => Ok(redirect_with(&retry_url, Flash::UsernameTaken)),
        Err(e) => Err(e.into()),
    }
}

// -- Login --

/// GET /auth/login
pub async fn login_page(
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    uri: Uri,
    Query(query): Query<AuthQuery>,
) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        ctx: PageContext::new(user.as_ref(), &uri, flash),
        action: query.url("/auth/login"),
        register_url: query.url("/auth/register"),
        username: query.username.clone().unwrap_or_default(),
    })
}

/// POST /auth/login: verify password, start a session
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let user_id = users::authenticate(&conn, form.username.trim(), &form.password)?;

    let Some(user_id) = user_id else {
        return Ok(redirect_with(&query.url("/auth/login"), Flash::LoginFailed));
    };

    let hours = state.config.auth.session_hours;
    let token = session::create_session(&conn, user_id, hours)?;
    let cookie = session_cookie(&state.config.auth.cookie_name, &token, hours);

    let mut response = redirect_with(&query.next_target(), Flash::LoggedIn);
    append_cookie(&mut response, &cookie)?;
    Ok(response)
}

/// POST /auth/logout: delete session and redirect
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = get_cookie_value(&headers, cookie_name) {
        let conn = state.db.get()?;
        if let Err(e) = session::delete_session(&conn, token) {
            tracing::warn!("Failed to delete session: {}", e);
        }
    }

    let mut response = redirect_with("/", Flash::LoggedOut);
    append_cookie(&mut response, &clear_cookie(cookie_name))?;
    Ok(response)
}

fn append_cookie(response: &mut Response, cookie: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie).map_err(|e| AppError::Internal(e.to_string()))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
