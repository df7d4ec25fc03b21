pub mod assets;
pub mod auth;
pub mod browse;
pub mod categories;
pub mod format;
pub mod home;
pub mod my_recipes;
pub mod my_reviews;
pub mod search;

use axum::http::Uri;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::extractors::CurrentUser;
use crate::flash::{self, Flash, IncomingFlash};
use crate::navigation::{navigation, Location, NavLevel};
use crate::pagination::Page;
use crate::state::AppState;

/// The whole application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(auth::router())
        .merge(browse::router())
        .merge(search::router())
        .merge(categories::router())
        .merge(my_recipes::router())
        .merge(my_reviews::router())
        .layer(middleware::from_fn(flash::clear_shown))
        .with_state(state)
}

/// What every page's layout needs: menu, pending message and user.
pub struct PageContext {
    pub navigation: Vec<NavLevel>,
    pub flash: Option<Flash>,
    pub username: Option<String>,
    /// Current path and query, used as the `back` target of links.
    pub here: String,
}

impl PageContext {
    pub fn new(user: Option<&CurrentUser>, uri: &Uri, flash: IncomingFlash) -> Self {
        let username = user.map(|u| u.username.clone());
        let navigation = navigation(&Location {
            path: uri.path(),
            query: uri.query(),
            username: username.as_deref(),
        });
        let here = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        Self {
            navigation,
            flash: flash.0,
            username,
            here,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Requested page; anything unparsable is page 1.
    pub fn number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// Previous/next links for a listing.
pub struct Pager {
    pub number: i64,
    pub total_pages: i64,
    pub total_rows: i64,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl Pager {
    /// `base` is the listing URL; it may already carry a query string.
    pub fn new(page: &Page, base: &str) -> Self {
        let link = |n: i64| {
            let sep = if base.contains('?') { '&' } else { '?' };
            format!("{}{}page={}", base, sep, n)
        };
        Self {
            number: page.number,
            total_pages: page.total_pages,
            total_rows: page.total_rows,
            prev: page.has_prev().then(|| link(page.number - 1)),
            next: page.has_next().then(|| link(page.number + 1)),
        }
    }
}

/// `candidate` when it is a path on this site, `fallback` otherwise.
pub fn local_path(candidate: Option<&str>, fallback: &str) -> String {
    match candidate {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}

/// `key=value` pair for building links.
pub fn query_pair(key: &str, value: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish()
}
