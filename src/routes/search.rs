use askama::Template;
use axum::extract::{Query, State};
use axum::http::Uri;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::db::models::RecipeSummary;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::flash::IncomingFlash;
use crate::recipes::repository::search_published_recipes;
use crate::routes::home::Html;
use crate::routes::{query_pair, PageContext, PageQuery, Pager};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    q: Option<String>,
    #[serde(flatten)]
    page: PageQuery,
}

#[derive(Template)]
#[template(path = "pages/search.html")]
pub struct SearchTemplate {
    pub ctx: PageContext,
    pub term: String,
    pub recipes: Vec<RecipeSummary>,
    /// `None` until a search term is given.
    pub pager: Option<Pager>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/recipes/search", get(search))
}

/// GET /recipes/search?q=&page=
async fn search(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    uri: Uri,
    Query(query): Query<SearchQuery>,
) -> AppResult<Html<SearchTemplate>> {
    let term = query.q.as_deref().unwrap_or_default().trim().to_string();
    let page = query.page.number();

    let (recipes, pager) = if term.is_empty() {
        (Vec::new(), None)
    } else {
        let conn = state.db.get()?;
        let listing =
            search_published_recipes(&conn, &term, page, state.config.recipes.list_page_size)?;
        tracing::debug!("Search {:?}: {} hits", term, listing.page.total_rows);
        let base = format!("/recipes/search?{}", query_pair("q", &term));
        let pager = Pager::new(&listing.page, &base);
        (listing.items, Some(pager))
    };

    Ok(Html(SearchTemplate {
        ctx: PageContext::new(user.as_ref(), &uri, flash),
        term,
        recipes,
        pager,
    }))
}
