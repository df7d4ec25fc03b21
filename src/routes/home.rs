use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::db::models::RecipeSummary;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::flash::IncomingFlash;
use crate::recipes::repository::list_published_recipes;
use crate::routes::PageContext;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub recipes: Vec<RecipeSummary>,
    pub recipe_count: i64,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Front page with the best rated recipes.
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    uri: Uri,
) -> AppResult<Html<HomeTemplate>> {
    let conn = state.db.get()?;
    let listing = list_published_recipes(&conn, 1, state.config.recipes.list_page_size)?;

    Ok(Html(HomeTemplate {
        ctx: PageContext::new(user.as_ref(), &uri, flash),
        recipe_count: listing.page.total_rows,
        recipes: listing.items,
    }))
}
