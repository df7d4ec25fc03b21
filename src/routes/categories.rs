use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::db::models::Category;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::flash::{redirect_with, Flash, IncomingFlash};
use crate::recipes::categories::{fetch_category, list_categories, list_category_recipes};
use crate::routes::browse::RecipeListTemplate;
use crate::routes::home::Html;
use crate::routes::{PageContext, PageQuery, Pager};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/categories.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
    pub categories: Vec<Category>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/categories", get(index))
        .route("/recipes/categories/{id}", get(category))
}

/// GET /recipes/categories
async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    uri: Uri,
) -> AppResult<Html<CategoriesTemplate>> {
    let conn = state.db.get()?;
    Ok(Html(CategoriesTemplate {
        ctx: PageContext::new(user.as_ref(), &uri, flash),
        categories: list_categories(&conn)?,
    }))
}

/// GET /recipes/categories/{id}
async fn category(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    uri: Uri,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let Some(category) = fetch_category(&conn, id)? else {
        return Ok(redirect_with("/recipes/categories", Flash::CategoryNotFound));
    };
    let listing = list_category_recipes(
        &conn,
        id,
        query.number(),
        state.config.recipes.list_page_size,
    )?;

    let template = RecipeListTemplate {
        ctx: PageContext::new(user.as_ref(), &uri, flash),
        heading: category.title,
        pager: Pager::new(&listing.page, &format!("/recipes/categories/{}", id)),
        recipes: listing.items,
        empty_text: "No published recipes in this category.",
    };
    Ok(Html(template).into_response())
}
