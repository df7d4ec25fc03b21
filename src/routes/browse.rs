use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::db::models::{PublishedRecipe, RecipeSummary};
use crate::db::RepositoryError;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::flash::{redirect, redirect_with, Flash, IncomingFlash};
use crate::recipes::repository::{fetch_published_recipe, list_published_recipes};
use crate::reviews::repository::{find_review_id, insert_review};
use crate::routes::format::{minutes, parse_and_format_time, skill_level, stars};
use crate::routes::home::Html;
use crate::routes::{PageContext, PageQuery, Pager};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/recipe_list.html")]
pub struct RecipeListTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub recipes: Vec<RecipeSummary>,
    pub pager: Pager,
    pub empty_text: &'static str,
}

/// A review as rendered under a recipe.
pub struct ReviewLine {
    pub username: String,
    pub stars: String,
    pub review: Option<String>,
    pub when: String,
}

#[derive(Template)]
#[template(path = "pages/recipe_view.html")]
pub struct RecipeViewTemplate {
    pub ctx: PageContext,
    pub recipe: PublishedRecipe,
    pub preparation_time: String,
    pub cooking_time: String,
    pub skill_level: &'static str,
    pub reviews: Vec<ReviewLine>,
    pub is_author: bool,
    /// The viewer's own review, if they already wrote one.
    pub own_review: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list))
        .route("/recipes/{id}", get(view))
        .route("/recipes/{id}/review", post(start_review))
}

/// GET /recipes: published recipes, best rated first
async fn list(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<RecipeListTemplate>> {
    let conn = state.db.get()?;
    let listing =
        list_published_recipes(&conn, query.number(), state.config.recipes.list_page_size)?;

    Ok(Html(RecipeListTemplate {
        ctx: PageContext::new(user.as_ref(), &uri, flash),
        heading: "Recipes".to_string(),
        pager: Pager::new(&listing.page, "/recipes"),
        recipes: listing.items,
        empty_text: "No published recipes yet.",
    }))
}

/// GET /recipes/{id}
async fn view(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    uri: Uri,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let Some(recipe) = fetch_published_recipe(&conn, id, &state.config.recipes)? else {
        return Ok(redirect_with("/recipes", Flash::RecipeNotFound));
    };

    let own_review = match &user {
        Some(u) => find_review_id(&conn, u.id, id)?,
        None => None,
    };
    let is_author = user
        .as_ref()
        .is_some_and(|u| u.id == recipe.detail.recipe.author_id);
    let reviews = recipe
        .detail
        .reviews
        .iter()
        .map(|r| ReviewLine {
            username: r.username.clone(),
            stars: stars(r.rating),
            review: r.review.clone(),
            when: parse_and_format_time(&r.created_at),
        })
        .collect();

    let template = RecipeViewTemplate {
        ctx: PageContext::new(user.as_ref(), &uri, flash),
        preparation_time: minutes(recipe.detail.recipe.preparation_time),
        cooking_time: minutes(recipe.detail.recipe.cooking_time),
        skill_level: skill_level(recipe.detail.recipe.skill_level),
        reviews,
        is_author,
        own_review,
        recipe,
    };
    Ok(Html(template).into_response())
}

/// POST /recipes/{id}/review: create a bare review and open it for editing
async fn start_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    if let Some(existing) = find_review_id(&conn, user.id, id)? {
        return Ok(redirect(&format!("/my/reviews/{}", existing), None));
    }

    match insert_review(&conn, user.id, id) {
        Ok(review_id) => Ok(redirect(&format!("/my/reviews/{}", review_id), None)),
        Err(RepositoryError::NotFound) => Ok(redirect_with("/recipes", Flash::RecipeNotFound)),
        Err(RepositoryError::Conflict(e)) => {
            tracing::warn!("Review insert conflict: {}", e);
            match find_review_id(&conn, user.id, id)? {
                Some(existing) => Ok(redirect(&format!("/my/reviews/{}", existing), None)),
                None => Ok(redirect_with(&format!("/recipes/{}", id), Flash::ReviewFailed)),
            }
        }
        Err(e) => Err(e.into()),
    }
}
