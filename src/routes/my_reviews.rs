use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::db::models::ReviewSummary;
use crate::db::RepositoryError;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::flash::{redirect, redirect_with, Flash, IncomingFlash};
use crate::recipes::FormFields;
use crate::reviews::repository::{
    delete_review, fetch_author_review, list_user_reviews, update_review,
};
use crate::reviews::ReviewUpdate;
use crate::routes::format::{parse_and_format_time, stars};
use crate::routes::home::Html;
use crate::routes::{PageContext, PageQuery, Pager};
use crate::state::AppState;

const LIST_URL: &str = "/my/reviews";

pub struct ReviewRow {
    pub id: i64,
    pub recipe_id: i64,
    pub recipe_title: String,
    pub stars: String,
    pub review: Option<String>,
    pub when: String,
}

impl From<ReviewSummary> for ReviewRow {
    fn from(r: ReviewSummary) -> Self {
        Self {
            id: r.id,
            recipe_id: r.recipe_id,
            recipe_title: r.recipe_title,
            stars: stars(r.rating),
            review: r.review,
            when: parse_and_format_time(&r.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/my_reviews.html")]
pub struct MyReviewsTemplate {
    pub ctx: PageContext,
    pub reviews: Vec<ReviewRow>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "pages/review_edit.html")]
pub struct ReviewEditTemplate {
    pub ctx: PageContext,
    pub review: ReviewSummary,
    pub rating: i64,
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/my/reviews", get(list))
        .route("/my/reviews/{id}", get(edit_page).post(update))
        .route("/my/reviews/{id}/delete", post(delete))
}

/// GET /my/reviews
async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<MyReviewsTemplate>> {
    let conn = state.db.get()?;
    let listing = list_user_reviews(
        &conn,
        user.id,
        query.number(),
        state.config.recipes.review_page_size,
    )?;

    Ok(Html(MyReviewsTemplate {
        ctx: PageContext::new(Some(&user), &uri, flash),
        pager: Pager::new(&listing.page, LIST_URL),
        reviews: listing.items.into_iter().map(ReviewRow::from).collect(),
    }))
}

/// GET /my/reviews/{id}
async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
    uri: Uri,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let Some(review) = fetch_author_review(&conn, id, user.id)? else {
        return Ok(redirect_with(LIST_URL, Flash::ReviewNotFound));
    };

    let template = ReviewEditTemplate {
        ctx: PageContext::new(Some(&user), &uri, flash),
        rating: review.rating.unwrap_or(0),
        text: review.review.clone().unwrap_or_default(),
        review,
    };
    Ok(Html(template).into_response())
}

/// POST /my/reviews/{id}: save rating and text, or delete
async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(fields): Form<FormFields>,
) -> AppResult<Response> {
    if fields.contains("delete") {
        return delete_and_return(&state, &user, id);
    }

    let edit_url = format!("/my/reviews/{}", id);
    let update = match ReviewUpdate::from_form(&fields) {
        Ok(update) => update,
        Err(RepositoryError::Validation(msg)) => {
            tracing::debug!("Review {} rejected: {}", id, msg);
            return Ok(redirect_with(&edit_url, Flash::RatingInvalid));
        }
        Err(e) => return Err(e.into()),
    };

    let conn = state.db.get()?;
    if !update_review(&conn, id, user.id, &update)? {
        return Ok(redirect_with(LIST_URL, Flash::ReviewNotFound));
    }

    let target = if fields.contains("return") {
        LIST_URL
    } else {
        edit_url.as_str()
    };
    Ok(redirect_with(target, Flash::ReviewSaved))
}

/// POST /my/reviews/{id}/delete
async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    delete_and_return(&state, &user, id)
}

fn delete_and_return(state: &AppState, user: &CurrentUser, id: i64) -> AppResult<Response> {
    let conn = state.db.get()?;
    if delete_review(&conn, id, user.id)? {
        Ok(redirect_with(LIST_URL, Flash::ReviewDeleted))
    } else {
        Ok(redirect(LIST_URL, None))
    }
}
