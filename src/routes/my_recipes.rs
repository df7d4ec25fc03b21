//! The author's own recipes: listing, creation and the tabbed editor.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::db::models::{RecipeDetail, RecipeSummary};
use crate::db::{with_transaction, RepositoryError};
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::flash::{redirect, redirect_with, Flash, IncomingFlash};
use crate::recipes::categories::{parse_category_titles, set_recipe_categories};
use crate::recipes::ordering::{apply_edit, ChildList, EditOutcome};
use crate::recipes::repository::{
    delete_author_recipe, fetch_author_recipe, insert_recipe, list_user_recipes, owns_recipe,
    update_author_recipe, NewRecipe, RecipeUpdate,
};
use crate::recipes::{FormFields, SubListEdit};
use crate::routes::home::Html;
use crate::routes::{local_path, query_pair, PageContext, PageQuery, Pager};
use crate::state::AppState;

const LIST_URL: &str = "/my/recipes";

#[derive(Template)]
#[template(path = "pages/my_recipes.html")]
pub struct MyRecipesTemplate {
    pub ctx: PageContext,
    pub recipes: Vec<RecipeSummary>,
    pub pager: Pager,
    pub back_param: String,
}

#[derive(Template)]
#[template(path = "pages/recipe_create.html")]
pub struct CreateTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub summary: String,
}

/// Values a rejected create form is redisplayed with.
#[derive(Debug, Default, Deserialize)]
pub struct CreateQuery {
    pub title: Option<String>,
    pub summary: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/recipe_edit.html")]
pub struct EditTemplate {
    pub ctx: PageContext,
    pub detail: RecipeDetail,
    pub tab: u8,
    pub tab_links: Vec<TabLink>,
    pub action: String,
    pub back: String,
    pub summary: String,
    pub preparation_time: String,
    pub cooking_time: String,
    pub skill_level: i64,
    pub portions: String,
    pub categories: String,
    pub can_add_ingredient: bool,
    pub can_add_instruction: bool,
}

pub struct TabLink {
    pub number: u8,
    pub title: &'static str,
    pub active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditQuery {
    pub tab: Option<String>,
    pub back: Option<String>,
}

impl EditQuery {
    fn back(&self) -> String {
        local_path(self.back.as_deref(), LIST_URL)
    }
}

const TABS: [(u8, &str); 3] = [(1, "Recipe"), (2, "Ingredients"), (3, "Instructions")];

fn parse_tab(raw: Option<&str>) -> u8 {
    raw.and_then(|t| t.trim().parse().ok())
        .filter(|t| TABS.iter().any(|(n, _)| n == t))
        .unwrap_or(1)
}

fn edit_url(recipe_id: i64, tab: u8, back: &str) -> String {
    format!(
        "/my/recipes/{}?tab={}&{}",
        recipe_id,
        tab,
        query_pair("back", back)
    )
}

fn number_field(value: Option<i64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/my/recipes", get(list))
        .route("/my/recipes/create", get(create_page).post(create))
        .route("/my/recipes/{id}", get(edit_page))
        .route("/my/recipes/{id}/update", post(update))
        .route("/my/recipes/{id}/delete", post(delete))
}

/// GET /my/recipes
async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<MyRecipesTemplate>> {
    let conn = state.db.get()?;
    let listing = list_user_recipes(
        &conn,
        user.id,
        query.number(),
        state.config.recipes.list_page_size,
    )?;

    let ctx = PageContext::new(Some(&user), &uri, flash);
    Ok(Html(MyRecipesTemplate {
        back_param: query_pair("back", &ctx.here),
        ctx,
        pager: Pager::new(&listing.page, LIST_URL),
        recipes: listing.items,
    }))
}

/// GET /my/recipes/create
async fn create_page(
    user: CurrentUser,
    flash: IncomingFlash,
    uri: Uri,
    Query(query): Query<CreateQuery>,
) -> Html<CreateTemplate> {
    Html(CreateTemplate {
        ctx: PageContext::new(Some(&user), &uri, flash),
        title: query.title.unwrap_or_default(),
        summary: query.summary.unwrap_or_default(),
    })
}

/// POST /my/recipes/create
async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(fields): Form<FormFields>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let recipe = NewRecipe::from_form(&fields);
    let retry_url = format!(
        "/my/recipes/create?{}&{}",
        query_pair("title", &recipe.title),
        query_pair("summary", recipe.summary.as_deref().unwrap_or_default())
    );
    match insert_recipe(&conn, user.id, &recipe) {
        Ok(id) => {
            tracing::info!("User {} created recipe {}", user.id, id);
            Ok(redirect_with(&edit_url(id, 1, LIST_URL), Flash::RecipeCreated))
        }
        Err(RepositoryError::Validation(msg)) => {
            tracing::debug!("Recipe rejected: {}", msg);
            Ok(redirect_with(&retry_url, Flash::RecipeTitleInvalid))
        }
        Err(RepositoryError::Conflict(msg)) => {
            tracing::warn!("Recipe insert conflict: {}", msg);
            Ok(redirect_with(&retry_url, Flash::RecipeNameTaken))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /my/recipes/{id}?tab=&back=
async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
    uri: Uri,
    Path(id): Path<i64>,
    Query(query): Query<EditQuery>,
) -> AppResult<Response> {
    let limits = &state.config.recipes;
    let conn = state.db.get()?;
    let Some(detail) = fetch_author_recipe(&conn, id, user.id, limits)? else {
        return Ok(redirect_with(LIST_URL, Flash::RecipeNotFound));
    };

    let tab = parse_tab(query.tab.as_deref());
    let back = query.back();
    let recipe = &detail.recipe;
    let template = EditTemplate {
        ctx: PageContext::new(Some(&user), &uri, flash),
        tab,
        tab_links: TABS
            .iter()
            .map(|&(number, title)| TabLink {
                number,
                title,
                active: number == tab,
            })
            .collect(),
        action: format!("/my/recipes/{}/update?tab={}&{}", id, tab, query_pair("back", &back)),
        summary: recipe.summary.clone().unwrap_or_default(),
        preparation_time: number_field(recipe.preparation_time),
        cooking_time: number_field(recipe.cooking_time),
        skill_level: recipe.skill_level.unwrap_or(0),
        portions: number_field(recipe.portions),
        categories: detail.categories.join(", "),
        can_add_ingredient: (detail.ingredients.len() as i64) < limits.ingredients_max,
        can_add_instruction: (detail.instructions.len() as i64) < limits.instructions_max,
        back,
        detail,
    };
    Ok(Html(template).into_response())
}

/// Everything one submission of the editor asks for.
struct RecipeEdit {
    scalars: RecipeUpdate,
    categories: Option<Vec<String>>,
    ingredients: SubListEdit,
    instructions: SubListEdit,
}

impl RecipeEdit {
    fn decode(fields: &FormFields) -> Result<Self, RepositoryError> {
        Ok(Self {
            scalars: RecipeUpdate::from_form(fields)?,
            categories: fields.get("categories").map(parse_category_titles),
            ingredients: SubListEdit::decode(
                ChildList::Ingredients.form_prefix(),
                fields.iter(),
            ),
            instructions: SubListEdit::decode(
                ChildList::Instructions.form_prefix(),
                fields.iter(),
            ),
        })
    }
}

/// POST /my/recipes/{id}/update?tab=&back=
///
/// Applies the whole submission in one transaction, then follows the
/// pressed button: `return` goes back, `delete` deletes the recipe, `tab`
/// switches tab, anything else stays on the current tab.
async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<EditQuery>,
    Form(fields): Form<FormFields>,
) -> AppResult<Response> {
    let back = query.back();
    let current_tab = parse_tab(query.tab.as_deref());

    if fields.contains("delete") {
        return delete_and_return(&state, &user, id, &back);
    }

    let stay_url = edit_url(id, current_tab, &back);
    let edit = match RecipeEdit::decode(&fields) {
        Ok(edit) => edit,
        Err(e) => {
            tracing::debug!("Recipe {} edit rejected: {}", id, e);
            return Ok(redirect_with(&stay_url, Flash::InvalidValue));
        }
    };

    let limits = state.config.recipes.clone();
    let mut conn = state.db.get()?;
    let result = with_transaction(&mut conn, |tx| {
        if !owns_recipe(tx, id, user.id)? {
            return Err(RepositoryError::NotFound);
        }
        update_author_recipe(tx, id, user.id, &edit.scalars)?;
        if let Some(titles) = &edit.categories {
            set_recipe_categories(tx, id, titles, limits.categories_max)?;
        }
        let ingredients = apply_edit(
            tx,
            ChildList::Ingredients,
            id,
            &edit.ingredients,
            limits.ingredients_max,
        )?;
        let instructions = apply_edit(
            tx,
            ChildList::Instructions,
            id,
            &edit.instructions,
            limits.instructions_max,
        )?;
        Ok::<_, RepositoryError>((ingredients, instructions))
    });

    let (ingredients, instructions): (EditOutcome, EditOutcome) = match result {
        Ok(outcomes) => outcomes,
        Err(RepositoryError::NotFound) => {
            return Ok(redirect_with(LIST_URL, Flash::RecipeNotFound));
        }
        Err(RepositoryError::Conflict(msg)) => {
            tracing::warn!("Recipe {} edit failed: {}", id, msg);
            return Ok(redirect_with(&stay_url, Flash::SaveFailed));
        }
        Err(RepositoryError::Validation(msg)) => {
            tracing::debug!("Recipe {} edit rejected: {}", id, msg);
            return Ok(redirect_with(&stay_url, Flash::InvalidValue));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!(
        "Recipe {} edited: ingredients {:?}, instructions {:?}",
        id,
        ingredients,
        instructions
    );

    let flash = if ingredients.append_refused || instructions.append_refused {
        Flash::ListFull
    } else {
        Flash::RecipeSaved
    };

    if fields.contains("return") {
        return Ok(redirect_with(&back, flash));
    }
    let next_tab = match fields.get("tab") {
        Some(tab) => parse_tab(Some(tab)),
        None => current_tab,
    };
    Ok(redirect_with(&edit_url(id, next_tab, &back), flash))
}

/// POST /my/recipes/{id}/delete?back=
async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<EditQuery>,
) -> AppResult<Response> {
    delete_and_return(&state, &user, id, &query.back())
}

fn delete_and_return(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
    back: &str,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    if delete_author_recipe(&conn, id, user.id)? {
        tracing::info!("User {} deleted recipe {}", user.id, id);
        // The recipe page itself is gone.
        let target = if back.starts_with(&format!("/recipes/{}", id)) {
            LIST_URL
        } else {
            back
        };
        Ok(redirect_with(target, Flash::RecipeDeleted))
    } else {
        Ok(redirect(back, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tab_clamps_to_known_tabs() {
        assert_eq!(parse_tab(None), 1);
        assert_eq!(parse_tab(Some("2")), 2);
        assert_eq!(parse_tab(Some("3")), 3);
        assert_eq!(parse_tab(Some("9")), 1);
        assert_eq!(parse_tab(Some("x")), 1);
    }

    #[test]
    fn edit_url_encodes_back() {
        assert_eq!(
            edit_url(4, 2, "/my/recipes?page=2"),
            "/my/recipes/4?tab=2&back=%2Fmy%2Frecipes%3Fpage%3D2"
        );
    }

    #[test]
    fn decode_splits_scalars_categories_and_lists() {
        let fields: FormFields = [
            ("title", "Pancakes"),
            ("categories", "Sweet, Quick"),
            ("ingredients_3_up", "1"),
            ("instructions_add_row", "1"),
        ]
        .into_iter()
        .collect();
        let edit = RecipeEdit::decode(&fields).unwrap();
        assert_eq!(edit.scalars.title.as_deref(), Some("Pancakes"));
        assert_eq!(
            edit.categories,
            Some(vec!["Sweet".to_string(), "Quick".to_string()])
        );
        assert_eq!(edit.ingredients.actions.len(), 1);
        assert!(edit.instructions.append);
        assert!(!edit.ingredients.append);
    }
}
