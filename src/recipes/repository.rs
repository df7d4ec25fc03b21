//! Recipes and their related rows.
//!
//! Every mutation is scoped by `author_id`: a recipe that exists but
//! belongs to someone else behaves exactly like one that does not exist.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::config::RecipesConfig;
use crate::db::models::{
    Ingredient, Instruction, PublishedRecipe, RatingSummary, Recipe, RecipeDetail, RecipeReview,
    RecipeSummary,
};
use crate::db::{RepoResult, RepositoryError};
use crate::pagination::{Listing, Page};
use crate::recipes::form::{parse_flag, FormFields};

const RECIPE_COLUMNS: &str = "recipes.id, recipes.title, recipes.summary, \
     recipes.preparation_time, recipes.cooking_time, recipes.skill_level, \
     recipes.portions, recipes.published, recipes.author_id";

const SKILL_LEVELS: std::ops::RangeInclusive<i64> = 1..=4;

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        preparation_time: row.get(3)?,
        cooking_time: row.get(4)?,
        skill_level: row.get(5)?,
        portions: row.get(6)?,
        published: row.get(7)?,
        author_id: row.get(8)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<RecipeSummary> {
    Ok(RecipeSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        published: row.get(3)?,
        rating: RatingSummary {
            average: row.get(4)?,
            count: row.get(5)?,
        },
    })
}

// -- Validation --

/// New recipe titles: at least four characters, letters and digits only.
pub fn validate_new_title(title: &str) -> RepoResult<()> {
    if title.is_empty() {
        return Err(RepositoryError::Validation("Recipe title is required".into()));
    }
    if title.chars().count() < 4 || !title.chars().all(char::is_alphanumeric) {
        return Err(RepositoryError::Validation(
            "Recipe title must be at least 4 letters or digits".into(),
        ));
    }
    Ok(())
}

fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `None` when the field is absent, `Some(None)` when it was submitted
/// blank.
fn optional_number(
    fields: &FormFields,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
) -> RepoResult<Option<Option<i64>>> {
    let Some(raw) = fields.get(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Some(None));
    }
    match raw.parse::<i64>() {
        Ok(n) if range.contains(&n) => Ok(Some(Some(n))),
        _ => Err(RepositoryError::Validation(format!(
            "{} must be a whole number between {} and {}",
            key,
            range.start(),
            range.end()
        ))),
    }
}

// -- Create --

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub summary: Option<String>,
}

impl NewRecipe {
    pub fn from_form(fields: &FormFields) -> Self {
        Self {
            title: fields.get("title").unwrap_or_default().trim().to_string(),
            summary: fields.get("summary").and_then(blank_to_none),
        }
    }
}

/// Insert an unpublished recipe owned by `author_id`. Returns the new id.
pub fn insert_recipe(conn: &Connection, author_id: i64, recipe: &NewRecipe) -> RepoResult<i64> {
    validate_new_title(&recipe.title)?;

    conn.execute(
        "INSERT INTO recipes (title, summary, author_id) VALUES (?1, ?2, ?3)",
        params![recipe.title, recipe.summary, author_id],
    )
    .map_err(|e| match RepositoryError::from(e) {
        RepositoryError::Conflict(_) => RepositoryError::Conflict("Recipe name is taken".into()),
        other => other,
    })?;

    Ok(conn.last_insert_rowid())
}

// -- Read --

pub fn owns_recipe(conn: &Connection, recipe_id: i64, author_id: i64) -> RepoResult<bool> {
    let owned = conn.query_row(
        "SELECT COUNT(*) > 0 FROM recipes WHERE id = ?1 AND author_id = ?2",
        params![recipe_id, author_id],
        |row| row.get(0),
    )?;
    Ok(owned)
}

/// The author's own recipe, published or not.
pub fn fetch_author_recipe(
    conn: &Connection,
    recipe_id: i64,
    author_id: i64,
    limits: &RecipesConfig,
) -> RepoResult<Option<RecipeDetail>> {
    let recipe = conn
        .query_row(
            &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE recipes.id = ?1 AND recipes.author_id = ?2"),
            params![recipe_id, author_id],
            recipe_from_row,
        )
        .optional()?;

    match recipe {
        Some(recipe) => Ok(Some(fetch_related(conn, recipe, limits)?)),
        None => Ok(None),
    }
}

/// A published recipe with its author's name and rating.
pub fn fetch_published_recipe(
    conn: &Connection,
    recipe_id: i64,
    limits: &RecipesConfig,
) -> RepoResult<Option<PublishedRecipe>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {RECIPE_COLUMNS}, users.username,
                        AVG(user_reviews.rating), COUNT(user_reviews.rating)
                 FROM recipes
                 JOIN users ON recipes.author_id = users.id
                 LEFT JOIN user_reviews ON recipes.id = user_reviews.recipe_id
                 WHERE recipes.id = ?1 AND recipes.published = 1
                 GROUP BY recipes.id"
            ),
            params![recipe_id],
            |row| {
                Ok((
                    recipe_from_row(row)?,
                    row.get::<_, String>(9)?,
                    RatingSummary {
                        average: row.get(10)?,
                        count: row.get(11)?,
                    },
                ))
            },
        )
        .optional()?;

    let Some((recipe, author_username, rating)) = row else {
        return Ok(None);
    };

    Ok(Some(PublishedRecipe {
        detail: fetch_related(conn, recipe, limits)?,
        author_username,
        rating,
    }))
}

fn fetch_related(
    conn: &Connection,
    recipe: Recipe,
    limits: &RecipesConfig,
) -> RepoResult<RecipeDetail> {
    let ingredients = conn
        .prepare(
            "SELECT id, recipe_id, order_number, amount, unit, title
             FROM ingredients WHERE recipe_id = ?1
             ORDER BY order_number, id LIMIT ?2",
        )?
        .query_map(params![recipe.id, limits.ingredients_max], |row| {
            Ok(Ingredient {
                id: row.get(0)?,
                recipe_id: row.get(1)?,
                order_number: row.get(2)?,
                amount: row.get(3)?,
                unit: row.get(4)?,
                title: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let instructions = conn
        .prepare(
            "SELECT id, recipe_id, order_number, instructions
             FROM instructions WHERE recipe_id = ?1
             ORDER BY order_number, id LIMIT ?2",
        )?
        .query_map(params![recipe.id, limits.instructions_max], |row| {
            Ok(Instruction {
                id: row.get(0)?,
                recipe_id: row.get(1)?,
                order_number: row.get(2)?,
                instructions: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let categories = conn
        .prepare(
            "SELECT categories.title
             FROM recipe_category
             JOIN categories ON recipe_category.category_id = categories.id
             WHERE recipe_category.recipe_id = ?1
             ORDER BY categories.title LIMIT ?2",
        )?
        .query_map(params![recipe.id, limits.categories_max], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    // Written reviews first, bare ratings after.
    let reviews = conn
        .prepare(
            "SELECT user_reviews.id, users.username, user_reviews.rating,
                    user_reviews.review, user_reviews.created_at
             FROM user_reviews JOIN users ON user_reviews.author_id = users.id
             WHERE user_reviews.recipe_id = ?1
             ORDER BY user_reviews.review IS NOT NULL DESC, user_reviews.id DESC
             LIMIT ?2",
        )?
        .query_map(params![recipe.id, limits.reviews_max], |row| {
            Ok(RecipeReview {
                id: row.get(0)?,
                username: row.get(1)?,
                rating: row.get(2)?,
                review: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RecipeDetail {
        recipe,
        ingredients,
        instructions,
        categories,
        reviews,
    })
}

// -- Listings --

/// Which published recipes a public listing shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedFilter {
    All,
    /// Case-insensitive substring of the title.
    TitleContains(String),
    Category(i64),
}

impl PublishedFilter {
    fn clause(&self) -> (&'static str, Vec<Value>) {
        match self {
            Self::All => ("", Vec::new()),
            Self::TitleContains(term) => (
                " AND recipes.title LIKE ? ESCAPE '\\'",
                vec![Value::Text(like_pattern(term))],
            ),
            Self::Category(id) => (
                " AND recipes.id IN (SELECT recipe_id FROM recipe_category WHERE category_id = ?)",
                vec![Value::Integer(*id)],
            ),
        }
    }
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Published recipes ordered by average rating, unrated recipes last.
pub fn list_published(
    conn: &Connection,
    filter: &PublishedFilter,
    page: i64,
    page_size: i64,
) -> RepoResult<Listing<RecipeSummary>> {
    let (clause, mut values) = filter.clause();

    let total_rows: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM recipes WHERE recipes.published = 1{clause}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;
    let page = Page::new(total_rows, page_size, page);

    values.push(Value::Integer(page.limit()));
    values.push(Value::Integer(page.offset()));
    let items = conn
        .prepare(&format!(
            "SELECT recipes.id, recipes.title, recipes.summary, recipes.published,
                    AVG(user_reviews.rating) AS rating, COUNT(user_reviews.rating)
             FROM recipes
             LEFT JOIN user_reviews ON recipes.id = user_reviews.recipe_id
             WHERE recipes.published = 1{clause}
             GROUP BY recipes.id
             ORDER BY rating DESC, recipes.id DESC
             LIMIT ? OFFSET ?"
        ))?
        .query_map(params_from_iter(values.iter()), summary_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Listing { items, page })
}

pub fn list_published_recipes(
    conn: &Connection,
    page: i64,
    page_size: i64,
) -> RepoResult<Listing<RecipeSummary>> {
    list_published(conn, &PublishedFilter::All, page, page_size)
}

pub fn search_published_recipes(
    conn: &Connection,
    term: &str,
    page: i64,
    page_size: i64,
) -> RepoResult<Listing<RecipeSummary>> {
    list_published(
        conn,
        &PublishedFilter::TitleContains(term.to_string()),
        page,
        page_size,
    )
}

/// All recipes of one author, newest first.
pub fn list_user_recipes(
    conn: &Connection,
    author_id: i64,
    page: i64,
    page_size: i64,
) -> RepoResult<Listing<RecipeSummary>> {
    let total_rows: i64 = conn.query_row(
        "SELECT COUNT(*) FROM recipes WHERE author_id = ?1",
        params![author_id],
        |row| row.get(0),
    )?;
    let page = Page::new(total_rows, page_size, page);

    let items = conn
        .prepare(
            "SELECT recipes.id, recipes.title, recipes.summary, recipes.published,
                    AVG(user_reviews.rating), COUNT(user_reviews.rating)
             FROM recipes
             LEFT JOIN user_reviews ON recipes.id = user_reviews.recipe_id
             WHERE recipes.author_id = ?1
             GROUP BY recipes.id
             ORDER BY recipes.id DESC
             LIMIT ?2 OFFSET ?3",
        )?
        .query_map(
            params![author_id, page.limit(), page.offset()],
            summary_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Listing { items, page })
}

// -- Update --

/// Scalar recipe fields to change. `None` keeps the stored value; for
/// nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeUpdate {
    pub title: Option<String>,
    pub summary: Option<Option<String>>,
    pub preparation_time: Option<Option<i64>>,
    pub cooking_time: Option<Option<i64>>,
    pub skill_level: Option<Option<i64>>,
    pub portions: Option<Option<i64>>,
    pub published: Option<bool>,
}

impl RecipeUpdate {
    /// Build an update from only the fields present in the form.
    ///
    /// An unchecked checkbox is not submitted at all, so `published` falls
    /// back to the hidden `published.default` field. With neither present
    /// the flag is left alone.
    pub fn from_form(fields: &FormFields) -> RepoResult<Self> {
        let title = match fields.get("title") {
            Some(raw) => match blank_to_none(raw) {
                Some(title) => Some(title),
                None => {
                    return Err(RepositoryError::Validation(
                        "Recipe title is required".into(),
                    ))
                }
            },
            None => None,
        };

        let published = fields
            .get("published")
            .or_else(|| fields.get("published.default"))
            .map(parse_flag);

        Ok(Self {
            title,
            summary: fields.get("summary").map(blank_to_none),
            preparation_time: optional_number(fields, "preparation_time", 0..=10_000)?,
            cooking_time: optional_number(fields, "cooking_time", 0..=10_000)?,
            skill_level: optional_number(fields, "skill_level", SKILL_LEVELS)?,
            portions: optional_number(fields, "portions", 1..=1_000)?,
            published,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut set = Vec::new();
        if let Some(title) = &self.title {
            set.push(("title", Value::from(title.clone())));
        }
        if let Some(summary) = &self.summary {
            set.push(("summary", Value::from(summary.clone())));
        }
        let numbers = [
            ("preparation_time", self.preparation_time),
            ("cooking_time", self.cooking_time),
            ("skill_level", self.skill_level),
            ("portions", self.portions),
        ];
        for (column, value) in numbers {
            if let Some(value) = value {
                set.push((column, Value::from(value)));
            }
        }
        if let Some(published) = self.published {
            set.push(("published", Value::from(published)));
        }
        set
    }
}

/// Apply `update` to the author's recipe. Returns `false` when no recipe
/// with that id belongs to the author.
pub fn update_author_recipe(
    conn: &Connection,
    recipe_id: i64,
    author_id: i64,
    update: &RecipeUpdate,
) -> RepoResult<bool> {
    let assignments = update.assignments();
    if assignments.is_empty() {
        return owns_recipe(conn, recipe_id, author_id);
    }

    let set_clause = assignments
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let n = assignments.len();
    let mut values: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
    values.push(Value::Integer(recipe_id));
    values.push(Value::Integer(author_id));

    let updated = conn.execute(
        &format!(
            "UPDATE recipes SET {} WHERE id = ?{} AND author_id = ?{}",
            set_clause,
            n + 1,
            n + 2
        ),
        params_from_iter(values.iter()),
    )?;
    Ok(updated > 0)
}

// -- Delete --

/// Delete the author's recipe; children and reviews go with it. Returns
/// `false` when nothing matched.
pub fn delete_author_recipe(conn: &Connection, recipe_id: i64, author_id: i64) -> RepoResult<bool> {
    let deleted = conn.execute(
        "DELETE FROM recipes WHERE id = ?1 AND author_id = ?2",
        params![recipe_id, author_id],
    )?;
    Ok(deleted > 0)
}
