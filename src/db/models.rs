use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub preparation_time: Option<i64>,
    pub cooking_time: Option<i64>,
    pub skill_level: Option<i64>,
    pub portions: Option<i64>,
    pub published: bool,
    pub author_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub recipe_id: i64,
    pub order_number: i64,
    pub amount: Option<String>,
    pub unit: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: i64,
    pub recipe_id: i64,
    pub order_number: i64,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub recipe_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub author_id: i64,
    pub recipe_id: i64,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub created_at: String,
}

/// Average of the non-null ratings of one recipe, recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}

impl RatingSummary {
    pub fn display(&self) -> String {
        match self.average {
            Some(avg) => format!("{:.1} ({})", avg, self.count),
            None => "-".to_string(),
        }
    }
}

/// One row of a recipe listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub published: bool,
    pub rating: RatingSummary,
}

/// A review as shown under a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeReview {
    pub id: i64,
    pub username: String,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub created_at: String,
}

/// A review in its author's own listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub id: i64,
    pub recipe_id: i64,
    pub recipe_title: String,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub created_at: String,
}

/// Recipe with its ordered child rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
    pub categories: Vec<String>,
    pub reviews: Vec<RecipeReview>,
}

/// Public view of a published recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedRecipe {
    pub detail: RecipeDetail,
    pub author_username: String,
    pub rating: RatingSummary,
}
