use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{RatingSummary, ReviewSummary};
use crate::db::{RepoResult, RepositoryError};
use crate::pagination::{Listing, Page};
use crate::recipes::FormFields;

/// Start a review: a bare row with neither rating nor text. Only published
/// recipes can be reviewed; anything else is `NotFound`. A second review
/// of the same recipe by the same author is a `Conflict`.
pub fn insert_review(conn: &Connection, author_id: i64, recipe_id: i64) -> RepoResult<i64> {
    let inserted = conn.execute(
        "INSERT INTO user_reviews (author_id, recipe_id)
         SELECT ?1, id FROM recipes WHERE id = ?2 AND published = 1",
        params![author_id, recipe_id],
    )?;
    if inserted == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(conn.last_insert_rowid())
}

/// Id of the author's review of `recipe_id`, if they have one.
pub fn find_review_id(conn: &Connection, author_id: i64, recipe_id: i64) -> RepoResult<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM user_reviews WHERE author_id = ?1 AND recipe_id = ?2",
            params![author_id, recipe_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// The review with its recipe title, only if `author_id` wrote it.
pub fn fetch_author_review(
    conn: &Connection,
    review_id: i64,
    author_id: i64,
) -> RepoResult<Option<ReviewSummary>> {
    let review = conn
        .query_row(
            "SELECT user_reviews.id, user_reviews.recipe_id, recipes.title,
                    user_reviews.rating, user_reviews.review, user_reviews.created_at
             FROM user_reviews JOIN recipes ON user_reviews.recipe_id = recipes.id
             WHERE user_reviews.id = ?1 AND user_reviews.author_id = ?2",
            params![review_id, author_id],
            |row| {
                Ok(ReviewSummary {
                    id: row.get(0)?,
                    recipe_id: row.get(1)?,
                    recipe_title: row.get(2)?,
                    rating: row.get(3)?,
                    review: row.get(4)?,
                    created_at: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(review)
}

/// Fields of a review to change; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewUpdate {
    pub rating: Option<i64>,
    /// `Some(None)` clears the text.
    pub review: Option<Option<String>>,
}

impl ReviewUpdate {
    pub fn from_form(fields: &FormFields) -> RepoResult<Self> {
        let rating = match fields.get("rating").map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if (1..=5).contains(&n) => Some(n),
                _ => {
                    return Err(RepositoryError::Validation(
                        "Rating must be between 1 and 5".into(),
                    ))
                }
            },
        };
        let review = fields.get("review").map(|text| {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        });
        Ok(Self { rating, review })
    }
}

/// Returns `false` when no review with that id belongs to the author.
pub fn update_review(
    conn: &Connection,
    review_id: i64,
    author_id: i64,
    update: &ReviewUpdate,
) -> RepoResult<bool> {
    let clear_text = matches!(update.review, Some(None));
    let text = update.review.clone().flatten();
    let updated = conn.execute(
        "UPDATE user_reviews SET
            rating = COALESCE(?1, rating),
            review = CASE WHEN ?2 THEN NULL ELSE COALESCE(?3, review) END
         WHERE id = ?4 AND author_id = ?5",
        params![update.rating, clear_text, text, review_id, author_id],
    )?;
    Ok(updated > 0)
}

pub fn delete_review(conn: &Connection, review_id: i64, author_id: i64) -> RepoResult<bool> {
    let deleted = conn.execute(
        "DELETE FROM user_reviews WHERE id = ?1 AND author_id = ?2",
        params![review_id, author_id],
    )?;
    Ok(deleted > 0)
}

/// The author's reviews, newest first.
pub fn list_user_reviews(
    conn: &Connection,
    author_id: i64,
    page: i64,
    page_size: i64,
) -> RepoResult<Listing<ReviewSummary>> {
    let total_rows: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_reviews WHERE author_id = ?1",
        params![author_id],
        |row| row.get(0),
    )?;
    let page = Page::new(total_rows, page_size, page);

    let items = conn
        .prepare(
            "SELECT user_reviews.id, user_reviews.recipe_id, recipes.title,
                    user_reviews.rating, user_reviews.review, user_reviews.created_at
             FROM user_reviews JOIN recipes ON user_reviews.recipe_id = recipes.id
             WHERE user_reviews.author_id = ?1
             ORDER BY user_reviews.id DESC
             LIMIT ?2 OFFSET ?3",
        )?
        .query_map(params![author_id, page.limit(), page.offset()], |row| {
            Ok(ReviewSummary {
                id: row.get(0)?,
                recipe_id: row.get(1)?,
                recipe_title: row.get(2)?,
                rating: row.get(3)?,
                review: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Listing { items, page })
}

/// Average and count of the non-null ratings of one recipe.
pub fn rating_summary(conn: &Connection, recipe_id: i64) -> RepoResult<RatingSummary> {
    let summary = conn.query_row(
        "SELECT AVG(rating), COUNT(rating) FROM user_reviews WHERE recipe_id = ?1",
        params![recipe_id],
        |row| {
            Ok(RatingSummary {
                average: row.get(0)?,
                count: row.get(1)?,
            })
        },
    )?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Review;
    use crate::db::test_support::*;

    fn fetch_review(conn: &Connection, review_id: i64) -> RepoResult<Option<Review>> {
        let review = conn
            .query_row(
                "SELECT id, author_id, recipe_id, rating, review, created_at
                 FROM user_reviews WHERE id = ?1",
                params![review_id],
                |row| {
                    Ok(Review {
                        id: row.get(0)?,
                        author_id: row.get(1)?,
                        recipe_id: row.get(2)?,
                        rating: row.get(3)?,
                        review: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(review)
    }

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        pairs.iter().copied().collect()
    }

    fn rate(conn: &Connection, review_id: i64, author_id: i64, rating: i64) {
        let update = ReviewUpdate {
            rating: Some(rating),
            review: None,
        };
        assert!(update_review(conn, review_id, author_id, &update).unwrap());
    }

    #[test]
    fn average_excludes_unrated_reviews() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let recipe = add_recipe(&conn, alice, "Pancakes", true);
        let bob = insert_user(&conn, "bobby");
        let carol = insert_user(&conn, "carol");
        let dave = insert_user(&conn, "daveb");

        insert_review(&conn, bob, recipe).unwrap();
        let c = insert_review(&conn, carol, recipe).unwrap();
        let d = insert_review(&conn, dave, recipe).unwrap();
        rate(&conn, c, carol, 4);
        rate(&conn, d, dave, 2);

        let summary = rating_summary(&conn, recipe).unwrap();
        assert_eq!(summary.average, Some(3.0));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.display(), "3.0 (2)");
    }

    #[test]
    fn unrated_recipe_has_no_average() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let recipe = add_recipe(&conn, alice, "Pancakes", true);

        let summary = rating_summary(&conn, recipe).unwrap();
        assert_eq!(summary, RatingSummary::default());
        assert_eq!(summary.display(), "-");
    }

    #[test]
    fn bare_review_then_fill_in() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bobby");
        let recipe = add_recipe(&conn, alice, "Pancakes", true);

        let id = insert_review(&conn, bob, recipe).unwrap();
        let bare = fetch_review(&conn, id).unwrap().unwrap();
        assert_eq!(bare.rating, None);
        assert_eq!(bare.review, None);

        let update =
            ReviewUpdate::from_form(&form(&[("rating", "5"), ("review", " Great! ")])).unwrap();
        assert!(update_review(&conn, id, bob, &update).unwrap());

        let filled = fetch_author_review(&conn, id, bob).unwrap().unwrap();
        assert_eq!(filled.rating, Some(5));
        assert_eq!(filled.review.as_deref(), Some("Great!"));
        assert_eq!(filled.recipe_title, "Pancakes");
    }

    #[test]
    fn text_only_update_keeps_rating_and_blank_clears_text() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bobby");
        let recipe = add_recipe(&conn, alice, "Pancakes", true);
        let id = insert_review(&conn, bob, recipe).unwrap();
        rate(&conn, id, bob, 4);

        let text = ReviewUpdate::from_form(&form(&[("review", "Tasty")])).unwrap();
        update_review(&conn, id, bob, &text).unwrap();
        let clear = ReviewUpdate::from_form(&form(&[("review", "")])).unwrap();
        update_review(&conn, id, bob, &clear).unwrap();

        let review = fetch_review(&conn, id).unwrap().unwrap();
        assert_eq!(review.rating, Some(4));
        assert_eq!(review.review, None);
    }

    #[test]
    fn rating_outside_range_is_rejected() {
        for raw in ["0", "6", "five"] {
            assert!(matches!(
                ReviewUpdate::from_form(&form(&[("rating", raw)])),
                Err(RepositoryError::Validation(_))
            ));
        }
    }

    #[test]
    fn unpublished_or_missing_recipe_cannot_be_reviewed() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let draft = add_recipe(&conn, alice, "Draft", false);

        assert!(matches!(
            insert_review(&conn, alice, draft),
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            insert_review(&conn, alice, 4242),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn second_review_of_same_recipe_conflicts() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bobby");
        let recipe = add_recipe(&conn, alice, "Pancakes", true);

        let first = insert_review(&conn, bob, recipe).unwrap();
        assert!(matches!(
            insert_review(&conn, bob, recipe),
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(find_review_id(&conn, bob, recipe).unwrap(), Some(first));
        assert_eq!(find_review_id(&conn, alice, recipe).unwrap(), None);
    }

    #[test]
    fn other_users_cannot_touch_a_review() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bobby");
        let recipe = add_recipe(&conn, alice, "Pancakes", true);
        let id = insert_review(&conn, bob, recipe).unwrap();

        let update = ReviewUpdate {
            rating: Some(1),
            review: None,
        };
        assert!(!update_review(&conn, id, alice, &update).unwrap());
        assert!(fetch_author_review(&conn, id, alice).unwrap().is_none());
        assert!(!delete_review(&conn, id, alice).unwrap());
        assert!(delete_review(&conn, id, bob).unwrap());
        assert!(!delete_review(&conn, id, bob).unwrap());
    }

    #[test]
    fn own_review_listing_is_paginated() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bobby");
        for i in 0..12 {
            let recipe = add_recipe(&conn, alice, &format!("Recipe{}", i), true);
            insert_review(&conn, bob, recipe).unwrap();
        }

        let listing = list_user_reviews(&conn, bob, 2, 10).unwrap();
        assert_eq!(listing.page.total_pages, 2);
        assert_eq!(listing.items.len(), 2);
        assert!(list_user_reviews(&conn, alice, 1, 10).unwrap().is_empty());
    }
}
