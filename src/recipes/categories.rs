//! Recipe categories and the many-to-many join.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Category, RecipeSummary};
use crate::db::{RepoResult, RepositoryError};
use crate::pagination::Listing;
use crate::recipes::repository::{list_published, PublishedFilter};

/// Split a comma separated `categories` field into distinct trimmed titles,
/// keeping first-seen order.
pub fn parse_category_titles(raw: &str) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for title in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !titles.iter().any(|t| t.eq_ignore_ascii_case(title)) {
            titles.push(title.to_string());
        }
    }
    titles
}

/// Replace the recipe's categories with `titles`, creating missing ones.
/// More than `max_titles` is rejected before anything is written.
/// Callers run this inside the edit transaction and check ownership first.
pub fn set_recipe_categories(
    conn: &Connection,
    recipe_id: i64,
    titles: &[String],
    max_titles: i64,
) -> RepoResult<()> {
    if titles.len() as i64 > max_titles {
        return Err(RepositoryError::Validation(format!(
            "At most {} categories per recipe",
            max_titles
        )));
    }

    conn.execute(
        "DELETE FROM recipe_category WHERE recipe_id = ?1",
        params![recipe_id],
    )?;

    let mut insert_category =
        conn.prepare_cached("INSERT OR IGNORE INTO categories (title) VALUES (?1)")?;
    let mut link = conn.prepare_cached(
        "INSERT OR IGNORE INTO recipe_category (recipe_id, category_id)
         SELECT ?1, id FROM categories WHERE title = ?2 COLLATE NOCASE",
    )?;
    for title in titles {
        insert_category.execute(params![title])?;
        link.execute(params![recipe_id, title])?;
    }
    Ok(())
}

/// Every category with the number of published recipes in it.
pub fn list_categories(conn: &Connection) -> RepoResult<Vec<Category>> {
    let categories = conn
        .prepare(
            "SELECT categories.id, categories.title, COUNT(recipes.id)
             FROM categories
             LEFT JOIN recipe_category ON categories.id = recipe_category.category_id
             LEFT JOIN recipes ON recipe_category.recipe_id = recipes.id
                AND recipes.published = 1
             GROUP BY categories.id
             ORDER BY categories.title",
        )?
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                title: row.get(1)?,
                recipe_count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn fetch_category(conn: &Connection, category_id: i64) -> RepoResult<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT categories.id, categories.title,
                (SELECT COUNT(*) FROM recipe_category
                 JOIN recipes ON recipe_category.recipe_id = recipes.id
                 WHERE recipe_category.category_id = categories.id AND recipes.published = 1)
             FROM categories WHERE categories.id = ?1",
            params![category_id],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    recipe_count: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(category)
}

pub fn list_category_recipes(
    conn: &Connection,
    category_id: i64,
    page: i64,
    page_size: i64,
) -> RepoResult<Listing<RecipeSummary>> {
    list_published(conn, &PublishedFilter::Category(category_id), page, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecipesConfig;
    use crate::db::test_support::*;
    use crate::recipes::repository::fetch_author_recipe;

    const MAX: i64 = 20;

    #[test]
    fn parse_drops_blanks_and_duplicates() {
        assert_eq!(
            parse_category_titles(" Soup, dessert ,,soup, Vegan "),
            vec!["Soup", "dessert", "Vegan"]
        );
        assert!(parse_category_titles(" , ").is_empty());
    }

    #[test]
    fn set_replaces_links_and_reuses_categories() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let soup = add_recipe(&conn, alice, "Soup", true);
        let stew = add_recipe(&conn, alice, "Stew", false);

        set_recipe_categories(&conn, soup, &["Warm".into(), "Quick".into()], MAX).unwrap();
        set_recipe_categories(&conn, stew, &["Warm".into()], MAX).unwrap();
        set_recipe_categories(&conn, soup, &["Warm".into()], MAX).unwrap();

        let categories = list_categories(&conn).unwrap();
        let counts: Vec<(&str, i64)> = categories
            .iter()
            .map(|c| (c.title.as_str(), c.recipe_count))
            .collect();
        // Stew is unpublished, Quick lost its only recipe.
        assert_eq!(counts, vec![("Quick", 0), ("Warm", 1)]);
    }

    #[test]
    fn category_listing_shows_only_published_members() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let soup = add_recipe(&conn, alice, "Soup", true);
        let draft = add_recipe(&conn, alice, "Draft", false);
        let bread = add_recipe(&conn, alice, "Bread", true);
        set_recipe_categories(&conn, soup, &["Warm".into()], MAX).unwrap();
        set_recipe_categories(&conn, draft, &["Warm".into()], MAX).unwrap();
        set_recipe_categories(&conn, bread, &["Baked".into()], MAX).unwrap();

        let warm = list_categories(&conn)
            .unwrap()
            .into_iter()
            .find(|c| c.title == "Warm")
            .unwrap();
        let listing = list_category_recipes(&conn, warm.id, 1, 5).unwrap();
        assert_eq!(
            listing.items.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![soup]
        );

        let fetched = fetch_category(&conn, warm.id).unwrap().unwrap();
        assert_eq!(fetched.recipe_count, 1);
        assert!(fetch_category(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn deleting_recipe_removes_links() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let soup = add_recipe(&conn, alice, "Soup", true);
        set_recipe_categories(&conn, soup, &["Warm".into()], MAX).unwrap();

        conn.execute("DELETE FROM recipes WHERE id = ?1", params![soup])
            .unwrap();
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM recipe_category", [], |r| r.get(0))
            .unwrap();
        assert_eq!(links, 0);
    }

    #[test]
    fn titles_differing_in_case_share_one_category() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let soup = add_recipe(&conn, alice, "Soup", true);
        let stew = add_recipe(&conn, alice, "Stew", true);

        set_recipe_categories(&conn, soup, &["Warm".into()], MAX).unwrap();
        set_recipe_categories(&conn, stew, &["warm".into()], MAX).unwrap();

        let categories = list_categories(&conn).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].title, "Warm");
        assert_eq!(categories[0].recipe_count, 2);
    }

    #[test]
    fn too_many_titles_are_rejected_and_links_kept() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let soup = add_recipe(&conn, alice, "Soup", true);
        set_recipe_categories(&conn, soup, &["Warm".into()], MAX).unwrap();

        let many: Vec<String> = (1..=25).map(|n| format!("Category{:02}", n)).collect();
        let err = set_recipe_categories(&conn, soup, &many, MAX).unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));

        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM recipe_category", [], |r| r.get(0))
            .unwrap();
        assert_eq!(links, 1);
    }

    #[test]
    fn editor_round_trip_keeps_every_category() {
        let (pool, _tmp) = test_pool();
        let conn = pool.get().unwrap();
        let alice = insert_user(&conn, "alice");
        let soup = add_recipe(&conn, alice, "Soup", true);
        let limits = RecipesConfig::default();

        let full: Vec<String> = (1..=limits.categories_max)
            .map(|n| format!("Category{:02}", n))
            .collect();
        set_recipe_categories(&conn, soup, &full, limits.categories_max).unwrap();

        // Save the editor field exactly as the edit page renders it
        let detail = fetch_author_recipe(&conn, soup, alice, &limits)
            .unwrap()
            .unwrap();
        let resubmitted = parse_category_titles(&detail.categories.join(", "));
        set_recipe_categories(&conn, soup, &resubmitted, limits.categories_max).unwrap();

        let links: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM recipe_category WHERE recipe_id = ?1",
                params![soup],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(links, limits.categories_max);
    }
}
