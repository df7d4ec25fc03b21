//! Random test content for `--seed-users N`.

use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection};

use crate::config::RecipesConfig;
use crate::db::{with_transaction, RepoResult, RepositoryError};
use crate::recipes::categories::set_recipe_categories;
use crate::state::DbPool;

const WORDS: &[&str] = &[
    "kaali", "peruna", "sipuli", "porkkana", "lohi", "ruis", "mustikka", "puolukka", "sieni",
    "kurpitsa", "kerma", "voi", "hunaja", "omena", "leipä", "keitto", "laatikko", "piirakka",
    "paisti", "salaatti", "muhennos", "pata", "kastike", "vanukas", "tuore", "paahdettu",
    "savustettu", "kotoisa", "mausteinen", "makea", "suolainen", "rapea", "mehevä", "kevyt",
];

const UNITS: &[&str] = &["g", "kg", "dl", "l", "tl", "rkl", "kpl", "pussi", "purkki"];

const CATEGORIES: &[&str] = &[
    "Arkiruoka", "Juhla", "Jälkiruoka", "Kasvis", "Kala", "Liha", "Keitot", "Leivonnaiset",
    "Salaatit", "Aamiainen", "Välipala", "Juomat",
];

/// What one seeding run produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: u32,
    pub recipes: u32,
    pub reviews: u32,
}

/// Create `users` test users, each with 0..=10 recipes, then let every new
/// user review 5..=20 random published recipes. Runs in one transaction.
pub fn seed<R: Rng>(pool: &DbPool, rng: &mut R, users: u32) -> RepoResult<SeedReport> {
    let mut conn = pool.get()?;
    with_transaction(&mut conn, |tx| {
        let first: i64 = tx.query_row("SELECT IFNULL(MAX(id), 0) + 1 FROM users", [], |r| {
            r.get(0)
        })?;

        let mut report = SeedReport::default();
        let mut user_ids = Vec::with_capacity(users as usize);
        for n in 0..i64::from(users) {
            tx.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, '')",
                params![format!("test{}", first + n)],
            )?;
            let user_id = tx.last_insert_rowid();
            user_ids.push(user_id);
            report.users += 1;

            for _ in 0..rng.gen_range(0..=10_u32) {
                insert_random_recipe(tx, rng, user_id)?;
                report.recipes += 1;
            }
        }

        let published: Vec<i64> = {
            let mut stmt = tx.prepare("SELECT id FROM recipes WHERE published = 1")?;
            let ids = stmt.query_map([], |r| r.get(0))?;
            ids.collect::<Result<_, _>>()?
        };
        if published.is_empty() {
            return Ok(report);
        }

        for &user_id in &user_ids {
            for _ in 0..rng.gen_range(5..=20_u32) {
                let Some(&recipe_id) = published.choose(rng) else {
                    break;
                };
                let rating = rng.gen_range(1..=5_i64);
                let n = rng.gen_range(1..=3_usize);
                let text = sentences(rng, n);
                // One review per recipe and author; repeats are skipped
                report.reviews += tx.execute(
                    "INSERT OR IGNORE INTO user_reviews (author_id, recipe_id, rating, review)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![user_id, recipe_id, rating, text],
                )? as u32;
            }
        }

        Ok::<_, RepositoryError>(report)
    })
}

fn insert_random_recipe<R: Rng>(conn: &Connection, rng: &mut R, author_id: i64) -> RepoResult<i64> {
    let title_text = format!("{} [TEST]", title(rng));
    let n = rng.gen_range(3..=8_usize);
    let summary = sentences(rng, n);
    conn.execute(
        "INSERT INTO recipes (title, summary, preparation_time, cooking_time,
                              skill_level, portions, published, author_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            title_text,
            summary,
            rng.gen_range(0..=120_i64),
            rng.gen_range(0..=600_i64),
            rng.gen_range(1..=4_i64),
            rng.gen_range(1..=20_i64),
            rng.gen_bool(0.5),
            author_id
        ],
    )?;
    let recipe_id = conn.last_insert_rowid();

    for order in 0..rng.gen_range(3..=10_i64) {
        let amount = rng.gen_range(1..=15_i64).to_string();
        let unit = pick(rng, UNITS);
        let name = title(rng);
        conn.execute(
            "INSERT INTO ingredients (recipe_id, order_number, amount, unit, title)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![recipe_id, order, amount, unit, name],
        )?;
    }
    for order in 0..rng.gen_range(3..=10_i64) {
        let n = rng.gen_range(1..=4_usize);
        let text = sentences(rng, n);
        conn.execute(
            "INSERT INTO instructions (recipe_id, order_number, instructions)
             VALUES (?1, ?2, ?3)",
            params![recipe_id, order, text],
        )?;
    }

    let count = rng.gen_range(0..=4_usize);
    let categories: Vec<String> = CATEGORIES
        .choose_multiple(rng, count)
        .map(|c| c.to_string())
        .collect();
    set_recipe_categories(
        conn,
        recipe_id,
        &categories,
        RecipesConfig::default().categories_max,
    )?;

    Ok(recipe_id)
}

fn pick<R: Rng>(rng: &mut R, words: &[&'static str]) -> &'static str {
    words.choose(rng).copied().unwrap_or("x")
}

/// One to three words, first one capitalised.
fn title<R: Rng>(rng: &mut R) -> String {
    let count = rng.gen_range(1..=3_usize);
    let words: Vec<&str> = (0..count).map(|_| pick(&mut *rng, WORDS)).collect();
    capitalise(&words.join(" "))
}

fn sentences<R: Rng>(rng: &mut R, n: usize) -> String {
    (0..n)
        .map(|_| {
            let count = rng.gen_range(2..=10_usize);
            let words: Vec<&str> = (0..count).map(|_| pick(&mut *rng, WORDS)).collect();
            format!("{}.", capitalise(&words.join(" ")))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn seeds_users_recipes_and_reviews() {
        let (pool, _dir) = test_pool();
        let mut rng = StdRng::seed_from_u64(7);
        let report = seed(&pool, &mut rng, 6).unwrap();
        assert_eq!(report.users, 6);

        let conn = pool.get().unwrap();
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        let recipes: i64 = conn
            .query_row("SELECT COUNT(*) FROM recipes", [], |r| r.get(0))
            .unwrap();
        let reviews: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_reviews", [], |r| r.get(0))
            .unwrap();
        assert_eq!(users, 6);
        assert_eq!(recipes, i64::from(report.recipes));
        assert_eq!(reviews, i64::from(report.reviews));

        // Every seeded recipe has at least three ingredients and steps
        let thin: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM recipes r
                 WHERE (SELECT COUNT(*) FROM ingredients i WHERE i.recipe_id = r.id) < 3
                    OR (SELECT COUNT(*) FROM instructions s WHERE s.recipe_id = r.id) < 3",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(thin, 0);
    }

    #[test]
    fn second_run_continues_user_numbering() {
        let (pool, _dir) = test_pool();
        let mut rng = StdRng::seed_from_u64(1);
        seed(&pool, &mut rng, 2).unwrap();
        seed(&pool, &mut rng, 2).unwrap();

        let conn = pool.get().unwrap();
        let distinct: i64 = conn
            .query_row("SELECT COUNT(DISTINCT username) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(distinct, 4);
    }

    #[test]
    fn capitalise_handles_multibyte_first_letter() {
        assert_eq!(capitalise("äes"), "Äes");
        assert_eq!(capitalise(""), "");
    }
}
