//! Ordered child rows (ingredients, instructions) of a recipe.
//!
//! Rows carry an `order_number` that is unique within its recipe but may
//! have gaps. Readers always sort by it. Every mutation here is a single
//! SQL statement so that two requests reordering the same recipe cannot
//! interleave into duplicate order numbers.

use std::collections::BTreeMap;

use rusqlite::{params, params_from_iter, Connection, ToSql};

use crate::recipes::form::{RowAction, SubListEdit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildList {
    Ingredients,
    Instructions,
}

impl ChildList {
    pub fn table(self) -> &'static str {
        match self {
            Self::Ingredients => "ingredients",
            Self::Instructions => "instructions",
        }
    }

    /// Field name prefix used by the edit form.
    pub fn form_prefix(self) -> &'static str {
        self.table()
    }

    /// Columns a form may write.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Ingredients => &["amount", "unit", "title"],
            Self::Instructions => &["instructions"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn window_fn(self) -> &'static str {
        match self {
            Self::Up => "lag",
            Self::Down => "lead",
        }
    }
}

/// Insert an empty row after the current last one. Returns `None` when the
/// recipe already has `max_rows` rows.
pub fn append_row(
    conn: &Connection,
    list: ChildList,
    recipe_id: i64,
    max_rows: i64,
) -> rusqlite::Result<Option<i64>> {
    let table = list.table();
    let inserted = conn.execute(
        &format!(
            "INSERT INTO {table} (recipe_id, order_number)
             SELECT ?1, next_order FROM (
                SELECT IFNULL(MAX(order_number), 0) + 1 AS next_order, COUNT(*) AS row_count
                FROM {table}
                WHERE recipe_id = ?1
             )
             WHERE row_count < ?2"
        ),
        params![recipe_id, max_rows],
    )?;

    Ok((inserted > 0).then(|| conn.last_insert_rowid()))
}

/// Delete one row. Siblings keep their order numbers. Deleting a row that
/// does not exist (or belongs to another recipe) is a no-op.
pub fn delete_row(
    conn: &Connection,
    list: ChildList,
    recipe_id: i64,
    row_id: i64,
) -> rusqlite::Result<bool> {
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE recipe_id = ?1 AND id = ?2", list.table()),
        params![recipe_id, row_id],
    )?;
    Ok(deleted > 0)
}

/// Swap the order number of a row with its neighbour in `direction`.
/// The first row cannot move up and the last cannot move down; both are
/// no-ops that return `false`.
pub fn move_row(
    conn: &Connection,
    list: ChildList,
    recipe_id: i64,
    row_id: i64,
    direction: Direction,
) -> rusqlite::Result<bool> {
    let table = list.table();
    let window = direction.window_fn();
    // The neighbour lookup and both writes happen in one statement.
    let swapped = conn.execute(
        &format!(
            "UPDATE {table} SET order_number = CASE
                WHEN {table}.id = nb.neighbour_id THEN nb.order_number
                ELSE nb.neighbour_order
             END
             FROM (
                SELECT id, order_number,
                    {window}(id) OVER (ORDER BY order_number, id) AS neighbour_id,
                    {window}(order_number) OVER (ORDER BY order_number, id) AS neighbour_order
                FROM {table}
                WHERE recipe_id = ?1
             ) AS nb
             WHERE nb.id = ?2
               AND nb.neighbour_id IS NOT NULL
               AND {table}.id IN (nb.id, nb.neighbour_id)"
        ),
        params![recipe_id, row_id],
    )?;
    Ok(swapped > 0)
}

/// Write the submitted columns of one row. Columns missing from `fields`
/// keep their stored value; blank values are stored as NULL. Columns the
/// list does not have are skipped.
pub fn update_row(
    conn: &Connection,
    list: ChildList,
    recipe_id: i64,
    row_id: i64,
    fields: &BTreeMap<String, String>,
) -> rusqlite::Result<bool> {
    let mut assignments = Vec::new();
    let mut values: Vec<Option<&str>> = Vec::new();
    for (column, value) in fields {
        if !list.columns().contains(&column.as_str()) {
            tracing::debug!("Ignoring unknown {} column: {}", list.table(), column);
            continue;
        }
        values.push(Some(value.trim()).filter(|v| !v.is_empty()));
        assignments.push(format!("{} = ?{}", column, values.len()));
    }
    if assignments.is_empty() {
        return Ok(false);
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE recipe_id = ?{} AND id = ?{}",
        list.table(),
        assignments.join(", "),
        values.len() + 1,
        values.len() + 2,
    );
    let mut bound: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
    bound.push(&recipe_id);
    bound.push(&row_id);

    let updated = conn.execute(&sql, params_from_iter(bound))?;
    Ok(updated > 0)
}

/// What a sub-list edit actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditOutcome {
    pub moved: usize,
    pub deleted: usize,
    pub updated: usize,
    pub appended: bool,
    /// An append was requested but the list was full.
    pub append_refused: bool,
}

/// Execute a decoded edit: moves and deletes first, then column updates
/// per row, then at most one append.
pub fn apply_edit(
    conn: &Connection,
    list: ChildList,
    recipe_id: i64,
    edit: &SubListEdit,
    max_rows: i64,
) -> rusqlite::Result<EditOutcome> {
    let mut outcome = EditOutcome::default();

    for &(row_id, action) in &edit.actions {
        match action {
            RowAction::Up => {
                outcome.moved += move_row(conn, list, recipe_id, row_id, Direction::Up)? as usize
            }
            RowAction::Down => {
                outcome.moved += move_row(conn, list, recipe_id, row_id, Direction::Down)? as usize
            }
            RowAction::Delete => {
                outcome.deleted += delete_row(conn, list, recipe_id, row_id)? as usize
            }
        }
    }

    for (&row_id, fields) in &edit.updates {
        outcome.updated += update_row(conn, list, recipe_id, row_id, fields)? as usize;
    }

    if edit.append {
        match append_row(conn, list, recipe_id, max_rows)? {
            Some(_) => outcome.appended = true,
            None => outcome.append_refused = true,
        }
    }

    Ok(outcome)
}

/// Row ids of a recipe's list in display order.
pub fn ordered_ids(conn: &Connection, list: ChildList, recipe_id: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE recipe_id = ?1 ORDER BY order_number, id",
        list.table()
    ))?;
    let ids = stmt
        .query_map(params![recipe_id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}
