use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{params_from_iter, Connection, Error as SqlError, Row};

use crate::contract::{columns, TABLE_BOOKS};
use crate::models::{Book, BookField, ChangeSet, FieldValue};

use super::query::{Selection, SortOrder};

/// Rows touched by an update or delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Affected {
    pub ids: Vec<i64>,
}

impl Affected {
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}

/// Column list shared by every `SELECT` so `map_book` can read by position.
fn select_columns() -> String {
    [BookField::Id]
        .into_iter()
        .chain(BookField::WRITABLE)
        .map(BookField::column)
        .collect::<Vec<_>>()
        .join(", ")
}

fn map_book(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        price: row.get(3)?,
        quantity: row.get(4)?,
        supplier: row.get(5)?,
        supplier_phone: row.get(6)?,
    })
}

/// Ids of every row matching `selection`, ordered by `sort`. Queries hold on
/// to this list and load the rows themselves a page at a time.
pub fn fetch_ids(conn: &Connection, selection: &Selection, sort: &SortOrder) -> Result<Vec<i64>> {
    let (filter, params) = selection.where_clause(1);
    let sql = format!(
        "SELECT {} FROM {TABLE_BOOKS}{filter}{}",
        columns::ID,
        sort.order_clause()
    );

    let mut stmt = conn.prepare(&sql).context("failed to prepare book query")?;
    let ids = stmt
        .query_map(params_from_iter(params), |row| row.get(0))
        .context("failed to query book ids")?
        .collect::<Result<Vec<i64>, _>>()
        .context("failed to collect book ids")?;

    tracing::debug!(rows = ids.len(), "queried books");
    Ok(ids)
}

/// Load the rows for `ids`, returned in the order the ids are given. Ids
/// whose row has since been deleted are skipped.
pub fn fetch_books_by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<Book>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = (1..=ids.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {} FROM {TABLE_BOOKS} WHERE {} IN ({placeholders})",
        select_columns(),
        columns::ID
    );

    let mut stmt = conn.prepare(&sql).context("failed to prepare book page query")?;
    let mut by_id = stmt
        .query_map(params_from_iter(ids), map_book)
        .context("failed to load book page")?
        .map(|book| book.map(|book| (book.id, book)))
        .collect::<Result<HashMap<_, _>, _>>()
        .context("failed to collect book page")?;

    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

/// Insert one row built from `changes` and return its id. When the engine
/// refuses the row (a constraint, a full disk, a read-only file) the refusal
/// is logged and `None` comes back instead of an error.
pub fn create_book(conn: &Connection, changes: &ChangeSet) -> Result<Option<i64>> {
    let entries = changes.entries();
    let names = entries
        .iter()
        .map(|(field, _)| field.column())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=entries.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("INSERT INTO {TABLE_BOOKS} ({names}) VALUES ({placeholders})");

    match conn.execute(&sql, params_from_iter(entries.iter().map(|(_, value)| value))) {
        Ok(_) => {
            let id = conn.last_insert_rowid();
            tracing::debug!(id, "inserted book");
            Ok(Some(id))
        }
        Err(err @ SqlError::SqliteFailure(..)) => {
            tracing::error!(error = %err, "failed to insert book row");
            Ok(None)
        }
        Err(err) => Err(err).context("failed to insert book"),
    }
}

/// Apply `changes` to every row matching `selection`. An empty change set
/// never reaches the engine.
pub fn update_books(conn: &Connection, changes: &ChangeSet, selection: &Selection) -> Result<Affected> {
    if changes.is_empty() {
        return Ok(Affected::default());
    }

    let entries = changes.entries();
    let assignments = entries
        .iter()
        .enumerate()
        .map(|(index, (field, _))| format!("{} = ?{}", field.column(), index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let (filter, filter_params) = selection.where_clause(entries.len() + 1);
    let sql = format!(
        "UPDATE {TABLE_BOOKS} SET {assignments}{filter} RETURNING {}",
        columns::ID
    );

    let params: Vec<&FieldValue> = entries
        .iter()
        .map(|(_, value)| value)
        .chain(filter_params)
        .collect();
    let ids = collect_ids(conn, &sql, params).context("failed to update books")?;

    tracing::debug!(rows = ids.len(), "updated books");
    Ok(Affected { ids })
}

/// Remove every row matching `selection`.
pub fn delete_books(conn: &Connection, selection: &Selection) -> Result<Affected> {
    let (filter, params) = selection.where_clause(1);
    let sql = format!(
        "DELETE FROM {TABLE_BOOKS}{filter} RETURNING {}",
        columns::ID
    );

    let ids = collect_ids(conn, &sql, params).context("failed to delete books")?;

    tracing::debug!(rows = ids.len(), "deleted books");
    Ok(Affected { ids })
}

/// Run a statement ending in `RETURNING _id` to completion.
fn collect_ids(conn: &Connection, sql: &str, params: Vec<&FieldValue>) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(sql).context("failed to prepare statement")?;
    let mut ids = stmt
        .query_map(params_from_iter(params), |row| row.get::<_, i64>(0))
        .context("failed to execute statement")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect affected ids")?;
    ids.sort_unstable();
    Ok(ids)
}
