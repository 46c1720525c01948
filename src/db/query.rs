//! Typed building blocks for `WHERE` and `ORDER BY` clauses plus the
//! paged, single-pass [`ResultSet`] handed back by queries. Values are always bound
//! as parameters; only column names from [`BookField`] reach the SQL text.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, ToSql};

use crate::models::{Book, BookField, FieldValue};

use super::books::fetch_books_by_ids;
use super::store::lock;

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Integer(value) => ToSqlOutput::from(*value),
            FieldValue::Real(value) => ToSqlOutput::from(*value),
            FieldValue::Text(value) => ToSqlOutput::from(value.as_str()),
        })
    }
}

/// Comparison operator for one selection condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// SQL `LIKE`, case-insensitive for ASCII.
    Like,
}

impl Comparison {
    fn sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::NotEq => "<>",
            Comparison::Lt => "<",
            Comparison::LtEq => "<=",
            Comparison::Gt => ">",
            Comparison::GtEq => ">=",
            Comparison::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    field: BookField,
    op: Comparison,
    value: FieldValue,
}

/// Conjunction of field conditions. An empty selection matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    conditions: Vec<Condition>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: i64) -> Self {
        Self::all().eq(BookField::Id, id)
    }

    /// Add `field op value` to the conjunction.
    pub fn and(mut self, field: BookField, op: Comparison, value: impl Into<FieldValue>) -> Self {
        self.conditions.push(Condition {
            field,
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: BookField, value: impl Into<FieldValue>) -> Self {
        self.and(field, Comparison::Eq, value)
    }

    /// Every condition of `self` followed by every condition of `other`.
    pub fn merge(mut self, other: &Selection) -> Self {
        self.conditions.extend(other.conditions.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render a ` WHERE ...` clause whose placeholders start at `?first`.
    /// Returns an empty string when there is nothing to filter on.
    pub(crate) fn where_clause(&self, first: usize) -> (String, Vec<&FieldValue>) {
        if self.conditions.is_empty() {
            return (String::new(), Vec::new());
        }

        let predicates = self
            .conditions
            .iter()
            .enumerate()
            .map(|(offset, condition)| {
                format!(
                    "{} {} ?{}",
                    condition.field.column(),
                    condition.op.sql(),
                    first + offset
                )
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        let params = self.conditions.iter().map(|condition| &condition.value).collect();

        (format!(" WHERE {predicates}"), params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Ordering terms applied left to right. Rows always fall back to id order
/// so results are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    terms: Vec<(BookField, Direction)>,
}

impl SortOrder {
    pub fn by(field: BookField, direction: Direction) -> Self {
        Self::default().then(field, direction)
    }

    pub fn then(mut self, field: BookField, direction: Direction) -> Self {
        self.terms.push((field, direction));
        self
    }

    pub(crate) fn order_clause(&self) -> String {
        let mut terms: Vec<String> = self
            .terms
            .iter()
            .map(|(field, direction)| {
                let direction = match direction {
                    Direction::Ascending => "ASC",
                    Direction::Descending => "DESC",
                };
                // Text sorts ignore case so mixed-case titles group together.
                if field.is_text() {
                    format!("{} COLLATE NOCASE {direction}", field.column())
                } else {
                    format!("{} {direction}", field.column())
                }
            })
            .collect();
        if !self.terms.iter().any(|(field, _)| *field == BookField::Id) {
            terms.push(format!("{} ASC", BookField::Id.column()));
        }
        format!(" ORDER BY {}", terms.join(", "))
    }
}

/// Query options accepted by the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub selection: Selection,
    pub sort: SortOrder,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// Rows loaded per trip to the database while iterating a [`ResultSet`].
pub const PAGE_SIZE: usize = 64;

/// Rows returned by a query, consumed once.
///
/// The set of matching ids and their order are fixed when the query runs.
/// Rows are then loaded [`PAGE_SIZE`] at a time, each page under the store
/// lock, so a page always reflects a committed state. A row deleted before
/// its page loads is skipped; one updated before then shows the new values.
/// Iterate to the end or call [`ResultSet::close`] to let go of the
/// connection early; dropping the set does the same.
#[derive(Debug)]
pub struct ResultSet {
    conn: Option<Arc<Mutex<Connection>>>,
    pending: VecDeque<i64>,
    page: VecDeque<Book>,
}

impl ResultSet {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>, ids: Vec<i64>) -> Self {
        Self {
            conn: Some(conn),
            pending: ids.into(),
            page: VecDeque::new(),
        }
    }

    /// Rows not yet handed out. Rows deleted since the query ran are still
    /// counted until their page is loaded.
    pub fn remaining(&self) -> usize {
        self.page.len() + self.pending.len()
    }

    /// Release the connection and drop whatever was not consumed.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.conn = None;
        self.pending.clear();
        self.page.clear();
    }

    fn load_page(&mut self) -> Result<()> {
        let Some(conn) = &self.conn else {
            self.pending.clear();
            return Ok(());
        };
        let take = self.pending.len().min(PAGE_SIZE);
        let ids: Vec<i64> = self.pending.drain(..take).collect();
        let books = fetch_books_by_ids(&*lock(conn)?, &ids)?;
        tracing::debug!(requested = ids.len(), loaded = books.len(), "loaded result page");
        self.page.extend(books);
        Ok(())
    }
}

impl Iterator for ResultSet {
    type Item = Book;

    fn next(&mut self) -> Option<Book> {
        while self.page.is_empty() && !self.pending.is_empty() {
            if let Err(err) = self.load_page() {
                tracing::error!(error = ?err, "abandoning result set");
                self.release();
                return None;
            }
        }

        let book = self.page.pop_front();
        if book.is_none() {
            self.conn = None;
        }
        book
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}
