use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use rusqlite::Connection;

use crate::config::StoreLocation;
use crate::models::ChangeSet;

use super::books::{create_book, delete_books, fetch_ids, update_books, Affected};
use super::connection::{open_connection, schema_version};
use super::query::{ResultSet, Selection, SortOrder};

/// Owner of the single SQLite connection. Every statement runs under the
/// mutex, so at most one write is in flight and a read never observes a
/// half-applied statement. Open result sets share the connection and take
/// the lock again for each page they load.
#[derive(Debug)]
pub struct BookStore {
    conn: Arc<Mutex<Connection>>,
}

impl BookStore {
    pub fn open(location: &StoreLocation) -> Result<Self> {
        let conn = open_connection(location)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection whose schema the caller already ensured.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        lock(&self.conn)
    }

    /// The matching ids are fixed here; row contents are read page by page
    /// as the caller iterates.
    pub fn query_all(&self, selection: &Selection, sort: &SortOrder) -> Result<ResultSet> {
        let ids = fetch_ids(&*self.lock()?, selection, sort)?;
        Ok(ResultSet::new(Arc::clone(&self.conn), ids))
    }

    /// Zero or one row; `selection` narrows further.
    pub fn query_by_id(&self, id: i64, selection: &Selection, sort: &SortOrder) -> Result<ResultSet> {
        self.query_all(&Selection::by_id(id).merge(selection), sort)
    }

    /// `None` means the engine could not assign a row.
    pub fn insert(&self, changes: &ChangeSet) -> Result<Option<i64>> {
        let conn = self.lock()?;
        create_book(&conn, changes)
    }

    pub fn update_where(&self, changes: &ChangeSet, selection: &Selection) -> Result<Affected> {
        if changes.is_empty() {
            return Ok(Affected::default());
        }
        let conn = self.lock()?;
        update_books(&conn, changes, selection)
    }

    pub fn delete_where(&self, selection: &Selection) -> Result<Affected> {
        let conn = self.lock()?;
        delete_books(&conn, selection)
    }

    pub fn schema_version(&self) -> Result<i64> {
        let conn = self.lock()?;
        schema_version(&conn)
    }
}

pub(super) fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow!("book store connection lock poisoned"))
}
