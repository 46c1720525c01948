use std::fs;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::StoreLocation;
use crate::contract::{columns, SCHEMA_VERSION, TABLE_BOOKS};

/// Open the database at `location`, creating the parent directory of a file
/// database when needed, and make sure the schema exists.
pub fn open_connection(location: &StoreLocation) -> Result<Connection> {
    let conn = match location {
        StoreLocation::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
            Connection::open(path).context("failed to open SQLite database")?
        }
        StoreLocation::InMemory => {
            Connection::open_in_memory().context("failed to open in-memory SQLite database")?
        }
    };

    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the `books` table on a fresh database and stamp the schema version.
/// Running it again is a no-op. A database stamped with a version we do not
/// know is left alone: there are no migrations past the initial create.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;

    match version {
        0 => {
            conn.execute(&create_books_sql(), [])
                .context("failed to create books table")?;
            conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
                .context("failed to stamp schema version")?;
            tracing::info!(version = SCHEMA_VERSION, "created books schema");
        }
        SCHEMA_VERSION => {
            tracing::debug!(version, "books schema already current");
        }
        other => {
            tracing::warn!(
                found = other,
                expected = SCHEMA_VERSION,
                "unknown books schema version, leaving database untouched"
            );
        }
    }

    Ok(())
}

/// Read `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("failed to read schema version")
}

/// Characters stripped before the non-empty checks: space, tab, newline and
/// carriage return. Rarer Unicode whitespace is left to the validator.
const BLANK_CHARS: &str = "' ' || char(9, 10, 13)";

/// The table mirrors the validation rules so the engine refuses any row the
/// validator would have refused.
fn create_books_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            {id} INTEGER PRIMARY KEY AUTOINCREMENT,
            {title} TEXT NOT NULL CHECK (length(trim({title}, {blank})) > 0),
            {author} TEXT NOT NULL CHECK (length(trim({author}, {blank})) > 0),
            {price} REAL NOT NULL CHECK ({price} >= 0),
            {quantity} INTEGER NOT NULL CHECK ({quantity} >= 0),
            {supplier} TEXT NOT NULL CHECK (length(trim({supplier}, {blank})) > 0),
            {phone} TEXT NOT NULL CHECK (length(trim({phone}, {blank})) > 0)
        )",
        table = TABLE_BOOKS,
        id = columns::ID,
        title = columns::TITLE,
        author = columns::AUTHOR,
        price = columns::PRICE,
        quantity = columns::QUANTITY,
        supplier = columns::SUPPLIER,
        phone = columns::SUPPLIER_PHONE,
        blank = BLANK_CHARS,
    )
}
