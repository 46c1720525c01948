//! Fixed names shared by the router, the schema and anyone building URIs by
//! hand. Everything here is a plain constant so tests and the binary agree on
//! the exact same strings.

/// URI scheme used for every resource address.
pub const SCHEME: &str = "content";

/// Authority token naming the whole inventory resource.
pub const AUTHORITY: &str = "com.example.bookstore";

/// Path segment addressing the book collection.
pub const PATH_BOOKS: &str = "books";

/// Name of the single table holding book rows.
pub const TABLE_BOOKS: &str = "books";

/// Schema version written to `PRAGMA user_version` after the initial create.
pub const SCHEMA_VERSION: i64 = 1;

/// File name of the on-disk database.
pub const DB_FILE_NAME: &str = "inventory.db";

/// MIME type prefix for a list of rows.
pub const CONTENT_DIR_PREFIX: &str = "vnd.cursor.dir";

/// MIME type prefix for a single row.
pub const CONTENT_ITEM_PREFIX: &str = "vnd.cursor.item";

pub mod columns {
    //! Column names for the `books` table.

    pub const ID: &str = "_id";
    pub const TITLE: &str = "title";
    pub const AUTHOR: &str = "author";
    pub const PRICE: &str = "price";
    pub const QUANTITY: &str = "quantity";
    pub const SUPPLIER: &str = "supplier";
    pub const SUPPLIER_PHONE: &str = "supplier_phone";
}
