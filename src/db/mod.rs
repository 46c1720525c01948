//! Persistence module split across logical submodules.

mod books;
mod connection;
mod query;
mod store;

pub use books::Affected;
pub use connection::{ensure_schema, open_connection, schema_version};
pub use query::{Comparison, Direction, Query, ResultSet, Selection, SortOrder};
pub use store::BookStore;
