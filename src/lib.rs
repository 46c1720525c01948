//! Core library surface for the bookstore inventory data layer.
//!
//! A [`BookProvider`] routes logical URIs, validates payloads, runs CRUD
//! against the embedded SQLite store and fans changes out to subscribers.
//! Presentation code is expected to talk to the provider only.
pub mod config;
pub mod contract;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod provider;
pub mod telemetry;
pub mod uri;
pub mod validation;

pub use config::{StoreConfig, StoreLocation};
pub use db::{BookStore, Comparison, Direction, Query, ResultSet, Selection, SortOrder};
pub use error::{ProviderError, ProviderResult};

/// The domain types other layers manipulate.
pub use models::{Book, BookField, ChangeSet, FieldValue, NewBook};

pub use notify::{Change, ChangeKind, SubscriptionHandle};
pub use provider::{BookProvider, InsertOutcome};
pub use uri::{ResourceUri, Router, Target, UriMatch};
pub use validation::{validate_insert, validate_update, ValidationError, Violation};
