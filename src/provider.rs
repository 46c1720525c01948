//! The resource facade. Every request runs the same synchronous pipeline:
//! classify the URI, validate the payload, execute against the store, publish
//! the change, respond. URI and validation failures stop the request before
//! the store is touched.

use crate::config::StoreConfig;
use crate::db::{BookStore, Query, ResultSet, Selection};
use crate::error::{ProviderError, ProviderResult};
use crate::models::ChangeSet;
use crate::notify::{Change, ChangeBus, ChangeKind, SubscriptionHandle};
use crate::uri::{ResourceUri, Router, Target};
use crate::validation::{validate_insert, validate_update};

/// Result of an insert that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The new row's item URI.
    Inserted(ResourceUri),
    /// The engine could not assign a row. Nothing was written.
    Failed,
}

impl InsertOutcome {
    pub fn id(&self) -> Option<i64> {
        match self {
            InsertOutcome::Inserted(uri) => uri.id(),
            InsertOutcome::Failed => None,
        }
    }
}

/// Entry point for everything that reads or writes books.
#[derive(Debug)]
pub struct BookProvider {
    router: Router,
    store: BookStore,
    bus: ChangeBus,
}

impl BookProvider {
    pub fn new(router: Router, store: BookStore) -> Self {
        Self {
            router,
            store,
            bus: ChangeBus::new(),
        }
    }

    /// Open the configured database and wire it to the configured router.
    pub fn open(config: &StoreConfig) -> ProviderResult<Self> {
        let store = BookStore::open(&config.location)?;
        Ok(Self::new(config.router.clone(), store))
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn store(&self) -> &BookStore {
        &self.store
    }

    fn resolve(&self, uri: &str) -> ProviderResult<Target> {
        self.router
            .match_uri(uri)
            .target()
            .ok_or_else(|| ProviderError::InvalidUri(uri.to_string()))
    }

    /// Selection for `target`, narrowed by whatever the caller passed.
    fn scope(target: Target, selection: Option<&Selection>) -> Selection {
        let base = match target {
            Target::Collection => Selection::all(),
            Target::Item(id) => Selection::by_id(id),
        };
        match selection {
            Some(extra) => base.merge(extra),
            None => base,
        }
    }

    /// MIME type of what `query` returns for `uri`.
    pub fn content_type(&self, uri: &str) -> ProviderResult<String> {
        let target = self.resolve(uri)?;
        Ok(self.router.content_type(target))
    }

    pub fn query(&self, uri: &str, query: &Query) -> ProviderResult<ResultSet> {
        let rows = match self.resolve(uri)? {
            Target::Collection => self.store.query_all(&query.selection, &query.sort)?,
            Target::Item(id) => self.store.query_by_id(id, &query.selection, &query.sort)?,
        };
        Ok(rows)
    }

    /// Insert one book. Only the collection URI accepts inserts.
    #[tracing::instrument(skip(self, changes))]
    pub fn insert(&self, uri: &str, changes: &ChangeSet) -> ProviderResult<InsertOutcome> {
        if let Target::Item(_) = self.resolve(uri)? {
            return Err(ProviderError::UnsupportedUri {
                operation: "insert",
                uri: uri.to_string(),
            });
        }
        validate_insert(changes)?;

        let Some(id) = self.store.insert(changes)? else {
            tracing::warn!("insert refused by storage engine");
            return Ok(InsertOutcome::Failed);
        };

        self.bus.publish(&Change {
            kind: ChangeKind::Inserted,
            uri: self.router.collection_uri(),
            ids: vec![id],
        });
        Ok(InsertOutcome::Inserted(self.router.item_uri(id)))
    }

    /// Apply `changes` to the rows addressed by `uri` (and `selection`, if
    /// any). Returns the number of rows changed.
    #[tracing::instrument(skip(self, changes, selection))]
    pub fn update(
        &self,
        uri: &str,
        changes: &ChangeSet,
        selection: Option<&Selection>,
    ) -> ProviderResult<usize> {
        let target = self.resolve(uri)?;
        validate_update(changes)?;
        if changes.is_empty() {
            return Ok(0);
        }

        let affected = self
            .store
            .update_where(changes, &Self::scope(target, selection))?;
        let count = affected.count();
        if count > 0 {
            self.bus.publish(&Change {
                kind: ChangeKind::Updated,
                uri: self.router.uri_for(target),
                ids: affected.ids,
            });
        }
        Ok(count)
    }

    /// Remove the rows addressed by `uri` (and `selection`, if any). Returns
    /// the number of rows removed.
    #[tracing::instrument(skip(self, selection))]
    pub fn delete(&self, uri: &str, selection: Option<&Selection>) -> ProviderResult<usize> {
        let target = self.resolve(uri)?;

        let affected = self.store.delete_where(&Self::scope(target, selection))?;
        let count = affected.count();
        if count > 0 {
            self.bus.publish(&Change {
                kind: ChangeKind::Deleted,
                uri: self.router.uri_for(target),
                ids: affected.ids,
            });
        }
        Ok(count)
    }

    /// Register `callback` for changes to `uri`. It stays registered until
    /// [`BookProvider::unsubscribe`] is called with the returned handle.
    pub fn subscribe<F>(&self, uri: &str, callback: F) -> ProviderResult<SubscriptionHandle>
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        let target = self.resolve(uri)?;
        Ok(self.bus.subscribe(target, callback))
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.bus.unsubscribe(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookField;
    use crate::validation::Violation;

    fn provider() -> BookProvider {
        BookProvider::open(&StoreConfig::in_memory()).unwrap()
    }

    fn dune() -> ChangeSet {
        ChangeSet::new()
            .with_title("Dune")
            .with_author("Herbert")
            .with_price(12.5)
            .with_quantity(3)
            .with_supplier("Acme")
            .with_supplier_phone("555-1234")
    }

    #[test]
    fn unknown_uri_fails_every_operation() {
        let provider = provider();
        let bad = "content://elsewhere/books";

        assert!(matches!(
            provider.query(bad, &Query::new()),
            Err(ProviderError::InvalidUri(_))
        ));
        assert!(matches!(
            provider.insert(bad, &dune()),
            Err(ProviderError::InvalidUri(_))
        ));
        assert!(matches!(
            provider.update(bad, &ChangeSet::new(), None),
            Err(ProviderError::InvalidUri(_))
        ));
        assert!(matches!(
            provider.delete(bad, None),
            Err(ProviderError::InvalidUri(_))
        ));
        assert!(matches!(
            provider.subscribe(bad, |_| {}),
            Err(ProviderError::InvalidUri(_))
        ));
        assert!(matches!(
            provider.content_type(bad),
            Err(ProviderError::InvalidUri(_))
        ));
    }

    #[test]
    fn insert_on_item_uri_is_unsupported() {
        let provider = provider();
        let uri = provider.router().item_uri(1);

        let err = provider.insert(uri.as_str(), &dune()).unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedUri { operation: "insert", .. }));
    }

    #[test]
    fn invalid_update_reports_field() {
        let provider = provider();
        let collection = provider.router().collection_uri();
        let id = provider
            .insert(collection.as_str(), &dune())
            .unwrap()
            .id()
            .unwrap();

        let item = provider.router().item_uri(id);
        let err = provider
            .update(item.as_str(), &ChangeSet::new().with_author(""), None)
            .unwrap_err();
        match err {
            ProviderError::Validation(err) => {
                assert_eq!(err.field, BookField::Author);
                assert_eq!(err.violation, Violation::Empty);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn item_query_honours_extra_selection() {
        let provider = provider();
        let collection = provider.router().collection_uri();
        let id = provider
            .insert(collection.as_str(), &dune())
            .unwrap()
            .id()
            .unwrap();
        let item = provider.router().item_uri(id);

        let matching = Query::new().filter(Selection::all().eq(BookField::Author, "Herbert"));
        assert_eq!(provider.query(item.as_str(), &matching).unwrap().count(), 1);

        let other = Query::new().filter(Selection::all().eq(BookField::Author, "Austen"));
        assert_eq!(provider.query(item.as_str(), &other).unwrap().count(), 0);
    }

    #[test]
    fn content_type_follows_target() {
        let provider = provider();
        let collection = provider.router().collection_uri();
        let item = provider.router().item_uri(9);

        assert!(provider
            .content_type(collection.as_str())
            .unwrap()
            .starts_with("vnd.cursor.dir/"));
        assert!(provider
            .content_type(item.as_str())
            .unwrap()
            .starts_with("vnd.cursor.item/"));
    }
}
