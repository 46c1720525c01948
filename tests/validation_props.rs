//! Property tests for the validation rules and the storage boundary.
//!
//! Run with: `cargo test --test validation_props`

use proptest::prelude::*;

use bookstore_inventory::{
    validate_insert, validate_update, BookField, BookProvider, ChangeSet, ProviderError, Query,
    StoreConfig, Violation,
};

// =============================================================================
// Strategies
// =============================================================================

fn text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 .-]{0,20}"
}

fn valid_book() -> impl Strategy<Value = ChangeSet> {
    (text(), text(), 0.0f64..10_000.0, 0i64..100_000, text(), "[0-9]{3}-[0-9]{4}").prop_map(
        |(title, author, price, quantity, supplier, phone)| {
            ChangeSet::new()
                .with_title(title)
                .with_author(author)
                .with_price(price)
                .with_quantity(quantity)
                .with_supplier(supplier)
                .with_supplier_phone(phone)
        },
    )
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn valid_books_pass_insert_and_update(book in valid_book()) {
        prop_assert_eq!(validate_insert(&book), Ok(()));
        prop_assert_eq!(validate_update(&book), Ok(()));
    }

    #[test]
    fn negative_price_is_always_rejected(book in valid_book(), price in -10_000.0f64..-0.001) {
        let err = validate_insert(&book.with_price(price)).unwrap_err();
        prop_assert_eq!(err.field, BookField::Price);
        prop_assert_eq!(err.violation, Violation::Negative);

        let err = validate_update(&ChangeSet::new().with_price(price)).unwrap_err();
        prop_assert_eq!(err.field, BookField::Price);
    }

    #[test]
    fn negative_quantity_is_always_rejected(quantity in i64::MIN..0) {
        let err = validate_update(&ChangeSet::new().with_quantity(quantity)).unwrap_err();
        prop_assert_eq!(err.field, BookField::Quantity);
        prop_assert_eq!(err.violation, Violation::Negative);
    }

    #[test]
    fn whitespace_text_is_rejected(blank in "[ \t]{0,8}") {
        let err = validate_update(&ChangeSet::new().with_supplier(blank)).unwrap_err();
        prop_assert_eq!(err.field, BookField::Supplier);
        prop_assert_eq!(err.violation, Violation::Empty);
    }

    #[test]
    fn valid_insert_round_trips_through_storage(book in valid_book()) {
        let provider = BookProvider::open(&StoreConfig::in_memory()).unwrap();
        let collection = provider.router().collection_uri();

        let id = provider.insert(collection.as_str(), &book).unwrap().id().unwrap();
        let item = provider.router().item_uri(id);
        let stored = provider.query(item.as_str(), &Query::new()).unwrap().next().unwrap();

        for field in BookField::WRITABLE {
            prop_assert_eq!(Some(stored.value(field)), book.get(field));
        }
    }

    #[test]
    fn rejected_payloads_never_reach_storage(book in valid_book(), quantity in i64::MIN..0) {
        let provider = BookProvider::open(&StoreConfig::in_memory()).unwrap();
        let collection = provider.router().collection_uri();

        let result = provider.insert(collection.as_str(), &book.with_quantity(quantity));
        prop_assert!(matches!(result, Err(ProviderError::Validation(_))));
        prop_assert_eq!(provider.query(collection.as_str(), &Query::new()).unwrap().count(), 0);
    }
}
