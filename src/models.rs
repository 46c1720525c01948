//! Domain models that mirror the `books` table and get passed between the
//! router, the validator and the store. These types stay light-weight data
//! holders; the rules about which values are acceptable live in
//! `validation`, and the SQL lives in `db`.

use std::fmt;

use crate::contract::columns;

/// Every column a caller can name. `Id` is readable and selectable but never
/// writable, which is why [`BookField::WRITABLE`] leaves it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BookField {
    Id,
    Title,
    Author,
    Price,
    Quantity,
    Supplier,
    SupplierPhone,
}

impl BookField {
    /// Writable fields in the order validation reports them.
    pub const WRITABLE: [BookField; 6] = [
        BookField::Title,
        BookField::Author,
        BookField::Price,
        BookField::Quantity,
        BookField::Supplier,
        BookField::SupplierPhone,
    ];

    /// Column backing this field in the `books` table.
    pub fn column(self) -> &'static str {
        match self {
            BookField::Id => columns::ID,
            BookField::Title => columns::TITLE,
            BookField::Author => columns::AUTHOR,
            BookField::Price => columns::PRICE,
            BookField::Quantity => columns::QUANTITY,
            BookField::Supplier => columns::SUPPLIER,
            BookField::SupplierPhone => columns::SUPPLIER_PHONE,
        }
    }

    /// Resolve a column name back to its field.
    pub fn from_column(name: &str) -> Option<BookField> {
        [BookField::Id]
            .into_iter()
            .chain(BookField::WRITABLE)
            .find(|field| field.column() == name)
    }

    /// Whether the field holds free text (as opposed to a number).
    pub fn is_text(self) -> bool {
        matches!(
            self,
            BookField::Title | BookField::Author | BookField::Supplier | BookField::SupplierPhone
        )
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookField::Id => "id",
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Price => "price",
            BookField::Quantity => "quantity",
            BookField::Supplier => "supplier",
            BookField::SupplierPhone => "supplier phone",
        };
        f.write_str(label)
    }
}

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to reals so price comparisons accept either.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Real(value) => Some(*value),
            FieldValue::Integer(value) => Some(*value as f64),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A persisted book row. Instances only ever come out of the store, so every
/// field already satisfies the table constraints.
pub struct Book {
    /// Primary key assigned on insert. Never reused, even after a delete.
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Unit price. Stored as a SQLite `REAL`.
    pub price: f64,
    /// Units in stock.
    pub quantity: i64,
    pub supplier: String,
    /// Kept as raw text; formatting belongs to whoever displays it.
    pub supplier_phone: String,
}

impl Book {
    /// Typed accessor keyed by field.
    pub fn value(&self, field: BookField) -> FieldValue {
        match field {
            BookField::Id => FieldValue::Integer(self.id),
            BookField::Title => FieldValue::Text(self.title.clone()),
            BookField::Author => FieldValue::Text(self.author.clone()),
            BookField::Price => FieldValue::Real(self.price),
            BookField::Quantity => FieldValue::Integer(self.quantity),
            BookField::Supplier => FieldValue::Text(self.supplier.clone()),
            BookField::SupplierPhone => FieldValue::Text(self.supplier_phone.clone()),
        }
    }

    /// Typed accessor keyed by column name, for callers that only know the
    /// table layout.
    pub fn get(&self, column: &str) -> Option<FieldValue> {
        BookField::from_column(column).map(|field| self.value(field))
    }

    /// Stock value of this row (`price * quantity`).
    pub fn stock_value(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.author)
    }
}

/// Partial payload naming only the fields to write. Update leaves every
/// absent slot untouched; insert requires all of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    title: Option<String>,
    author: Option<String>,
    price: Option<f64>,
    quantity: Option<i64>,
    supplier: Option<String>,
    supplier_phone: Option<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn with_supplier_phone(mut self, phone: impl Into<String>) -> Self {
        self.supplier_phone = Some(phone.into());
        self
    }

    /// Value staged for `field`, if any. `Id` is never staged.
    pub fn get(&self, field: BookField) -> Option<FieldValue> {
        match field {
            BookField::Id => None,
            BookField::Title => self.title.clone().map(FieldValue::Text),
            BookField::Author => self.author.clone().map(FieldValue::Text),
            BookField::Price => self.price.map(FieldValue::Real),
            BookField::Quantity => self.quantity.map(FieldValue::Integer),
            BookField::Supplier => self.supplier.clone().map(FieldValue::Text),
            BookField::SupplierPhone => self.supplier_phone.clone().map(FieldValue::Text),
        }
    }

    /// Staged values in column order.
    pub fn entries(&self) -> Vec<(BookField, FieldValue)> {
        BookField::WRITABLE
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fully-populated insert payload, handy when every value is known up front.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: f64,
    pub quantity: i64,
    pub supplier: String,
    pub supplier_phone: String,
}

impl From<NewBook> for ChangeSet {
    fn from(book: NewBook) -> Self {
        ChangeSet::new()
            .with_title(book.title)
            .with_author(book.author)
            .with_price(book.price)
            .with_quantity(book.quantity)
            .with_supplier(book.supplier)
            .with_supplier_phone(book.supplier_phone)
    }
}
