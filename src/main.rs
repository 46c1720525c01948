//! Binary entry point: open the configured inventory database and print a
//! stock report. Handy for checking what a presentation layer would see.
use bookstore_inventory::{
    telemetry, BookField, BookProvider, Direction, Query, SortOrder, StoreConfig,
};

fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = StoreConfig::from_env()?;
    let provider = BookProvider::open(&config)?;
    let collection = provider.router().collection_uri();

    let query = Query::new().sort(SortOrder::by(BookField::Title, Direction::Ascending));
    let books = provider.query(collection.as_str(), &query)?;
    tracing::info!(location = ?config.location, rows = books.remaining(), "loaded inventory");

    let mut total = 0.0;
    for book in books {
        total += book.stock_value();
        println!(
            "{:>4}  {:<32} {:>8.2} x {:<4} {} ({})",
            book.id,
            book.to_string(),
            book.price,
            book.quantity,
            book.supplier,
            book.supplier_phone
        );
    }
    println!("stock value: {total:.2}");
    Ok(())
}
