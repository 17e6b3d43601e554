pub mod books_to_scrape;
pub mod http;

pub use books_to_scrape::BooksCatalog;
pub use http::HttpFetcher;
