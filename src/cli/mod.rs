pub mod prompt;
pub mod report;
pub mod scrape;
pub mod setup;
pub mod ui;
