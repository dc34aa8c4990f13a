//! Trait seams for the model, the record store, the scraping service and
//! the page directory.

pub mod llm;
pub mod pages;
pub mod scraper;
pub mod store;

pub use llm::{GenerationRequest, Llm};
pub use pages::PageDirectory;
pub use scraper::AdScraper;
pub use store::RecordStore;
