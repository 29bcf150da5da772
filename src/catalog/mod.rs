mod cache;
pub(crate) mod entry;
pub mod error;
mod fetcher;
mod loader;
mod source;

pub use entry::CatalogEntry;
pub use fetcher::{CatalogFetcher, HttpTransport};
pub use loader::{load, split_lines};
pub use source::CatalogSource;
