use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid tle: {0}")]
    InvalidTle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("cache file error: {0}")]
    Cache(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
}
