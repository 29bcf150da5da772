use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::cache::cache_filename;

/// Placeholder in a catalog URL that is replaced by the caller identity.
pub const IDENTITY_PLACEHOLDER: &str = "{identity}";

/// Where the catalog comes from. An empty URL disables the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogSource {
    pub url: String,
    #[serde(default)]
    pub identity: Option<String>,
}

impl CatalogSource {
    pub fn new(url: impl Into<String>, identity: Option<String>) -> Self {
        Self {
            url: url.into(),
            identity,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.url.trim().is_empty()
    }

    /// Personalized endpoints need a caller identity and are always refetched.
    pub fn requires_identity(&self) -> bool {
        self.url.contains(IDENTITY_PLACEHOLDER)
    }

    /// URL to fetch, or `None` when an identity is required but unavailable.
    pub fn resolved_url(&self) -> Option<String> {
        if !self.requires_identity() {
            return Some(self.url.clone());
        }
        let identity = self.identity.as_deref().filter(|id| !id.is_empty())?;
        Some(self.url.replace(IDENTITY_PLACEHOLDER, identity))
    }

    pub fn cache_filename(&self) -> String {
        cache_filename(&self.url)
    }
}
