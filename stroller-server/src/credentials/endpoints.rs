//! Transitland REST endpoints.

/// Default base URL for the Transitland v2 REST API.
pub const DEFAULT_BASE_URL: &str = "https://transit.land/api/v2/rest";

/// Endpoint URLs for the Transitland REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitlandEndpoints {
    base_url: String,
}

impl TransitlandEndpoints {
    /// Endpoints rooted at `base_url` (trailing slashes are ignored).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn routes_url(&self) -> String {
        format!("{}/routes", self.base_url)
    }

    pub fn stops_url(&self) -> String {
        format!("{}/stops", self.base_url)
    }
}

impl Default for TransitlandEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
