use std::sync::Arc;

use db::collection::{CollectionClient, CollectionError};
use services::services::assistant::AssistantGateway;

pub mod config;
pub mod error;
pub mod routes;

/// Bounds applied to `?limit=` on collection reads.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 500,
        }
    }
}

impl PageLimits {
    /// Missing means the default; anything above the maximum is clamped.
    pub fn resolve(&self, raw: Option<&str>) -> Result<i64, CollectionError> {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(self.default_limit);
        };
        let limit = raw
            .parse::<i64>()
            .map_err(|_| CollectionError::InvalidValue {
                field: "limit".to_string(),
                reason: format!("expected an integer, got '{raw}'"),
            })?;
        if limit <= 0 {
            return Err(CollectionError::InvalidLimit(limit));
        }
        Ok(limit.min(self.max_limit))
    }
}

#[derive(Clone)]
pub struct AppState {
    collections: Arc<dyn CollectionClient>,
    assistant: AssistantGateway,
    page_limits: PageLimits,
}

impl AppState {
    pub fn new(
        collections: Arc<dyn CollectionClient>,
        assistant: AssistantGateway,
        page_limits: PageLimits,
    ) -> Self {
        Self {
            collections,
            assistant,
            page_limits,
        }
    }

    pub fn collections(&self) -> Arc<dyn CollectionClient> {
        Arc::clone(&self.collections)
    }

    pub fn assistant(&self) -> &AssistantGateway {
        &self.assistant
    }

    pub fn page_limits(&self) -> PageLimits {
        self.page_limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limit_resolution() {
        let limits = PageLimits::default();
        assert_eq!(limits.resolve(None).unwrap(), 100);
        assert_eq!(limits.resolve(Some("")).unwrap(), 100);
        assert_eq!(limits.resolve(Some("25")).unwrap(), 25);
        assert_eq!(limits.resolve(Some("10000")).unwrap(), 500);
        assert!(limits.resolve(Some("0")).is_err());
        assert!(limits.resolve(Some("ten")).is_err());
    }
}
