//! Target service description

use serde::{Deserialize, Serialize};

/// Service a job is launched against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// URL of the service, without trailing slash
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beacon_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_slug: Option<String>,
}

impl Service {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            beacon_id: None,
            event_slug: None,
        }
    }

    pub fn with_beacon_id(mut self, beacon_id: i64) -> Self {
        self.beacon_id = Some(beacon_id);
        self
    }

    pub fn with_event_slug(mut self, event_slug: impl Into<String>) -> Self {
        self.event_slug = Some(event_slug.into());
        self
    }
}
