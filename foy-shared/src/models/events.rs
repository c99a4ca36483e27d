use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of interaction recorded against an ad.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdEventType {
    Impression,
    Click,
}

impl AdEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdEventType::Impression => "impression",
            AdEventType::Click => "click",
        }
    }
}

impl std::fmt::Display for AdEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published to the tracking topic once a live counter update succeeded.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct AdTrackedEvent {
    pub event_id: Uuid,
    pub ad_id: String,
    pub event_type: AdEventType,
    pub timestamp: i64,
}

impl AdTrackedEvent {
    pub fn new(ad_id: &str, event_type: AdEventType) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            ad_id: ad_id.to_string(),
            event_type,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
