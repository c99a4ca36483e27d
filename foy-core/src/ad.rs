use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Moderation status of an ad. Only `Active` ads are served.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdStatus {
    Pending,
    Active,
    Paused,
    Rejected,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Pending => "pending",
            AdStatus::Active => "active",
            AdStatus::Paused => "paused",
            AdStatus::Rejected => "rejected",
        }
    }

    /// Transitions an admin may apply. Rejected is terminal.
    pub fn can_transition_to(&self, next: AdStatus) -> bool {
        matches!(
            (self, next),
            (AdStatus::Pending, AdStatus::Active)
                | (AdStatus::Pending, AdStatus::Rejected)
                | (AdStatus::Active, AdStatus::Paused)
                | (AdStatus::Active, AdStatus::Rejected)
                | (AdStatus::Paused, AdStatus::Active)
                | (AdStatus::Paused, AdStatus::Rejected)
        )
    }
}

impl std::fmt::Display for AdStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AdStatus::Pending),
            "active" => Ok(AdStatus::Active),
            "paused" => Ok(AdStatus::Paused),
            "rejected" => Ok(AdStatus::Rejected),
            other => Err(CoreError::ValidationError(format!("unknown ad status '{}'", other))),
        }
    }
}

/// Place listing embedded in a sponsored-place ad.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceSummary {
    pub name: String,
    pub address: String,
    pub rating: f32,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Visual format of an ad. Closed set; consumers match on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdFormat {
    Banner,
    SponsoredPlace { place: PlaceSummary },
    Native,
}

impl AdFormat {
    pub fn kind(&self) -> &'static str {
        match self {
            AdFormat::Banner => "banner",
            AdFormat::SponsoredPlace { .. } => "sponsored_place",
            AdFormat::Native => "native",
        }
    }

    pub fn place(&self) -> Option<&PlaceSummary> {
        match self {
            AdFormat::SponsoredPlace { place } => Some(place),
            AdFormat::Banner | AdFormat::Native => None,
        }
    }
}

/// Region and place-type criteria. An empty list matches no filter value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Targeting {
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub place_types: Vec<String>,
}

impl Targeting {
    pub fn has_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    pub fn has_place_type(&self, place_type: &str) -> bool {
        self.place_types.iter().any(|p| p == place_type)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdMetrics {
    pub impressions: u64,
    pub clicks: u64,
}

/// A unit of ad inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ad {
    pub id: String,
    pub format: AdFormat,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub cta_text: Option<String>,
    pub cta_url: Option<String>,
    pub status: AdStatus,
    pub placements: Vec<String>,
    pub targeting: Targeting,
    pub priority: i32,
    pub metrics: AdMetrics,
    pub created_at: DateTime<Utc>,
}

impl Ad {
    pub fn is_active(&self) -> bool {
        self.status == AdStatus::Active
    }

    pub fn has_placement(&self, placement: &str) -> bool {
        self.placements.iter().any(|p| p == placement)
    }

    /// Apply a moderation transition in place.
    pub fn transition_to(&mut self, next: AdStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }
}

/// Advertiser-submitted ad, before an id and status are assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct AdSubmission {
    pub format: AdFormat,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
    pub cta_text: Option<String>,
    pub cta_url: Option<String>,
    pub placements: Vec<String>,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub priority: i32,
}

impl AdSubmission {
    /// Validate and turn the submission into a pending ad with zeroed metrics.
    pub fn into_ad(self) -> CoreResult<Ad> {
        if self.title.trim().is_empty() {
            return Err(CoreError::ValidationError("title must not be empty".into()));
        }
        if self.placements.is_empty() {
            return Err(CoreError::ValidationError("at least one placement is required".into()));
        }
        if let Some(url) = &self.cta_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(CoreError::ValidationError(format!("cta_url must be http(s): {}", url)));
            }
            // Served back as a Location header.
            if url.chars().any(|c| c.is_control() || c.is_whitespace()) {
                return Err(CoreError::ValidationError("cta_url must not contain whitespace or control characters".into()));
            }
        }

        Ok(Ad {
            id: Uuid::new_v4().to_string(),
            format: self.format,
            title: self.title,
            description: self.description,
            image: self.image,
            cta_text: self.cta_text,
            cta_url: self.cta_url,
            status: AdStatus::Pending,
            placements: self.placements,
            targeting: self.targeting,
            priority: self.priority,
            metrics: AdMetrics::default(),
            created_at: Utc::now(),
        })
    }
}
