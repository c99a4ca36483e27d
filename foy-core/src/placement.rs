use serde::Deserialize;

use crate::ad::Ad;
use crate::{CoreError, CoreResult};

/// Number of ads returned for a placement when the caller gives no limit.
pub const DEFAULT_PLACEMENT_LIMIT: usize = 3;

/// Larger requested limits are capped to this.
pub const MAX_PLACEMENT_LIMIT: usize = 50;

/// Ephemeral query for the ads of one UI slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRequest {
    pub placement: String,
    pub region: Option<String>,
    pub place_type: Option<String>,
    pub limit: usize,
}

/// Query-string filters as they arrive over HTTP.
#[derive(Debug, Default, Deserialize)]
pub struct PlacementFilters {
    pub region: Option<String>,
    pub place_type: Option<String>,
    pub limit: Option<usize>,
}

impl PlacementRequest {
    pub fn new(placement: impl Into<String>) -> Self {
        Self {
            placement: placement.into(),
            region: None,
            place_type: None,
            limit: DEFAULT_PLACEMENT_LIMIT,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_place_type(mut self, place_type: impl Into<String>) -> Self {
        self.place_type = Some(place_type.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Build a request from HTTP filters. Blank filter values count as absent
    /// and the limit is capped at [`MAX_PLACEMENT_LIMIT`].
    pub fn from_filters(placement: impl Into<String>, filters: PlacementFilters) -> CoreResult<Self> {
        let placement = placement.into();
        if placement.trim().is_empty() {
            return Err(CoreError::ValidationError("placement must not be empty".into()));
        }
        let limit = filters.limit.unwrap_or(DEFAULT_PLACEMENT_LIMIT);
        if limit == 0 {
            return Err(CoreError::ValidationError("limit must be greater than zero".into()));
        }

        Ok(Self {
            placement,
            region: filters.region.filter(|r| !r.trim().is_empty()),
            place_type: filters.place_type.filter(|p| !p.trim().is_empty()),
            limit: limit.min(MAX_PLACEMENT_LIMIT),
        })
    }

    /// Whether `ad` is eligible for this request: active, slotted here, and
    /// carrying every supplied targeting value.
    pub fn matches(&self, ad: &Ad) -> bool {
        if !ad.is_active() || !ad.has_placement(&self.placement) {
            return false;
        }
        if let Some(region) = &self.region {
            if !ad.targeting.has_region(region) {
                return false;
            }
        }
        if let Some(place_type) = &self.place_type {
            if !ad.targeting.has_place_type(place_type) {
                return false;
            }
        }
        true
    }
}

/// Select the ads for `request` from an inventory, keeping inventory order.
/// No shuffling and no priority weighting.
pub fn select<'a, I>(inventory: I, request: &PlacementRequest) -> Vec<Ad>
where
    I: IntoIterator<Item = &'a Ad>,
{
    inventory
        .into_iter()
        .filter(|ad| request.matches(ad))
        .take(request.limit)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad::{AdFormat, AdMetrics, AdStatus, Targeting};
    use chrono::Utc;

    fn ad(id: &str, placements: &[&str], regions: &[&str], place_types: &[&str]) -> Ad {
        Ad {
            id: id.to_string(),
            format: AdFormat::Banner,
            title: id.to_string(),
            description: String::new(),
            image: None,
            cta_text: None,
            cta_url: None,
            status: AdStatus::Active,
            placements: placements.iter().map(|s| s.to_string()).collect(),
            targeting: Targeting {
                regions: regions.iter().map(|s| s.to_string()).collect(),
                place_types: place_types.iter().map(|s| s.to_string()).collect(),
            },
            priority: 0,
            metrics: AdMetrics::default(),
            created_at: Utc::now(),
        }
    }

    fn inventory() -> Vec<Ad> {
        vec![
            ad("a", &["homepage_hero"], &["Dakar"], &["restaurant"]),
            ad("b", &["homepage_hero", "places_list"], &["Thiès"], &["hotel"]),
            ad("c", &["homepage_hero"], &["Dakar", "Thiès"], &["hotel"]),
            ad("d", &["places_list"], &["Dakar"], &["restaurant"]),
            ad("e", &["homepage_hero"], &[], &[]),
        ]
    }

    fn ids(ads: &[Ad]) -> Vec<&str> {
        ads.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_default_limit_is_three() {
        let ads = inventory();
        let req = PlacementRequest::new("homepage_hero");
        assert_eq!(req.limit, DEFAULT_PLACEMENT_LIMIT);
        assert_eq!(ids(&select(&ads, &req)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unknown_placement_yields_empty() {
        let ads = inventory();
        let req = PlacementRequest::new("checkout_footer");
        assert!(select(&ads, &req).is_empty());
    }

    #[test]
    fn test_region_filter_excludes_untargeted_ads() {
        let ads = inventory();
        let req = PlacementRequest::new("homepage_hero").with_region("Dakar").with_limit(10);
        // "e" has no regions at all and must not match a supplied region
        assert_eq!(ids(&select(&ads, &req)), vec!["a", "c"]);
    }

    #[test]
    fn test_region_and_place_type_combined() {
        let ads = inventory();
        let req = PlacementRequest::new("homepage_hero")
            .with_region("Thiès")
            .with_place_type("hotel");
        assert_eq!(ids(&select(&ads, &req)), vec!["b", "c"]);
    }

    #[test]
    fn test_inactive_ads_are_never_selected() {
        let mut ads = inventory();
        ads[0].status = AdStatus::Paused;
        ads[2].status = AdStatus::Pending;
        let req = PlacementRequest::new("homepage_hero").with_limit(10);
        assert_eq!(ids(&select(&ads, &req)), vec!["b", "e"]);
    }

    #[test]
    fn test_results_respect_limit_and_membership() {
        let ads = inventory();
        for limit in 1..=6 {
            let req = PlacementRequest::new("homepage_hero").with_region("Dakar").with_limit(limit);
            let selected = select(&ads, &req);
            assert!(selected.len() <= limit);
            for ad in &selected {
                assert!(ad.has_placement("homepage_hero"));
                assert!(ad.targeting.has_region("Dakar"));
            }
        }
    }

    #[test]
    fn test_from_filters_caps_huge_limit() {
        let filters = PlacementFilters { region: None, place_type: None, limit: Some(usize::MAX) };
        let req = PlacementRequest::from_filters("homepage_hero", filters).unwrap();
        assert_eq!(req.limit, MAX_PLACEMENT_LIMIT);

        let ads = inventory();
        assert_eq!(ids(&select(&ads, &req)), vec!["a", "b", "c", "e"]);
    }

    #[test]
    fn test_from_filters_validation() {
        let req = PlacementRequest::from_filters("places_list", PlacementFilters::default()).unwrap();
        assert_eq!(req.limit, 3);
        assert!(req.region.is_none());

        let blank = PlacementFilters { region: Some("  ".into()), place_type: None, limit: Some(2) };
        let req = PlacementRequest::from_filters("places_list", blank).unwrap();
        assert!(req.region.is_none());
        assert_eq!(req.limit, 2);

        let zero = PlacementFilters { limit: Some(0), ..Default::default() };
        assert!(PlacementRequest::from_filters("places_list", zero).is_err());
        assert!(PlacementRequest::from_filters("", PlacementFilters::default()).is_err());
    }
}
