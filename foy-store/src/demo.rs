//! Fixture inventory served while the app runs in demo mode.
//!
//! Behaves like the live repository, including the status check, and waits a
//! short simulated round trip on selection and tracking calls.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use foy_core::ad::{Ad, AdFormat, AdMetrics, AdStatus, PlaceSummary, Targeting};
use foy_core::placement::{self, PlacementRequest};
use foy_core::repository::{AdRepository, RepoResult};
use foy_shared::models::events::AdEventType;

pub const DEMO_LATENCY: Duration = Duration::from_millis(100);

pub struct DemoAdRepository {
    ads: RwLock<Vec<Ad>>,
    latency: Duration,
}

impl DemoAdRepository {
    /// The standard fixture set with the default simulated latency.
    pub fn new() -> Self {
        Self::with_ads(fixture_ads(), DEMO_LATENCY)
    }

    pub fn with_ads(ads: Vec<Ad>, latency: Duration) -> Self {
        Self {
            ads: RwLock::new(ads),
            latency,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate_round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for DemoAdRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdRepository for DemoAdRepository {
    async fn placement_ads(&self, request: &PlacementRequest) -> RepoResult<Vec<Ad>> {
        self.simulate_round_trip().await;
        let ads = self.ads.read().await;
        Ok(placement::select(ads.iter(), request))
    }

    async fn record_event(&self, ad_id: &str, event: AdEventType) -> RepoResult<bool> {
        self.simulate_round_trip().await;
        let mut ads = self.ads.write().await;
        let Some(ad) = ads.iter_mut().find(|a| a.id == ad_id) else {
            return Ok(false);
        };

        match event {
            AdEventType::Impression => ad.metrics.impressions += 1,
            AdEventType::Click => ad.metrics.clicks += 1,
        }
        debug!("Demo {} recorded for {} ({:?})", event, ad_id, ad.metrics);
        Ok(true)
    }

    async fn get_ad(&self, id: &str) -> RepoResult<Option<Ad>> {
        Ok(self.ads.read().await.iter().find(|a| a.id == id).cloned())
    }

    async fn list_ads(&self, status: Option<AdStatus>) -> RepoResult<Vec<Ad>> {
        let ads = self.ads.read().await;
        Ok(ads
            .iter()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect())
    }

    async fn create_ad(&self, ad: &Ad) -> RepoResult<()> {
        self.ads.write().await.push(ad.clone());
        Ok(())
    }

    async fn update_status(&self, id: &str, status: AdStatus) -> RepoResult<bool> {
        let mut ads = self.ads.write().await;
        match ads.iter_mut().find(|a| a.id == id) {
            Some(ad) => {
                ad.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn fixture_time(offset_minutes: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200 + offset_minutes * 60, 0).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn fixture(
    order: i64,
    id: &str,
    format: AdFormat,
    title: &str,
    description: &str,
    cta: Option<(&str, &str)>,
    placements: &[&str],
    regions: &[&str],
    place_types: &[&str],
    priority: i32,
    metrics: (u64, u64),
) -> Ad {
    Ad {
        id: id.to_string(),
        format,
        title: title.to_string(),
        description: description.to_string(),
        image: Some(format!("https://images.foylekke.sn/demo/{}.jpg", id)),
        cta_text: cta.map(|(text, _)| text.to_string()),
        cta_url: cta.map(|(_, url)| url.to_string()),
        status: AdStatus::Active,
        placements: strings(placements),
        targeting: Targeting {
            regions: strings(regions),
            place_types: strings(place_types),
        },
        priority,
        metrics: AdMetrics { impressions: metrics.0, clicks: metrics.1 },
        created_at: fixture_time(order),
    }
}

/// Demo inventory, in insertion order.
pub fn fixture_ads() -> Vec<Ad> {
    vec![
        fixture(
            0,
            "demo-banner-1",
            AdFormat::Banner,
            "Le Lagon 1 : dîner sur l'eau",
            "Fruits de mer et coucher de soleil sur la Corniche.",
            Some(("Réserver", "https://lelagon1.example.sn/reservation")),
            &["homepage_hero"],
            &["Dakar"],
            &["restaurant"],
            10,
            (1520, 87),
        ),
        fixture(
            1,
            "demo-banner-2",
            AdFormat::Banner,
            "Week-end au Terrou-Bi",
            "Offre spéciale résidents : -20% sur les chambres vue mer.",
            Some(("Voir l'offre", "https://terroubi.example.sn/offres")),
            &["homepage_hero", "search_results"],
            &["Dakar"],
            &["hotel"],
            8,
            (980, 41),
        ),
        fixture(
            2,
            "demo-banner-3",
            AdFormat::Banner,
            "Festival de Jazz de Saint-Louis",
            "Concerts, hébergements et restaurants partenaires.",
            Some(("Programme", "https://saintlouisjazz.example.sn")),
            &["homepage_hero"],
            &["Saint-Louis"],
            &["restaurant", "hotel"],
            6,
            (640, 22),
        ),
        fixture(
            3,
            "demo-sponsored-1",
            AdFormat::SponsoredPlace {
                place: PlaceSummary {
                    name: "Chez Loutcha".to_string(),
                    address: "101 Rue Moussé Diop, Dakar".to_string(),
                    rating: 4.5,
                    images: vec!["https://images.foylekke.sn/places/chez-loutcha.jpg".to_string()],
                },
            },
            "Chez Loutcha",
            "Cuisine sénégalaise et cap-verdienne au cœur du Plateau.",
            Some(("Voir le restaurant", "https://foylekke.sn/places/chez-loutcha")),
            &["places_list", "search_results"],
            &["Dakar"],
            &["restaurant"],
            9,
            (2210, 164),
        ),
        fixture(
            4,
            "demo-sponsored-2",
            AdFormat::SponsoredPlace {
                place: PlaceSummary {
                    name: "Hôtel Royal Saly".to_string(),
                    address: "Saly Portudal, Mbour".to_string(),
                    rating: 4.2,
                    images: vec!["https://images.foylekke.sn/places/royal-saly.jpg".to_string()],
                },
            },
            "Hôtel Royal Saly",
            "Piscine, plage privée et demi-pension.",
            Some(("Réserver", "https://foylekke.sn/places/hotel-royal-saly")),
            &["places_list"],
            &["Thiès", "Dakar"],
            &["hotel"],
            7,
            (1104, 58),
        ),
        fixture(
            5,
            "demo-native-1",
            AdFormat::Native,
            "Visitez l'île de Gorée",
            "Traversée en chaloupe et visite guidée de la Maison des Esclaves.",
            Some(("Planifier", "https://goree.example.sn/visites")),
            &["feed", "place_detail"],
            &["Dakar"],
            &["museum", "park"],
            5,
            (870, 39),
        ),
        fixture(
            6,
            "demo-native-2",
            AdFormat::Native,
            "Payez vos sorties avec Wave",
            "Sans frais chez nos restaurants et hôtels partenaires.",
            None,
            &["feed"],
            &["Dakar", "Thiès", "Saint-Louis"],
            &["restaurant", "hotel"],
            3,
            (3050, 95),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> DemoAdRepository {
        DemoAdRepository::new().with_latency(Duration::ZERO)
    }

    fn ids(ads: &[Ad]) -> Vec<&str> {
        ads.iter().map(|a| a.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_homepage_hero_in_dakar() {
        let req = PlacementRequest::new("homepage_hero").with_region("Dakar").with_limit(2);
        let ads = repo().placement_ads(&req).await.unwrap();
        assert_eq!(ids(&ads), vec!["demo-banner-1", "demo-banner-2"]);
    }

    #[tokio::test]
    async fn test_places_list_restaurants() {
        let req = PlacementRequest::new("places_list").with_place_type("restaurant");
        let ads = repo().placement_ads(&req).await.unwrap();

        assert!(ads.iter().any(|a| a.format.place().map(|p| p.name.as_str()) == Some("Chez Loutcha")));
        assert!(!ads.iter().any(|a| a.id == "demo-sponsored-2"));
    }

    #[tokio::test]
    async fn test_empty_placement() {
        let req = PlacementRequest::new("checkout_footer");
        assert!(repo().placement_ads(&req).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paused_fixture_is_not_served() {
        let repo = repo();
        repo.update_status("demo-banner-1", AdStatus::Paused).await.unwrap();

        let req = PlacementRequest::new("homepage_hero").with_region("Dakar");
        let ads = repo.placement_ads(&req).await.unwrap();
        assert_eq!(ids(&ads), vec!["demo-banner-2"]);
    }

    #[tokio::test]
    async fn test_tracking_updates_counters() {
        let repo = repo();
        assert!(repo.record_event("demo-native-1", AdEventType::Impression).await.unwrap());
        assert!(repo.record_event("demo-native-1", AdEventType::Click).await.unwrap());
        assert!(!repo.record_event("unknown", AdEventType::Click).await.unwrap());

        let ad = repo.get_ad("demo-native-1").await.unwrap().unwrap();
        assert_eq!(ad.metrics, AdMetrics { impressions: 871, clicks: 40 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_latency() {
        let repo = DemoAdRepository::new();
        let started = tokio::time::Instant::now();
        repo.placement_ads(&PlacementRequest::new("feed")).await.unwrap();
        assert!(started.elapsed() >= DEMO_LATENCY);
    }

    #[test]
    fn test_fixtures_are_active_with_unique_ids() {
        let ads = fixture_ads();
        let mut seen = std::collections::HashSet::new();
        for ad in &ads {
            assert!(ad.is_active());
            assert!(seen.insert(ad.id.clone()), "duplicate fixture id {}", ad.id);
            assert!(ad.metrics.clicks <= ad.metrics.impressions);
        }
        let banners = ads.iter().filter(|a| a.format == AdFormat::Banner).count();
        assert_eq!(banners, 3);
    }
}
