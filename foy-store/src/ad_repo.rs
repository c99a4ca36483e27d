use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use foy_core::ad::{Ad, AdFormat, AdMetrics, AdStatus, Targeting};
use foy_core::placement::PlacementRequest;
use foy_core::repository::{AdRepository, RepoResult};
use foy_shared::models::events::AdEventType;

const AD_COLUMNS: &str = "id, format, place, title, description, image, cta_text, cta_url, status, \
     placements, regions, place_types, priority, impressions, clicks, created_at";

/// Live inventory backed by the `ads` table.
pub struct PostgresAdRepository {
    pool: PgPool,
}

impl PostgresAdRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AdRow {
    id: String,
    format: String,
    place: Option<Value>,
    title: String,
    description: String,
    image: Option<String>,
    cta_text: Option<String>,
    cta_url: Option<String>,
    status: String,
    placements: Vec<String>,
    regions: Vec<String>,
    place_types: Vec<String>,
    priority: i32,
    impressions: i64,
    clicks: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdRow> for Ad {
    type Error = Box<dyn std::error::Error + Send + Sync>;

    fn try_from(row: AdRow) -> Result<Self, Self::Error> {
        let format = match row.format.as_str() {
            "banner" => AdFormat::Banner,
            "native" => AdFormat::Native,
            "sponsored_place" => {
                let place = row.place.ok_or_else(|| format!("sponsored ad {} has no place", row.id))?;
                AdFormat::SponsoredPlace { place: serde_json::from_value(place)? }
            }
            other => return Err(format!("unknown ad format '{}'", other).into()),
        };

        Ok(Ad {
            format,
            title: row.title,
            description: row.description,
            image: row.image,
            cta_text: row.cta_text,
            cta_url: row.cta_url,
            status: row.status.parse()?,
            placements: row.placements,
            targeting: Targeting {
                regions: row.regions,
                place_types: row.place_types,
            },
            priority: row.priority,
            metrics: AdMetrics {
                impressions: row.impressions.max(0) as u64,
                clicks: row.clicks.max(0) as u64,
            },
            created_at: row.created_at,
            id: row.id,
        })
    }
}

/// `LIMIT` bound; never negative.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn into_ads(rows: Vec<AdRow>) -> RepoResult<Vec<Ad>> {
    rows.into_iter().map(Ad::try_from).collect()
}

#[async_trait]
impl AdRepository for PostgresAdRepository {
    async fn placement_ads(&self, request: &PlacementRequest) -> RepoResult<Vec<Ad>> {
        let sql = format!(
            r#"
            SELECT {AD_COLUMNS}
            FROM ads
            WHERE status = 'active'
              AND $1 = ANY(placements)
              AND ($2::TEXT IS NULL OR $2 = ANY(regions))
              AND ($3::TEXT IS NULL OR $3 = ANY(place_types))
            ORDER BY created_at ASC, id ASC
            LIMIT $4
            "#
        );

        let rows = sqlx::query_as::<_, AdRow>(&sql)
            .bind(&request.placement)
            .bind(request.region.as_deref())
            .bind(request.place_type.as_deref())
            .bind(sql_limit(request.limit))
            .fetch_all(&self.pool)
            .await?;

        into_ads(rows)
    }

    async fn record_event(&self, ad_id: &str, event: AdEventType) -> RepoResult<bool> {
        let sql = match event {
            AdEventType::Impression => "UPDATE ads SET impressions = impressions + 1 WHERE id = $1",
            AdEventType::Click => "UPDATE ads SET clicks = clicks + 1 WHERE id = $1",
        };

        let result = sqlx::query(sql).bind(ad_id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_ad(&self, id: &str) -> RepoResult<Option<Ad>> {
        let sql = format!("SELECT {AD_COLUMNS} FROM ads WHERE id = $1");
        let row = sqlx::query_as::<_, AdRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Ad::try_from).transpose()
    }

    async fn list_ads(&self, status: Option<AdStatus>) -> RepoResult<Vec<Ad>> {
        let sql = format!(
            "SELECT {AD_COLUMNS} FROM ads WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, AdRow>(&sql)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        into_ads(rows)
    }

    async fn create_ad(&self, ad: &Ad) -> RepoResult<()> {
        let place = ad.format.place().map(serde_json::to_value).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO ads (id, format, place, title, description, image, cta_text, cta_url, status,
                             placements, regions, place_types, priority, impressions, clicks, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(&ad.id)
        .bind(ad.format.kind())
        .bind(place)
        .bind(&ad.title)
        .bind(&ad.description)
        .bind(&ad.image)
        .bind(&ad.cta_text)
        .bind(&ad.cta_url)
        .bind(ad.status.as_str())
        .bind(&ad.placements)
        .bind(&ad.targeting.regions)
        .bind(&ad.targeting.place_types)
        .bind(ad.priority)
        .bind(ad.metrics.impressions as i64)
        .bind(ad.metrics.clicks as i64)
        .bind(ad.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_status(&self, id: &str, status: AdStatus) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE ads SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(format: &str, place: Option<Value>) -> AdRow {
        AdRow {
            id: "ad-1".to_string(),
            format: format.to_string(),
            place,
            title: "Chez Loutcha".to_string(),
            description: String::new(),
            image: None,
            cta_text: None,
            cta_url: None,
            status: "active".to_string(),
            placements: vec!["places_list".to_string()],
            regions: vec!["Dakar".to_string()],
            place_types: vec!["restaurant".to_string()],
            priority: 2,
            impressions: 10,
            clicks: 3,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_to_sponsored_ad() {
        let place = serde_json::json!({
            "name": "Chez Loutcha",
            "address": "101 Rue Moussé Diop, Dakar",
            "rating": 4.5,
            "images": []
        });
        let ad = Ad::try_from(row("sponsored_place", Some(place))).unwrap();
        assert_eq!(ad.format.place().unwrap().name, "Chez Loutcha");
        assert_eq!(ad.metrics, AdMetrics { impressions: 10, clicks: 3 });
        assert!(ad.targeting.has_place_type("restaurant"));
    }

    #[test]
    fn test_sponsored_row_without_place_is_rejected() {
        assert!(Ad::try_from(row("sponsored_place", None)).is_err());
    }

    #[test]
    fn test_unknown_format_or_status_is_rejected() {
        assert!(Ad::try_from(row("popup", None)).is_err());

        let mut bad = row("banner", None);
        bad.status = "archived".to_string();
        assert!(Ad::try_from(bad).is_err());
    }

    #[test]
    fn test_sql_limit_never_wraps_negative() {
        assert_eq!(sql_limit(3), 3);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
    }
}
