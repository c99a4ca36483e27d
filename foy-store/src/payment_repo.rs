use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use foy_core::payment::{PaymentRecord, PaymentStatus};
use foy_core::repository::{PaymentRepository, RepoResult};
use foy_shared::Masked;

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    ad_id: String,
    amount_xof: i64,
    provider: String,
    status: String,
    payer_phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = Box<dyn std::error::Error + Send + Sync>;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            id: row.id,
            ad_id: row.ad_id,
            amount_xof: row.amount_xof,
            provider: row.provider.parse()?,
            status: row.status.parse()?,
            payer_phone: row.payer_phone.map(Masked),
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn create_payment(&self, payment: &PaymentRecord) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ad_payments (id, ad_id, amount_xof, provider, status, payer_phone, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.id)
        .bind(&payment.ad_id)
        .bind(payment.amount_xof)
        .bind(payment.provider.as_str())
        .bind(payment.status.as_str())
        .bind(payment.payer_phone.as_ref().map(|p| p.expose().as_str()))
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_payment(&self, id: Uuid) -> RepoResult<Option<PaymentRecord>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, ad_id, amount_xof, provider, status, payer_phone, created_at
            FROM ad_payments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn settle_payment(&self, id: Uuid, status: PaymentStatus) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE ad_payments SET status = $2, updated_at = NOW() WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
