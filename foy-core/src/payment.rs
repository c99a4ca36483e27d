use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::repository::PaymentRepository;
use crate::{CoreError, CoreResult};
use foy_shared::Masked;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    Wave,
    OrangeMoney,
    Card,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Wave => "wave",
            PaymentProvider::OrangeMoney => "orange_money",
            PaymentProvider::Card => "card",
        }
    }
}

impl std::str::FromStr for PaymentProvider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wave" => Ok(PaymentProvider::Wave),
            "orange_money" => Ok(PaymentProvider::OrangeMoney),
            "card" => Ok(PaymentProvider::Card),
            other => Err(CoreError::ValidationError(format!("unknown payment provider '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "failed" => Ok(PaymentStatus::Failed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(CoreError::ValidationError(format!("unknown payment status '{}'", other))),
        }
    }
}

/// Payment for an ad campaign, amounts in CFA francs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub ad_id: String,
    pub amount_xof: i64,
    pub provider: PaymentProvider,
    pub status: PaymentStatus,
    pub payer_phone: Option<Masked<String>>,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(
        ad_id: &str,
        amount_xof: i64,
        provider: PaymentProvider,
        payer_phone: Option<String>,
    ) -> CoreResult<Self> {
        if amount_xof <= 0 {
            return Err(CoreError::ValidationError("amount must be positive".into()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            ad_id: ad_id.to_string(),
            amount_xof,
            provider,
            status: PaymentStatus::Pending,
            payer_phone: payer_phone.map(Masked),
            created_at: Utc::now(),
        })
    }
}

/// Fixed-interval polling with a hard attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Confirmed { attempts: u32 },
    Failed { status: PaymentStatus, attempts: u32 },
    StillPending { attempts: u32 },
}

/// Waits for a payment to settle, giving up after the policy's cap.
pub struct PaymentVerifier {
    payments: Arc<dyn PaymentRepository>,
    policy: PollPolicy,
}

impl PaymentVerifier {
    pub fn new(payments: Arc<dyn PaymentRepository>, policy: PollPolicy) -> Self {
        Self { payments, policy }
    }

    /// Each attempt waits one interval, then reads the status. A read error
    /// uses up the attempt. An unknown payment fails immediately.
    pub async fn verify(&self, payment_id: Uuid) -> CoreResult<VerificationOutcome> {
        if self.payments.get_payment(payment_id).await.map_err(|e| CoreError::InternalError(e.to_string()))?.is_none() {
            return Err(CoreError::NotFound(format!("payment {}", payment_id)));
        }

        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;

            match self.payments.get_payment(payment_id).await {
                Ok(Some(payment)) => match payment.status {
                    PaymentStatus::Succeeded => {
                        info!("Payment {} confirmed after {} attempt(s)", payment_id, attempt);
                        return Ok(VerificationOutcome::Confirmed { attempts: attempt });
                    }
                    PaymentStatus::Failed | PaymentStatus::Cancelled => {
                        info!("Payment {} ended as {}", payment_id, payment.status.as_str());
                        return Ok(VerificationOutcome::Failed { status: payment.status, attempts: attempt });
                    }
                    PaymentStatus::Pending => {
                        debug!("Payment {} still pending (attempt {})", payment_id, attempt);
                    }
                },
                Ok(None) => return Err(CoreError::NotFound(format!("payment {}", payment_id))),
                Err(e) => warn!("Payment {} status check failed (attempt {}): {}", payment_id, attempt, e),
            }
        }

        Ok(VerificationOutcome::StillPending { attempts: self.policy.max_attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepoResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Reports pending until `settle_after` reads have happened.
    struct ScriptedPayments {
        record: PaymentRecord,
        reads: AtomicU32,
        settle_after: u32,
        settled: PaymentStatus,
        flaky: bool,
    }

    impl ScriptedPayments {
        fn new(settle_after: u32, settled: PaymentStatus) -> Self {
            Self {
                record: PaymentRecord::new("ad-1", 25_000, PaymentProvider::Wave, None).unwrap(),
                reads: AtomicU32::new(0),
                settle_after,
                settled,
                flaky: false,
            }
        }
    }

    #[async_trait]
    impl PaymentRepository for ScriptedPayments {
        async fn create_payment(&self, _payment: &PaymentRecord) -> RepoResult<()> {
            Ok(())
        }

        async fn get_payment(&self, id: Uuid) -> RepoResult<Option<PaymentRecord>> {
            if id != self.record.id {
                return Ok(None);
            }
            let reads = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if self.flaky && reads % 2 == 0 {
                return Err("timeout".into());
            }
            let mut record = self.record.clone();
            if reads > self.settle_after {
                record.status = self.settled;
            }
            Ok(Some(record))
        }

        async fn settle_payment(&self, _id: Uuid, _status: PaymentStatus) -> RepoResult<bool> {
            Ok(true)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_once_settled() {
        let repo = Arc::new(ScriptedPayments::new(3, PaymentStatus::Succeeded));
        let id = repo.record.id;
        let verifier = PaymentVerifier::new(repo, PollPolicy::default());

        let started = tokio::time::Instant::now();
        let outcome = verifier.verify(id).await.unwrap();
        // the existence check is read 1, so the settled status shows on attempt 3
        assert_eq!(outcome, VerificationOutcome::Confirmed { attempts: 3 });
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_cap() {
        let repo = Arc::new(ScriptedPayments::new(u32::MAX, PaymentStatus::Succeeded));
        let id = repo.record.id;
        let verifier = PaymentVerifier::new(repo.clone(), PollPolicy::default());

        let started = tokio::time::Instant::now();
        let outcome = verifier.verify(id).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::StillPending { attempts: 10 });
        assert_eq!(started.elapsed(), Duration::from_secs(100));
        assert_eq!(repo.reads.load(Ordering::SeqCst), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_terminal() {
        let repo = Arc::new(ScriptedPayments::new(1, PaymentStatus::Cancelled));
        let id = repo.record.id;
        let verifier = PaymentVerifier::new(repo, PollPolicy::default());

        let outcome = verifier.verify(id).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::Failed { status: PaymentStatus::Cancelled, attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_errors_consume_attempts() {
        let mut scripted = ScriptedPayments::new(u32::MAX, PaymentStatus::Succeeded);
        scripted.flaky = true;
        let id = scripted.record.id;
        let policy = PollPolicy { interval: Duration::from_secs(1), max_attempts: 4 };
        let verifier = PaymentVerifier::new(Arc::new(scripted), policy);

        let outcome = verifier.verify(id).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::StillPending { attempts: 4 });
    }

    #[tokio::test]
    async fn test_unknown_payment() {
        let verifier = PaymentVerifier::new(
            Arc::new(ScriptedPayments::new(0, PaymentStatus::Succeeded)),
            PollPolicy::default(),
        );
        assert!(matches!(verifier.verify(Uuid::new_v4()).await, Err(CoreError::NotFound(_))));
    }

    #[test]
    fn test_payment_requires_positive_amount() {
        assert!(PaymentRecord::new("ad-1", 0, PaymentProvider::Card, None).is_err());
        let record = PaymentRecord::new("ad-1", 5_000, PaymentProvider::OrangeMoney, Some("+221770000000".into())).unwrap();
        assert_eq!(record.status, PaymentStatus::Pending);
        assert_eq!(format!("{:?}", record.payer_phone.unwrap()), "********");
    }

    #[test]
    fn test_outcome_wire_format() {
        let value = serde_json::to_value(VerificationOutcome::StillPending { attempts: 10 }).unwrap();
        assert_eq!(value["outcome"], "still_pending");
        assert_eq!(value["attempts"], 10);
    }
}
