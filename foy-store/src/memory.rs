use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use foy_core::payment::{PaymentRecord, PaymentStatus};
use foy_core::repository::{ModeStore, PaymentRepository, RateLimiter, RepoResult};

/// Process-local mode flag, for running without Redis.
#[derive(Default)]
pub struct InMemoryModeStore {
    value: RwLock<Option<bool>>,
}

impl InMemoryModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(demo: bool) -> Self {
        Self { value: RwLock::new(Some(demo)) }
    }
}

#[async_trait]
impl ModeStore for InMemoryModeStore {
    async fn load_mode(&self) -> RepoResult<Option<bool>> {
        Ok(*self.value.read().await)
    }

    async fn store_mode(&self, demo: bool) -> RepoResult<()> {
        *self.value.write().await = Some(demo);
        Ok(())
    }
}

/// Process-local fixed window, for running without Redis.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    windows: Mutex<HashMap<String, (Instant, i64)>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RepoResult<bool> {
        let window = Duration::from_secs(window_seconds.max(0) as u64);
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let entry = windows.entry(key.to_string()).or_insert((now, 0));
        if now.duration_since(entry.0) >= window {
            *entry = (now, 0);
        }
        entry.1 += 1;
        Ok(entry.1 <= limit)
    }
}

#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<Uuid, PaymentRecord>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create_payment(&self, payment: &PaymentRecord) -> RepoResult<()> {
        self.payments.write().await.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get_payment(&self, id: Uuid) -> RepoResult<Option<PaymentRecord>> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn settle_payment(&self, id: Uuid, status: PaymentStatus) -> RepoResult<bool> {
        match self.payments.write().await.get_mut(&id) {
            Some(payment) if payment.status == PaymentStatus::Pending => {
                payment.status = status;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foy_core::payment::PaymentProvider;
    use foy_core::ModeSwitch;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mode_switch_over_memory_store() {
        let store = Arc::new(InMemoryModeStore::new());
        let switch = ModeSwitch::new(store.clone());

        assert_eq!(store.load_mode().await.unwrap(), None);
        assert!(switch.is_demo_mode().await.unwrap());
        assert_eq!(store.load_mode().await.unwrap(), Some(true));

        assert!(!switch.toggle().await.unwrap());
        assert_eq!(store.load_mode().await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_payment_settlement() {
        let repo = InMemoryPaymentRepository::new();
        let payment = PaymentRecord::new("demo-banner-1", 15_000, PaymentProvider::Wave, None).unwrap();
        repo.create_payment(&payment).await.unwrap();

        assert!(repo.settle_payment(payment.id, PaymentStatus::Succeeded).await.unwrap());
        assert!(!repo.settle_payment(Uuid::new_v4(), PaymentStatus::Failed).await.unwrap());

        let stored = repo.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_settled_payment_is_not_overwritten() {
        let repo = InMemoryPaymentRepository::new();
        let payment = PaymentRecord::new("demo-banner-1", 15_000, PaymentProvider::Card, None).unwrap();
        repo.create_payment(&payment).await.unwrap();

        assert!(repo.settle_payment(payment.id, PaymentStatus::Succeeded).await.unwrap());
        assert!(!repo.settle_payment(payment.id, PaymentStatus::Failed).await.unwrap());

        let stored = repo.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_window_resets_under_steady_traffic() {
        let limiter = InMemoryRateLimiter::new();

        assert!(limiter.check_rate_limit("ip", 2, 60).await.unwrap());
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(limiter.check_rate_limit("ip", 2, 60).await.unwrap());
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(!limiter.check_rate_limit("ip", 2, 60).await.unwrap());
        assert!(limiter.check_rate_limit("other-ip", 2, 60).await.unwrap());

        // Hits inside the window do not extend it: 60s after the first hit it reopens.
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(limiter.check_rate_limit("ip", 2, 60).await.unwrap());
    }
}
