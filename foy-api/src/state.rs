use std::sync::Arc;

use foy_core::payment::PollPolicy;
use foy_core::repository::{PaymentRepository, RateLimiter};
use foy_core::AdGateway;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub gateway: AdGateway,
    pub payments: Arc<dyn PaymentRepository>,
    pub payment_policy: PollPolicy,
    /// Tracking endpoints are not rate limited without one.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    pub rate_limit_per_minute: i64,
    pub auth: AuthConfig,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        gateway: AdGateway,
        payments: Arc<dyn PaymentRepository>,
        auth: AuthConfig,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            gateway,
            payments,
            payment_policy: PollPolicy::default(),
            rate_limiter: None,
            rate_limit_per_minute: 120,
            auth,
            metrics: Arc::new(Metrics::new()?),
        })
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>, per_minute: i64) -> Self {
        self.rate_limiter = Some(limiter);
        self.rate_limit_per_minute = per_minute;
        self
    }

    pub fn with_payment_policy(mut self, policy: PollPolicy) -> Self {
        self.payment_policy = policy;
        self
    }
}
