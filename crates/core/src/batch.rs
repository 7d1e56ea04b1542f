//! Concurrent auditing of many products.
//!
//! The engine itself is synchronous and CPU bound, so each product runs on the
//! blocking pool. A semaphore bounds how many audits are in flight and every
//! item gets its own deadline; one slow or panicking product never fails the
//! rest of the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{
    AuditEngine, DeterministicAuditEngine, ProductAuditEngineConfig, ProductAuditEngineResult,
    ProductAuditInput,
};
use crate::errors::ApplicationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub concurrency: usize,
    pub item_timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 4, item_timeout_ms: 5_000 }
    }
}

impl BatchConfig {
    pub fn item_timeout(&self) -> Duration {
        Duration::from_millis(self.item_timeout_ms)
    }
}

/// Catalogue identity of an audited product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductAuditRequest {
    pub product: ProductRef,
    #[serde(default)]
    pub input: ProductAuditInput,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductAuditReport {
    pub product: ProductRef,
    pub audited_at: DateTime<Utc>,
    pub result: ProductAuditEngineResult,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    Completed(ProductAuditReport),
    TimedOut { product_id: String },
    Failed { product_id: String, reason: String },
}

impl BatchOutcome {
    pub fn product_id(&self) -> &str {
        match self {
            Self::Completed(report) => &report.product.id,
            Self::TimedOut { product_id } | Self::Failed { product_id, .. } => product_id,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    /// Same order as the submitted requests
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_completed()).count()
    }

    pub fn incomplete(&self) -> usize {
        self.outcomes.len() - self.completed()
    }
}

pub struct BatchAuditor<E = DeterministicAuditEngine> {
    engine: Arc<E>,
    config: BatchConfig,
}

impl BatchAuditor<DeterministicAuditEngine> {
    /// Validates the engine configuration once for the whole batch.
    pub fn from_config(
        engine_config: ProductAuditEngineConfig,
        config: BatchConfig,
    ) -> Result<Self, ApplicationError> {
        Self::new(DeterministicAuditEngine::new(engine_config)?, config)
    }
}

impl<E> BatchAuditor<E>
where
    E: AuditEngine + 'static,
{
    pub fn new(engine: E, config: BatchConfig) -> Result<Self, ApplicationError> {
        if config.concurrency == 0 {
            return Err(ApplicationError::Batch("concurrency must be greater than zero".to_string()));
        }
        if config.item_timeout_ms == 0 {
            return Err(ApplicationError::Batch(
                "item timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self { engine: Arc::new(engine), config })
    }

    pub async fn run(&self, requests: Vec<ProductAuditRequest>) -> BatchReport {
        let batch_id = Uuid::new_v4().to_string();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let timeout = self.config.item_timeout();

        info!(
            event_name = "audit.batch.started",
            correlation_id = %batch_id,
            products = requests.len(),
            concurrency = self.config.concurrency,
            "product audit batch started"
        );

        let mut pending = Vec::with_capacity(requests.len());
        for request in requests {
            let product_id = request.product.id.clone();
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let batch_id = batch_id.clone();

            let handle = tokio::spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return BatchOutcome::Failed {
                            product_id: request.product.id,
                            reason: "batch was shut down".to_string(),
                        }
                    }
                };
                audit_one(engine, request, permit, timeout, &batch_id).await
            });
            pending.push((product_id, handle));
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for (product_id, handle) in pending {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(error) => BatchOutcome::Failed { product_id, reason: error.to_string() },
            };
            outcomes.push(outcome);
        }

        let report = BatchReport { batch_id, outcomes };
        info!(
            event_name = "audit.batch.completed",
            correlation_id = %report.batch_id,
            completed = report.completed(),
            incomplete = report.incomplete(),
            "product audit batch completed"
        );
        report
    }
}

async fn audit_one<E>(
    engine: Arc<E>,
    request: ProductAuditRequest,
    permit: OwnedSemaphorePermit,
    timeout: Duration,
    batch_id: &str,
) -> BatchOutcome
where
    E: AuditEngine + 'static,
{
    let ProductAuditRequest { product, input } = request;
    // The permit travels with the blocking audit so a timed-out item keeps
    // its slot until the work actually finishes.
    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        engine.audit(&input)
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => {
            BatchOutcome::Completed(ProductAuditReport { product, audited_at: Utc::now(), result })
        }
        Ok(Err(error)) => {
            let reason =
                if error.is_panic() { "audit task panicked".to_string() } else { error.to_string() };
            warn!(
                event_name = "audit.batch.item_failed",
                correlation_id = %batch_id,
                product_id = %product.id,
                reason = %reason,
                "product audit failed"
            );
            BatchOutcome::Failed { product_id: product.id, reason }
        }
        Err(_) => {
            warn!(
                event_name = "audit.batch.item_timed_out",
                correlation_id = %batch_id,
                product_id = %product.id,
                timeout_ms = timeout.as_millis() as u64,
                "product audit timed out"
            );
            BatchOutcome::TimedOut { product_id: product.id }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::audit::{run_product_audit, AuditStatus, MarketAuditData};

    fn request(id: &str, input: ProductAuditInput) -> ProductAuditRequest {
        ProductAuditRequest {
            product: ProductRef { id: id.to_string(), name: format!("Product {id}"), sku: None },
            input,
        }
    }

    fn market_only(trending: f64) -> ProductAuditInput {
        ProductAuditInput {
            market: Some(MarketAuditData { trending_score: Some(trending), ..Default::default() }),
            ..Default::default()
        }
    }

    /// Panics on a negative trending score and sleeps for `delay` on a
    /// trending score of exactly 1.
    struct ScriptedEngine {
        inner: DeterministicAuditEngine,
        delay: Duration,
        calls: AtomicUsize,
        running: AtomicUsize,
        peak_running: AtomicUsize,
    }

    impl AuditEngine for ScriptedEngine {
        fn audit(&self, input: &ProductAuditInput) -> ProductAuditEngineResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_running.fetch_max(running, Ordering::SeqCst);
            let result = self.scripted_audit(input);
            self.running.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    impl ScriptedEngine {
        fn scripted_audit(&self, input: &ProductAuditInput) -> ProductAuditEngineResult {
            let trending = input
                .market
                .as_ref()
                .and_then(|market| market.trending_score)
                .unwrap_or_default();
            if trending < 0.0 {
                panic!("scripted failure");
            }
            if trending == 1.0 {
                std::thread::sleep(self.delay);
            }
            self.inner.audit(input)
        }
    }

    fn scripted(delay: Duration) -> ScriptedEngine {
        ScriptedEngine {
            inner: DeterministicAuditEngine::default(),
            delay,
            calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            peak_running: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn outcomes_follow_request_order() {
        let auditor =
            BatchAuditor::from_config(ProductAuditEngineConfig::default(), BatchConfig::default())
                .unwrap();
        let requests: Vec<_> =
            (0..12).map(|index| request(&format!("p-{index}"), market_only(index as f64 * 8.0))).collect();

        let report = auditor.run(requests).await;

        assert_eq!(report.completed(), 12);
        let ids: Vec<_> = report.outcomes.iter().map(BatchOutcome::product_id).collect();
        let expected: Vec<_> = (0..12).map(|index| format!("p-{index}")).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn batch_results_match_single_audits() {
        let auditor =
            BatchAuditor::from_config(ProductAuditEngineConfig::default(), BatchConfig::default())
                .unwrap();
        let input = market_only(85.0);

        let report = auditor.run(vec![request("p-1", input.clone())]).await;
        let BatchOutcome::Completed(item) = &report.outcomes[0] else {
            panic!("expected a completed outcome");
        };

        assert_eq!(item.result, run_product_audit(&input, None).unwrap());
        assert_eq!(item.result.overall_status, AuditStatus::Passed);
    }

    #[tokio::test]
    async fn slow_item_times_out_without_blocking_others() {
        let config = BatchConfig { concurrency: 2, item_timeout_ms: 50 };
        let auditor = BatchAuditor::new(scripted(Duration::from_millis(400)), config).unwrap();

        let report = auditor
            .run(vec![
                request("fast-1", market_only(80.0)),
                request("slow", market_only(1.0)),
                request("fast-2", market_only(60.0)),
            ])
            .await;

        assert!(report.outcomes[0].is_completed());
        assert_eq!(report.outcomes[1], BatchOutcome::TimedOut { product_id: "slow".to_string() });
        assert!(report.outcomes[2].is_completed());
        assert_eq!(report.incomplete(), 1);
    }

    #[tokio::test]
    async fn timed_out_audits_keep_their_concurrency_slot() {
        let config = BatchConfig { concurrency: 1, item_timeout_ms: 20 };
        let auditor = BatchAuditor::new(scripted(Duration::from_millis(100)), config).unwrap();
        let requests: Vec<_> =
            (0..4).map(|index| request(&format!("slow-{index}"), market_only(1.0))).collect();

        let report = auditor.run(requests).await;

        assert_eq!(report.incomplete(), 4);
        assert_eq!(auditor.engine.peak_running.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_item_is_reported_as_failed() {
        let auditor = BatchAuditor::new(scripted(Duration::ZERO), BatchConfig::default()).unwrap();

        let report = auditor
            .run(vec![request("boom", market_only(-1.0)), request("ok", market_only(90.0))])
            .await;

        assert!(matches!(
            &report.outcomes[0],
            BatchOutcome::Failed { product_id, reason }
                if product_id == "boom" && reason == "audit task panicked"
        ));
        assert!(report.outcomes[1].is_completed());
        assert_eq!(auditor.engine.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalid_engine_config_is_rejected_once_up_front() {
        let mut engine_config = ProductAuditEngineConfig::default();
        engine_config.weights.market = 0.9;

        let error = BatchAuditor::from_config(engine_config, BatchConfig::default()).err();
        assert!(matches!(error, Some(ApplicationError::Configuration(_))));

        let error = BatchAuditor::from_config(
            ProductAuditEngineConfig::default(),
            BatchConfig { concurrency: 0, ..BatchConfig::default() },
        )
        .err();
        assert!(matches!(error, Some(ApplicationError::Batch(_))));
    }
}
