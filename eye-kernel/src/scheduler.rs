//! Runs deploy requests as tokio tasks.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eye_adapters::{DeployError, DeployReceipt, DeployRequest, DeployResult, Deployer};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Limits for the deploy scheduler.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    max_in_flight: NonZeroUsize,
}

impl SchedulerConfig {
    /// Creates a configuration allowing `max_in_flight` concurrent deploys.
    #[must_use]
    pub const fn new(max_in_flight: NonZeroUsize) -> Self {
        Self { max_in_flight }
    }

    /// Returns the concurrency limit.
    #[must_use]
    pub const fn max_in_flight(self) -> NonZeroUsize {
        self.max_in_flight
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN)
    }
}

/// Spawns deploy requests on a captured runtime, bounded by a semaphore.
#[derive(Debug, Clone)]
pub struct DeployScheduler {
    runtime: Handle,
    semaphore: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
    config: SchedulerConfig,
}

impl DeployScheduler {
    /// Creates a scheduler bound to the runtime of the calling task.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        Ok(Self::with_handle(runtime, config))
    }

    /// Creates a scheduler that spawns onto `runtime`.
    #[must_use]
    pub fn with_handle(runtime: Handle, config: SchedulerConfig) -> Self {
        Self {
            runtime,
            semaphore: Arc::new(Semaphore::new(config.max_in_flight().get())),
            closed: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Returns the associated configuration.
    #[must_use]
    pub const fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Returns `true` once [`DeployScheduler::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stops accepting deploys; queued requests resolve to
    /// [`DeployError::Aborted`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.semaphore.close();
    }

    /// Hands `request` to `deployer` on a background task.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] when the scheduler no longer accepts
    /// work.
    pub fn spawn_deploy(
        &self,
        deployer: Arc<dyn Deployer>,
        request: DeployRequest,
    ) -> SchedulerResult<JoinHandle<DeployResult<DeployReceipt>>> {
        if self.is_closed() {
            return Err(SchedulerError::Closed);
        }

        let semaphore = Arc::clone(&self.semaphore);
        info!(
            deployment_id = %request.deployment_id(),
            deployer = deployer.name(),
            template = request.template().unwrap_or("<none>"),
            "deployment started"
        );

        let handle = self.runtime.spawn(async move {
            let Ok(permit) = semaphore.acquire_owned().await else {
                debug!(deployment_id = %request.deployment_id(), "scheduler closed before deploy ran");
                return Err(DeployError::Aborted);
            };
            let outcome = deployer.deploy(request).await;
            drop(permit);
            outcome
        });

        Ok(handle)
    }
}

/// Errors produced by the scheduler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Scheduler is closed and will not accept new deploys.
    #[error("deploy scheduler closed")]
    Closed,
    /// No tokio runtime was available to capture.
    #[error("deploy scheduler requires a tokio runtime")]
    NoRuntime,
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use eye_adapters::SimulatedDeployer;
    use eye_primitives::DeploymentId;

    use super::*;

    struct CountingDeployer {
        in_flight: AtomicUsize,
        max_seen: AtomicUsize,
    }

    #[async_trait]
    impl Deployer for CountingDeployer {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn deploy(&self, request: DeployRequest) -> DeployResult<DeployReceipt> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(DeployReceipt::accepted(request.deployment_id()))
        }
    }

    fn request() -> DeployRequest {
        DeployRequest::new(DeploymentId::random(), "agent:\n")
    }

    #[tokio::test]
    async fn default_allows_one_deploy_at_a_time() {
        let scheduler = DeployScheduler::new(SchedulerConfig::default()).unwrap();
        let deployer = Arc::new(CountingDeployer {
            in_flight: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        });

        let mut handles = Vec::new();
        for _ in 0..3 {
            let deployer: Arc<dyn Deployer> = deployer.clone();
            handles.push(scheduler.spawn_deploy(deployer, request()).unwrap());
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(deployer.max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_scheduler_rejects_deploys() {
        let scheduler = DeployScheduler::new(SchedulerConfig::default()).unwrap();
        scheduler.close();

        let err = scheduler
            .spawn_deploy(Arc::new(SimulatedDeployer::new(Duration::ZERO)), request())
            .unwrap_err();
        assert_eq!(err, SchedulerError::Closed);
    }

    #[tokio::test]
    async fn queued_deploy_aborts_when_closed() {
        let scheduler = DeployScheduler::new(SchedulerConfig::default()).unwrap();
        let slow: Arc<dyn Deployer> = Arc::new(SimulatedDeployer::new(Duration::from_millis(50)));

        let first = scheduler.spawn_deploy(Arc::clone(&slow), request()).unwrap();
        let second = scheduler.spawn_deploy(slow, request()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        scheduler.close();

        assert!(first.await.unwrap().is_ok());
        assert_eq!(second.await.unwrap().unwrap_err(), DeployError::Aborted);
    }

    #[test]
    fn requires_runtime() {
        let err = DeployScheduler::new(SchedulerConfig::default()).unwrap_err();
        assert_eq!(err, SchedulerError::NoRuntime);
    }
}
