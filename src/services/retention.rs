//! Background purge of resolved join requests.
//!
//! Periodically deletes accepted, rejected and canceled requests older than
//! the configured age. Pending requests are never swept.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

use crate::config::RetentionConfig;
use crate::error::Result;
use crate::models::RequestStatus;

use super::RequestService;

/// Background retention sweeper.
#[derive(Clone)]
pub struct RetentionSweeper {
    inner: Arc<RetentionSweeperInner>,
}

struct RetentionSweeperInner {
    requests: RequestService,
    max_age: chrono::Duration,
    interval: Duration,
    running: RwLock<bool>,
    wake: Notify,
}

impl RetentionSweeper {
    /// Fails when the configured max age is not a positive number of days
    /// within range.
    pub fn new(requests: RequestService, config: &RetentionConfig) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(RetentionSweeperInner {
                requests,
                max_age: config.max_age()?,
                interval: Duration::from_secs(config.interval_secs.max(1)),
                running: RwLock::new(false),
                wake: Notify::new(),
            }),
        })
    }

    /// Start the sweep loop.
    /// Returns a handle that can be used to stop it.
    pub async fn start(&self) -> RetentionHandle {
        *self.inner.running.write().await = true;

        let sweeper = self.clone();
        let task = tokio::spawn(async move {
            sweeper.run_loop().await;
        });

        info!(
            max_age_days = self.inner.max_age.num_days(),
            interval_secs = self.inner.interval.as_secs(),
            "Retention sweeper started"
        );

        RetentionHandle {
            sweeper: self.clone(),
            task,
        }
    }

    async fn run_loop(&self) {
        while self.is_running().await {
            if let Err(e) = self.sweep_once().await {
                error!(error = %e, "Retention sweep failed");
            }

            tokio::select! {
                _ = sleep(self.inner.interval) => {}
                _ = self.inner.wake.notified() => {}
            }
        }
        info!("Retention sweeper stopped");
    }

    /// Run a single sweep. Returns the number of requests removed.
    pub async fn sweep_once(&self) -> Result<u64> {
        let cutoff = Utc::now() - self.inner.max_age;
        self.inner
            .requests
            .purge_old(&RequestStatus::TERMINAL, cutoff)
            .await
    }

    pub async fn is_running(&self) -> bool {
        *self.inner.running.read().await
    }

    async fn stop(&self) {
        *self.inner.running.write().await = false;
        self.inner.wake.notify_one();
    }
}

/// Handle for the running sweeper.
pub struct RetentionHandle {
    sweeper: RetentionSweeper,
    task: JoinHandle<()>,
}

impl RetentionHandle {
    /// Stop the sweeper and wait for the loop to exit.
    pub async fn stop(self) {
        self.sweeper.stop().await;
        if let Err(e) = self.task.await {
            error!(error = %e, "Retention sweeper task failed");
        }
    }
}
