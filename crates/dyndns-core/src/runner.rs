//! Runner: one reconciliation task per configuration
//!
//! The runner spawns every reconciler onto the runtime, then joins them all
//! through a [`JoinSet`] it owns. Tasks share nothing mutable: each holds its
//! own provider client and timer, and the resolver is read-only.
//!
//! In one-shot mode [`Runner::run`] returns once every task has finished its
//! pass. In daemon mode tasks only end when the shutdown token is cancelled.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{DyndnsConfig, RunMode};
use crate::error::Result;
use crate::reconciler::{Reconciler, TaskSummary};
use crate::traits::{DnsProviderFactory, IpResolver};

/// Fans out reconcilers and waits for all of them
pub struct Runner {
    reconcilers: Vec<Reconciler>,
    mode: RunMode,
    shutdown: CancellationToken,
}

impl Runner {
    /// Create an empty runner
    pub fn new(mode: RunMode) -> Self {
        Self {
            reconcilers: Vec::new(),
            mode,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build a runner with one reconciler per configuration
    ///
    /// Every configuration gets its own provider client from `factory`.
    pub fn from_config(
        config: &DyndnsConfig,
        resolver: Arc<dyn IpResolver>,
        factory: &dyn DnsProviderFactory,
        mode: RunMode,
    ) -> Result<Self> {
        config.validate()?;

        let mut runner = Self::new(mode);
        for domain_config in &config.configs {
            let provider = factory.create(domain_config)?;
            let reconciler = Reconciler::new(domain_config.clone(), resolver.clone(), provider)?;
            runner = runner.with_reconciler(reconciler);
        }

        Ok(runner)
    }

    /// Add a reconciler
    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconcilers.push(reconciler);
        self
    }

    /// Use an externally owned shutdown token
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Token that stops every task when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Number of reconcilers this runner will launch
    pub fn len(&self) -> usize {
        self.reconcilers.len()
    }

    /// Whether no reconcilers are configured
    pub fn is_empty(&self) -> bool {
        self.reconcilers.is_empty()
    }

    /// Run every reconciler concurrently and wait for all of them
    ///
    /// # Returns
    ///
    /// One summary per reconciler, in the order they were added. A task that
    /// panicked is logged and has no summary.
    pub async fn run(self) -> Vec<TaskSummary> {
        info!(tasks = self.reconcilers.len(), mode = ?self.mode, "Starting runner");

        let mut tasks = JoinSet::new();
        for (index, reconciler) in self.reconcilers.into_iter().enumerate() {
            let mode = self.mode;
            let shutdown = self.shutdown.clone();
            tasks.spawn(async move { (index, reconciler.run(mode, shutdown).await) });
        }

        let mut summaries = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(summary) => summaries.push(summary),
                Err(e) => error!("Reconciler task failed: {}", e),
            }
        }

        summaries.sort_by_key(|(index, _)| *index);
        info!("All reconcilers finished");

        summaries.into_iter().map(|(_, summary)| summary).collect()
    }
}
