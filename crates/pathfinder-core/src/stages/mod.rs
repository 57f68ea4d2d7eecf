//! Stage collaborators.
//!
//! The orchestrator treats each analysis stage as a black box implementing
//! [`StageAnalyzer`]: it is handed the session input and the results of the
//! stages before it, and returns a structured result or an error. An analyzer
//! that wants graceful degradation should return a fallback result itself;
//! the orchestrator never retries.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::models::{Stage, StageResults};

pub mod offline;

pub use offline::OfflineAnalyzer;

/// What an analyzer gets to work with. Borrowed; analyzers never own or
/// mutate the session.
#[derive(Debug, Clone, Copy)]
pub struct StageRequest<'a> {
    /// The business idea
    pub input: &'a str,
    /// Outputs of every stage that completed before this one
    pub prior: &'a StageResults,
    /// Whether the session asked for an improvised spotlight idea
    pub lucky: bool,
}

/// One analysis stage.
#[async_trait]
pub trait StageAnalyzer: Send + Sync {
    /// Produces this stage's structured result. The error's display text is
    /// recorded on the failed step.
    async fn analyze(&self, request: StageRequest<'_>) -> anyhow::Result<serde_json::Value>;
}

/// One entry of the fixed stage table the orchestrator walks.
#[derive(Clone)]
pub struct StagePlan {
    pub stage: Stage,
    pub analyzer: Arc<dyn StageAnalyzer>,
    /// Progress reached once the stage completes
    pub checkpoint: u8,
}

/// The four stages, in execution order, each with its analyzer.
#[derive(Clone)]
pub struct StageSet {
    plans: Vec<StagePlan>,
}

impl StageSet {
    /// Uses the given analyzers for the four stages, in order.
    pub fn new(
        market: Arc<dyn StageAnalyzer>,
        competitors: Arc<dyn StageAnalyzer>,
        trends: Arc<dyn StageAnalyzer>,
        plan: Arc<dyn StageAnalyzer>,
    ) -> Self {
        let plans = Stage::ALL
            .iter()
            .zip([market, competitors, trends, plan])
            .map(|(stage, analyzer)| StagePlan {
                stage: *stage,
                analyzer,
                checkpoint: stage.checkpoint(),
            })
            .collect();
        Self { plans }
    }

    /// Uses the same analyzer for every stage.
    pub fn uniform(analyzer: Arc<dyn StageAnalyzer>) -> Self {
        Self::new(
            Arc::clone(&analyzer),
            Arc::clone(&analyzer),
            Arc::clone(&analyzer),
            analyzer,
        )
    }

    /// The built-in offline analyzers, answering after `delay`.
    pub fn offline(delay: Duration) -> Self {
        let [market, competitors, trends, plan] = Stage::ALL.map(|stage| {
            Arc::new(OfflineAnalyzer::new(stage, delay)) as Arc<dyn StageAnalyzer>
        });
        Self::new(market, competitors, trends, plan)
    }

    /// Swaps the analyzer used for one stage.
    pub fn with_analyzer(mut self, stage: Stage, analyzer: Arc<dyn StageAnalyzer>) -> Self {
        if let Some(plan) = self.plans.iter_mut().find(|p| p.stage == stage) {
            plan.analyzer = analyzer;
        }
        self
    }

    /// Sets the progress a stage reaches on completion.
    pub fn with_checkpoint(mut self, stage: Stage, checkpoint: u8) -> Self {
        if let Some(plan) = self.plans.iter_mut().find(|p| p.stage == stage) {
            plan.checkpoint = checkpoint;
        }
        self
    }

    /// Stage table in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &StagePlan> {
        self.plans.iter()
    }
}

impl Default for StageSet {
    fn default() -> Self {
        Self::offline(Duration::ZERO)
    }
}
