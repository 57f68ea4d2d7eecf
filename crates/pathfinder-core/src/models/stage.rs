//! Stage and phase enumerations.
//!
//! A [`Stage`] is one of the four analysis stages the orchestrator runs. A
//! [`Phase`] is what a session reports as its `currentStep`: the stages plus
//! the `initialization` and `completed` bookends. Both enums are declared in
//! execution order so their derived `Ord` follows the pipeline.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the four ordered analysis stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    MarketResearch,
    CompetitiveAnalysis,
    TrendingAnalysis,
    BusinessPlan,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [
        Stage::MarketResearch,
        Stage::CompetitiveAnalysis,
        Stage::TrendingAnalysis,
        Stage::BusinessPlan,
    ];

    /// Progress value a session reaches once this stage completes.
    pub fn checkpoint(&self) -> u8 {
        match self {
            Stage::MarketResearch => 20,
            Stage::CompetitiveAnalysis => 40,
            Stage::TrendingAnalysis => 60,
            Stage::BusinessPlan => 80,
        }
    }

    /// The phase a session is in while this stage runs.
    pub fn phase(&self) -> Phase {
        match self {
            Stage::MarketResearch => Phase::MarketResearch,
            Stage::CompetitiveAnalysis => Phase::CompetitiveAnalysis,
            Stage::TrendingAnalysis => Phase::TrendingAnalysis,
            Stage::BusinessPlan => Phase::BusinessPlan,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.phase().as_str()
    }

    /// Human readable section title.
    pub fn title(&self) -> &'static str {
        match self {
            Stage::MarketResearch => "Market Research",
            Stage::CompetitiveAnalysis => "Competitor Analysis",
            Stage::TrendingAnalysis => "Trending Analysis",
            Stage::BusinessPlan => "Business Plan",
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Phase>()?.stage() {
            Some(stage) => Ok(stage),
            None => Err(format!("Not an analysis stage: {s}")),
        }
    }
}

/// Where a session is in the pipeline; also names each step record.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Initialization,
    MarketResearch,
    CompetitiveAnalysis,
    TrendingAnalysis,
    BusinessPlan,
    Completed,
}

impl Phase {
    /// Step records seeded on every new session, in order.
    pub const STEPS: [Phase; 5] = [
        Phase::Initialization,
        Phase::MarketResearch,
        Phase::CompetitiveAnalysis,
        Phase::TrendingAnalysis,
        Phase::BusinessPlan,
    ];

    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initialization => "initialization",
            Phase::MarketResearch => "market_research",
            Phase::CompetitiveAnalysis => "competitive_analysis",
            Phase::TrendingAnalysis => "trending_analysis",
            Phase::BusinessPlan => "business_plan",
            Phase::Completed => "completed",
        }
    }

    /// The analysis stage behind this phase, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Phase::MarketResearch => Some(Stage::MarketResearch),
            Phase::CompetitiveAnalysis => Some(Stage::CompetitiveAnalysis),
            Phase::TrendingAnalysis => Some(Stage::TrendingAnalysis),
            Phase::BusinessPlan => Some(Stage::BusinessPlan),
            Phase::Initialization | Phase::Completed => None,
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "initialization" => Ok(Phase::Initialization),
            "market_research" => Ok(Phase::MarketResearch),
            "competitive_analysis" => Ok(Phase::CompetitiveAnalysis),
            "trending_analysis" => Ok(Phase::TrendingAnalysis),
            "business_plan" => Ok(Phase::BusinessPlan),
            "completed" => Ok(Phase::Completed),
            _ => Err(format!("Invalid phase: {s}")),
        }
    }
}

/// Structured stage outputs keyed by stage, iterated in execution order.
pub type StageResults = BTreeMap<Stage, serde_json::Value>;
