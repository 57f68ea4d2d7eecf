//! Built-in analyzers that work without any network access.
//!
//! Results are assembled from canned material keyed on the idea text, so a
//! session always completes with a full set of stage outputs. In lucky mode
//! the market stage spotlights a randomly chosen adjacent idea.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rand::seq::IndexedRandom;
use serde_json::{Value, json};

use super::{StageAnalyzer, StageRequest};
use crate::models::Stage;

const SPOTLIGHT_IDEAS: &[&str] = &[
    "AI-powered fitness coaching app",
    "Sustainable packaging solutions",
    "Remote work productivity tools",
    "Plant-based meal delivery service",
    "Virtual reality meditation platform",
];

/// Offline analyzer for one stage.
#[derive(Debug, Clone)]
pub struct OfflineAnalyzer {
    stage: Stage,
    delay: Duration,
}

impl OfflineAnalyzer {
    /// `delay` is slept before answering, to mimic a slow upstream.
    pub fn new(stage: Stage, delay: Duration) -> Self {
        Self { stage, delay }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }
}

#[async_trait]
impl StageAnalyzer for OfflineAnalyzer {
    async fn analyze(&self, request: StageRequest<'_>) -> anyhow::Result<Value> {
        debug!("Offline {} analysis for: {}", self.stage.as_str(), request.input);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match self.stage {
            Stage::MarketResearch => market_research(request),
            Stage::CompetitiveAnalysis => competitor_analysis(request),
            Stage::TrendingAnalysis => trend_analysis(request),
            Stage::BusinessPlan => business_plan(request),
        };
        Ok(result)
    }
}

fn market_research(request: StageRequest<'_>) -> Value {
    let subject = if request.lucky {
        SPOTLIGHT_IDEAS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(request.input)
    } else {
        request.input
    };

    json!({
        "overview": format!(
            "The {subject} market shows promising potential with growing consumer interest \
             and room for new entrants with a differentiated approach."
        ),
        "targetAudience": "Early adopters aged 25-45 with disposable income, plus professionals \
                           looking for time savings and better value.",
        "marketSize": "Addressable market estimated at $100M+ with 10-15% projected annual growth.",
        "keyInsights": [
            "Consumer demand for the category is growing",
            "Specific niches remain underserved",
            "Technology adoption is accelerating the market",
            "Differentiation through innovation is possible",
            "Subscription models show higher lifetime value",
        ],
        "spotlight": request.lucky.then_some(subject),
    })
}

fn competitor_analysis(_request: StageRequest<'_>) -> Value {
    json!({
        "competitors": [
            {
                "name": "MarketLeader Pro",
                "url": "https://marketleader.com",
                "description": "Established leader with broad coverage and a strong brand",
                "strengths": [
                    "Large customer base",
                    "Brand recognition",
                    "Extensive resources"
                ],
                "weaknesses": ["High prices", "Slow innovation", "Complex interface"],
            },
            {
                "name": "InnovateNow",
                "url": "https://innovatenow.io",
                "description": "Agile startup focused on modern technology and user experience",
                "strengths": ["Modern stack", "User-friendly design", "Rapid iteration"],
                "weaknesses": ["Limited market presence", "Small team", "Funding constraints"],
            },
            {
                "name": "TraditionCorp",
                "url": "https://traditioncorp.com",
                "description": "Long-standing incumbent with established processes",
                "strengths": ["Industry expertise", "Reliable service", "Strong partnerships"],
                "weaknesses": ["Outdated technology", "Rigid processes", "Slow adaptation"],
            },
        ],
        "marketGaps": [
            "Few mobile-first offerings",
            "Limited personalization from current providers",
            "High barrier to entry for new customers",
            "Poor support responsiveness",
        ],
        "competitiveAdvantages": [
            "Superior user experience",
            "Competitive pricing",
            "Faster time to market",
            "Better customer support",
        ],
    })
}

fn trend_analysis(_request: StageRequest<'_>) -> Value {
    json!({
        "trends": [
            {
                "term": "Digital transformation",
                "popularity": 90,
                "growth": "Rising",
                "relevance": "Very High - essential for modern operations",
            },
            {
                "term": "AI automation",
                "popularity": 85,
                "growth": "Rising",
                "relevance": "High - efficiency gains across the business",
            },
            {
                "term": "Customer experience",
                "popularity": 82,
                "growth": "Stable",
                "relevance": "High - drives retention",
            },
            {
                "term": "Sustainable business",
                "popularity": 72,
                "growth": "Rising",
                "relevance": "High - growing preference for responsible brands",
            },
        ],
        "opportunities": [
            "Growing demand for automated solutions",
            "Rising interest in sustainable practices",
            "Digital-first consumer behavior",
        ],
        "threats": [
            "Rapid technological change",
            "Increasing competition in digital markets",
            "Economic uncertainty affecting spending",
        ],
    })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn business_plan(request: StageRequest<'_>) -> Value {
    let idea = request.input;
    let market = request.prior.get(&Stage::MarketResearch);
    let competitors = request.prior.get(&Stage::CompetitiveAnalysis);
    let trends = request.prior.get(&Stage::TrendingAnalysis);

    let audience = market
        .and_then(|m| m.get("targetAudience"))
        .and_then(Value::as_str)
        .unwrap_or("early adopters");
    let gaps = string_list(competitors.and_then(|c| c.get("marketGaps")));
    let threats = string_list(trends.and_then(|t| t.get("threats")));

    let mut market_strategy = format!(
        "Focus initial marketing on {}",
        audience.trim_end_matches('.')
    );
    if let Some(gap) = gaps.first() {
        market_strategy.push_str(&format!(
            ", positioning against the gap: {}",
            gap.to_lowercase()
        ));
    }
    market_strategy.push('.');

    let mut risks = vec!["Customer acquisition costs rising faster than revenue".to_string()];
    risks.extend(threats);

    json!({
        "executiveSummary": format!(
            "A plan to launch {idea} by addressing unmet needs in the market and competing \
             on experience and value."
        ),
        "marketStrategy": market_strategy,
        "revenueModel": "Subscription tiers with optional add-on services and partnership revenue.",
        "implementation": "Build an MVP, run a limited launch with early customers, then iterate \
                           on feedback before scaling marketing spend.",
        "risks": risks,
        "nextSteps": [
            "Validate demand with a landing page and waitlist",
            "Build and launch the MVP",
            "Secure first paying customers",
            "Review metrics and plan the next funding round",
        ],
    })
}
