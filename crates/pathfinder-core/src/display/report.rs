//! Human-readable result reports.
//!
//! Both reports walk the stage results in pipeline order and skip any
//! section whose stage has no result. Scalar fields missing from a result
//! are left out; missing lists render no bullets. The "Generated" line uses
//! the session's end time, so rendering the same session twice gives
//! identical output.

use std::fmt;

use jiff::Timestamp;
use serde_json::Value;

use crate::models::{Session, Stage};

fn text<'a>(result: &'a Value, key: &str) -> Option<&'a str> {
    result.get(key).and_then(Value::as_str)
}

fn items<'a>(result: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    result
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn strings<'a>(result: &'a Value, key: &str) -> impl Iterator<Item = &'a str> {
    items(result, key).filter_map(Value::as_str)
}

fn generated_at(session: &Session) -> Timestamp {
    session.metadata.end_time.unwrap_or(session.updated_at)
}

/// Plain-text report.
pub struct TextReport<'a>(pub &'a Session);

impl TextReport<'_> {
    fn section(f: &mut fmt::Formatter<'_>, stage: Stage) -> fmt::Result {
        let heading = stage.title().to_uppercase();
        writeln!(f, "{heading}")?;
        writeln!(f, "{}", "-".repeat(heading.chars().count()))
    }

    fn line(f: &mut fmt::Formatter<'_>, label: &str, value: Option<&str>) -> fmt::Result {
        match value {
            Some(value) => writeln!(f, "{label}: {value}"),
            None => Ok(()),
        }
    }

    fn bullets<'a>(
        f: &mut fmt::Formatter<'_>,
        values: impl Iterator<Item = &'a str>,
    ) -> fmt::Result {
        for value in values {
            writeln!(f, "- {value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.0;
        writeln!(f, "BUSINESS AUTOMATION REPORT")?;
        writeln!(f, "==========================")?;
        writeln!(f)?;
        writeln!(f, "Business Idea: {}", session.input)?;
        writeln!(f, "Generated: {}", generated_at(session))?;

        for (stage, result) in &session.results {
            writeln!(f)?;
            Self::section(f, *stage)?;
            match stage {
                Stage::MarketResearch => {
                    Self::line(f, "Overview", text(result, "overview"))?;
                    Self::line(f, "Target Audience", text(result, "targetAudience"))?;
                    Self::line(f, "Market Size", text(result, "marketSize"))?;
                    writeln!(f, "Key Insights:")?;
                    Self::bullets(f, strings(result, "keyInsights"))?;
                }
                Stage::CompetitiveAnalysis => {
                    for competitor in items(result, "competitors") {
                        let name = text(competitor, "name").unwrap_or("Unnamed competitor");
                        match text(competitor, "description") {
                            Some(description) => writeln!(f, "{name}: {description}")?,
                            None => writeln!(f, "{name}")?,
                        }
                    }
                    writeln!(f, "Market Gaps:")?;
                    Self::bullets(f, strings(result, "marketGaps"))?;
                }
                Stage::TrendingAnalysis => {
                    for trend in items(result, "trends") {
                        let term = text(trend, "term").unwrap_or("Unnamed trend");
                        match text(trend, "relevance") {
                            Some(relevance) => writeln!(f, "{term}: {relevance}")?,
                            None => writeln!(f, "{term}")?,
                        }
                    }
                }
                Stage::BusinessPlan => {
                    Self::line(f, "Executive Summary", text(result, "executiveSummary"))?;
                    Self::line(f, "Market Strategy", text(result, "marketStrategy"))?;
                    Self::line(f, "Revenue Model", text(result, "revenueModel"))?;
                    Self::line(f, "Implementation", text(result, "implementation"))?;
                    writeln!(f, "Next Steps:")?;
                    Self::bullets(f, strings(result, "nextSteps"))?;
                }
            }
        }

        Ok(())
    }
}

/// Markdown report.
pub struct MarkdownReport<'a>(pub &'a Session);

impl MarkdownReport<'_> {
    fn paragraph(f: &mut fmt::Formatter<'_>, label: &str, value: Option<&str>) -> fmt::Result {
        match value {
            Some(value) => writeln!(f, "**{label}:** {value}\n"),
            None => Ok(()),
        }
    }

    fn subsection(f: &mut fmt::Formatter<'_>, title: &str, value: Option<&str>) -> fmt::Result {
        match value {
            Some(value) => writeln!(f, "### {title}\n{value}\n"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.0;
        writeln!(f, "# Business Automation Report")?;
        writeln!(f)?;
        writeln!(f, "**Business Idea:** {}", session.input)?;
        writeln!(f, "**Generated:** {}", generated_at(session))?;

        for (stage, result) in &session.results {
            writeln!(f)?;
            writeln!(f, "## {}", stage.title())?;
            writeln!(f)?;
            match stage {
                Stage::MarketResearch => {
                    Self::paragraph(f, "Overview", text(result, "overview"))?;
                    Self::paragraph(f, "Target Audience", text(result, "targetAudience"))?;
                    Self::paragraph(f, "Market Size", text(result, "marketSize"))?;
                    writeln!(f, "**Key Insights:**")?;
                    for insight in strings(result, "keyInsights") {
                        writeln!(f, "- {insight}")?;
                    }
                }
                Stage::CompetitiveAnalysis => {
                    for competitor in items(result, "competitors") {
                        let name = text(competitor, "name").unwrap_or("Unnamed competitor");
                        writeln!(f, "### {name}")?;
                        if let Some(description) = text(competitor, "description") {
                            writeln!(f, "{description}")?;
                        }
                        writeln!(f)?;
                    }
                }
                Stage::TrendingAnalysis => {
                    for trend in items(result, "trends") {
                        let term = text(trend, "term").unwrap_or("Unnamed trend");
                        match text(trend, "relevance") {
                            Some(relevance) => writeln!(f, "- **{term}:** {relevance}")?,
                            None => writeln!(f, "- **{term}**")?,
                        }
                    }
                }
                Stage::BusinessPlan => {
                    Self::subsection(f, "Executive Summary", text(result, "executiveSummary"))?;
                    Self::subsection(f, "Market Strategy", text(result, "marketStrategy"))?;
                    Self::subsection(f, "Revenue Model", text(result, "revenueModel"))?;
                    Self::subsection(f, "Implementation", text(result, "implementation"))?;
                    writeln!(f, "### Next Steps")?;
                    for step in strings(result, "nextSteps") {
                        writeln!(f, "- {step}")?;
                    }
                }
            }
        }

        Ok(())
    }
}
