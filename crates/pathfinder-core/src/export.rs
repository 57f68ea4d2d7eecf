//! Result export in JSON, plain text or markdown.
//!
//! The exporter renders whatever results a session holds; checking that the
//! session is `completed` is up to the caller.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    display::{MarkdownReport, TextReport},
    error::{PipelineError, Result},
    models::Session,
};

/// Supported export formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Txt,
    Md,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Txt, ExportFormat::Md];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
            ExportFormat::Md => "md",
        }
    }

    /// MIME type of the rendered document.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Txt => "text/plain",
            ExportFormat::Md => "text/markdown",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "txt" | "text" => Ok(ExportFormat::Txt),
            "md" | "markdown" => Ok(ExportFormat::Md),
            _ => Err(PipelineError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rendered export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub content_type: String,
    pub data: String,
}

impl Export {
    /// Suggested file name, `<session id>.<format>`.
    pub fn file_name(session_id: &str, format: ExportFormat) -> String {
        format!("{session_id}.{format}")
    }
}

/// Renders a session's results in the given format.
pub fn export(session: &Session, format: ExportFormat) -> Result<Export> {
    let data = match format {
        ExportFormat::Json => serde_json::to_string_pretty(&session.results)?,
        ExportFormat::Txt => TextReport(session).to_string(),
        ExportFormat::Md => MarkdownReport(session).to_string(),
    };

    Ok(Export {
        content_type: format.content_type().to_string(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use serde_json::json;

    use super::*;
    use crate::models::Stage;

    fn completed_results() -> Session {
        let mut session =
            Session::new("session_e", "vegan snack subscription", false, Timestamp::now());
        for stage in Stage::ALL {
            session.results.insert(stage, json!({ "stage": stage.as_str() }));
        }
        session
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Md);
        let err = "pdf".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(ref f) if f == "pdf"));
        assert_eq!(err.to_string(), "Unsupported format: pdf");
    }

    #[test]
    fn test_json_export_is_pretty_results() {
        let session = completed_results();
        let export = export(&session, ExportFormat::Json).unwrap();

        assert_eq!(export.content_type, "application/json");
        assert!(export.data.contains("\n  \"market_research\""));
        let value: serde_json::Value = serde_json::from_str(&export.data).unwrap();
        assert_eq!(value["business_plan"]["stage"], "business_plan");
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_text_and_markdown_content_types() {
        let session = completed_results();
        assert_eq!(export(&session, ExportFormat::Txt).unwrap().content_type, "text/plain");
        assert_eq!(export(&session, ExportFormat::Md).unwrap().content_type, "text/markdown");
    }

    #[test]
    fn test_export_twice_is_identical() {
        let session = completed_results();
        for format in ExportFormat::ALL {
            assert_eq!(
                export(&session, format).unwrap(),
                export(&session, format).unwrap()
            );
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(Export::file_name("session_1", ExportFormat::Md), "session_1.md");
    }
}
