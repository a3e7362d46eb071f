use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openrouter;
use serde::Deserialize;
use tracing::{info, warn};

use summary_flow::{PipelineError, Result, Stage, SummaryDraft, Summarizer, UploadedDocument};

const DEFAULT_MODEL: &str = "openai/gpt-4.1-mini";

const PREAMBLE: &str = "You are an expert document analyst. You read PDF documents \
and produce clear, well-structured markdown summaries.";

/// Summarizer backed by an OpenRouter model.
///
/// The model is asked for strict JSON `{"title", "summary"}`. Three failure
/// shapes are kept apart in the logs even though the user sees the same
/// message: the completion call failing, a reply that cannot be read as a
/// payload at all, and a payload whose summary field is missing or empty.
pub struct LlmSummarizer {
    model: String,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
}

impl LlmSummarizer {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        // Fails fast when the key is missing; the agent itself is built per call.
        std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY not set"))?;
        Ok(Self::new(DEFAULT_MODEL))
    }

    fn agent(&self) -> anyhow::Result<rig::agent::Agent<openrouter::CompletionModel>> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY not set"))?;
        let client = openrouter::Client::new(&api_key);
        Ok(client.agent(&self.model).preamble(PREAMBLE).build())
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, document: UploadedDocument) -> Result<SummaryDraft> {
        info!(url = %document.remote_url, "requesting summary from LLM");

        let prompt = format!(
            "Read the PDF document at the following URL and summarize it.\n\
             Document: {}\n\
             Original file name: {}\n\n\
             Respond **only** with JSON of the form\n\
             {{ \"title\": \"short descriptive title\", \"summary\": \"markdown summary\" }}\n\
             The summary should cover the document's key points in a few short sections.",
            document.remote_url, document.original_file_name
        );

        let agent = self
            .agent()
            .map_err(|e| PipelineError::transport(Stage::Summarize, e.to_string()))?;

        let raw = agent
            .prompt(&prompt)
            .await
            .map_err(|e| PipelineError::transport(Stage::Summarize, e.to_string()))?;

        parse_summary_reply(&raw)
    }
}

/// Turn the raw model reply into a draft, surfacing the empty-payload and
/// empty-summary shapes separately.
fn parse_summary_reply(raw: &str) -> Result<SummaryDraft> {
    // Models occasionally wrap the JSON in a code fence.
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    let cleaned = cleaned.trim();

    let payload = match serde_json::from_str::<SummaryPayload>(cleaned) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "summarizer reply carried no usable payload");
            return Err(PipelineError::empty_result(
                Stage::Summarize,
                format!("reply was not a summary payload: {}", e),
            ));
        }
    };

    if payload.summary.trim().is_empty() {
        warn!("summarizer payload had a missing or empty summary field");
        return Err(PipelineError::empty_result(
            Stage::Summarize,
            "payload summary field was missing or empty",
        ));
    }

    Ok(SummaryDraft {
        title: payload.title,
        body: payload.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let draft =
            parse_summary_reply(r###"{ "title": "T", "summary": "## Points\n- one" }"###).unwrap();
        assert_eq!(draft.title, "T");
        assert!(draft.body.starts_with("## Points"));
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{ \"title\": \"T\", \"summary\": \"body\" }\n```";
        let draft = parse_summary_reply(raw).unwrap();
        assert_eq!(draft.body, "body");
    }

    #[test]
    fn empty_summary_field_is_an_empty_result() {
        let err = parse_summary_reply(r#"{ "title": "T", "summary": "" }"#).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptyResult {
                stage: Stage::Summarize,
                ..
            }
        ));
    }

    #[test]
    fn missing_summary_field_is_an_empty_result() {
        let err = parse_summary_reply(r#"{ "title": "T" }"#).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResult { .. }));
    }

    #[test]
    fn garbage_reply_is_an_empty_result() {
        let err = parse_summary_reply("I could not read the document, sorry.").unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResult { .. }));
    }
}
