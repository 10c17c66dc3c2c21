//! End-to-end pipeline tests with in-memory sources and wiremock-backed clients.

use std::process::ExitCode;
use std::sync::Mutex;

use async_trait::async_trait;
use carvox_app::{conclude, run_pipeline};
use carvox_common::{CarQuery, OutputFormat, Result, ReviewCollection, ReviewSource};
use carvox_config::BingConfig;
use carvox_llm::traits::{LlmClient, LlmResponse};
use carvox_web::BingApi;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FixedSource {
    label: &'static str,
    fragments: Vec<&'static str>,
}

#[async_trait]
impl ReviewSource for FixedSource {
    fn label(&self) -> &str {
        self.label
    }

    async fn fetch_reviews(&self, _query: &CarQuery) -> Result<ReviewCollection> {
        Ok(self
            .fragments
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .into())
    }
}

#[derive(Default)]
struct RecordingLlm {
    reply: &'static str,
    prompts: Mutex<Vec<String>>,
}

impl RecordingLlm {
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for RecordingLlm {
    async fn generate(
        &self,
        prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(LlmResponse {
            text: self.reply.to_string(),
            ..Default::default()
        })
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

fn source(label: &'static str, fragments: &[&'static str]) -> FixedSource {
    FixedSource {
        label,
        fragments: fragments.to_vec(),
    }
}

#[tokio::test]
async fn text_output_follows_console_layout() {
    let reddit = source("Reddit", &["Love the range", "Ride is firm"]);
    let web = source("Web Search", &["Car and Driver: Quick and efficient"]);
    let llm = RecordingLlm {
        reply: "Performance: strong\n\nReliability: good\n",
        ..Default::default()
    };
    let mut out = Vec::new();

    let report = run_pipeline(
        &CarQuery::new("Tesla Model 3"),
        &reddit,
        &web,
        &llm,
        OutputFormat::Text,
        &mut out,
    )
    .await
    .expect("pipeline succeeds");

    let expected = "\
Fetching car data for: Tesla Model 3
Found 2 Reddit reviews.
Fetching web search results for: Tesla Model 3
Found 1 web search results.

Total reviews collected: 3

--- Reddit Reviews ---
- Love the range
- Ride is firm

--- Web Search Reviews ---
- Car and Driver: Quick and efficient

--- Final Summary of Reviews ---
- Performance: strong
- Reliability: good
";
    assert_eq!(String::from_utf8(out).unwrap(), expected);
    assert_eq!(report.total_reviews(), 3);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(
        "\nLove the range\nRide is firm\nCar and Driver: Quick and efficient\n\n"
    ));
}

#[tokio::test]
async fn empty_sources_still_invoke_summarizer_with_empty_text() {
    let reddit = source("Reddit", &[]);
    let web = source("Web Search", &[]);
    let llm = RecordingLlm {
        reply: "Not enough information.",
        ..Default::default()
    };
    let mut out = Vec::new();

    run_pipeline(
        &CarQuery::new("Lada Niva"),
        &reddit,
        &web,
        &llm,
        OutputFormat::Text,
        &mut out,
    )
    .await
    .expect("pipeline succeeds");

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("\n--- Reddit Reviews ---\nNo Reddit reviews found.\n"));
    assert!(text.contains("\n--- Web Search Reviews ---\nNo web search reviews found.\n"));
    assert!(text.ends_with("\n--- Final Summary of Reviews ---\n- Not enough information.\n"));

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("Here are reviews and opinions about a car model:\n\n\n"));
}

#[tokio::test]
async fn web_search_rejection_stops_before_summarizer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7.0/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"errors":[{"code":"InvalidAuthorization","message":"Access denied"}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let bing = BingApi::new(
        &BingConfig {
            api_key: "bad-key".into(),
            endpoint: format!("{}/v7.0/search", server.uri()),
            result_count: 5,
        },
        None,
    )
    .unwrap();
    let reddit = source("Reddit", &["Solid commuter"]);
    let llm = RecordingLlm::default();
    let mut out = Vec::new();

    let outcome = run_pipeline(
        &CarQuery::new("Honda Civic"),
        &reddit,
        &bing,
        &llm,
        OutputFormat::Text,
        &mut out,
    )
    .await;
    let code = conclude(outcome, &mut out);

    assert_eq!(code, ExitCode::FAILURE);
    assert!(llm.prompts().is_empty());

    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Fetching car data for: Honda Civic"));
    assert_eq!(lines.next(), Some("Found 1 Reddit reviews."));
    assert_eq!(lines.next(), Some("Fetching web search results for: Honda Civic"));
    let error_line = lines.next().expect("error line printed");
    assert!(
        error_line.starts_with("An error occurred: HTTP error 401: "),
        "got {error_line}"
    );
    assert!(error_line.contains("InvalidAuthorization"));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn json_format_writes_only_the_report() {
    let reddit = source("Reddit", &["Roomy"]);
    let web = source("Web Search", &["Edmunds: Practical"]);
    let llm = RecordingLlm {
        reply: "Practical and roomy",
        ..Default::default()
    };
    let mut out = Vec::new();

    run_pipeline(
        &CarQuery::new("Subaru Outback"),
        &reddit,
        &web,
        &llm,
        OutputFormat::Json,
        &mut out,
    )
    .await
    .expect("pipeline succeeds");

    let report: Value = serde_json::from_slice(&out).expect("stdout is one JSON document");
    assert_eq!(
        report,
        json!({
            "query": "Subaru Outback",
            "reddit_reviews": ["Roomy"],
            "web_reviews": ["Edmunds: Practical"],
            "summary": ["Practical and roomy"]
        })
    );
}
