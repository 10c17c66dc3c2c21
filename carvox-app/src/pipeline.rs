use anyhow::Result;
use carvox_common::{CarQuery, OutputFormat, ReviewCollection, ReviewSource, Summary};
use carvox_llm::traits::LlmClient;
use serde::Serialize;
use std::io::Write;
use std::process::ExitCode;

/// Everything one run collected, in the shape written by `--format json`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub query: String,
    pub reddit_reviews: ReviewCollection,
    pub web_reviews: ReviewCollection,
    pub summary: Summary,
}

impl Report {
    pub fn total_reviews(&self) -> usize {
        self.reddit_reviews.len() + self.web_reviews.len()
    }
}

/// Console sink that only writes in text mode; JSON mode keeps stdout for
/// the final report.
struct Console<'a, W: Write> {
    out: &'a mut W,
    format: OutputFormat,
}

impl<W: Write> Console<'_, W> {
    fn line(&mut self, text: impl std::fmt::Display) -> std::io::Result<()> {
        if self.format == OutputFormat::Text {
            writeln!(self.out, "{text}")?;
            self.out.flush()?;
        }
        Ok(())
    }

    fn section(&mut self, header: &str, items: &[String], empty: &str) -> std::io::Result<()> {
        self.line(format_args!("\n--- {header} ---"))?;
        if items.is_empty() {
            return self.line(empty);
        }
        for item in items {
            self.line(format_args!("- {item}"))?;
        }
        Ok(())
    }
}

/// Run one lookup end to end.
///
/// Steps run strictly in order and the first failure aborts the run, so a
/// failed fetch never reaches the summarizer. Lines already written stay
/// written.
pub async fn run_pipeline<W: Write>(
    query: &CarQuery,
    social: &dyn ReviewSource,
    web: &dyn ReviewSource,
    llm: &dyn LlmClient,
    format: OutputFormat,
    out: &mut W,
) -> Result<Report> {
    let mut console = Console { out, format };

    console.line(format_args!("Fetching car data for: {query}"))?;
    tracing::info!(%query, source = social.label(), "fetching reviews");
    let reddit_reviews = social.fetch_reviews(query).await?;
    tracing::info!(source = social.label(), count = reddit_reviews.len(), "reviews fetched");
    console.line(format_args!("Found {} Reddit reviews.", reddit_reviews.len()))?;

    console.line(format_args!("Fetching web search results for: {query}"))?;
    tracing::info!(%query, source = web.label(), "fetching reviews");
    let web_reviews = web.fetch_reviews(query).await?;
    tracing::info!(source = web.label(), count = web_reviews.len(), "reviews fetched");
    console.line(format_args!("Found {} web search results.", web_reviews.len()))?;

    let total = reddit_reviews.len() + web_reviews.len();
    console.line(format_args!("\nTotal reviews collected: {total}"))?;
    console.section(
        "Reddit Reviews",
        reddit_reviews.as_slice(),
        "No Reddit reviews found.",
    )?;
    console.section(
        "Web Search Reviews",
        web_reviews.as_slice(),
        "No web search reviews found.",
    )?;

    let combined = ReviewCollection::combine(&[&reddit_reviews, &web_reviews]);
    tracing::info!(
        total,
        combined_chars = combined.len(),
        model = llm.model_name(),
        "summarizing reviews"
    );
    let summary = llm.summarize_reviews(&combined).await?;

    console.line("\n--- Final Summary of Reviews ---")?;
    for line in summary.lines() {
        console.line(format_args!("- {line}"))?;
    }

    let report = Report {
        query: query.as_str().to_string(),
        reddit_reviews,
        web_reviews,
        summary,
    };

    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *console.out, &report)?;
        writeln!(console.out)?;
    }

    Ok(report)
}

/// Turn the outcome of a run into the process exit code.
///
/// A failure is logged and written to `out` as `An error occurred: <msg>`
/// after whatever the run already printed.
pub fn conclude<T, W: Write>(outcome: Result<T>, out: &mut W) -> ExitCode {
    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "carvox run failed");
            if let Err(io) = writeln!(out, "An error occurred: {err}").and_then(|()| out.flush()) {
                tracing::warn!(error = %io, "failed to write error message");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conclude_maps_outcomes_to_exit_codes() {
        let mut buf = Vec::new();
        assert_eq!(conclude(Ok::<_, anyhow::Error>(()), &mut buf), ExitCode::SUCCESS);
        assert!(buf.is_empty());

        let failed: Result<()> = Err(anyhow::anyhow!("boom"));
        assert_eq!(conclude(failed, &mut buf), ExitCode::FAILURE);
        assert_eq!(String::from_utf8(buf).unwrap(), "An error occurred: boom\n");
    }

    #[test]
    fn json_mode_console_writes_nothing() {
        let mut buf = Vec::new();
        let mut console = Console {
            out: &mut buf,
            format: OutputFormat::Json,
        };
        console.line("hidden").unwrap();
        console
            .section("Reddit Reviews", &[], "No Reddit reviews found.")
            .unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn section_prefixes_items_with_dash() {
        let mut buf = Vec::new();
        let mut console = Console {
            out: &mut buf,
            format: OutputFormat::Text,
        };
        let items = vec!["Great".to_string(), "Loud".to_string()];
        console.section("Web Search Reviews", &items, "none").unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "\n--- Web Search Reviews ---\n- Great\n- Loud\n"
        );
    }
}
