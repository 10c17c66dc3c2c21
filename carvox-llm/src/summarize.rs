//! Prompt construction for review summaries.

const PROMPT_HEAD: &str = "Here are reviews and opinions about a car model:";
const PROMPT_TAIL: &str =
    "Summarize the key points about performance, features, reliability, and user feedback.";

/// Embed the combined review text in the fixed summary prompt.
///
/// ```
/// let prompt = carvox_llm::summarize::build_summary_prompt("Great car\nBad seats");
/// assert!(prompt.starts_with("Here are reviews and opinions about a car model:\nGreat car\nBad seats\n"));
/// assert!(prompt.ends_with("reliability, and user feedback."));
/// ```
pub fn build_summary_prompt(combined_text: &str) -> String {
    format!("{PROMPT_HEAD}\n{combined_text}\n\n{PROMPT_TAIL}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_still_produces_the_template() {
        let prompt = build_summary_prompt("");
        assert_eq!(
            prompt,
            "Here are reviews and opinions about a car model:\n\n\nSummarize the key points about performance, features, reliability, and user feedback."
        );
    }
}
