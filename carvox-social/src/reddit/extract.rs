//! Pure helpers that decide which submissions count and what text they add.

use std::collections::HashSet;

use carvox_common::{CarQuery, ReviewCollection};

use super::types::Submission;

/// Submissions whose normalized title contains the normalized query, in
/// listing order, each title admitted once.
///
/// Titles are deduplicated by their raw text while matching uses the
/// normalized form, so two titles differing only in punctuation both pass.
pub fn select_submissions<'a>(query: &CarQuery, submissions: &'a [Submission]) -> Vec<&'a Submission> {
    let mut seen_titles: HashSet<&str> = HashSet::new();
    submissions
        .iter()
        .filter(|s| query.matches_title(&s.title) && seen_titles.insert(s.title.as_str()))
        .collect()
}

/// The body of a submission, or its title for link/title-only posts.
pub fn submission_fragment(submission: &Submission) -> Option<String> {
    [submission.selftext.as_str(), submission.title.as_str()]
        .into_iter()
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// The first `limit` comment bodies, trimmed; blank ones are dropped.
pub fn comment_fragments(bodies: &[&str], limit: usize) -> Vec<String> {
    bodies
        .iter()
        .take(limit)
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

/// Append one qualifying submission followed by its comments.
pub fn append_submission(
    out: &mut ReviewCollection,
    submission: &Submission,
    comment_bodies: &[&str],
    limit: usize,
) {
    if let Some(text) = submission_fragment(submission) {
        out.push(text);
    }
    for comment in comment_fragments(comment_bodies, limit) {
        out.push(comment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(id: &str, title: &str, selftext: &str) -> Submission {
        Submission {
            id: id.into(),
            title: title.into(),
            selftext: selftext.into(),
        }
    }

    #[test]
    fn selects_by_normalized_title_and_dedups_raw_titles() {
        let q = CarQuery::new("Honda Civic");
        let subs = vec![
            sub("1", "Honda Civic 2022 ownership review", ""),
            sub("2", "Honda Civic 2022 ownership review", "repost"),
            sub("3", "honda-civic vs corolla?", ""),
            sub("4", "Mazda 3 thoughts", ""),
            sub("5", "HONDA CIVIC 2022 OWNERSHIP REVIEW", ""),
        ];

        let ids: Vec<&str> = select_submissions(&q, &subs)
            .into_iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, ["1", "3", "5"]);
    }

    #[test]
    fn body_wins_over_title() {
        assert_eq!(
            submission_fragment(&sub("1", "Title", "  Body text \n")).as_deref(),
            Some("Body text")
        );
        assert_eq!(
            submission_fragment(&sub("1", " Title only ", "   ")).as_deref(),
            Some("Title only")
        );
        assert_eq!(submission_fragment(&sub("1", "  ", "")), None);
    }

    #[test]
    fn comments_are_capped_and_never_blank() {
        let bodies = ["  great car ", "", "meh", "fourth"];
        assert_eq!(comment_fragments(&bodies, 3), ["great car", "meh"]);
        assert!(comment_fragments(&bodies, 0).is_empty());
    }

    #[test]
    fn append_keeps_post_then_comments_order() {
        let mut out = ReviewCollection::new();
        append_submission(&mut out, &sub("1", "Title", ""), &["c1", "c2"], 3);
        assert_eq!(out.iter().collect::<Vec<_>>(), ["Title", "c1", "c2"]);
    }
}
