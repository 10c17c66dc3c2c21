//! Minimal wrapper around the Reddit OAuth API with carvox defaults.
//!
//! Every fetch exchanges the client credentials for an application-only
//! token, runs one subreddit search and then reads the top-level comments of
//! each qualifying submission. Nothing is paginated or retried.
use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use carvox_common::{CarQuery, CarvoxError, Result, ReviewCollection, ReviewSource};
use carvox_config::RedditConfig;
use carvox_http::{Auth, HttpClient, HttpError, RequestOpts};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use super::extract::{append_submission, select_submissions};
use super::types::{Listing, Submission, TokenResponse};

#[derive(Clone, Debug)]
pub struct RedditApi {
    http: HttpClient,
    auth_url: String,
    client_id: String,
    client_secret: String,
    user_agent: HeaderValue,
    subreddit: String,
    search_limit: u32,
    comments_per_post: usize,
}

impl RedditApi {
    /// Validate credentials and build the client. No request is made here.
    pub fn new(config: &RedditConfig, timeout: Option<Duration>) -> Result<Self> {
        let client_id = config.require_client_id()?.to_string();
        let client_secret = config.require_client_secret()?.to_string();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| CarvoxError::Config(format!("invalid reddit user_agent: {e}")))?;

        let http = HttpClient::new(&config.api_url)?.with_timeout(timeout);

        Ok(Self {
            http,
            auth_url: config.auth_url.clone(),
            client_id,
            client_secret,
            user_agent,
            subreddit: config.subreddit.clone(),
            search_limit: config.search_limit,
            comments_per_post: config.comments_per_post,
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(USER_AGENT, self.user_agent.clone());
        h
    }

    /// Exchange client credentials for a bearer token.
    ///
    /// A rejected exchange is reported as [`CarvoxError::Auth`].
    pub async fn access_token(&self) -> Result<String> {
        let resp: std::result::Result<TokenResponse, HttpError> = self
            .http
            .post_form(
                &self.auth_url,
                &[("grant_type", "client_credentials")],
                RequestOpts {
                    auth: Some(Auth::Basic {
                        user: &self.client_id,
                        password: &self.client_secret,
                    }),
                    headers: Some(self.headers()),
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await;

        match resp {
            Ok(TokenResponse {
                error: Some(error), ..
            }) => Err(CarvoxError::Auth(format!(
                "reddit token exchange rejected: {error}"
            ))),
            Ok(token) if !token.access_token.is_empty() => Ok(token.access_token),
            Ok(_) => Err(CarvoxError::Auth(
                "reddit token exchange returned an empty access_token".into(),
            )),
            Err(HttpError::Api {
                status, message, ..
            }) => Err(CarvoxError::Auth(format!(
                "reddit token exchange failed with status {status}: {message}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Search the configured subreddit, relevance-sorted, one page.
    pub async fn search_submissions(&self, token: &str, query: &str) -> Result<Vec<Submission>> {
        let path = format!("r/{}/search", self.subreddit);
        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("q", query.into()),
            ("restrict_sr", "true".into()),
            ("sort", "relevance".into()),
            ("t", "all".into()),
            ("limit", self.search_limit.to_string().into()),
            ("raw_json", "1".into()),
        ];

        let listing: Listing = self
            .http
            .get_json(
                &path,
                RequestOpts {
                    auth: Some(Auth::Bearer(token)),
                    headers: Some(self.headers()),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await?;

        let submissions = listing.submissions();
        tracing::debug!(
            subreddit = %self.subreddit,
            query,
            returned = submissions.len(),
            "reddit search page"
        );
        Ok(submissions)
    }

    /// Top-level comment bodies for one submission, "more" stubs not expanded.
    pub async fn top_comments(&self, token: &str, submission_id: &str) -> Result<Vec<String>> {
        let path = format!("comments/{submission_id}");
        let limit = self.comments_per_post.to_string();
        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("limit", limit.as_str().into()),
            ("depth", "1".into()),
            ("sort", "confidence".into()),
            ("raw_json", "1".into()),
        ];

        // [submission listing, comment listing]
        let listings: Vec<Listing> = self
            .http
            .get_json(
                &path,
                RequestOpts {
                    auth: Some(Auth::Bearer(token)),
                    headers: Some(self.headers()),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await?;

        Ok(listings
            .get(1)
            .map(|l| l.comment_bodies().into_iter().map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Matching submissions plus up to `comments_per_post` comments each.
    pub async fn fetch_car_reviews(&self, query: &CarQuery) -> Result<ReviewCollection> {
        let token = self.access_token().await?;
        let submissions = self.search_submissions(&token, query.as_str()).await?;
        let selected = select_submissions(query, &submissions);

        tracing::debug!(
            query = %query,
            searched = submissions.len(),
            matched = selected.len(),
            "reddit submissions selected"
        );

        let mut reviews = ReviewCollection::new();
        for submission in selected {
            let comments = self.top_comments(&token, &submission.id).await?;
            let bodies: Vec<&str> = comments.iter().map(String::as_str).collect();
            append_submission(&mut reviews, submission, &bodies, self.comments_per_post);
        }

        tracing::info!(query = %query, fragments = reviews.len(), "reddit reviews collected");
        Ok(reviews)
    }
}

#[async_trait]
impl ReviewSource for RedditApi {
    fn label(&self) -> &str {
        "Reddit"
    }

    async fn fetch_reviews(&self, query: &CarQuery) -> Result<ReviewCollection> {
        self.fetch_car_reviews(query).await
    }
}
