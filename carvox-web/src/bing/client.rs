use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use carvox_common::{CarQuery, CarvoxError, Result, ReviewCollection, ReviewSource};
use carvox_config::BingConfig;
use carvox_http::{Auth, HttpClient, RequestOpts};
use reqwest::header::{HeaderName, HeaderValue};

use super::types::SearchResponse;

const SUBSCRIPTION_HEADER: &str = "ocp-apim-subscription-key";

/// The phrase sent to the search engine for a car model.
///
/// ```
/// assert_eq!(
///     carvox_web::bing::review_query("Honda Civic"),
///     "Honda Civic reviews opinions pros cons"
/// );
/// ```
pub fn review_query(car_model: &str) -> String {
    format!("{car_model} reviews opinions pros cons")
}

/// Minimal client for the Bing Web Search API.
#[derive(Clone, Debug)]
pub struct BingApi {
    http: HttpClient,
    endpoint: String,
    subscription_key: HeaderValue,
    result_count: u32,
}

impl BingApi {
    /// Validate the subscription key and build the client. No request is made.
    pub fn new(config: &BingConfig, timeout: Option<Duration>) -> Result<Self> {
        let key = config.require_api_key()?;
        let mut subscription_key = HeaderValue::from_str(key)
            .map_err(|e| CarvoxError::Auth(format!("BING_API_KEY is not a valid header value: {e}")))?;
        subscription_key.set_sensitive(true);

        let http = HttpClient::new(&config.endpoint)?.with_timeout(timeout);
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            subscription_key,
            result_count: config.result_count,
        })
    }

    /// One search request; the raw decoded response.
    pub async fn search(&self, q: &str) -> Result<SearchResponse> {
        let count = self.result_count.to_string();
        let params: Vec<(&str, Cow<'_, str>)> = vec![("q", q.into()), ("count", count.as_str().into())];

        let resp: SearchResponse = self
            .http
            .get_json(
                &self.endpoint,
                RequestOpts {
                    auth: Some(Auth::Header {
                        name: HeaderName::from_static(SUBSCRIPTION_HEADER),
                        value: self.subscription_key.clone(),
                    }),
                    query: Some(params),
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await?;
        Ok(resp)
    }

    /// `"<name>: <snippet>"` for each of the top `result_count` hits.
    pub async fn fetch_web_reviews(&self, query: &CarQuery) -> Result<ReviewCollection> {
        let resp = self.search(&review_query(query.as_str())).await?;
        let reviews = ReviewCollection::from(resp.fragments(self.result_count as usize));

        tracing::info!(
            query = %query,
            estimated_matches = ?resp.web_pages.as_ref().and_then(|w| w.total_estimated_matches),
            fragments = reviews.len(),
            "web search reviews collected"
        );
        Ok(reviews)
    }
}

#[async_trait]
impl ReviewSource for BingApi {
    fn label(&self) -> &str {
        "Web Search"
    }

    async fn fetch_reviews(&self, query: &CarQuery) -> Result<ReviewCollection> {
        self.fetch_web_reviews(query).await
    }
}
