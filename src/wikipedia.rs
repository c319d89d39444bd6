use std::borrow::Cow;
use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tracing::debug;

use crate::config::WikipediaConfig;
use crate::error::AnnotateError;

/// Source of raw page summaries.
#[async_trait]
pub trait SummaryFetcher: Send + Sync {
    async fn fetch_summary(&self, identifier: &str) -> Result<Vec<u8>, AnnotateError>;
}

/// Client for the MediaWiki `action=query` extracts API.
pub struct WikipediaClient {
    client: reqwest::Client,
    api_url: String,
}

impl WikipediaClient {
    pub fn new(config: &WikipediaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build Wikipedia HTTP client")?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl SummaryFetcher for WikipediaClient {
    async fn fetch_summary(&self, identifier: &str) -> Result<Vec<u8>, AnnotateError> {
        // Titles copied from a browser arrive percent-encoded; the query
        // builder encodes again, so decode once here.
        let title = percent_decode_str(identifier)
            .decode_utf8()
            .unwrap_or(Cow::Borrowed(identifier));
        debug!("Fetching summary for '{}' from {}", title, self.api_url);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("titles", title.as_ref()),
                ("format", "json"),
                ("prop", "extracts"),
                ("exintro", "true"),
                ("explaintext", "true"),
                ("exsentences", "1"),
                ("exlimit", "1"),
            ])
            .send()
            .await
            .map_err(|e| AnnotateError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnnotateError::Fetch(format!(
                "Wikipedia API returned {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AnnotateError::Fetch(e.to_string()))?;
        if body.is_empty() {
            return Err(AnnotateError::Fetch("response was empty".to_string()));
        }

        Ok(body.to_vec())
    }
}

#[derive(Debug, Deserialize)]
pub struct SummaryResponse {
    pub query: Query,
}

#[derive(Debug, Deserialize)]
pub struct Query {
    pub pages: HashMap<String, PageSummary>,
}

/// One entry of `query.pages`. Missing pages come back without `extract`
/// and `pageid`.
#[derive(Debug, Deserialize)]
pub struct PageSummary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub extract: String,
    #[serde(default)]
    pub pageid: i64,
}

/// Decode a summary payload into the first line of one page's extract.
///
/// `pages` is keyed by page id and normally holds a single entry. When it
/// holds several, whichever the map yields first is used; the choice is not
/// stable between runs.
pub fn parse_summary(raw: &[u8]) -> Result<String, AnnotateError> {
    let response: SummaryResponse = serde_json::from_slice(raw)?;

    let page = response
        .query
        .pages
        .into_values()
        .next()
        .ok_or(AnnotateError::NotFound)?;

    let first_line = page.extract.split('\n').next().unwrap_or_default();
    if first_line.trim().is_empty() {
        debug!("Page '{}' ({}) has no extract", page.title, page.pageid);
        return Err(AnnotateError::NotFound);
    }

    Ok(first_line.to_string())
}
