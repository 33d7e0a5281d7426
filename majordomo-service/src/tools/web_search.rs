//! DuckDuckGo Instant Answer client backing `web_search` and `get_news`.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::IntegrationsConfig;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search failed with status {status}")]
    ApiError { status: u16 },
}

pub struct SearchClient {
    client: Client,
}

impl SearchClient {
    pub fn new() -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent("Majordomo/1.0")
            .build()?;
        Ok(Self { client })
    }

    /// Best instant answer for a query
    pub async fn search(
        &self,
        settings: &IntegrationsConfig,
        query: &str,
    ) -> Result<String, SearchError> {
        let url = format!("{}/", settings.search_base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .timeout(Duration::from_secs(settings.search_timeout_secs))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SearchError::ApiError {
                status: response.status().as_u16(),
            });
        }

        // DuckDuckGo answers with application/x-javascript, so decode manually
        let body = response.bytes().await?;
        let answer: InstantAnswer = serde_json::from_slice(&body).unwrap_or_default();
        Ok(summarize(query, &answer))
    }

    /// Headlines-style lookup for a topic
    pub async fn news(
        &self,
        settings: &IntegrationsConfig,
        topic: &str,
    ) -> Result<String, SearchError> {
        let result = self.search(settings, &format!("{} news", topic)).await?;
        Ok(format!("Latest on {}:\n{}", topic, result))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstantAnswer {
    #[serde(default)]
    pub heading: String,
    #[serde(default, rename = "Abstract")]
    pub abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    pub abstract_url: String,
    #[serde(default)]
    pub related_topics: Vec<serde_json::Value>,
}

fn with_source(text: &str, url: &str) -> String {
    if url.is_empty() {
        text.to_string()
    } else {
        format!("{}\nSource: {}", text, url)
    }
}

fn summarize(query: &str, answer: &InstantAnswer) -> String {
    if !answer.abstract_text.is_empty() && !answer.heading.is_empty() {
        let text = format!("{}: {}", answer.heading, answer.abstract_text);
        return with_source(&text, &answer.abstract_url);
    }

    // Topic groups have no Text of their own, so only the first entry is considered
    if let Some(first) = answer.related_topics.first() {
        let text = first.get("Text").and_then(|v| v.as_str()).unwrap_or("");
        if !text.is_empty() {
            let url = first.get("FirstURL").and_then(|v| v.as_str()).unwrap_or("");
            return with_source(text, url);
        }
    }

    format!(
        "No direct answer found for '{}'. Try a more specific search.",
        query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(value: serde_json::Value) -> InstantAnswer {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_abstract_preferred() {
        let a = answer(serde_json::json!({
            "Heading": "Rust",
            "Abstract": "A systems programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust",
            "RelatedTopics": [{"Text": "ignored"}]
        }));
        assert_eq!(
            summarize("rust", &a),
            "Rust: A systems programming language.\nSource: https://en.wikipedia.org/wiki/Rust"
        );
    }

    #[test]
    fn test_related_topic_fallback() {
        let a = answer(serde_json::json!({
            "Heading": "",
            "Abstract": "",
            "RelatedTopics": [{"Text": "Ferris the crab", "FirstURL": "https://example.org/ferris"}]
        }));
        assert_eq!(
            summarize("ferris", &a),
            "Ferris the crab\nSource: https://example.org/ferris"
        );
    }

    #[test]
    fn test_no_answer() {
        let text = summarize("zzzz", &InstantAnswer::default());
        assert!(text.contains("No direct answer found for 'zzzz'"));
    }
}
