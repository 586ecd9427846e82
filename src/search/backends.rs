//! 具体的联网搜索后端：Exa、Tavily、SerpAPI

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::{Value, json};

use super::{SearchBackend, SearchHit};

fn hits_from(items: Option<&Vec<Value>>, url_key: &str, content_keys: &[&str]) -> Vec<SearchHit> {
    items
        .map(|arr| {
            arr.iter()
                .map(|item| SearchHit {
                    url: item
                        .get(url_key)
                        .and_then(|u| u.as_str())
                        .unwrap_or("Link")
                        .to_string(),
                    content: content_keys
                        .iter()
                        .find_map(|key| item.get(*key).and_then(|c| c.as_str()))
                        .unwrap_or("")
                        .trim()
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

async fn read_json(response: reqwest::Response, backend: &str) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let err_body = response.text().await.unwrap_or_default();
        bail!("{} API error ({}): {}", backend, status.as_u16(), err_body);
    }
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", backend))
}

/// Exa 搜索
pub struct ExaBackend {
    client: reqwest::Client,
    api_key: String,
    num_results: usize,
}

impl ExaBackend {
    pub fn new(client: reqwest::Client, api_key: String, num_results: usize) -> Self {
        Self {
            client,
            api_key,
            num_results,
        }
    }
}

#[async_trait]
impl SearchBackend for ExaBackend {
    fn name(&self) -> &str {
        "Exa"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let body = json!({
            "query": query,
            "numResults": self.num_results,
            "contents": { "text": { "maxCharacters": 2000 } },
        });

        let response = self
            .client
            .post("https://api.exa.ai/search")
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Exa request failed")?;

        let data = read_json(response, "Exa").await?;
        Ok(hits_from(
            data.get("results").and_then(|r| r.as_array()),
            "url",
            &["text", "summary", "title"],
        ))
    }
}

/// Tavily 搜索
pub struct TavilyBackend {
    client: reqwest::Client,
    api_key: String,
    max_results: usize,
}

impl TavilyBackend {
    pub fn new(client: reqwest::Client, api_key: String, max_results: usize) -> Self {
        Self {
            client,
            api_key,
            max_results,
        }
    }
}

#[async_trait]
impl SearchBackend for TavilyBackend {
    fn name(&self) -> &str {
        "Tavily"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let body = json!({
            "query": query,
            "max_results": self.max_results,
            "search_depth": "advanced",
            "include_answer": false,
        });

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Tavily request failed")?;

        let data = read_json(response, "Tavily").await?;
        Ok(hits_from(
            data.get("results").and_then(|r| r.as_array()),
            "url",
            &["content"],
        ))
    }
}

/// SerpAPI（Google）搜索
pub struct SerpApiBackend {
    client: reqwest::Client,
    api_key: String,
    num_results: usize,
}

impl SerpApiBackend {
    pub fn new(client: reqwest::Client, api_key: String, num_results: usize) -> Self {
        Self {
            client,
            api_key,
            num_results,
        }
    }
}

#[async_trait]
impl SearchBackend for SerpApiBackend {
    fn name(&self) -> &str {
        "SerpAPI"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let num = self.num_results.to_string();
        let response = self
            .client
            .get("https://serpapi.com/search.json")
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("SerpAPI request failed")?;

        let data = read_json(response, "SerpAPI").await?;
        if let Some(error) = data.get("error").and_then(|e| e.as_str()) {
            bail!("SerpAPI error: {}", error);
        }

        let mut hits = hits_from(
            data.get("organic_results").and_then(|r| r.as_array()),
            "link",
            &["snippet", "title"],
        );
        hits.truncate(self.num_results);
        Ok(hits)
    }
}
