//! 联网搜索聚合：对多个可选后端并发发起查询，统一整理结果

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::i18n::TargetLanguage;

mod backends;

pub use backends::{ExaBackend, SerpApiBackend, TavilyBackend};

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub content: String,
}

/// 搜索后端接口
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// 结果分组标题中使用的后端名称
    fn name(&self) -> &str;

    /// 请求失败时返回带上下文的错误，由聚合器收敛为 `Unavailable`
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// 单次查询的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(String),
    Empty,
    /// 后端不可用或请求失败，不会向上抛出
    Unavailable(String),
}

/// 查询变体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    English,
    Localized(TargetLanguage),
    GitHub,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryVariant {
    pub kind: QueryKind,
    pub query: String,
}

impl QueryVariant {
    /// 针对论文标题构造三种查询：英文解读、目标语言解读、GitHub 代码
    pub fn for_title(title: &str, language: TargetLanguage) -> Vec<QueryVariant> {
        vec![
            QueryVariant {
                kind: QueryKind::English,
                query: format!("analysis review of paper '{}'", title),
            },
            QueryVariant {
                kind: QueryKind::Localized(language),
                query: language.localized_review_query(title),
            },
            QueryVariant {
                kind: QueryKind::GitHub,
                query: format!("site:github.com '{}' code implementation", title),
            },
        ]
    }

    fn header(&self, backend: &str) -> String {
        match self.kind {
            QueryKind::English => format!("### {} Search Results (English)", backend),
            QueryKind::Localized(language) => {
                format!("### {} Search Results ({})", backend, language.english_name())
            }
            QueryKind::GitHub => format!("### {} GitHub Search Results", backend),
        }
    }
}

/// 搜索聚合器
#[derive(Clone, Default)]
pub struct SearchAggregator {
    backends: Vec<Arc<dyn SearchBackend>>,
}

impl SearchAggregator {
    pub fn new(backends: Vec<Arc<dyn SearchBackend>>) -> Self {
        Self { backends }
    }

    /// 只为配置了key的后端创建实例
    pub fn from_config(config: &SearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();
        let key = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        };

        let mut backends: Vec<Arc<dyn SearchBackend>> = Vec::new();
        match key(&config.exa_api_key) {
            Some(api_key) => backends.push(Arc::new(ExaBackend::new(
                client.clone(),
                api_key,
                config.results_per_query,
            ))),
            None => tracing::debug!("Exa API Key 未配置，跳过"),
        }
        match key(&config.tavily_api_key) {
            Some(api_key) => backends.push(Arc::new(TavilyBackend::new(
                client.clone(),
                api_key,
                config.results_per_query,
            ))),
            None => tracing::debug!("Tavily API Key 未配置，跳过"),
        }
        match key(&config.serpapi_api_key) {
            Some(api_key) => backends.push(Arc::new(SerpApiBackend::new(
                client,
                api_key,
                config.results_per_query,
            ))),
            None => tracing::debug!("SerpAPI Key 未配置，跳过"),
        }

        Self { backends }
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// 对每个后端并发执行所有查询变体，返回带标题的结果分组
    ///
    /// 顺序固定为后端顺序再按变体顺序，失败或为空的查询直接跳过。
    pub async fn search_all(&self, variants: &[QueryVariant]) -> Vec<String> {
        let jobs = self.backends.iter().flat_map(|backend| {
            variants.iter().map(move |variant| async move {
                let outcome = query_backend(backend.as_ref(), &variant.query).await;
                (variant.header(backend.name()), outcome)
            })
        });

        join_all(jobs)
            .await
            .into_iter()
            .filter_map(|(header, outcome)| match outcome {
                SearchOutcome::Found(body) => Some(format!("{}\n{}", header, body)),
                SearchOutcome::Empty | SearchOutcome::Unavailable(_) => None,
            })
            .collect()
    }
}

/// 执行一次查询并把结果整理为 markdown 列表
pub async fn query_backend(backend: &dyn SearchBackend, query: &str) -> SearchOutcome {
    match backend.search(query).await {
        Ok(hits) if hits.is_empty() => SearchOutcome::Empty,
        Ok(hits) => SearchOutcome::Found(format_hits(&hits)),
        Err(e) => {
            tracing::warn!("⚠️ {} 搜索失败: {:#}", backend.name(), e);
            SearchOutcome::Unavailable(format!("{:#}", e))
        }
    }
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("- **{}**: {}", hit.url, hit.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
