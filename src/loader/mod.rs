//! 论文加载：从 Arxiv 链接或本地 PDF 提取正文与元数据

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 论文元数据，例如 `Title`、`Authors`
pub type Metadata = BTreeMap<String, Value>;

/// 加载结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedDocument {
    pub text: String,
    pub metadata: Metadata,
    pub figures: Vec<PathBuf>,
}

/// 加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),

    #[error("No text could be extracted from {0}")]
    Empty(String),
}

/// 文档加载接口
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, source: &str, use_vision: bool) -> Result<LoadedDocument, LoadError>;
}

/// 内置加载器：Arxiv 下载 + 本地 PDF 文本提取
#[derive(Clone)]
pub struct PaperLoader {
    http: reqwest::Client,
}

impl Default for PaperLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

impl PaperLoader {
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { http }
    }

    async fn load_arxiv(&self, source: &str) -> Result<LoadedDocument, LoadError> {
        let arxiv_id = arxiv_id_from_source(source);
        tracing::info!("📥 正在从 Arxiv 下载论文: {}", arxiv_id);

        let pdf_url = format!("https://arxiv.org/pdf/{}.pdf", arxiv_id);
        let bytes = self.download(&pdf_url).await?;
        let text = extract_text_from_bytes(bytes).await?;
        if text.trim().is_empty() {
            return Err(LoadError::Empty(source.to_string()));
        }

        let metadata = match self.fetch_arxiv_metadata(&arxiv_id).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => fallback_arxiv_metadata(source, &arxiv_id),
            Err(e) => {
                tracing::warn!("⚠️ 获取 Arxiv 元数据失败: {}", e);
                fallback_arxiv_metadata(source, &arxiv_id)
            }
        };

        Ok(LoadedDocument {
            text,
            metadata,
            figures: Vec::new(),
        })
    }

    async fn load_local(&self, source: &str) -> Result<LoadedDocument, LoadError> {
        let path = Path::new(source);
        if !path.exists() {
            return Err(LoadError::NotFound(source.to_string()));
        }
        tracing::info!("📄 正在解析本地文件: {}", path.display());

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| LoadError::Extraction(e.to_string()))?;
        let text = extract_text_from_bytes(bytes).await?;
        if text.trim().is_empty() {
            return Err(LoadError::Empty(source.to_string()));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| source.to_string());

        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), Value::from(source));
        metadata.insert("title".to_string(), Value::from(file_name));

        Ok(LoadedDocument {
            text,
            metadata,
            figures: Vec::new(),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let download_error = |message: String| LoadError::Download {
            url: url.to_string(),
            message,
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(download_error(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_arxiv_metadata(&self, arxiv_id: &str) -> anyhow::Result<Option<Metadata>> {
        let url = format!(
            "http://export.arxiv.org/api/query?id_list={}&max_results=1",
            arxiv_id
        );
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_arxiv_atom(&body)
    }
}

#[async_trait]
impl DocumentLoader for PaperLoader {
    async fn load(&self, source: &str, use_vision: bool) -> Result<LoadedDocument, LoadError> {
        if use_vision {
            // 内置加载器不做页面渲染，直接走文本提取
            tracing::warn!("⚠️ 内置加载器不支持视觉解析，改用PDF文本提取");
        }

        if source.contains("arxiv.org") {
            self.load_arxiv(source).await
        } else {
            self.load_local(source).await
        }
    }
}

/// 从链接中取出 Arxiv ID，兼容 `/abs/xxx`、`/pdf/xxx.pdf` 等形式
pub fn arxiv_id_from_source(source: &str) -> String {
    let last = source
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    last.strip_suffix(".pdf").unwrap_or(last).to_string()
}

fn fallback_arxiv_metadata(source: &str, arxiv_id: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), Value::from(source));
    metadata.insert("title".to_string(), Value::from(format!("Arxiv:{}", arxiv_id)));
    metadata
}

async fn extract_text_from_bytes(bytes: Vec<u8>) -> Result<String, LoadError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| LoadError::Extraction(e.to_string()))?
        .map_err(|e| LoadError::Extraction(e.to_string()))
}

/// 解析 Arxiv export API 返回的 Atom 文档，没有条目时返回 None
fn parse_arxiv_atom(body: &str) -> anyhow::Result<Option<Metadata>> {
    let entry_re = Regex::new(r"(?s)<entry>(.*?)</entry>")?;
    let Some(entry) = entry_re.captures(body).and_then(|c| c.get(1)) else {
        return Ok(None);
    };
    let entry = entry.as_str();

    let field = |tag: &str| -> anyhow::Result<Option<String>> {
        let re = Regex::new(&format!(r"(?s)<{tag}[^>]*>(.*?)</{tag}>"))?;
        Ok(re.captures(entry).and_then(|c| c.get(1)).map(|m| collapse_whitespace(m.as_str())))
    };

    let Some(title) = field("title")?.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let author_re = Regex::new(r"(?s)<author>\s*<name>(.*?)</name>")?;
    let authors: Vec<String> = author_re
        .captures_iter(entry)
        .filter_map(|c| c.get(1))
        .map(|m| collapse_whitespace(m.as_str()))
        .collect();

    let mut metadata = Metadata::new();
    metadata.insert("Title".to_string(), Value::from(title));
    if !authors.is_empty() {
        metadata.insert("Authors".to_string(), Value::from(authors.join(", ")));
    }
    if let Some(summary) = field("summary")? {
        metadata.insert("Summary".to_string(), Value::from(summary));
    }
    if let Some(published) = field("published")? {
        metadata.insert("Published".to_string(), Value::from(published));
    }
    Ok(Some(metadata))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
