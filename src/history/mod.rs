//! 分析历史
//!
//! 工作流本身不读写历史，由调用方在运行结束后保存。
//! [`FileHistoryStore`] 的目录结构：
//!
//! ```text
//! {data_dir}/
//!   records/{id}.json   摘要 + 完整状态
//!   images/{id}/        插图副本
//!   exports/            导出文件
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::generator::state::{AnalysisField, AnalysisState};
use crate::utils::text::truncate_chars;

pub const UNTITLED_ANALYSIS: &str = "Untitled Analysis";
/// 列表中展示的报告摘要长度（字符）
const SUMMARY_CHARS: usize = 200;

/// 历史列表中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    /// `PDF` 或 `Arxiv`
    pub source_type: String,
    pub source_name: String,
    pub summary: String,
}

impl HistorySummary {
    fn describe(id: String, created_at: DateTime<Utc>, state: &AnalysisState) -> Self {
        let source_name = Path::new(state.source())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| state.source().to_string());
        let source_type = if source_name.to_lowercase().ends_with(".pdf") {
            "PDF"
        } else {
            "Arxiv"
        };
        let summary = match state.final_report() {
            Some(report) if !report.is_empty() => {
                format!("{}...", truncate_chars(report, SUMMARY_CHARS))
            }
            _ => "No summary available.".to_string(),
        };

        Self {
            id,
            created_at,
            title: state.title().unwrap_or_else(|| UNTITLED_ANALYSIS.to_string()),
            source_type: source_type.to_string(),
            source_name,
            summary,
        }
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.source_name.to_lowercase().contains(&query)
    }
}

/// 一条完整的历史记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub summary: HistorySummary,
    pub state: AnalysisState,
}

impl HistoryRecord {
    /// Markdown 导出：标题、报告、翻译与对话评审
    pub fn to_markdown(&self) -> String {
        let mut content = format!(
            "# {}\n\n> 来源: {}\n> 时间: {}\n\n",
            self.summary.title,
            self.state.source(),
            self.summary.created_at.to_rfc3339()
        );
        let sections = [
            ("Report", self.state.final_report()),
            ("Translation", self.state.text(AnalysisField::Translation)),
            ("Review Dialogue", self.state.review_dialogue()),
        ];
        for (heading, body) in sections {
            if let Some(body) = body {
                content.push_str(&format!("## {}\n\n{}\n\n", heading, body));
            }
        }
        content
    }
}

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(format!("unsupported export format: {}", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 历史存储
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 保存一次分析，返回新记录的摘要
    async fn save(&self, state: &AnalysisState) -> Result<HistorySummary>;

    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>>;

    /// 按时间倒序列出所有记录
    async fn list(&self) -> Result<Vec<HistorySummary>>;

    /// 按标题或来源名称搜索（不区分大小写）
    async fn search(&self, query: &str) -> Result<Vec<HistorySummary>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|summary| summary.matches(query))
            .collect())
    }

    /// 删除记录及其插图，记录不存在时返回 `false`
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 导出记录，返回导出文件路径
    async fn export(&self, id: &str, format: ExportFormat) -> Result<PathBuf>;
}

/// 基于 JSON 文件的历史存储
pub struct FileHistoryStore {
    root: PathBuf,
}

impl FileHistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    fn images_dir(&self, id: &Uuid) -> PathBuf {
        self.root.join("images").join(id.to_string())
    }

    fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    fn record_path(&self, id: &Uuid) -> PathBuf {
        self.records_dir().join(format!("{}.json", id))
    }

    /// 复制仍然存在的插图，返回副本路径
    async fn persist_figures(&self, id: &Uuid, figures: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut copies = Vec::new();
        if figures.is_empty() {
            return Ok(copies);
        }

        let dir = self.images_dir(id);
        fs::create_dir_all(&dir).await?;
        for figure in figures {
            let Some(file_name) = figure.file_name() else {
                continue;
            };
            if !fs::try_exists(figure).await.unwrap_or(false) {
                tracing::warn!("⚠️ 插图不存在，跳过: {}", figure.display());
                continue;
            }
            let target = dir.join(file_name);
            fs::copy(figure, &target)
                .await
                .with_context(|| format!("Failed to copy figure {}", figure.display()))?;
            copies.push(target);
        }
        Ok(copies)
    }
}

/// 记录 id 必须是合法的 UUID，避免拼接出目录之外的路径
fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("Invalid history record id: {}", id))
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn save(&self, state: &AnalysisState) -> Result<HistorySummary> {
        let id = Uuid::new_v4();
        let summary = HistorySummary::describe(id.to_string(), Utc::now(), state);

        let mut persisted = state.clone();
        persisted.relocate_figures(self.persist_figures(&id, state.figures()).await?);

        let record = HistoryRecord {
            summary: summary.clone(),
            state: persisted,
        };
        fs::create_dir_all(self.records_dir()).await?;
        fs::write(self.record_path(&id), serde_json::to_string_pretty(&record)?).await?;

        tracing::info!("💾 已保存分析记录: {} ({})", summary.title, summary.id);
        Ok(summary)
    }

    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>> {
        let path = self.record_path(&parse_id(id)?);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Corrupted history record: {}", path.display()))?;
        Ok(Some(record))
    }

    async fn list(&self) -> Result<Vec<HistorySummary>> {
        let dir = self.records_dir();
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|content| {
                    serde_json::from_str::<HistoryRecord>(&content).map_err(anyhow::Error::from)
                });
            match parsed {
                Ok(record) => summaries.push(record.summary),
                Err(e) => tracing::warn!("⚠️ 跳过无法读取的历史记录 {}: {}", path.display(), e),
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = parse_id(id)?;
        let path = self.record_path(&id);
        if !fs::try_exists(&path).await? {
            return Ok(false);
        }

        fs::remove_file(&path).await?;
        let images = self.images_dir(&id);
        if fs::try_exists(&images).await? {
            fs::remove_dir_all(&images).await?;
        }
        tracing::info!("🗑️ 已删除分析记录: {}", id);
        Ok(true)
    }

    async fn export(&self, id: &str, format: ExportFormat) -> Result<PathBuf> {
        let Some(record) = self.get(id).await? else {
            bail!("History record not found: {}", id);
        };

        let content = match format {
            ExportFormat::Json => serde_json::to_string_pretty(&record)?,
            ExportFormat::Markdown => record.to_markdown(),
        };

        let dir = self.exports_dir();
        fs::create_dir_all(&dir).await?;
        let path = dir.join(format!(
            "export_{}_{}.{}",
            record.summary.id,
            Utc::now().format("%Y%m%d_%H%M%S"),
            format.extension()
        ));
        fs::write(&path, content).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests;
