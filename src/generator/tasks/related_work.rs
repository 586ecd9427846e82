use crate::generator::context::GeneratorContext;
use crate::generator::prompts;
use crate::generator::state::{AnalysisState, DegradeReason, TaskOutput};
use crate::search::QueryVariant;
use crate::utils::text::truncate_chars;

use super::complete;

pub const NO_TITLE_MESSAGE: &str = "No title or content to search for.";
pub const SEARCH_NOT_CONFIGURED_MESSAGE: &str =
    "No search results found. Please configure Tavily, Exa, or SerpAPI Key.";
pub const NO_SEARCH_RESULTS_MESSAGE: &str = "Search executed but returned no results.";

/// 从正文推断标题时最多保留的字符数
const TITLE_FALLBACK_CHARS: usize = 100;

/// 联网搜索相关工作与外部评价，并用模型整理成情报汇总
///
/// 汇总之后附上原始搜索结果，方便核对来源。
pub async fn search_related_work(context: &GeneratorContext, state: &AnalysisState) -> TaskOutput {
    let Some(title) = search_title(state) else {
        return TaskOutput::degraded(DegradeReason::NoTitle, NO_TITLE_MESSAGE);
    };

    if context.search.is_empty() {
        tracing::info!("🔍 未配置任何搜索后端，跳过相关工作搜索");
        return TaskOutput::degraded(
            DegradeReason::SearchNotConfigured,
            SEARCH_NOT_CONFIGURED_MESSAGE,
        );
    }

    let language = state.options().target_language;
    tracing::info!(
        "🔍 搜索相关工作: {} (后端: {})",
        title,
        context.search.backend_names().join(", ")
    );
    let sections = context
        .search
        .search_all(&QueryVariant::for_title(&title, language))
        .await;
    if sections.is_empty() {
        return TaskOutput::degraded(DegradeReason::NoSearchResults, NO_SEARCH_RESULTS_MESSAGE);
    }
    let raw_results = sections.join("\n\n");

    let summary = complete(
        context.models.related_work.as_ref(),
        &prompts::RELATED_WORK,
        language,
        &[("title", title.as_str()), ("search_results", raw_results.as_str())],
    )
    .await;

    match summary {
        Ok(summary) => TaskOutput::Content(format!(
            "{}\n\n---\n\n#### 原始搜索结果 (Raw Search Results)\n\n{}",
            summary, raw_results
        )),
        Err(e) => {
            tracing::warn!("⚠️ 搜索结果整理失败: {:#}", e);
            TaskOutput::degraded(
                DegradeReason::TaskFailed,
                format!(
                    "Error processing search results: {:#}\n\nRaw Results:\n{}",
                    e, raw_results
                ),
            )
        }
    }
}

/// 搜索用的标题：优先取元数据，其次取正文第一行非空文本
///
/// 正文为空时不搜索，即使元数据里有标题。
pub fn search_title(state: &AnalysisState) -> Option<String> {
    let doc = state.doc_content();
    if doc.trim().is_empty() {
        return None;
    }

    state.title().or_else(|| {
        doc.lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| truncate_chars(line, TITLE_FALLBACK_CHARS).to_string())
    })
}
