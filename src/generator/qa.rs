use anyhow::{Context, Result, bail};

use crate::generator::context::GeneratorContext;
use crate::generator::prompts;
use crate::generator::state::AnalysisState;
use crate::utils::text::truncate_chars;

use super::tasks::complete;

/// 问答时参考的论文正文长度（字符）
pub const QA_CONTEXT_CHARS: usize = 50_000;

/// 基于论文正文回答一个自由提问
pub async fn ask(context: &GeneratorContext, state: &AnalysisState, question: &str) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        bail!("Question must not be empty");
    }
    let doc = state.doc_content();
    if doc.trim().is_empty() {
        bail!("No paper content available for `{}`", state.source());
    }

    tracing::info!("❓ 论文问答: {}", question);
    complete(
        context.models.core.as_ref(),
        &prompts::PAPER_QA,
        state.options().target_language,
        &[
            ("doc_content", truncate_chars(doc, QA_CONTEXT_CHARS)),
            ("question", question),
        ],
    )
    .await
    .context("Paper Q&A failed")
}
