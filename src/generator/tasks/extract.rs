use crate::generator::context::GeneratorContext;
use crate::generator::prompts;
use crate::generator::state::{AnalysisState, DegradeReason, TaskOutput};
use crate::llm::PromptTemplate;
use crate::utils::text::truncate_chars;

use super::{NO_CONTENT_TO_ANALYZE, TASK_CONTEXT_CHARS, complete, contain};

/// 提取核心要点
pub async fn extract_key_points(context: &GeneratorContext, state: &AnalysisState) -> TaskOutput {
    extract(context, state, &prompts::KEY_POINTS, "Key points extraction").await
}

/// 提取实验设置与结果
pub async fn extract_experiments(context: &GeneratorContext, state: &AnalysisState) -> TaskOutput {
    extract(context, state, &prompts::EXPERIMENTS, "Experiments extraction").await
}

/// 解释关键术语
pub async fn explain_terms(context: &GeneratorContext, state: &AnalysisState) -> TaskOutput {
    extract(context, state, &prompts::TERMS, "Terms explanation").await
}

async fn extract(
    context: &GeneratorContext,
    state: &AnalysisState,
    template: &PromptTemplate,
    task_label: &str,
) -> TaskOutput {
    let doc = state.doc_content();
    if doc.is_empty() {
        return TaskOutput::degraded(DegradeReason::NoContent, NO_CONTENT_TO_ANALYZE);
    }

    let text = truncate_chars(doc, TASK_CONTEXT_CHARS);
    let result = complete(
        context.models.core.as_ref(),
        template,
        state.options().target_language,
        &[("text", text)],
    )
    .await;
    contain(result, task_label)
}
