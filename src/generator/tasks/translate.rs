use anyhow::{Result, bail};

use crate::generator::context::GeneratorContext;
use crate::generator::prompts;
use crate::generator::state::{AnalysisState, DegradeReason, TaskOutput};
use crate::i18n::TargetLanguage;
use crate::llm::ChatModel;
use crate::utils::text::{split_text, truncate_chars};
use crate::utils::threads::do_parallel_with_limit;

use super::{NO_CONTENT_TO_TRANSLATE, TASK_CONTEXT_CHARS, complete, contain, render};

/// 术语表只参考论文开头的这部分
pub const GLOSSARY_CONTEXT_CHARS: usize = 10_000;
/// 全文翻译的分段长度（字符）
pub const CHUNK_SIZE: usize = 4000;
/// 相邻分段的重叠长度（字符）
pub const CHUNK_OVERLAP: usize = 200;
/// 同时翻译的分段数上限
pub const MAX_PARALLEL_CHUNKS: usize = 5;

/// 翻译论文：默认摘要翻译，开启全文翻译时分段翻译并统一术语
pub async fn translate(context: &GeneratorContext, state: &AnalysisState) -> TaskOutput {
    let doc = state.doc_content();
    if doc.is_empty() {
        return TaskOutput::degraded(DegradeReason::NoContent, NO_CONTENT_TO_TRANSLATE);
    }

    let model = context.models.translation.as_ref();
    let language = state.options().target_language;

    if state.options().is_full_translation {
        contain(
            translate_full(model, doc, language).await,
            "Full translation",
        )
    } else {
        let result = complete(
            model,
            &prompts::SUMMARY_TRANSLATION,
            language,
            &[("text", truncate_chars(doc, TASK_CONTEXT_CHARS))],
        )
        .await;
        contain(result, "Translation")
    }
}

async fn translate_full(
    model: &dyn ChatModel,
    doc: &str,
    language: TargetLanguage,
) -> Result<String> {
    let glossary = complete(
        model,
        &prompts::GLOSSARY,
        language,
        &[("text", truncate_chars(doc, GLOSSARY_CONTEXT_CHARS))],
    )
    .await?;

    let chunks = split_text(doc, CHUNK_SIZE, CHUNK_OVERLAP);
    tracing::info!(
        "📑 全文翻译：共 {} 个分段，最多 {} 个并发",
        chunks.len(),
        MAX_PARALLEL_CHUNKS
    );

    let futures = chunks
        .iter()
        .map(|chunk| {
            let request = render(
                &prompts::CHUNK_TRANSLATION,
                language,
                &[("glossary", glossary.as_str()), ("text", *chunk)],
            );
            async move { model.invoke(&request).await }
        })
        .collect::<Vec<_>>();
    let results = do_parallel_with_limit(futures, MAX_PARALLEL_CHUNKS).await;

    let total = results.len();
    let mut translated = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(text) => translated.push(text),
            Err(e) => failures.push((index + 1, e)),
        }
    }

    if let Some((_, first_error)) = failures.first() {
        let numbers = failures
            .iter()
            .map(|(number, _)| number.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        bail!(
            "{} of {} chunks failed (chunks {}): {:#}",
            failures.len(),
            total,
            numbers,
            first_error
        );
    }

    Ok(format!(
        "### 术语对照表 (Glossary)\n{}\n\n---\n\n### 全文翻译\n\n{}",
        glossary,
        translated.join("\n\n")
    ))
}
