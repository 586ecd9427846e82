//! 五个互相独立的分析任务
//!
//! 每个任务只读取加载后的状态、只产出自己的字段，失败时返回降级文本而不是错误。

use anyhow::Result;

use crate::generator::context::GeneratorContext;
use crate::generator::prompts::language_slots;
use crate::generator::state::{AnalysisField, AnalysisState, DegradeReason, TaskOutput};
use crate::i18n::TargetLanguage;
use crate::llm::{ChatModel, PromptRequest, PromptTemplate};

pub mod extract;
pub mod related_work;
pub mod translate;

/// 单次任务调用可使用的最大正文长度（字符）
pub const TASK_CONTEXT_CHARS: usize = 100_000;

pub const NO_CONTENT_TO_TRANSLATE: &str = "No content to translate.";
pub const NO_CONTENT_TO_ANALYZE: &str = "No content to analyze.";

/// 分析任务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisTask {
    Translate,
    KeyPoints,
    Experiments,
    Terms,
    RelatedWork,
}

impl AnalysisTask {
    pub const ALL: [AnalysisTask; 5] = [
        AnalysisTask::Translate,
        AnalysisTask::KeyPoints,
        AnalysisTask::Experiments,
        AnalysisTask::Terms,
        AnalysisTask::RelatedWork,
    ];

    /// 任务负责写入的字段
    pub fn field(&self) -> AnalysisField {
        match self {
            AnalysisTask::Translate => AnalysisField::Translation,
            AnalysisTask::KeyPoints => AnalysisField::KeyPoints,
            AnalysisTask::Experiments => AnalysisField::Experiments,
            AnalysisTask::Terms => AnalysisField::Terms,
            AnalysisTask::RelatedWork => AnalysisField::RelatedWorkSearch,
        }
    }

    /// 执行任务，永远返回一个输出
    pub async fn run(&self, context: &GeneratorContext, state: &AnalysisState) -> TaskOutput {
        match self {
            AnalysisTask::Translate => translate::translate(context, state).await,
            AnalysisTask::KeyPoints => extract::extract_key_points(context, state).await,
            AnalysisTask::Experiments => extract::extract_experiments(context, state).await,
            AnalysisTask::Terms => extract::explain_terms(context, state).await,
            AnalysisTask::RelatedWork => related_work::search_related_work(context, state).await,
        }
    }
}

/// 渲染模板，自动带上目标语言槽位
pub(crate) fn render(
    template: &PromptTemplate,
    language: TargetLanguage,
    slots: &[(&str, &str)],
) -> PromptRequest {
    let mut all_slots: Vec<(&str, &str)> = language_slots(language).to_vec();
    all_slots.extend_from_slice(slots);
    template.render(&all_slots)
}

/// 渲染模板并调用模型
pub(crate) async fn complete(
    model: &dyn ChatModel,
    template: &PromptTemplate,
    language: TargetLanguage,
    slots: &[(&str, &str)],
) -> Result<String> {
    let request = render(template, language, slots);
    tracing::debug!("🤖 调用模型 {}", model.model_name());
    model.invoke(&request).await
}

/// 把任务内部的错误转换成降级输出
pub(crate) fn contain(result: Result<String>, task_label: &str) -> TaskOutput {
    match result {
        Ok(text) => TaskOutput::Content(text),
        Err(e) => {
            tracing::warn!("⚠️ {} 失败: {:#}", task_label, e);
            TaskOutput::degraded(
                DegradeReason::TaskFailed,
                format!("{} failed: {:#}", task_label, e),
            )
        }
    }
}
