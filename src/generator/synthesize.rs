use anyhow::{Context, Result};

use crate::generator::context::GeneratorContext;
use crate::generator::prompts;
use crate::generator::state::{AnalysisField, AnalysisState, DegradeReason, TaskOutput};

use super::tasks::complete;

/// 缺失的输入以占位符传给模型
pub const MISSING_INPUT: &str = "N/A";

/// 汇总五个任务的输出，生成最终研读报告
///
/// 模型调用失败时直接返回错误，由工作流作为整次运行的失败上报。
/// 五个输入全部缺失或降级时，报告本身也标记为降级，后续对话不会基于它展开。
pub async fn synthesize_report(
    context: &GeneratorContext,
    state: &AnalysisState,
) -> Result<TaskOutput> {
    let input = |field: AnalysisField| state.text(field).unwrap_or(MISSING_INPUT);

    let usable_inputs = AnalysisField::TASK_FIELDS
        .iter()
        .filter(|field| state.is_written(**field) && !state.is_degraded(**field))
        .count();
    tracing::info!("📝 生成研读报告，有效输入 {}/5", usable_inputs);

    let report = complete(
        context.models.core.as_ref(),
        &prompts::REPORT,
        state.options().target_language,
        &[
            ("source", state.source()),
            ("translation", input(AnalysisField::Translation)),
            ("key_points", input(AnalysisField::KeyPoints)),
            ("experiments", input(AnalysisField::Experiments)),
            ("terms", input(AnalysisField::Terms)),
            ("related_work", input(AnalysisField::RelatedWorkSearch)),
        ],
    )
    .await
    .context("Report synthesis failed")?;

    if usable_inputs == 0 {
        tracing::warn!("⚠️ 所有分析结果均不可用，报告标记为降级");
        Ok(TaskOutput::degraded(DegradeReason::TaskFailed, report))
    } else {
        Ok(TaskOutput::Content(report))
    }
}
