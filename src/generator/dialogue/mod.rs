//! 对话评审
//!
//! 基于研读报告模拟多角色讨论。开启圆桌模式时由主持人、方法论专家、应用实践者与作者
//! 进行三轮辩论；否则由读者与作者进行五轮问答。每一轮都是一次模型调用，严格按顺序执行，
//! 产出的发言依次追加到对话记录并实时推送给 [`DialogueSink`]。

use anyhow::{Context, Result};

use crate::generator::context::GeneratorContext;
use crate::generator::prompts;
use crate::generator::state::{AnalysisField, AnalysisState, DegradeReason, StateUpdate, TaskOutput};
use crate::i18n::TargetLanguage;
use crate::llm::{ChatModel, PromptTemplate};
use crate::utils::text::truncate_chars;

use super::tasks::render;

pub const NO_REPORT_MESSAGE: &str = "无法进行对话评审：未生成最终报告。";
pub const UNTITLED_PAPER: &str = "Untitled Paper";
/// 评审角色参考的报告片段长度（字符）
pub const REPORT_EXCERPT_CHARS: usize = 10_000;
/// 作者角色参考的论文正文长度（字符）
pub const DOC_EXCERPT_CHARS: usize = 50_000;
/// 对话记录中相邻发言之间的分隔
pub const TRANSCRIPT_SEPARATOR: &str = "\n\n---\n\n";

/// 对话参与者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    Moderator,
    Critic,
    Practitioner,
    Author,
    Reader,
    /// 简单问答模式下为读者答疑的作者
    Mentor,
}

impl Persona {
    pub fn icon(&self) -> &'static str {
        match self {
            Persona::Moderator => "🎓",
            Persona::Critic => "⚔️",
            Persona::Practitioner => "🛠️",
            Persona::Author => "🛡️",
            Persona::Reader => "👤",
            Persona::Mentor => "🎓",
        }
    }

    /// (本地化名称, 英文名称)
    fn names(&self) -> (Option<&'static str>, &'static str) {
        match self {
            Persona::Moderator => (Some("主持人"), "Moderator"),
            Persona::Critic => (Some("方法论专家"), "Critic"),
            Persona::Practitioner => (Some("应用实践者"), "Practitioner"),
            Persona::Author => (Some("论文作者"), "Author"),
            Persona::Reader => (None, "Reader"),
            Persona::Mentor => (None, "Author"),
        }
    }

    /// 对话记录里的角色标签，例如 `🎓 主持人 (Moderator - 总结)`、`👤 Reader (Q1)`
    pub fn label(&self, tag: Option<&str>) -> String {
        let (local, english) = self.names();
        let name = match (local, tag) {
            (Some(local), Some(tag)) => format!("{} ({} - {})", local, english, tag),
            (Some(local), None) => format!("{} ({})", local, english),
            (None, Some(tag)) => format!("{} ({})", english, tag),
            (None, None) => english.to_string(),
        };
        format!("{} {}", self.icon(), name)
    }

    fn template(&self) -> &'static PromptTemplate {
        match self {
            Persona::Moderator => &prompts::MODERATOR,
            Persona::Critic => &prompts::CRITIC,
            Persona::Practitioner => &prompts::PRACTITIONER,
            Persona::Author => &prompts::AUTHOR,
            Persona::Reader => &prompts::READER,
            Persona::Mentor => &prompts::MENTOR,
        }
    }

    /// 作者熟悉论文全文，使用核心模型；其余角色使用评审模型
    fn uses_core_model(&self) -> bool {
        matches!(self, Persona::Author | Persona::Mentor)
    }
}

/// 一条发言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub persona: Persona,
    pub label: String,
    pub text: String,
}

impl Utterance {
    /// 对话记录中的格式：`**{label}:**\n{text}`
    pub fn render(&self) -> String {
        format!("**{}:**\n{}", self.label, self.text)
    }
}

/// 实时接收对话进展的旁路输出
pub trait DialogueSink: Send + Sync {
    /// 进入新的阶段
    fn phase(&self, _header: &str) {}

    /// 产生了一条新的发言
    fn emit(&self, utterance: &Utterance);
}

/// 丢弃所有输出
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DialogueSink for NoopSink {
    fn emit(&self, _utterance: &Utterance) {}
}

/// 进行一次对话评审，返回完整的对话记录
///
/// 报告缺失、为空或已降级时不调用模型，直接返回降级提示。
/// 任意一轮调用失败都会中止整个对话并返回错误。
pub async fn run_dialogue(
    context: &GeneratorContext,
    state: &AnalysisState,
    sink: &dyn DialogueSink,
) -> Result<TaskOutput> {
    let report = match state.final_report() {
        Some(report)
            if !report.trim().is_empty() && !state.is_degraded(AnalysisField::FinalReport) =>
        {
            report
        }
        _ => {
            tracing::warn!("⚠️ 没有可用的研读报告，跳过对话评审");
            return Ok(TaskOutput::degraded(DegradeReason::NoReport, NO_REPORT_MESSAGE));
        }
    };

    let round_table = state.options().enable_round_table;
    tracing::info!(
        "🎙️ 开始对话评审（{}）",
        if round_table { "圆桌讨论" } else { "读者问答" }
    );

    let mut session = Session {
        context,
        sink,
        language: state.options().target_language,
        title: state.title().unwrap_or_else(|| UNTITLED_PAPER.to_string()),
        report: truncate_chars(report, REPORT_EXCERPT_CHARS),
        doc: truncate_chars(state.doc_content(), DOC_EXCERPT_CHARS),
        transcript: Vec::new(),
    };

    if round_table {
        session.round_table().await?;
    } else {
        session.reader_questions().await?;
    }

    tracing::info!("✅ 对话评审完成，共 {} 条发言", session.transcript.len());
    Ok(TaskOutput::Content(session.transcript.join(TRANSCRIPT_SEPARATOR)))
}

/// 对已完成的分析重新发起一次对话评审
///
/// 旧的对话记录会被替换，其余字段保持不变。
pub async fn discuss(
    context: &GeneratorContext,
    state: &AnalysisState,
    enable_round_table: bool,
    sink: &dyn DialogueSink,
) -> Result<AnalysisState> {
    let mut state = state.reseed_for_dialogue(enable_round_table);
    let output = run_dialogue(context, &state, sink).await?;
    state.apply(StateUpdate::Task {
        field: AnalysisField::ReviewDialogue,
        output,
    })?;
    Ok(state)
}

struct Session<'a> {
    context: &'a GeneratorContext,
    sink: &'a dyn DialogueSink,
    language: TargetLanguage,
    title: String,
    report: &'a str,
    doc: &'a str,
    transcript: Vec<String>,
}

impl Session<'_> {
    async fn round_table(&mut self) -> Result<()> {
        self.sink.phase("### 🟢 会议开始 (Opening)");
        let opening = format!(
            "会议开始。请简要介绍论文《{}》的核心贡献（以摘要为准），并依次介绍三位嘉宾：论文作者、方法论专家和应用实践者。",
            self.title
        );
        self.moderate(None, "会议刚开始，需要开场介绍。", &opening)
            .await?;

        self.sink.phase("### 1️⃣ 第一轮：方法论探讨 (Round 1/3)");
        let critic_input = "主持人请你（方法论专家）发言。请结合研读报告，就论文的理论推导、算法设计或实验严谨性提出一个尖锐的问题。";
        let critic_question = self.speak(Persona::Critic, None, critic_input, None).await?;
        let first_answer = self
            .speak(
                Persona::Author,
                None,
                &format!(
                    "方法论专家提出了质疑：{}\n请依据论文内容有力地反驳或解释。",
                    critic_question
                ),
                None,
            )
            .await?;

        self.sink.phase("### 2️⃣ 第二轮：落地应用质疑 (Round 2/3)");
        let practitioner_input = "主持人请你（应用实践者）发言，作者刚刚回应了方法论问题。请从你的视角，就落地成本、工程难度或实际价值提出质疑。";
        let practitioner_question = self
            .speak(Persona::Practitioner, None, practitioner_input, None)
            .await?;
        let second_answer = self
            .speak(
                Persona::Author,
                None,
                &format!(
                    "应用实践者提出了质疑：{}\n请依据论文内容回应，重点说明实际应用价值与成本。",
                    practitioner_question
                ),
                None,
            )
            .await?;

        self.sink.phase("### 3️⃣ 第三轮：深度追问 (Round 3/3)");
        let follow_up = format!(
            "前两轮讨论结束。\n方法论专家的问题：{}\n应用实践者的问题：{}\n\n请梳理争议焦点，并指定一位评审嘉宾深入追问。",
            critic_question, practitioner_question
        );
        self.moderate(None, "进入自由辩论环节，需要指定一位嘉宾追问。", &follow_up)
            .await?;
        let sharper = format!(
            "主持人请你继续追问。作者此前的两次回答：\n1. {}\n2. {}\n\n请抓住其中的逻辑漏洞或含糊之处，提出最后一个追问。",
            first_answer, second_answer
        );
        let final_question = self
            .speak(Persona::Critic, Some("追问"), &sharper, None)
            .await?;
        let final_answer = self
            .speak(
                Persona::Author,
                None,
                &format!(
                    "方法论专家追问：{}\n这是最后一次回应机会，请给出总结性的回答。",
                    final_question
                ),
                None,
            )
            .await?;

        self.sink.phase("### 🏁 会议结束 (Closing)");
        let closing = format!(
            "辩论结束，作者最后的回答是：{}\n\n请综合各方观点，从创新点、工程可行性、算法完备性等维度总结这篇论文，并给出“技术推荐等级”（强烈推荐 / 值得尝试 / 仅供参考）。",
            final_answer
        );
        self.moderate(Some("总结"), "会议结束，需要总结并给出推荐等级。", &closing)
            .await?;
        Ok(())
    }

    async fn reader_questions(&mut self) -> Result<()> {
        const ROUND_ICONS: [&str; 4] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣"];
        const ROUND_NAMES: [&str; 4] = ["一", "二", "三", "四"];
        const FOLLOW_UP_HINTS: [&str; 3] = [
            "请在此基础上追问一个更深入、更具体的问题。",
            "请继续追问，或者询问这项研究的局限性与应用场景。",
            "请继续追问，例如未来的发展方向或潜在的缺陷。",
        ];

        let mut last_answer = String::new();
        for round in 0..ROUND_ICONS.len() {
            self.sink.phase(&format!(
                "### {} 第{}轮问答 (Round {}/5)",
                ROUND_ICONS[round],
                ROUND_NAMES[round],
                round + 1
            ));

            let reader_input = if round == 0 {
                format!(
                    "我已经读完了这份论文研读报告。请基于报告内容，提出你最想问作者的一个核心问题，或者指出你觉得最难理解的一个概念。\n\n报告内容：\n{}",
                    self.report
                )
            } else {
                format!(
                    "作者回答了你的第{}个问题。\n作者回答：{}\n\n{}",
                    ROUND_NAMES[round - 1],
                    last_answer,
                    FOLLOW_UP_HINTS[round - 1]
                )
            };
            let number = round + 1;
            let question = self
                .speak(Persona::Reader, Some(&format!("Q{}", number)), &reader_input, None)
                .await?;

            let prefix = if round == 0 { "读者提问" } else { "读者追问" };
            last_answer = self
                .speak(
                    Persona::Mentor,
                    Some(&format!("A{}", number)),
                    &format!("{}：{}", prefix, question),
                    None,
                )
                .await?;
        }

        self.sink.phase("### 5️⃣ 最终点评 (Round 5/5)");
        let feedback = format!(
            "作者已经回答了你的所有问题。\n作者回答：{}\n\n请总结你对这篇论文的理解，并为这份报告的易读性（1-10 分）和论文的启发性（1-10 分）打分点评。",
            last_answer
        );
        self.speak(Persona::Reader, Some("Final Feedback"), &feedback, None)
            .await?;
        Ok(())
    }

    async fn moderate(&mut self, tag: Option<&str>, status: &str, input: &str) -> Result<String> {
        self.speak(Persona::Moderator, tag, input, Some(status)).await
    }

    /// 一轮发言：调用模型、记录并推送
    async fn speak(
        &mut self,
        persona: Persona,
        tag: Option<&str>,
        input: &str,
        status: Option<&str>,
    ) -> Result<String> {
        let label = persona.label(tag);
        let model: &dyn ChatModel = if persona.uses_core_model() {
            self.context.models.core.as_ref()
        } else {
            self.context.models.review.as_ref()
        };

        let request = render(
            persona.template(),
            self.language,
            &[
                ("title", self.title.as_str()),
                ("report", self.report),
                ("doc_content", self.doc),
                ("status", status.unwrap_or_default()),
                ("input", input),
            ],
        );
        let text = model
            .invoke(&request)
            .await
            .with_context(|| format!("Dialogue turn `{}` failed", label))?;
        tracing::debug!("💬 {} 发言完成", label);

        let utterance = Utterance {
            persona,
            label,
            text,
        };
        self.sink.emit(&utterance);
        self.transcript.push(utterance.render());
        Ok(utterance.text)
    }
}

#[cfg(test)]
mod tests;
