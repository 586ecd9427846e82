//! 贯穿整个工作流的分析状态

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

use crate::i18n::TargetLanguage;
use crate::loader::Metadata;

/// 状态中由节点写入的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisField {
    DocContent,
    Metadata,
    Figures,
    Translation,
    KeyPoints,
    Experiments,
    Terms,
    RelatedWorkSearch,
    FinalReport,
    ReviewDialogue,
}

impl AnalysisField {
    /// 汇总报告依赖的五个分析字段
    pub const TASK_FIELDS: [AnalysisField; 5] = [
        AnalysisField::Translation,
        AnalysisField::KeyPoints,
        AnalysisField::Experiments,
        AnalysisField::Terms,
        AnalysisField::RelatedWorkSearch,
    ];
}

impl std::fmt::Display for AnalysisField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnalysisField::DocContent => "doc_content",
            AnalysisField::Metadata => "metadata",
            AnalysisField::Figures => "figures",
            AnalysisField::Translation => "translation",
            AnalysisField::KeyPoints => "key_points",
            AnalysisField::Experiments => "experiments",
            AnalysisField::Terms => "terms",
            AnalysisField::RelatedWorkSearch => "related_work_search",
            AnalysisField::FinalReport => "final_report",
            AnalysisField::ReviewDialogue => "review_dialogue",
        };
        write!(f, "{}", name)
    }
}

/// 降级原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// 没有可分析的正文
    NoContent,
    /// 没有可用于搜索的标题
    NoTitle,
    /// 没有配置任何搜索后端
    SearchNotConfigured,
    /// 搜索执行了但没有结果
    NoSearchResults,
    /// 模型或解析失败
    TaskFailed,
    /// 没有可评审的报告
    NoReport,
}

/// 单个任务的输出，区分真实内容与降级占位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    Content(String),
    Degraded { reason: DegradeReason, text: String },
}

impl TaskOutput {
    pub fn degraded(reason: DegradeReason, text: impl Into<String>) -> Self {
        TaskOutput::Degraded {
            reason,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TaskOutput::Content(text) => text,
            TaskOutput::Degraded { text, .. } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TaskOutput::Degraded { .. })
    }

    pub fn degrade_reason(&self) -> Option<DegradeReason> {
        match self {
            TaskOutput::Content(_) => None,
            TaskOutput::Degraded { reason, .. } => Some(*reason),
        }
    }
}

/// 调用方提供的分析选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub is_full_translation: bool,
    pub use_vlm_parsing: bool,
    pub enable_round_table: bool,
    pub target_language: TargetLanguage,
}

/// 加载节点的输出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub doc_content: String,
    pub metadata: Metadata,
    pub figures: Vec<PathBuf>,
    /// 加载失败时的错误信息，此时其余字段为空
    pub error: Option<String>,
}

/// 单个节点对状态的增量更新
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Loaded(LoadOutcome),
    Task {
        field: AnalysisField,
        output: TaskOutput,
    },
}

impl StateUpdate {
    /// 本次更新会写入的字段
    pub fn fields(&self) -> Vec<AnalysisField> {
        match self {
            StateUpdate::Loaded(_) => vec![
                AnalysisField::DocContent,
                AnalysisField::Metadata,
                AnalysisField::Figures,
            ],
            StateUpdate::Task { field, .. } => vec![*field],
        }
    }

    /// 是否为降级结果
    pub fn is_degraded(&self) -> bool {
        match self {
            StateUpdate::Loaded(outcome) => outcome.error.is_some(),
            StateUpdate::Task { output, .. } => output.is_degraded(),
        }
    }

    /// 用于展示的简短文本
    pub fn preview(&self, max_chars: usize) -> String {
        let text = match self {
            StateUpdate::Loaded(outcome) => match &outcome.error {
                Some(error) => error.as_str(),
                None => outcome.doc_content.as_str(),
            },
            StateUpdate::Task { output, .. } => output.text(),
        };
        let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
        crate::utils::text::truncate_chars(&flattened, max_chars).to_string()
    }
}

/// 状态写入错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("field `{0}` has already been written in this run")]
    AlreadyWritten(AnalysisField),

    #[error("field `{0}` cannot be written by a task update")]
    NotATaskField(AnalysisField),
}

/// 分析状态
///
/// `source` 在创建时设置且不可修改，其余字段每次运行只能写入一次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    source: String,
    #[serde(default)]
    options: AnalysisOptions,
    #[serde(default)]
    doc_content: Option<String>,
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    figures: Option<Vec<PathBuf>>,
    #[serde(default)]
    translation: Option<String>,
    #[serde(default)]
    key_points: Option<String>,
    #[serde(default)]
    experiments: Option<String>,
    #[serde(default)]
    terms: Option<String>,
    #[serde(default)]
    related_work_search: Option<String>,
    #[serde(default)]
    final_report: Option<String>,
    #[serde(default)]
    review_dialogue: Option<String>,
    #[serde(default)]
    load_error: Option<String>,
    #[serde(default)]
    degraded: BTreeSet<AnalysisField>,
}

impl AnalysisState {
    pub fn new(source: impl Into<String>, options: AnalysisOptions) -> Self {
        Self {
            source: source.into(),
            options,
            doc_content: None,
            metadata: None,
            figures: None,
            translation: None,
            key_points: None,
            experiments: None,
            terms: None,
            related_work_search: None,
            final_report: None,
            review_dialogue: None,
            load_error: None,
            degraded: BTreeSet::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// 正文，未加载或加载失败时为空串
    pub fn doc_content(&self) -> &str {
        self.doc_content.as_deref().unwrap_or_default()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn figures(&self) -> &[PathBuf] {
        self.figures.as_deref().unwrap_or_default()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// 读取文本字段
    pub fn text(&self, field: AnalysisField) -> Option<&str> {
        match field {
            AnalysisField::DocContent => self.doc_content.as_deref(),
            AnalysisField::Translation => self.translation.as_deref(),
            AnalysisField::KeyPoints => self.key_points.as_deref(),
            AnalysisField::Experiments => self.experiments.as_deref(),
            AnalysisField::Terms => self.terms.as_deref(),
            AnalysisField::RelatedWorkSearch => self.related_work_search.as_deref(),
            AnalysisField::FinalReport => self.final_report.as_deref(),
            AnalysisField::ReviewDialogue => self.review_dialogue.as_deref(),
            AnalysisField::Metadata | AnalysisField::Figures => None,
        }
    }

    pub fn final_report(&self) -> Option<&str> {
        self.final_report.as_deref()
    }

    pub fn review_dialogue(&self) -> Option<&str> {
        self.review_dialogue.as_deref()
    }

    pub fn is_written(&self, field: AnalysisField) -> bool {
        match field {
            AnalysisField::Metadata => self.metadata.is_some(),
            AnalysisField::Figures => self.figures.is_some(),
            other => self.text(other).is_some(),
        }
    }

    pub fn is_degraded(&self, field: AnalysisField) -> bool {
        self.degraded.contains(&field)
    }

    /// 元数据中的标题（`Title` 或 `title`）
    pub fn title(&self) -> Option<String> {
        let metadata = self.metadata.as_ref()?;
        ["Title", "title"]
            .iter()
            .filter_map(|key| metadata.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
    }

    /// 合并一个节点的输出，已经写入的字段不能再次写入
    pub fn apply(&mut self, update: StateUpdate) -> Result<(), StateError> {
        if let Some(field) = update.fields().into_iter().find(|f| self.is_written(*f)) {
            return Err(StateError::AlreadyWritten(field));
        }

        match update {
            StateUpdate::Loaded(outcome) => {
                if outcome.error.is_some() {
                    self.degraded.insert(AnalysisField::DocContent);
                }
                self.doc_content = Some(outcome.doc_content);
                self.metadata = Some(outcome.metadata);
                self.figures = Some(outcome.figures);
                self.load_error = outcome.error;
            }
            StateUpdate::Task { field, output } => {
                let degraded = output.is_degraded();
                let text = match output {
                    TaskOutput::Content(text) => text,
                    TaskOutput::Degraded { text, .. } => text,
                };
                let slot = self.task_slot(field)?;
                *slot = Some(text);
                if degraded {
                    self.degraded.insert(field);
                }
            }
        }
        Ok(())
    }

    fn task_slot(&mut self, field: AnalysisField) -> Result<&mut Option<String>, StateError> {
        match field {
            AnalysisField::Translation => Ok(&mut self.translation),
            AnalysisField::KeyPoints => Ok(&mut self.key_points),
            AnalysisField::Experiments => Ok(&mut self.experiments),
            AnalysisField::Terms => Ok(&mut self.terms),
            AnalysisField::RelatedWorkSearch => Ok(&mut self.related_work_search),
            AnalysisField::FinalReport => Ok(&mut self.final_report),
            AnalysisField::ReviewDialogue => Ok(&mut self.review_dialogue),
            other => Err(StateError::NotATaskField(other)),
        }
    }

    /// 基于已保存的状态开启一次新的对话评审，清空旧的对话记录
    pub fn reseed_for_dialogue(&self, enable_round_table: bool) -> AnalysisState {
        let mut state = self.clone();
        state.review_dialogue = None;
        state.degraded.remove(&AnalysisField::ReviewDialogue);
        state.options.enable_round_table = enable_round_table;
        state
    }

    /// 历史存储把插图复制到持久目录后，替换插图路径
    pub(crate) fn relocate_figures(&mut self, figures: Vec<PathBuf>) {
        self.figures = Some(figures);
    }
}
