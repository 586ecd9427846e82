//! 分析工作流
//!
//! `load_paper → {五个分析任务} → generate_report → review_dialogue`
//!
//! 驱动器在独立的 tokio 任务中运行，每完成一个节点就把增量更新推送给 [`WorkflowRun`]。
//! 五个分析任务并发执行，按完成顺序上报；报告节点要等五个任务全部上报后才会启动。
//!
//! 事件流是惰性的：首次轮询时才启动驱动器，事件通道只有一个槽位，
//! 每个阶段在拿到发送许可（即消费者取走上一个事件）之后才会派发。
//! 调用方停止轮询时驱动器随之暂停，丢弃事件流后不再派发新的节点。

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::generator::context::GeneratorContext;
use crate::generator::dialogue::{self, DialogueSink, NoopSink};
use crate::generator::state::{AnalysisField, AnalysisState, LoadOutcome, StateUpdate, TaskOutput};
use crate::generator::synthesize::synthesize_report;
use crate::generator::tasks::AnalysisTask;

/// 工作流节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeName {
    LoadPaper,
    Translate,
    ExtractKeyPoints,
    ExtractExperiments,
    ExplainTerms,
    RelatedWorkSearch,
    GenerateReport,
    ReviewDialogue,
}

impl NodeName {
    pub const ALL: [NodeName; 8] = [
        NodeName::LoadPaper,
        NodeName::Translate,
        NodeName::ExtractKeyPoints,
        NodeName::ExtractExperiments,
        NodeName::ExplainTerms,
        NodeName::RelatedWorkSearch,
        NodeName::GenerateReport,
        NodeName::ReviewDialogue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeName::LoadPaper => "load_paper",
            NodeName::Translate => "translate",
            NodeName::ExtractKeyPoints => "extract_key_points",
            NodeName::ExtractExperiments => "extract_experiments",
            NodeName::ExplainTerms => "explain_terms",
            NodeName::RelatedWorkSearch => "related_work_search",
            NodeName::GenerateReport => "generate_report",
            NodeName::ReviewDialogue => "review_dialogue",
        }
    }

    pub fn is_fan_out(&self) -> bool {
        AnalysisTask::ALL.iter().any(|task| NodeName::from(*task) == *self)
    }
}

impl From<AnalysisTask> for NodeName {
    fn from(task: AnalysisTask) -> Self {
        match task {
            AnalysisTask::Translate => NodeName::Translate,
            AnalysisTask::KeyPoints => NodeName::ExtractKeyPoints,
            AnalysisTask::Experiments => NodeName::ExtractExperiments,
            AnalysisTask::Terms => NodeName::ExplainTerms,
            AnalysisTask::RelatedWork => NodeName::RelatedWorkSearch,
        }
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一个节点完成后的事件
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvent {
    pub node: NodeName,
    pub update: StateUpdate,
    /// 自运行开始以来的耗时
    pub elapsed: Duration,
}

impl NodeEvent {
    pub fn is_degraded(&self) -> bool {
        self.update.is_degraded()
    }
}

/// 运行级别的失败，携带截至失败时已累积的状态
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("node `{node}` failed: {message}")]
    NodeFailed {
        node: NodeName,
        message: String,
        partial_state: Box<AnalysisState>,
    },
    #[error("workflow stopped before all nodes completed")]
    Interrupted { partial_state: Box<AnalysisState> },
}

impl WorkflowError {
    pub fn partial_state(&self) -> &AnalysisState {
        match self {
            WorkflowError::NodeFailed { partial_state, .. } => partial_state,
            WorkflowError::Interrupted { partial_state } => partial_state,
        }
    }
}

enum DriverMessage {
    Event(NodeEvent),
    Failed { node: NodeName, message: String },
}

type Permit<'a> = mpsc::Permit<'a, DriverMessage>;

enum Halt {
    /// 事件流已被丢弃
    Disconnected,
    Failed(NodeName, String),
}

/// 论文分析工作流
#[derive(Clone)]
pub struct Workflow {
    context: Arc<GeneratorContext>,
    sink: Arc<dyn DialogueSink>,
}

impl Workflow {
    pub fn new(context: GeneratorContext) -> Self {
        Self {
            context: Arc::new(context),
            sink: Arc::new(NoopSink),
        }
    }

    /// 对话评审的实时输出
    pub fn with_sink(mut self, sink: Arc<dyn DialogueSink>) -> Self {
        self.sink = sink;
        self
    }

    /// 创建一次运行，返回按完成顺序产出节点事件的流
    ///
    /// 首次轮询前不会执行任何节点。
    pub fn run(&self, initial: AnalysisState) -> WorkflowRun {
        let (tx, rx) = mpsc::channel(1);
        WorkflowRun {
            launch: Some(Launch {
                context: self.context.clone(),
                sink: self.sink.clone(),
                initial: initial.clone(),
                tx,
            }),
            rx,
            state: initial,
            finished: false,
        }
    }

    /// 运行到结束，返回最终状态
    pub async fn run_to_completion(
        &self,
        initial: AnalysisState,
    ) -> Result<AnalysisState, WorkflowError> {
        let mut run = self.run(initial);
        while let Some(item) = run.next().await {
            item?;
        }
        Ok(run.into_state())
    }

    /// 在已有的分析结果上单独发起一次对话评审
    pub async fn discuss(
        &self,
        state: &AnalysisState,
        enable_round_table: bool,
    ) -> anyhow::Result<AnalysisState> {
        dialogue::discuss(&self.context, state, enable_round_table, self.sink.as_ref()).await
    }
}

/// 一次运行的事件流
///
/// 每个事件在产出前已合并进 [`WorkflowRun::state`]。运行失败时产出一个
/// [`WorkflowError`] 后结束。
pub struct WorkflowRun {
    launch: Option<Launch>,
    rx: mpsc::Receiver<DriverMessage>,
    state: AnalysisState,
    finished: bool,
}

/// 尚未启动的驱动器
struct Launch {
    context: Arc<GeneratorContext>,
    sink: Arc<dyn DialogueSink>,
    initial: AnalysisState,
    tx: mpsc::Sender<DriverMessage>,
}

impl WorkflowRun {
    /// 截至目前累积的状态
    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn into_state(self) -> AnalysisState {
        self.state
    }

    fn fail(&mut self, node: NodeName, message: String) -> WorkflowError {
        self.finished = true;
        WorkflowError::NodeFailed {
            node,
            message,
            partial_state: Box::new(self.state.clone()),
        }
    }
}

impl Stream for WorkflowRun {
    type Item = Result<NodeEvent, WorkflowError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        if let Some(launch) = this.launch.take() {
            tokio::spawn(drive(launch.context, launch.sink, launch.initial, launch.tx));
        }

        match this.rx.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(DriverMessage::Event(event))) => {
                if let Err(e) = this.state.apply(event.update.clone()) {
                    return Poll::Ready(Some(Err(this.fail(event.node, e.to_string()))));
                }
                if event.node == NodeName::ReviewDialogue {
                    this.finished = true;
                }
                Poll::Ready(Some(Ok(event)))
            }
            Poll::Ready(Some(DriverMessage::Failed { node, message })) => {
                Poll::Ready(Some(Err(this.fail(node, message))))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(Some(Err(WorkflowError::Interrupted {
                    partial_state: Box::new(this.state.clone()),
                })))
            }
        }
    }
}

async fn drive(
    context: Arc<GeneratorContext>,
    sink: Arc<dyn DialogueSink>,
    mut state: AnalysisState,
    tx: mpsc::Sender<DriverMessage>,
) {
    let started = Instant::now();
    tracing::info!("🚀 开始分析: {}", state.source());

    match execute(&context, sink.as_ref(), &mut state, &tx, started).await {
        Ok(()) => tracing::info!(
            "🎉 分析完成，总耗时 {:.2}s",
            started.elapsed().as_secs_f64()
        ),
        Err(Halt::Disconnected) => tracing::info!("⏹️ 事件流已关闭，停止派发后续节点"),
        Err(Halt::Failed(node, message)) => {
            tracing::error!("❌ 节点 {} 失败: {}", node, message);
            let _ = tx.send(DriverMessage::Failed { node, message }).await;
        }
    }
}

async fn execute(
    context: &GeneratorContext,
    sink: &dyn DialogueSink,
    state: &mut AnalysisState,
    tx: &mpsc::Sender<DriverMessage>,
    started: Instant,
) -> Result<(), Halt> {
    let permit = demand(tx).await?;
    let options = state.options().clone();
    let outcome = match context
        .loader
        .load(state.source(), options.use_vlm_parsing)
        .await
    {
        Ok(document) => {
            tracing::info!("📄 论文加载完成，正文 {} 字符", document.text.chars().count());
            LoadOutcome {
                doc_content: document.text,
                metadata: document.metadata,
                figures: document.figures,
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!("⚠️ 论文加载失败，后续任务将以空内容继续: {}", e);
            LoadOutcome {
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    };
    emit(permit, state, NodeName::LoadPaper, StateUpdate::Loaded(outcome), started)?;

    let mut permit = Some(demand(tx).await?);
    let loaded = state.clone();
    let mut pending = AnalysisTask::ALL
        .iter()
        .map(|task| {
            let task = *task;
            let loaded = &loaded;
            async move { (task, task.run(context, loaded).await) }
        })
        .collect::<FuturesUnordered<_>>();

    // 已完成但还没有发送许可的任务结果，其余任务继续并发执行
    let mut completed = VecDeque::new();
    let mut remaining = pending.len();
    while remaining > 0 {
        if permit.is_some() && !completed.is_empty() {
            if let (Some(slot), Some((task, output))) = (permit.take(), completed.pop_front()) {
                remaining -= 1;
                report_task(task, &output, remaining);
                let update = StateUpdate::Task {
                    field: task.field(),
                    output,
                };
                emit(slot, state, NodeName::from(task), update, started)?;
                continue;
            }
        }

        tokio::select! {
            Some(done) = pending.next(), if !pending.is_empty() => completed.push_back(done),
            reserved = tx.reserve(), if permit.is_none() && !completed.is_empty() => {
                permit = Some(reserved.map_err(|_| Halt::Disconnected)?);
            }
            _ = tx.closed() => return Err(Halt::Disconnected),
        }

        if pending.is_empty() && completed.is_empty() {
            break;
        }
    }
    if remaining > 0 {
        return Err(Halt::Failed(
            NodeName::GenerateReport,
            format!("{} analysis tasks never reported", remaining),
        ));
    }

    let permit = demand(tx).await?;
    let report = synthesize_report(context, state)
        .await
        .map_err(|e| Halt::Failed(NodeName::GenerateReport, format!("{:#}", e)))?;
    let update = StateUpdate::Task {
        field: AnalysisField::FinalReport,
        output: report,
    };
    emit(permit, state, NodeName::GenerateReport, update, started)?;

    let permit = demand(tx).await?;
    let transcript = dialogue::run_dialogue(context, state, sink)
        .await
        .map_err(|e| Halt::Failed(NodeName::ReviewDialogue, format!("{:#}", e)))?;
    let update = StateUpdate::Task {
        field: AnalysisField::ReviewDialogue,
        output: transcript,
    };
    emit(permit, state, NodeName::ReviewDialogue, update, started)
}

fn report_task(task: AnalysisTask, output: &TaskOutput, remaining: usize) {
    let node = NodeName::from(task);
    if output.is_degraded() {
        tracing::warn!("⚠️ {} 已降级: {}", node, output.text());
    } else {
        tracing::info!("✅ {} 完成，剩余 {} 个任务", node, remaining);
    }
}

/// 等待消费者腾出事件槽位，事件流被丢弃时停止
async fn demand(tx: &mpsc::Sender<DriverMessage>) -> Result<Permit<'_>, Halt> {
    tx.reserve().await.map_err(|_| Halt::Disconnected)
}

/// 合并到驱动器自己的状态后推送给消费者
fn emit(
    permit: Permit<'_>,
    state: &mut AnalysisState,
    node: NodeName,
    update: StateUpdate,
    started: Instant,
) -> Result<(), Halt> {
    state
        .apply(update.clone())
        .map_err(|e| Halt::Failed(node, e.to_string()))?;
    permit.send(DriverMessage::Event(NodeEvent {
        node,
        update,
        elapsed: started.elapsed(),
    }));
    Ok(())
}
