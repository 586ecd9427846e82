//! 子命令的执行

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use futures::StreamExt;

use crate::cli::{Args, Command, HistoryAction, analysis_options};
use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::generator::dialogue::{DialogueSink, NoopSink, Utterance};
use crate::generator::qa;
use crate::generator::state::AnalysisState;
use crate::generator::workflow::{NodeEvent, Workflow, WorkflowError};
use crate::history::{FileHistoryStore, HistoryRecord, HistoryStore, HistorySummary};

/// 事件预览的最大字符数
const PREVIEW_CHARS: usize = 120;

/// 把对话评审实时打印到终端
pub struct ConsoleSink;

impl DialogueSink for ConsoleSink {
    fn phase(&self, header: &str) {
        println!("\n{}\n", header);
    }

    fn emit(&self, utterance: &Utterance) {
        println!("{}\n\n---", utterance.render());
    }
}

/// 执行命令行指定的子命令
pub async fn execute(args: Args) -> Result<()> {
    let config = args.into_config()?;
    let store = FileHistoryStore::new(&config.history.data_dir);

    match args.command {
        Command::Analyze(analyze) => {
            analyze_paper(&config, &store, &analyze.source, analyze.stream).await
        }
        Command::Discuss { id, simple } => discuss(&config, &store, &id, !simple).await,
        Command::Ask { id, question } => {
            let record = require_record(&store, &id).await?;
            let context = GeneratorContext::new(&config)?;
            let answer = qa::ask(&context, &record.state, &question).await?;
            println!("{}", answer);
            Ok(())
        }
        Command::History { action } => manage_history(&store, action).await,
    }
}

async fn analyze_paper(
    config: &Config,
    store: &FileHistoryStore,
    source: &str,
    stream: bool,
) -> Result<()> {
    let context = GeneratorContext::new(config)?;
    let sink: Arc<dyn DialogueSink> = if stream {
        Arc::new(ConsoleSink)
    } else {
        Arc::new(NoopSink)
    };
    let workflow = Workflow::new(context).with_sink(sink);
    let initial = AnalysisState::new(source, analysis_options(config));

    let result = if stream {
        stream_events(&workflow, initial).await
    } else {
        workflow.run_to_completion(initial).await
    };

    let state = match result {
        Ok(state) => state,
        Err(e) => {
            // 失败时仍保留已完成的部分结果
            if config.history.enabled {
                let summary = store.save(e.partial_state()).await?;
                println!("⚠️ 部分结果已保存到历史记录: {}", summary.id);
            }
            return Err(e.into());
        }
    };

    let report = state.final_report().unwrap_or_default();
    tokio::fs::write(&config.output_path, report)
        .await
        .with_context(|| format!("Failed to write report to {:?}", config.output_path))?;
    println!("✅ 报告已保存到 {}", config.output_path.display());

    if config.history.enabled {
        let summary = store.save(&state).await?;
        println!("💾 历史记录 id: {}", summary.id);
    }
    Ok(())
}

/// 交互模式：每个节点完成后立即打印
async fn stream_events(
    workflow: &Workflow,
    initial: AnalysisState,
) -> Result<AnalysisState, WorkflowError> {
    let mut run = workflow.run(initial);
    while let Some(item) = run.next().await {
        print_event(&item?);
    }
    Ok(run.into_state())
}

fn print_event(event: &NodeEvent) {
    let marker = if event.is_degraded() { "⚠️" } else { "✅" };
    println!(
        "[{:>7.2}s] {} {}",
        event.elapsed.as_secs_f64(),
        marker,
        event.node
    );
    let preview = event.update.preview(PREVIEW_CHARS);
    if !preview.is_empty() {
        println!("           {}", preview);
    }
}

async fn discuss(
    config: &Config,
    store: &FileHistoryStore,
    id: &str,
    enable_round_table: bool,
) -> Result<()> {
    let record = require_record(store, id).await?;
    let context = GeneratorContext::new(config)?;
    let workflow = Workflow::new(context).with_sink(Arc::new(ConsoleSink));

    let updated = workflow.discuss(&record.state, enable_round_table).await?;
    let summary = store.save(&updated).await?;
    println!("💾 新的历史记录 id: {}", summary.id);
    Ok(())
}

async fn manage_history(store: &FileHistoryStore, action: HistoryAction) -> Result<()> {
    match action {
        HistoryAction::List => print_summaries(&store.list().await?),
        HistoryAction::Search { query } => print_summaries(&store.search(&query).await?),
        HistoryAction::Show { id } => {
            let record = require_record(store, &id).await?;
            println!("{}", record.to_markdown());
        }
        HistoryAction::Delete { id } => {
            if store.delete(&id).await? {
                println!("🗑️ 已删除 {}", id);
            } else {
                println!("未找到记录 {}", id);
            }
        }
        HistoryAction::Export { id, format } => {
            let path = store.export(&id, format).await?;
            println!("📦 已导出到 {}", path.display());
        }
    }
    Ok(())
}

fn print_summaries(summaries: &[HistorySummary]) {
    if summaries.is_empty() {
        println!("暂无历史记录");
        return;
    }
    for summary in summaries {
        println!(
            "{}  {}  [{}] {}",
            summary.id,
            summary.created_at.format("%Y-%m-%d %H:%M"),
            summary.source_type,
            summary.title
        );
    }
}

async fn require_record(store: &FileHistoryStore, id: &str) -> Result<HistoryRecord> {
    match store.get(id).await? {
        Some(record) => Ok(record),
        None => bail!("History record not found: {}", id),
    }
}
