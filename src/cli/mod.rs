use crate::config::Config;
use crate::generator::state::AnalysisOptions;
use crate::history::ExportFormat;
use crate::i18n::TargetLanguage;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod commands;

/// 未指定 `--config` 时尝试读取的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "paper-insight.toml";

/// Paper Insight - 由Rust与大模型驱动的论文深度研读引擎
#[derive(Parser, Debug)]
#[command(name = "paper-insight")]
#[command(
    about = "LLM-driven academic paper analysis: translation, key points, experiments, terminology, related-work search, a synthesized deep-reading report and a simulated review dialogue."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// LLM Provider (openai, openai-compatible, openrouter, anthropic, deepseek, moonshot, mistral, gemini, ollama)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// 核心模型名称
    #[arg(long, global = true)]
    pub llm_model: Option<String>,

    /// LLM API KEY
    #[arg(long, global = true)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long, global = true)]
    pub llm_api_base_url: Option<String>,

    /// 最大tokens数
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// 历史数据目录
    #[arg(long, global = true)]
    pub history_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 分析一篇论文（Arxiv 链接或本地 PDF）
    Analyze(AnalyzeArgs),

    /// 对已保存的分析重新发起对话评审
    Discuss {
        /// 历史记录 id
        id: String,

        /// 使用读者-作者问答模式，而不是圆桌讨论
        #[arg(long)]
        simple: bool,
    },

    /// 针对已保存的论文提问
    Ask {
        /// 历史记录 id
        id: String,

        /// 问题
        question: String,
    },

    /// 管理分析历史
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Arxiv 链接或本地 PDF 路径
    pub source: String,

    /// 全文翻译（默认只翻译摘要等核心内容）
    #[arg(long)]
    pub full_translation: bool,

    /// 使用视觉模型解析 PDF
    #[arg(long)]
    pub vlm: bool,

    /// 开启圆桌讨论模式的对话评审
    #[arg(long)]
    pub round_table: bool,

    /// 交互模式：每完成一个节点立即输出
    #[arg(long)]
    pub stream: bool,

    /// 报告输出路径
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 不保存到分析历史
    #[arg(long)]
    pub no_history: bool,

    /// 目标语言 (zh, en, ja, ko, de, fr, ru)
    #[arg(long)]
    pub target_language: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// 按时间倒序列出记录
    List,

    /// 查看一条记录
    Show { id: String },

    /// 按标题或来源搜索
    Search { query: String },

    /// 删除一条记录
    Delete { id: String },

    /// 导出一条记录
    Export {
        id: String,

        /// 导出格式 (md, json)
        #[arg(long, default_value = "md")]
        format: ExportFormat,
    },
}

impl Args {
    /// 将CLI参数转换为配置：配置文件 < 环境变量 < 命令行参数
    pub fn into_config(&self) -> Result<Config> {
        let base = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => {
                let default_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);
                load_if_present(&default_path)?
            }
        };
        Ok(self.apply_to(base.with_env_overrides()))
    }

    /// 用命令行参数覆盖配置
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(provider) = &self.llm_provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.llm_model {
            config.llm.model = model.clone();
        }
        if let Some(api_key) = &self.llm_api_key {
            config.llm.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = Some(base_url.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(dir) = &self.history_dir {
            config.history.data_dir = dir.clone();
        }
        if self.verbose {
            config.verbose = true;
        }

        if let Command::Analyze(analyze) = &self.command {
            if let Some(output) = &analyze.output {
                config.output_path = output.clone();
            }
            if analyze.no_history {
                config.history.enabled = false;
            }
            config.analysis.is_full_translation |= analyze.full_translation;
            config.analysis.use_vlm_parsing |= analyze.vlm;
            config.analysis.enable_round_table |= analyze.round_table;

            if let Some(language) = &analyze.target_language {
                match language.parse::<TargetLanguage>() {
                    Ok(language) => config.analysis.target_language = language,
                    Err(_) => tracing::warn!(
                        "⚠️ 警告: 未知的目标语言: {}，使用 {}",
                        language,
                        config.analysis.target_language.display_name()
                    ),
                }
            }
        }

        config
    }
}

/// 由配置得到本次分析的选项
pub fn analysis_options(config: &Config) -> AnalysisOptions {
    AnalysisOptions {
        is_full_translation: config.analysis.is_full_translation,
        use_vlm_parsing: config.analysis.use_vlm_parsing,
        enable_round_table: config.analysis.enable_round_table,
        target_language: config.analysis.target_language,
    }
}

fn load_if_present(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::from_file(path)
            .with_context(|| format!("Failed to load default config {:?}", path))
    } else {
        Ok(Config::default())
    }
}

// Include tests
#[cfg(test)]
mod tests;
