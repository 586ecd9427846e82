use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::i18n::TargetLanguage;
use crate::llm::ModelRole;

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 核心模型配置，也是各角色未单独配置时的兜底
    pub llm: LLMConfig,

    /// 各角色的独立模型配置
    pub roles: RoleOverrides,

    /// 联网搜索配置
    pub search: SearchConfig,

    /// 历史记录配置
    pub history: HistoryConfig,

    /// 分析流程默认选项
    pub analysis: AnalysisConfig,

    /// 批处理模式下报告输出路径
    pub output_path: PathBuf,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型，在解析阶段校验，`none` 表示未配置
    pub provider: String,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址，OpenAI兼容的自定义端点需要设置
    pub api_base_url: Option<String>,

    /// 模型名称
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,
}

/// 各角色的独立模型配置，缺省时回落到核心配置
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RoleOverrides {
    pub translation: Option<LLMConfig>,
    pub related_work: Option<LLMConfig>,
    pub review: Option<LLMConfig>,
    pub vision: Option<LLMConfig>,
}

/// 联网搜索配置，每个后端的key都是可选的
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub exa_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,

    /// 每个查询返回的结果数
    pub results_per_query: usize,

    /// 单次搜索超时时间（秒）
    pub timeout_seconds: u64,
}

/// 历史记录配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// 分析完成后是否自动保存
    pub enabled: bool,

    /// 历史数据目录
    pub data_dir: PathBuf,
}

/// 分析流程默认选项
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 全文翻译（否则为摘要翻译）
    pub is_full_translation: bool,

    /// 使用视觉模型解析PDF
    pub use_vlm_parsing: bool,

    /// 圆桌讨论模式（否则为读者-作者问答）
    pub enable_round_table: bool,

    /// 翻译与输出的目标语言
    pub target_language: TargetLanguage,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 用环境变量覆盖配置
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// 用给定的查找函数覆盖配置，便于测试时注入变量
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        apply_llm_env(&mut self.llm, "", &non_empty);

        for role in ModelRole::OVERRIDABLE {
            let prefix = format!("{}_", role.env_prefix());
            let Some(slot) = self.roles.slot_mut(role) else {
                continue;
            };
            let mut role_config = slot.clone().unwrap_or_else(LLMConfig::unset);
            apply_llm_env(&mut role_config, &prefix, &non_empty);
            if role_config.is_configured() || slot.is_some() {
                *slot = Some(role_config);
            }
        }

        if let Some(key) = non_empty("EXA_API_KEY") {
            self.search.exa_api_key = Some(key);
        }
        if let Some(key) = non_empty("TAVILY_API_KEY") {
            self.search.tavily_api_key = Some(key);
        }
        if let Some(key) = non_empty("SERPAPI_API_KEY") {
            self.search.serpapi_api_key = Some(key);
        }

        self
    }
}

fn apply_llm_env<F>(config: &mut LLMConfig, prefix: &str, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(provider) = lookup(&format!("{}LLM_PROVIDER", prefix)) {
        config.provider = provider;
    }
    if let Some(api_key) = lookup(&format!("{}LLM_API_KEY", prefix)) {
        config.api_key = api_key;
    }
    if let Some(base_url) = lookup(&format!("{}LLM_API_BASE_URL", prefix)) {
        config.api_base_url = Some(base_url);
    }
    if let Some(model) = lookup(&format!("{}LLM_MODEL", prefix)) {
        config.model = model;
    }
}

impl LLMConfig {
    /// 未配置的角色占位
    pub fn unset() -> Self {
        Self {
            provider: String::from("none"),
            api_key: String::new(),
            api_base_url: None,
            model: String::new(),
            max_tokens: LLMConfig::default().max_tokens,
        }
    }

    /// provider 缺失或显式为 none 时视为未配置
    pub fn is_configured(&self) -> bool {
        let provider = self.provider.trim();
        !provider.is_empty() && !provider.eq_ignore_ascii_case("none")
    }
}

impl RoleOverrides {
    /// 获取角色对应的配置
    pub fn get(&self, role: ModelRole) -> Option<&LLMConfig> {
        match role {
            ModelRole::Core => None,
            ModelRole::Translation => self.translation.as_ref(),
            ModelRole::RelatedWork => self.related_work.as_ref(),
            ModelRole::Review => self.review.as_ref(),
            ModelRole::Vision => self.vision.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: ModelRole) -> Option<&mut Option<LLMConfig>> {
        match role {
            ModelRole::Core => None,
            ModelRole::Translation => Some(&mut self.translation),
            ModelRole::RelatedWork => Some(&mut self.related_work),
            ModelRole::Review => Some(&mut self.review),
            ModelRole::Vision => Some(&mut self.vision),
        }
    }
}

impl SearchConfig {
    /// 已配置key的后端数量
    pub fn configured_backends(&self) -> usize {
        [
            &self.exa_api_key,
            &self.tavily_api_key,
            &self.serpapi_api_key,
        ]
        .iter()
        .filter(|key| key.as_deref().is_some_and(|k| !k.trim().is_empty()))
        .count()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            roles: RoleOverrides::default(),
            search: SearchConfig::default(),
            history: HistoryConfig::default(),
            analysis: AnalysisConfig::default(),
            output_path: PathBuf::from("paper_analysis_report.md"),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: String::from("openai"),
            api_key: String::new(),
            api_base_url: None,
            model: String::from("gpt-4o"),
            max_tokens: 16384,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exa_api_key: None,
            tavily_api_key: None,
            serpapi_api_key: None,
            results_per_query: 3,
            timeout_seconds: 30,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: PathBuf::from("history_data"),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            is_full_translation: false,
            use_vlm_parsing: false,
            enable_round_table: false,
            target_language: TargetLanguage::default(),
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
