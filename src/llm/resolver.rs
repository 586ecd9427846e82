//! 模型解析：把角色映射到具体的 provider、模型与凭证

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, LLMConfig, RoleOverrides};
use crate::llm::ModelRole;

/// LLM Provider类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    OpenAI,
    /// OpenAI兼容的自定义端点，必须设置基地址
    #[serde(rename = "openai-compatible")]
    OpenAICompatible,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::OpenAICompatible => write!(f, "openai-compatible"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Moonshot => write!(f, "moonshot"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "openai-compatible" | "openai_compatible" | "custom" => {
                Ok(LLMProvider::OpenAICompatible)
            }
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" | "claude" => Ok(LLMProvider::Anthropic),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "moonshot" | "kimi" => Ok(LLMProvider::Moonshot),
            "mistral" => Ok(LLMProvider::Mistral),
            "gemini" | "google" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl LLMProvider {
    /// 是否需要API KEY
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

/// 模型配置错误，在解析阶段报告，而不是推迟到调用时
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no model provider configured for role `{role}`")]
    NotConfigured { role: ModelRole },

    #[error("unsupported model provider `{provider}` for role `{role}`")]
    UnsupportedProvider { role: ModelRole, provider: String },

    #[error("missing API key for provider `{provider}` (role `{role}`)")]
    MissingApiKey {
        role: ModelRole,
        provider: LLMProvider,
    },

    #[error("missing model name for role `{role}`")]
    MissingModel { role: ModelRole },

    #[error("provider `{provider}` requires a base URL (role `{role}`)")]
    MissingBaseUrl {
        role: ModelRole,
        provider: LLMProvider,
    },
}

/// 解析完成的模型句柄
///
/// 句柄不记录角色本身，回落到核心配置的角色与核心角色得到完全相同的句柄。
#[derive(Clone, PartialEq)]
pub struct ModelHandle {
    pub provider: LLMProvider,
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl ModelHandle {
    /// 所有角色使用固定的采样温度
    pub const TEMPERATURE: f64 = 0.0;
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// 模型解析器
#[derive(Debug, Clone)]
pub struct ModelResolver {
    core: LLMConfig,
    overrides: RoleOverrides,
}

impl ModelResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            core: config.llm.clone(),
            overrides: config.roles.clone(),
        }
    }

    /// 解析角色对应的模型句柄
    pub fn resolve(&self, role: ModelRole) -> Result<ModelHandle, ConfigError> {
        let config = self.effective_config(role);
        if !config.is_configured() {
            return Err(ConfigError::NotConfigured { role });
        }

        let provider: LLMProvider =
            config
                .provider
                .parse()
                .map_err(|_| ConfigError::UnsupportedProvider {
                    role,
                    provider: config.provider.clone(),
                })?;

        if provider.requires_api_key() && config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey { role, provider });
        }
        if config.model.trim().is_empty() {
            return Err(ConfigError::MissingModel { role });
        }

        let base_url = config
            .api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        if provider == LLMProvider::OpenAICompatible && base_url.is_none() {
            return Err(ConfigError::MissingBaseUrl { role, provider });
        }

        Ok(ModelHandle {
            provider,
            model: config.model.trim().to_string(),
            api_key: config.api_key.trim().to_string(),
            base_url,
            max_tokens: config.max_tokens,
            temperature: ModelHandle::TEMPERATURE,
        })
    }

    /// 角色未配置（缺失或为 none）时回落到核心配置
    fn effective_config(&self, role: ModelRole) -> &LLMConfig {
        match self.overrides.get(role) {
            Some(config) if config.is_configured() => config,
            _ => &self.core,
        }
    }
}
