//! 大模型接入层：角色解析、提示词模板与统一调用接口

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod client;
pub mod prompt;
pub mod resolver;

pub use client::LLMClient;
pub use prompt::{PromptRequest, PromptTemplate};
pub use resolver::{ConfigError, LLMProvider, ModelHandle, ModelResolver};

/// 模型角色，每个角色可以独立选择模型，未配置时使用核心模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Core,
    Translation,
    RelatedWork,
    Review,
    Vision,
}

impl ModelRole {
    /// 所有角色
    pub const ALL: [ModelRole; 5] = [
        ModelRole::Core,
        ModelRole::Translation,
        ModelRole::RelatedWork,
        ModelRole::Review,
        ModelRole::Vision,
    ];

    /// 可以单独覆盖配置的角色
    pub const OVERRIDABLE: [ModelRole; 4] = [
        ModelRole::Translation,
        ModelRole::RelatedWork,
        ModelRole::Review,
        ModelRole::Vision,
    ];

    /// 环境变量前缀，例如 `REVIEW_LLM_PROVIDER`
    pub fn env_prefix(&self) -> &'static str {
        match self {
            ModelRole::Core => "",
            ModelRole::Translation => "TRANSLATION",
            ModelRole::RelatedWork => "RELATED_WORK",
            ModelRole::Review => "REVIEW",
            ModelRole::Vision => "VLM",
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelRole::Core => write!(f, "core"),
            ModelRole::Translation => write!(f, "translation"),
            ModelRole::RelatedWork => write!(f, "related_work"),
            ModelRole::Review => write!(f, "review"),
            ModelRole::Vision => write!(f, "vision"),
        }
    }
}

/// 单轮对话模型，任务函数只依赖这个接口
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 发送一次请求并返回模型输出的文本
    async fn invoke(&self, request: &PromptRequest) -> Result<String>;

    /// 日志中展示的模型名称
    fn model_name(&self) -> &str {
        "unknown"
    }
}
