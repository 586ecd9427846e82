//! LLM客户端 - 基于rig的统一调用实现

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::llm::{ChatModel, PromptRequest, resolver::ModelHandle};

mod providers;

use providers::ProviderClient;

/// LLM客户端，一个实例对应一个解析好的模型句柄
#[derive(Clone)]
pub struct LLMClient {
    handle: ModelHandle,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(handle: ModelHandle) -> Result<Self> {
        let client = ProviderClient::new(&handle)
            .with_context(|| format!("Failed to create {} client", handle.provider))?;
        Ok(Self { handle, client })
    }
}

#[async_trait]
impl ChatModel for LLMClient {
    async fn invoke(&self, request: &PromptRequest) -> Result<String> {
        tracing::debug!(
            provider = %self.handle.provider,
            model = %self.handle.model,
            prompt_chars = request.system.chars().count() + request.user.chars().count(),
            "invoking model"
        );

        let agent = self.client.create_agent(&self.handle, &request.system)?;
        agent.prompt(&request.user).await.with_context(|| {
            format!(
                "Model call failed ({} / {})",
                self.handle.provider, self.handle.model
            )
        })
    }

    fn model_name(&self) -> &str {
        &self.handle.model
    }
}
