use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::llm::{ChatModel, LLMClient, ModelResolver, ModelRole};
use crate::loader::{DocumentLoader, PaperLoader};
use crate::search::SearchAggregator;

/// 各角色解析后的模型
#[derive(Clone)]
pub struct ModelSet {
    pub core: Arc<dyn ChatModel>,
    pub translation: Arc<dyn ChatModel>,
    pub related_work: Arc<dyn ChatModel>,
    pub review: Arc<dyn ChatModel>,
}

impl ModelSet {
    /// 解析所有用到的角色，配置错误在这里一次性暴露
    pub fn from_resolver(resolver: &ModelResolver) -> Result<Self> {
        let build = |role: ModelRole| -> Result<Arc<dyn ChatModel>> {
            let handle = resolver.resolve(role)?;
            tracing::debug!("模型角色 {} -> {} / {}", role, handle.provider, handle.model);
            Ok(Arc::new(LLMClient::new(handle)?))
        };

        // 视觉模型只有自定义加载器会用到，这里仅校验配置
        let vision = resolver.resolve(ModelRole::Vision)?;
        tracing::debug!("模型角色 {} -> {} / {}", ModelRole::Vision, vision.provider, vision.model);

        Ok(Self {
            core: build(ModelRole::Core)?,
            translation: build(ModelRole::Translation)?,
            related_work: build(ModelRole::RelatedWork)?,
            review: build(ModelRole::Review)?,
        })
    }

    /// 所有角色共用同一个模型
    pub fn uniform(model: Arc<dyn ChatModel>) -> Self {
        Self {
            core: model.clone(),
            translation: model.clone(),
            related_work: model.clone(),
            review: model,
        }
    }
}

/// 工作流运行所需的外部协作者
#[derive(Clone)]
pub struct GeneratorContext {
    /// 各角色的模型
    pub models: ModelSet,
    /// 联网搜索
    pub search: SearchAggregator,
    /// 论文加载器
    pub loader: Arc<dyn DocumentLoader>,
}

impl GeneratorContext {
    /// 根据配置创建上下文
    pub fn new(config: &Config) -> Result<Self> {
        let resolver = ModelResolver::new(config);
        Ok(Self {
            models: ModelSet::from_resolver(&resolver)?,
            search: SearchAggregator::from_config(&config.search),
            loader: Arc::new(PaperLoader::default()),
        })
    }

    pub fn from_parts(
        models: ModelSet,
        search: SearchAggregator,
        loader: Arc<dyn DocumentLoader>,
    ) -> Self {
        Self {
            models,
            search,
            loader,
        }
    }
}
