//! 测试用的模型、加载器与搜索后端

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::generator::context::{GeneratorContext, ModelSet};
use crate::generator::state::{AnalysisOptions, AnalysisState, LoadOutcome, StateUpdate};
use crate::llm::{ChatModel, PromptRequest};
use crate::loader::{DocumentLoader, LoadError, LoadedDocument, Metadata};
use crate::search::{SearchAggregator, SearchBackend, SearchHit};

type Responder = dyn Fn(&PromptRequest) -> Result<String> + Send + Sync;

/// 记录每次请求并按规则应答的模型
pub struct FakeModel {
    name: String,
    calls: Mutex<Vec<PromptRequest>>,
    responder: Box<Responder>,
    delay: Option<Duration>,
}

impl FakeModel {
    pub fn with<F>(name: &str, responder: F) -> Arc<Self>
    where
        F: Fn(&PromptRequest) -> Result<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            delay: None,
        })
    }

    /// 固定返回同一段文本
    pub fn replying(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::with("fake", move |_| Ok(text.clone()))
    }

    /// 每次调用都失败
    pub fn failing(message: &str) -> Arc<Self> {
        let message = message.to_string();
        Self::with("fake", move |_| Err(anyhow!(message.clone())))
    }

    /// 按调用顺序编号返回，例如 `turn-3`
    pub fn numbered() -> Arc<Self> {
        let counter = AtomicUsize::new(0);
        Self::with("fake", move |_| {
            Ok(format!("turn-{}", counter.fetch_add(1, Ordering::SeqCst) + 1))
        })
    }

    pub fn delayed(responder: impl Fn(&PromptRequest) -> Result<String> + Send + Sync + 'static, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: "fake".to_string(),
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            delay: Some(delay),
        })
    }

    pub fn calls(&self) -> Vec<PromptRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn invoke(&self, request: &PromptRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(request)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// 返回预设结果的加载器
pub struct FakeLoader {
    result: std::result::Result<LoadedDocument, String>,
    pub loads: AtomicUsize,
}

impl FakeLoader {
    pub fn document(text: &str, title: Option<&str>) -> Arc<Self> {
        let mut metadata = Metadata::new();
        if let Some(title) = title {
            metadata.insert("Title".to_string(), Value::from(title));
        }
        Arc::new(Self {
            result: Ok(LoadedDocument {
                text: text.to_string(),
                metadata,
                figures: vec![PathBuf::from("fig1.png")],
            }),
            loads: AtomicUsize::new(0),
        })
    }

    pub fn not_found() -> Arc<Self> {
        Arc::new(Self {
            result: Err("not found".to_string()),
            loads: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl DocumentLoader for FakeLoader {
    async fn load(&self, source: &str, _use_vision: bool) -> std::result::Result<LoadedDocument, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .map_err(|_| LoadError::NotFound(source.to_string()))
    }
}

/// 返回预设结果并记录查询的搜索后端
pub struct FakeBackend {
    name: &'static str,
    hits: Vec<SearchHit>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(name: &'static str, hits: Vec<SearchHit>) -> Arc<Self> {
        Arc::new(Self {
            name,
            hits,
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.hits.clone())
    }
}

pub fn hit(url: &str, content: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        content: content.to_string(),
    }
}

/// 所有角色共用一个模型、不带搜索后端的上下文
pub fn context_with(model: Arc<FakeModel>, loader: Arc<FakeLoader>) -> GeneratorContext {
    GeneratorContext::from_parts(ModelSet::uniform(model), SearchAggregator::default(), loader)
}

/// 已经完成加载的状态
pub fn loaded_state(text: &str, title: Option<&str>, options: AnalysisOptions) -> AnalysisState {
    let mut metadata = Metadata::new();
    if let Some(title) = title {
        metadata.insert("Title".to_string(), Value::from(title));
    }
    let mut state = AnalysisState::new("paper.pdf", options);
    state
        .apply(StateUpdate::Loaded(LoadOutcome {
            doc_content: text.to_string(),
            metadata,
            figures: Vec::new(),
            error: None,
        }))
        .unwrap();
    state
}
