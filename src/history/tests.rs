use std::path::PathBuf;

use serde_json::Value;
use tempfile::TempDir;

use super::*;
use crate::generator::state::{AnalysisOptions, LoadOutcome, StateUpdate, TaskOutput};
use crate::loader::Metadata;

fn finished_state(source: &str, title: Option<&str>, figures: Vec<PathBuf>) -> AnalysisState {
    let mut metadata = Metadata::new();
    if let Some(title) = title {
        metadata.insert("Title".to_string(), Value::from(title));
    }
    let mut state = AnalysisState::new(source, AnalysisOptions::default());
    state
        .apply(StateUpdate::Loaded(LoadOutcome {
            doc_content: "body".to_string(),
            metadata,
            figures,
            error: None,
        }))
        .unwrap();
    for (field, text) in [
        (AnalysisField::Translation, "译文"),
        (AnalysisField::FinalReport, "# 报告正文"),
        (AnalysisField::ReviewDialogue, "**👤 Reader (Q1):**\n问题"),
    ] {
        state
            .apply(StateUpdate::Task {
                field,
                output: TaskOutput::Content(text.to_string()),
            })
            .unwrap();
    }
    state
}

#[tokio::test]
async fn test_save_and_get_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = FileHistoryStore::new(dir.path());
    let state = finished_state("/tmp/papers/resnet.pdf", Some("Deep Residual Learning"), Vec::new());

    let summary = store.save(&state).await.unwrap();

    assert_eq!(summary.title, "Deep Residual Learning");
    assert_eq!(summary.source_type, "PDF");
    assert_eq!(summary.source_name, "resnet.pdf");
    assert_eq!(summary.summary, "# 报告正文...");
    assert!(dir.path().join("records").join(format!("{}.json", summary.id)).exists());

    let record = store.get(&summary.id).await.unwrap().unwrap();
    assert_eq!(record.summary, summary);
    assert_eq!(record.state, state);
}

#[tokio::test]
async fn test_missing_and_invalid_ids() {
    let dir = TempDir::new().unwrap();
    let store = FileHistoryStore::new(dir.path());

    let unknown = Uuid::new_v4().to_string();
    assert!(store.get(&unknown).await.unwrap().is_none());
    assert!(!store.delete(&unknown).await.unwrap());
    assert!(store.get("../etc/passwd").await.is_err());
    assert!(store.export(&unknown, ExportFormat::Json).await.is_err());
}

#[tokio::test]
async fn test_figures_are_copied_into_record_directory() {
    let dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let figure = scratch.path().join("fig1.png");
    std::fs::write(&figure, b"png").unwrap();
    let missing = scratch.path().join("gone.png");

    let store = FileHistoryStore::new(dir.path());
    let state = finished_state("https://arxiv.org/abs/1512.03385", None, vec![figure, missing]);
    let summary = store.save(&state).await.unwrap();

    assert_eq!(summary.title, UNTITLED_ANALYSIS);
    assert_eq!(summary.source_type, "Arxiv");
    let record = store.get(&summary.id).await.unwrap().unwrap();
    let expected = dir.path().join("images").join(&summary.id).join("fig1.png");
    assert_eq!(record.state.figures(), &[expected.clone()]);
    assert_eq!(std::fs::read(&expected).unwrap(), b"png");

    assert!(store.delete(&summary.id).await.unwrap());
    assert!(!expected.exists());
    assert!(store.get(&summary.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_is_newest_first_and_search_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let store = FileHistoryStore::new(dir.path());

    assert!(store.list().await.unwrap().is_empty());

    let first = store
        .save(&finished_state("a.pdf", Some("Attention Is All You Need"), Vec::new()))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = store
        .save(&finished_state("resnet.pdf", Some("Deep Residual Learning"), Vec::new()))
        .await
        .unwrap();
    std::fs::write(dir.path().join("records").join("broken.json"), "{").unwrap();

    let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);

    let by_title = store.search("attention").await.unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].id, first.id);

    let by_source = store.search("RESNET").await.unwrap();
    assert_eq!(by_source.len(), 1);
    assert_eq!(by_source[0].id, second.id);
}

#[tokio::test]
async fn test_export_formats() {
    let dir = TempDir::new().unwrap();
    let store = FileHistoryStore::new(dir.path());
    let summary = store
        .save(&finished_state("resnet.pdf", Some("ResNet"), Vec::new()))
        .await
        .unwrap();

    let markdown = store.export(&summary.id, ExportFormat::Markdown).await.unwrap();
    assert!(markdown.starts_with(dir.path().join("exports")));
    assert_eq!(markdown.extension().unwrap(), "md");
    let content = std::fs::read_to_string(&markdown).unwrap();
    assert!(content.starts_with("# ResNet\n"));
    assert!(content.contains("## Report\n\n# 报告正文"));
    assert!(content.contains("## Translation\n\n译文"));
    assert!(content.contains("## Review Dialogue\n\n**👤 Reader (Q1):**"));

    let json = store.export(&summary.id, ExportFormat::Json).await.unwrap();
    let record: HistoryRecord = serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(record.summary.id, summary.id);
}

#[test]
fn test_export_format_parsing() {
    assert_eq!("md".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
    assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
    assert!("pdf".parse::<ExportFormat>().is_err());
}
