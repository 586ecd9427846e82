use std::sync::{Arc, Mutex};

use super::*;
use crate::generator::context::ModelSet;
use crate::generator::state::AnalysisOptions;
use crate::generator::testing::{FakeLoader, FakeModel, context_with, loaded_state};
use crate::search::SearchAggregator;

#[derive(Default)]
struct RecordingSink {
    phases: Mutex<Vec<String>>,
    utterances: Mutex<Vec<Utterance>>,
}

impl DialogueSink for RecordingSink {
    fn phase(&self, header: &str) {
        self.phases.lock().unwrap().push(header.to_string());
    }

    fn emit(&self, utterance: &Utterance) {
        self.utterances.lock().unwrap().push(utterance.clone());
    }
}

fn reported_state(round_table: bool) -> AnalysisState {
    let options = AnalysisOptions {
        enable_round_table: round_table,
        ..Default::default()
    };
    let mut state = loaded_state("论文全文 body", Some("Deep Residual Learning"), options);
    state
        .apply(StateUpdate::Task {
            field: AnalysisField::FinalReport,
            output: TaskOutput::Content("# 研读报告".to_string()),
        })
        .unwrap();
    state
}

fn split_models() -> (Arc<FakeModel>, Arc<FakeModel>, GeneratorContext) {
    let core = FakeModel::replying("answer");
    let review = FakeModel::replying("question");
    let models = ModelSet {
        core: core.clone(),
        translation: core.clone(),
        related_work: core.clone(),
        review: review.clone(),
    };
    let context = GeneratorContext::from_parts(models, SearchAggregator::default(), FakeLoader::not_found());
    (core, review, context)
}

#[test]
fn test_persona_labels() {
    assert_eq!(Persona::Moderator.label(None), "🎓 主持人 (Moderator)");
    assert_eq!(Persona::Moderator.label(Some("总结")), "🎓 主持人 (Moderator - 总结)");
    assert_eq!(Persona::Critic.label(Some("追问")), "⚔️ 方法论专家 (Critic - 追问)");
    assert_eq!(Persona::Reader.label(Some("Q2")), "👤 Reader (Q2)");
    assert_eq!(Persona::Mentor.label(Some("A2")), "🎓 Author (A2)");
}

#[tokio::test]
async fn test_round_table_runs_nine_turns_in_order() {
    let model = FakeModel::numbered();
    let context = context_with(model.clone(), FakeLoader::not_found());
    let sink = RecordingSink::default();

    let output = run_dialogue(&context, &reported_state(true), &sink)
        .await
        .unwrap();

    let labels: Vec<String> = sink
        .utterances
        .lock()
        .unwrap()
        .iter()
        .map(|u| u.label.clone())
        .collect();
    assert_eq!(
        labels,
        vec![
            "🎓 主持人 (Moderator)",
            "⚔️ 方法论专家 (Critic)",
            "🛡️ 论文作者 (Author)",
            "🛠️ 应用实践者 (Practitioner)",
            "🛡️ 论文作者 (Author)",
            "🎓 主持人 (Moderator)",
            "⚔️ 方法论专家 (Critic - 追问)",
            "🛡️ 论文作者 (Author)",
            "🎓 主持人 (Moderator - 总结)",
        ]
    );
    assert_eq!(sink.phases.lock().unwrap().len(), 5);

    let transcript = output.text();
    let parts: Vec<&str> = transcript.split(TRANSCRIPT_SEPARATOR).collect();
    assert_eq!(parts.len(), 9);
    assert_eq!(parts[0], "**🎓 主持人 (Moderator):**\nturn-1");
    assert_eq!(parts[8], "**🎓 主持人 (Moderator - 总结):**\nturn-9");
    assert_eq!(model.call_count(), 9);
}

#[tokio::test]
async fn test_round_table_follow_up_sees_both_author_answers() {
    let model = FakeModel::numbered();
    let context = context_with(model.clone(), FakeLoader::not_found());

    run_dialogue(&context, &reported_state(true), &NoopSink)
        .await
        .unwrap();

    let calls = model.calls();
    let follow_up = &calls[6];
    assert!(follow_up.user.contains("1. turn-3"));
    assert!(follow_up.user.contains("2. turn-5"));
    assert!(calls[0].system.contains("《Deep Residual Learning》"));
    assert!(calls[0].system.contains("会议刚开始"));
    assert!(calls[1].system.contains("# 研读报告"));
    assert!(calls[2].system.contains("论文全文 body"));
}

#[tokio::test]
async fn test_reviewers_receive_the_report_once() {
    let model = FakeModel::numbered();
    let context = context_with(model.clone(), FakeLoader::not_found());

    run_dialogue(&context, &reported_state(true), &NoopSink)
        .await
        .unwrap();

    let calls = model.calls();
    // 方法论专家、应用实践者与追问
    for request in [&calls[1], &calls[3], &calls[6]] {
        let occurrences =
            request.system.matches("# 研读报告").count() + request.user.matches("# 研读报告").count();
        assert_eq!(occurrences, 1);
    }
}

#[tokio::test]
async fn test_authors_use_core_model_and_others_use_review_model() {
    let (core, review, context) = split_models();
    run_dialogue(&context, &reported_state(true), &NoopSink)
        .await
        .unwrap();
    assert_eq!(core.call_count(), 3);
    assert_eq!(review.call_count(), 6);

    let (core, review, context) = split_models();
    run_dialogue(&context, &reported_state(false), &NoopSink)
        .await
        .unwrap();
    assert_eq!(core.call_count(), 4);
    assert_eq!(review.call_count(), 5);
}

#[tokio::test]
async fn test_reader_questions_alternate_with_answers() {
    let model = FakeModel::numbered();
    let context = context_with(model.clone(), FakeLoader::not_found());
    let sink = RecordingSink::default();

    let output = run_dialogue(&context, &reported_state(false), &sink)
        .await
        .unwrap();

    let labels: Vec<String> = sink
        .utterances
        .lock()
        .unwrap()
        .iter()
        .map(|u| u.label.clone())
        .collect();
    assert_eq!(
        labels,
        vec![
            "👤 Reader (Q1)",
            "🎓 Author (A1)",
            "👤 Reader (Q2)",
            "🎓 Author (A2)",
            "👤 Reader (Q3)",
            "🎓 Author (A3)",
            "👤 Reader (Q4)",
            "🎓 Author (A4)",
            "👤 Reader (Final Feedback)",
        ]
    );
    assert_eq!(sink.phases.lock().unwrap().len(), 5);
    assert_eq!(output.text().split(TRANSCRIPT_SEPARATOR).count(), 9);

    let calls = model.calls();
    assert!(calls[0].user.contains("# 研读报告"));
    assert!(calls[2].user.contains("turn-2"));
    assert!(calls[8].user.contains("turn-8"));
    assert!(calls[8].user.contains("1-10 分"));
}

#[tokio::test]
async fn test_missing_report_skips_dialogue() {
    let model = FakeModel::numbered();
    let context = context_with(model.clone(), FakeLoader::not_found());
    let state = loaded_state("body", None, AnalysisOptions::default());

    let output = run_dialogue(&context, &state, &NoopSink).await.unwrap();

    assert_eq!(output, TaskOutput::degraded(DegradeReason::NoReport, NO_REPORT_MESSAGE));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_degraded_report_skips_dialogue() {
    let model = FakeModel::numbered();
    let context = context_with(model.clone(), FakeLoader::not_found());
    let mut state = loaded_state("", None, AnalysisOptions::default());
    state
        .apply(StateUpdate::Task {
            field: AnalysisField::FinalReport,
            output: TaskOutput::degraded(DegradeReason::TaskFailed, "# 基于占位符的报告"),
        })
        .unwrap();

    let output = run_dialogue(&context, &state, &NoopSink).await.unwrap();

    assert_eq!(output.text(), NO_REPORT_MESSAGE);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_untitled_paper_fallback() {
    let model = FakeModel::numbered();
    let context = context_with(model.clone(), FakeLoader::not_found());
    let options = AnalysisOptions {
        enable_round_table: true,
        ..Default::default()
    };
    let mut state = loaded_state("body", None, options);
    state
        .apply(StateUpdate::Task {
            field: AnalysisField::FinalReport,
            output: TaskOutput::Content("report".to_string()),
        })
        .unwrap();

    run_dialogue(&context, &state, &NoopSink).await.unwrap();

    assert!(model.calls()[0].system.contains("《Untitled Paper》"));
}

#[tokio::test]
async fn test_turn_failure_aborts_dialogue() {
    let context = context_with(FakeModel::failing("overloaded"), FakeLoader::not_found());
    let sink = RecordingSink::default();

    let error = run_dialogue(&context, &reported_state(true), &sink)
        .await
        .unwrap_err();

    let message = format!("{:#}", error);
    assert!(message.contains("Dialogue turn `🎓 主持人 (Moderator)` failed"));
    assert!(message.contains("overloaded"));
    assert!(sink.utterances.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_discuss_replaces_previous_dialogue() {
    let model = FakeModel::numbered();
    let context = context_with(model.clone(), FakeLoader::not_found());
    let mut state = reported_state(false);
    state
        .apply(StateUpdate::Task {
            field: AnalysisField::ReviewDialogue,
            output: TaskOutput::Content("old dialogue".to_string()),
        })
        .unwrap();

    let updated = discuss(&context, &state, true, &NoopSink).await.unwrap();

    let dialogue = updated.review_dialogue().unwrap();
    assert!(dialogue.starts_with("**🎓 主持人 (Moderator):**\nturn-1"));
    assert!(updated.options().enable_round_table);
    assert_eq!(updated.final_report(), state.final_report());
    assert_eq!(state.review_dialogue(), Some("old dialogue"));
}
