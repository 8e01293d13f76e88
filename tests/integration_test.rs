//! Integration tests for transcript-qa.

#![allow(clippy::expect_used)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use transcript_qa::completion::CompletionService;
use transcript_qa::core::{Chunk, Document, Message, Role};
use transcript_qa::embedding::{DEFAULT_DIMENSIONS, Embedder, FallbackEmbedder};
use transcript_qa::error::CompletionError;
use transcript_qa::retrieval::{Retriever, SqliteVectorIndex};
use transcript_qa::storage::{INDEX_DB_NAME, SqliteStorage, Storage};
use transcript_qa::{ChatSession, Error, PromptAssembler, Result, SessionOptions};

const TRANSCRIPT: [&str; 4] = [
    "FY23 revenue: ₹70,000 Cr, up 18% year on year.",
    "Cigarette volumes grew in high single digits during the quarter.",
    "Hotels segment EBITDA margin expanded to 33%.",
    "Agri business exports were affected by wheat export restrictions.",
];

/// Builds an on-disk index the way the external builder does.
fn build_index(dir: &Path) {
    let mut storage =
        SqliteStorage::open(dir.join(INDEX_DB_NAME)).expect("Failed to create storage");
    storage.init().expect("Failed to init storage");

    let doc_id = storage
        .add_document(&Document::new("itc-q4-fy23-call.pdf"))
        .expect("add_document failed");
    let chunks: Vec<Chunk> = TRANSCRIPT
        .iter()
        .enumerate()
        .map(|(i, text)| Chunk::new(doc_id, (*text).to_string(), i))
        .collect();
    storage.add_chunks(doc_id, &chunks).expect("add_chunks failed");

    let embedder = FallbackEmbedder::new(DEFAULT_DIMENSIONS);
    let embeddings: Vec<(i64, Vec<f32>)> = storage
        .get_chunks(doc_id)
        .expect("get_chunks failed")
        .iter()
        .map(|c| {
            (
                c.id.expect("stored chunk has id"),
                embedder.embed(&c.content).expect("embed failed"),
            )
        })
        .collect();
    storage
        .store_embeddings_batch(&embeddings, Some(embedder.model_name()))
        .expect("store_embeddings_batch failed");
}

/// Completion service that records conversations and answers from a script.
#[derive(Clone, Default)]
struct ScriptedService {
    seen: Arc<Mutex<Vec<Vec<Message>>>>,
    fail_from_call: Option<usize>,
}

impl ScriptedService {
    fn calls(&self) -> usize {
        self.seen.lock().expect("lock").len()
    }

    fn last(&self) -> Vec<Message> {
        self.seen
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("at least one call")
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, conversation: &[Message], _model: &str, _temperature: f32) -> Result<String> {
        let mut seen = self.seen.lock().expect("lock");
        seen.push(conversation.to_vec());
        let call = seen.len();
        if self.fail_from_call.is_some_and(|n| call >= n) {
            return Err(CompletionError::Service("503 upstream unavailable".to_string()).into());
        }
        Ok(format!("answer {call}"))
    }
}

fn open_session(dir: &TempDir, service: &ScriptedService) -> ChatSession {
    let index = SqliteVectorIndex::open(
        dir.path(),
        Box::new(FallbackEmbedder::new(DEFAULT_DIMENSIONS)),
        20,
    )
    .expect("open index");
    ChatSession::new(
        Retriever::new(Box::new(index), 3, 1.0),
        PromptAssembler::default(),
        Box::new(service.clone()),
        SessionOptions::default(),
    )
}

fn indexed_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    build_index(dir.path());
    dir
}

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_answer_uses_top_three_chunks() {
        let dir = indexed_dir();
        let service = ScriptedService::default();
        let mut session = open_session(&dir, &service);

        let response = session
            .submit("What was FY23 revenue?")
            .await
            .expect("submit failed");

        assert_eq!(response.answer, "answer 1");
        assert_eq!(response.sources.len(), 3);
        assert_eq!(response.sources[0].text, TRANSCRIPT[0]);
        assert_eq!(
            response.sources[0].source.as_deref(),
            Some("itc-q4-fy23-call.pdf")
        );
    }

    #[tokio::test]
    async fn test_context_passed_verbatim() {
        let dir = indexed_dir();
        let service = ScriptedService::default();
        let mut session = open_session(&dir, &service);

        session
            .submit("What was FY23 revenue?")
            .await
            .expect("submit failed");

        let conversation = service.last();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[0].role, Role::System);
        assert!(conversation[0].content.contains("₹70,000 Cr"));
        assert_eq!(conversation[1].role, Role::User);
        assert_eq!(conversation[1].content, "What was FY23 revenue?");
    }

    #[tokio::test]
    async fn test_follow_up_sees_previous_exchange() {
        let dir = indexed_dir();
        let service = ScriptedService::default();
        let mut session = open_session(&dir, &service);

        session.submit("What was FY23 revenue?").await.expect("first");
        session.submit("And the hotel margin?").await.expect("second");

        let conversation = service.last();
        let roles: Vec<Role> = conversation.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(conversation[2].content, "answer 1");
    }

    #[tokio::test]
    async fn test_clear_starts_fresh_conversation() {
        let dir = indexed_dir();
        let service = ScriptedService::default();
        let mut session = open_session(&dir, &service);

        for q in ["q one", "q two", "q three"] {
            session.submit(q).await.expect("submit failed");
        }
        assert_eq!(session.history().len(), 6);

        session.clear();
        assert!(session.history().is_empty());

        session.submit("hotels").await.expect("after clear");
        assert_eq!(service.last().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_completion_keeps_history() {
        let dir = indexed_dir();
        let service = ScriptedService {
            fail_from_call: Some(2),
            ..ScriptedService::default()
        };
        let mut session = open_session(&dir, &service);

        session.submit("first").await.expect("first succeeds");
        let before = session.history().clone();

        let err = session.submit("second").await.expect_err("second fails");
        assert!(matches!(err, Error::Completion(_)));
        assert!(err.is_turn_scoped());
        assert_eq!(session.history(), &before);
    }

    #[tokio::test]
    async fn test_empty_question_not_sent() {
        let dir = indexed_dir();
        let service = ScriptedService::default();
        let mut session = open_session(&dir, &service);

        let err = session.submit("   ").await.expect_err("blank rejected");
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_index_answers_without_context() {
        let dir = TempDir::new().expect("temp dir");
        let index = transcript_qa::retrieval::open_index(
            &dir.path().join("nope"),
            transcript_qa::EmbedderKind::Hash,
            20,
        )
        .expect("open_index degrades");
        let service = ScriptedService::default();
        let mut session = ChatSession::new(
            Retriever::new(index, 3, 1.0),
            PromptAssembler::default(),
            Box::new(service.clone()),
            SessionOptions::default(),
        );

        let response = session.submit("What was FY23 revenue?").await.expect("answer");
        assert!(response.sources.is_empty());
        assert!(!service.last()[0].content.contains("₹70,000"));
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    struct Echo;

    #[async_trait]
    impl CompletionService for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, conversation: &[Message], _: &str, _: f32) -> Result<String> {
            Ok(format!("echo {}", conversation.len()))
        }
    }

    struct NoIndex;

    impl transcript_qa::VectorIndex for NoIndex {
        fn search(&self, _: &str, _: usize, _: f32) -> Result<Vec<transcript_qa::RetrievedChunk>> {
            Ok(Vec::new())
        }
    }

    proptest! {
        #[test]
        fn history_holds_two_turns_per_exchange(questions in prop::collection::vec("[a-zA-Z0-9 ?₹]{1,40}", 0..8)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");
            let mut session = ChatSession::new(
                Retriever::new(Box::new(NoIndex), 3, 1.0),
                PromptAssembler::default(),
                Box::new(Echo),
                SessionOptions::default(),
            );

            let mut answered = 0;
            for q in &questions {
                if runtime.block_on(session.submit(q)).is_ok() {
                    answered += 1;
                }
            }

            prop_assert_eq!(session.history().len(), 2 * answered);
            let turns = session.history().turns();
            for (i, turn) in turns.iter().enumerate() {
                let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
                prop_assert_eq!(turn.role(), expected);
            }
        }
    }
}

/// Binary-level tests.
mod cli_tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn bin() -> Command {
        let mut cmd = Command::cargo_bin("transcript-qa").expect("binary built");
        cmd.env_remove("TRANSCRIPT_QA_API_KEY")
            .env_remove("TRANSCRIPT_QA_INDEX_DIR")
            .env_remove("TRANSCRIPT_QA_PROMPT_FILE")
            .env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn test_help_lists_commands() {
        bin()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("chat"))
            .stdout(predicate::str::contains("ask"))
            .stdout(predicate::str::contains("search"));
    }

    #[test]
    fn test_ask_without_api_key_fails() {
        let dir = indexed_dir();
        bin()
            .args(["--index-dir"])
            .arg(dir.path())
            .args(["ask", "What was FY23 revenue?"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("TRANSCRIPT_QA_API_KEY"));
    }

    #[test]
    fn test_ask_without_api_key_json_error() {
        bin()
            .args(["--format", "json", "ask", "hi"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("\"error\": \"config\""));
    }

    #[test]
    fn test_status_on_built_index() {
        let dir = indexed_dir();
        bin()
            .arg("--index-dir")
            .arg(dir.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Chunks:        4"));
    }

    #[test]
    fn test_status_missing_index_fails() {
        let dir = TempDir::new().expect("temp dir");
        bin()
            .arg("--index-dir")
            .arg(dir.path().join("missing"))
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn test_search_needs_no_key() {
        let dir = indexed_dir();
        bin()
            .arg("--index-dir")
            .arg(dir.path())
            .args(["--embedder", "hash", "search", "FY23 revenue"])
            .assert()
            .success()
            .stdout(predicate::str::contains("₹70,000"));
    }

    #[test]
    fn test_prompt_init_writes_template() {
        let dir = TempDir::new().expect("temp dir");
        bin()
            .args(["prompt", "init", "--dir"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("system.md"));

        let text = std::fs::read_to_string(dir.path().join("system.md")).expect("template");
        assert!(text.contains("{context}"));
    }
}
