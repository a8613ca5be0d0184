use std::sync::Arc;

use studyhall_db::{ConnectionProvider, DbRuntimeSettings};
use studyhall_store::{
    Difficulty, FieldUpdate, MessageRole, NewChatMessage, NewPracticeSession, NewQuestion,
    NewQuestionAttempt, NewStudyTopic, NewUserSettings, PracticeSessionUpdate, ProgressStats,
    Role, Store, StoreError, UserUpsert,
};
use tempfile::TempDir;

/// A store over a fresh file-backed database. The directory must outlive the store.
fn test_store(owner: Option<&str>) -> (Store, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("study.db").display());
    let provider = ConnectionProvider::new(Some(url), DbRuntimeSettings::default());
    let store = Store::new(Arc::new(provider), owner.map(str::to_string));
    (store, dir)
}

fn offline_store() -> Store {
    Store::new(Arc::new(ConnectionProvider::unconfigured()), Some("owner-1".to_string()))
}

async fn seed_question(store: &Store, user_id: i64, category: &str, difficulty: Difficulty) -> i64 {
    store
        .create_question(NewQuestion {
            user_id,
            category: category.to_string(),
            difficulty,
            question_text: format!("{category}/{difficulty}"),
            answer: "42".to_string(),
            source: None,
        })
        .await
        .expect("create question failed")
        .expect("question should be written")
}

#[tokio::test]
async fn upsert_requires_open_id_even_without_database() {
    let (store, _dir) = test_store(None);
    let err = store.upsert_user(UserUpsert::default()).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));

    let err = offline_store()
        .upsert_user(UserUpsert::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn upsert_statement_failure_is_returned() {
    let (store, _dir) = test_store(None);
    let too_long = "x".repeat(65);

    let err = store
        .upsert_user(UserUpsert::for_open_id(too_long.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Database(_)), "got {err:?}");

    let user = store
        .get_user_by_open_id(&too_long)
        .await
        .expect("lookup failed");
    assert!(user.is_none(), "nothing written");
}

#[tokio::test]
async fn owner_gets_admin_and_others_get_user() {
    let (store, _dir) = test_store(Some("owner-1"));

    store
        .upsert_user(UserUpsert::for_open_id("owner-1"))
        .await
        .expect("upsert owner failed");
    store
        .upsert_user(UserUpsert::for_open_id("ext-2"))
        .await
        .expect("upsert user failed");

    let owner = store
        .get_user_by_open_id("owner-1")
        .await
        .expect("get failed")
        .expect("owner should exist");
    let other = store
        .get_user_by_open_id("ext-2")
        .await
        .expect("get failed")
        .expect("user should exist");
    assert_eq!(owner.role, Role::Admin);
    assert_eq!(other.role, Role::User);
}

#[tokio::test]
async fn repeated_upsert_keeps_one_row_with_latest_supplied_fields() {
    let (store, _dir) = test_store(None);

    store
        .upsert_user(UserUpsert {
            name: FieldUpdate::Set(Some("Ada".to_string())),
            email: FieldUpdate::Set(Some("ada@example.com".to_string())),
            ..UserUpsert::for_open_id("ext-1")
        })
        .await
        .expect("first upsert failed");
    store
        .upsert_user(UserUpsert {
            name: FieldUpdate::Set(Some("Countess".to_string())),
            login_method: FieldUpdate::Set(Some("email".to_string())),
            ..UserUpsert::for_open_id("ext-1")
        })
        .await
        .expect("second upsert failed");

    let user = store
        .get_user_by_open_id("ext-1")
        .await
        .expect("get failed")
        .expect("user should exist");
    assert_eq!(user.name.as_deref(), Some("Countess"));
    assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    assert_eq!(user.login_method.as_deref(), Some("email"));

    let by_id = store
        .get_user_by_id(user.id)
        .await
        .expect("get failed")
        .expect("user should exist");
    assert_eq!(by_id, user);
    assert!(
        store.get_user_by_id(user.id + 1).await.expect("get failed").is_none(),
        "only one row exists"
    );
}

#[tokio::test]
async fn random_questions_match_filters_and_cap() {
    let (store, _dir) = test_store(None);
    for _ in 0..5 {
        seed_question(&store, 1, "geography", Difficulty::Hard).await;
    }
    seed_question(&store, 1, "geography", Difficulty::Easy).await;
    seed_question(&store, 1, "music", Difficulty::Hard).await;
    seed_question(&store, 2, "geography", Difficulty::Hard).await;

    let sample = store
        .get_random_questions(1, Some("geography"), Some(Difficulty::Hard), Some(3))
        .await
        .expect("sample failed");
    assert_eq!(sample.len(), 3);
    for question in &sample {
        assert_eq!(question.user_id, 1);
        assert_eq!(question.category, "geography");
        assert_eq!(question.difficulty, Difficulty::Hard);
    }

    let defaulted = store
        .get_random_questions(1, None, None, None)
        .await
        .expect("sample failed");
    assert_eq!(defaulted.len(), 7);

    let listed = store
        .get_questions_by_category(1, "geography", None)
        .await
        .expect("list failed");
    assert_eq!(listed.len(), 6);
}

#[tokio::test]
async fn practice_flow_feeds_progress_stats() {
    let (store, _dir) = test_store(None);

    let empty = store
        .get_user_progress_stats(1)
        .await
        .expect("stats failed")
        .expect("database is available");
    assert_eq!(empty, ProgressStats::default());

    let first = store
        .create_practice_session(NewPracticeSession {
            user_id: 1,
            category: Some("geography".to_string()),
            total_questions: 10,
            ..NewPracticeSession::default()
        })
        .await
        .expect("create session failed")
        .expect("session should be written");
    let question_id = seed_question(&store, 1, "geography", Difficulty::Medium).await;
    store
        .create_question_attempt(NewQuestionAttempt {
            session_id: first,
            question_id,
            user_answer: Some("Ulaanbaatar".to_string()),
            is_correct: true,
            buzz_time: Some(1_200),
        })
        .await
        .expect("create attempt failed");
    store
        .update_practice_session(
            first,
            PracticeSessionUpdate {
                correct_answers: Some(7),
                score: Some(70),
                completed_at: FieldUpdate::Set(Some(chrono::Utc::now())),
                ..PracticeSessionUpdate::default()
            },
        )
        .await
        .expect("update session failed");

    store
        .create_practice_session(NewPracticeSession {
            user_id: 1,
            total_questions: 5,
            correct_answers: 5,
            score: 100,
            ..NewPracticeSession::default()
        })
        .await
        .expect("create session failed");

    let attempts = store
        .get_question_attempts_by_session(first)
        .await
        .expect("list attempts failed");
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].buzz_time, Some(1_200));

    let session = store
        .get_practice_session_by_id(first)
        .await
        .expect("get session failed")
        .expect("session should exist");
    assert!(session.completed_at.is_some());

    let recent = store
        .get_practice_sessions(1, None)
        .await
        .expect("list sessions failed");
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[1].id, first, "newest first");

    let stats = store
        .get_user_progress_stats(1)
        .await
        .expect("stats failed")
        .expect("database is available");
    assert_eq!(
        stats,
        ProgressStats {
            total_sessions: 2,
            total_questions: 15,
            correct_answers: 12,
            accuracy: 80.0,
            average_score: 85.0,
        }
    );
}

#[tokio::test]
async fn settings_chat_and_topics_round_through_store() {
    let (store, _dir) = test_store(None);

    store
        .upsert_user_settings(NewUserSettings {
            user_id: 3,
            tutor_model_name: Some("tutor".to_string()),
            ..NewUserSettings::default()
        })
        .await
        .expect("upsert settings failed");
    store
        .upsert_user_settings(NewUserSettings {
            user_id: 3,
            tutor_model_name: Some("tutor-v2".to_string()),
            ..NewUserSettings::default()
        })
        .await
        .expect("upsert settings failed");
    let settings = store
        .get_user_settings(3)
        .await
        .expect("get settings failed")
        .expect("settings should exist");
    assert_eq!(settings.tutor_model_name.as_deref(), Some("tutor-v2"));

    for (role, content) in [(MessageRole::User, "hi"), (MessageRole::Assistant, "hello")] {
        store
            .create_chat_message(NewChatMessage {
                user_id: 3,
                role,
                content: content.to_string(),
            })
            .await
            .expect("create message failed");
    }
    let messages = store
        .get_chat_messages(3, None)
        .await
        .expect("list messages failed");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "hello");
    assert_eq!(store.clear_chat_messages(3).await.expect("clear failed"), 2);
    assert!(store
        .get_chat_messages(3, None)
        .await
        .expect("list messages failed")
        .is_empty());

    for (category, topic) in [("math", "Primes"), ("art", "Baroque"), ("math", "Fractions")] {
        store
            .create_study_topic(NewStudyTopic {
                category: category.to_string(),
                topic: topic.to_string(),
                difficulty: Difficulty::Easy,
                description: None,
                resource_links: None,
            })
            .await
            .expect("create topic failed");
    }
    let topics: Vec<String> = store
        .get_study_topics(None, None)
        .await
        .expect("list topics failed")
        .into_iter()
        .map(|t| t.topic)
        .collect();
    assert_eq!(topics, vec!["Baroque", "Fractions", "Primes"]);
}

#[tokio::test]
async fn unconfigured_store_degrades_to_defaults() {
    let store = offline_store();

    store
        .upsert_user(UserUpsert::for_open_id("owner-1"))
        .await
        .expect("upsert should no-op");
    assert!(store.get_user_by_open_id("owner-1").await.expect("read").is_none());
    assert!(store.get_user_by_id(1).await.expect("read").is_none());
    assert!(store.get_user_settings(1).await.expect("read").is_none());
    store
        .upsert_user_settings(NewUserSettings::default())
        .await
        .expect("write should no-op");

    let question = NewQuestion {
        user_id: 1,
        category: "math".to_string(),
        difficulty: Difficulty::Easy,
        question_text: "1+1".to_string(),
        answer: "2".to_string(),
        source: None,
    };
    assert_eq!(store.create_question(question).await.expect("write"), None);
    assert!(store
        .get_questions_by_category(1, "math", None)
        .await
        .expect("read")
        .is_empty());
    assert!(store
        .get_random_questions(1, None, None, None)
        .await
        .expect("read")
        .is_empty());

    assert_eq!(
        store
            .create_practice_session(NewPracticeSession::default())
            .await
            .expect("write"),
        None
    );
    store
        .update_practice_session(1, PracticeSessionUpdate::default())
        .await
        .expect("write should no-op");
    assert!(store.get_practice_sessions(1, None).await.expect("read").is_empty());
    assert!(store.get_practice_session_by_id(1).await.expect("read").is_none());

    let attempt = NewQuestionAttempt {
        session_id: 1,
        question_id: 1,
        user_answer: None,
        is_correct: false,
        buzz_time: None,
    };
    assert_eq!(store.create_question_attempt(attempt).await.expect("write"), None);
    assert!(store
        .get_question_attempts_by_session(1)
        .await
        .expect("read")
        .is_empty());

    let message = NewChatMessage {
        user_id: 1,
        role: MessageRole::User,
        content: "hi".to_string(),
    };
    assert_eq!(store.create_chat_message(message).await.expect("write"), None);
    assert!(store.get_chat_messages(1, None).await.expect("read").is_empty());
    assert_eq!(store.clear_chat_messages(1).await.expect("write"), 0);

    let topic = NewStudyTopic {
        category: "math".to_string(),
        topic: "Primes".to_string(),
        difficulty: Difficulty::Easy,
        description: None,
        resource_links: None,
    };
    assert_eq!(store.create_study_topic(topic).await.expect("write"), None);
    assert!(store.get_study_topics(None, None).await.expect("read").is_empty());

    assert_eq!(store.get_user_progress_stats(1).await.expect("read"), None);
}

#[tokio::test]
async fn unreachable_database_behaves_like_unconfigured() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let url = dir.path().join("no").join("such").join("dir").join("study.db");
    let provider = ConnectionProvider::new(
        Some(url.display().to_string()),
        DbRuntimeSettings {
            connect_timeout_ms: 200,
            ..DbRuntimeSettings::default()
        },
    );
    let store = Store::new(Arc::new(provider), None);

    assert!(store.get_study_topics(None, None).await.expect("read").is_empty());
    assert_eq!(store.get_user_progress_stats(1).await.expect("read"), None);
    store
        .upsert_user(UserUpsert::for_open_id("ext-1"))
        .await
        .expect("upsert should no-op");
}
