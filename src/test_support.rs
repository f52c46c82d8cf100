use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use time::{macros::datetime, Duration, PrimitiveDateTime};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, state::AppState, time::Clock};
use crate::db::models::{Answer, Question, QuestionOption, QuestionWithOptions, Quiz};
use crate::db::types::QuestionType;
use crate::repositories::memory::MemoryStore;
use crate::services::attempts::AttemptService;
use crate::services::notifier::{Notifier, TimerUpdate};
use crate::services::timer_registry::TimerRegistry;

pub(crate) const QUIZ_ID: &str = "quiz-1";
pub(crate) const ADMIN_TOKEN: &str = "test-admin-token";

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("QUIZGLASS_ENV", "test");
    std::env::set_var("QUIZGLASS_STRICT_CONFIG", "0");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    for key in [
        "ENVIRONMENT",
        "DATABASE_URL",
        "POSTGRES_SERVER",
        "POSTGRES_PORT",
        "POSTGRES_USER",
        "POSTGRES_PASSWORD",
        "POSTGRES_DB",
        "STORAGE_BACKEND",
        "QUIZ_FIXTURES_PATH",
        "ADMIN_TOKEN",
        "API_V1_STR",
        "TIMER_SYNC_INTERVAL_MS",
        "EXPIRY_CATCHUP_INTERVAL_SECONDS",
    ] {
        std::env::remove_var(key);
    }
}

pub(crate) fn base_time() -> PrimitiveDateTime {
    datetime!(2025-03-01 10:00:00)
}

/// Clock that only moves when told to.
pub(crate) struct ManualClock {
    now: StdMutex<PrimitiveDateTime>,
}

impl ManualClock {
    pub(crate) fn new(now: PrimitiveDateTime) -> Self {
        Self { now: StdMutex::new(now) }
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> PrimitiveDateTime {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    updates: StdMutex<Vec<TimerUpdate>>,
}

impl RecordingNotifier {
    pub(crate) fn updates(&self) -> Vec<TimerUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, update: &TimerUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }
}

pub(crate) fn blank_answer(question_id: &str) -> Answer {
    Answer {
        id: format!("ans-{question_id}"),
        attempt_id: "attempt-1".to_string(),
        question_id: question_id.to_string(),
        selected_option_id: None,
        numerical_value: None,
        is_correct: None,
        points_earned: None,
        answered_at: base_time(),
        last_modified_at: base_time(),
    }
}

/// Options get ids `{id}-o0`, `{id}-o1`, ... in the given order.
pub(crate) fn choice_question(
    id: &str,
    question_type: QuestionType,
    points: i32,
    options: &[(&str, bool)],
) -> QuestionWithOptions {
    QuestionWithOptions {
        question: Question {
            id: id.to_string(),
            quiz_id: QUIZ_ID.to_string(),
            question_type,
            question_text: format!("Question {id}"),
            explanation: Some(format!("Explanation for {id}")),
            points,
            order_index: 0,
        },
        options: options
            .iter()
            .enumerate()
            .map(|(index, (text, is_correct))| QuestionOption {
                id: format!("{id}-o{index}"),
                question_id: id.to_string(),
                option_text: text.to_string(),
                is_correct: *is_correct,
                order_index: index as i32,
            })
            .collect(),
    }
}

pub(crate) fn numerical_question(
    id: &str,
    points: i32,
    options: &[(&str, bool)],
) -> QuestionWithOptions {
    choice_question(id, QuestionType::Numerical, points, options)
}

/// Published quiz open from an hour before [`base_time`] to two hours after.
pub(crate) fn quiz(id: &str) -> Quiz {
    Quiz {
        id: id.to_string(),
        title: format!("Quiz {id}"),
        description: None,
        duration_minutes: 30,
        start_time: base_time() - Duration::hours(1),
        end_time: base_time() + Duration::hours(2),
        published: true,
        passing_score: 50,
        created_at: base_time() - Duration::days(1),
    }
}

/// `q-mc` (multiple choice, 5 points, `q-mc-o1` correct) then
/// `q-num` (numerical, 10 points, accepts 5.0).
pub(crate) fn standard_questions() -> Vec<QuestionWithOptions> {
    let mut choice = choice_question(
        "q-mc",
        QuestionType::MultipleChoice,
        5,
        &[("Berlin", false), ("Paris", true), ("Rome", false)],
    );
    choice.question.order_index = 0;
    let mut numerical = numerical_question("q-num", 10, &[("5.0", true)]);
    numerical.question.order_index = 1;
    vec![choice, numerical]
}

pub(crate) fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_quiz(quiz(QUIZ_ID), standard_questions());
    store
}

pub(crate) struct Harness {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) timers: Arc<TimerRegistry>,
    pub(crate) service: Arc<AttemptService>,
}

pub(crate) fn harness() -> Harness {
    let store = seeded_store();
    let clock = Arc::new(ManualClock::new(base_time()));
    let notifier = Arc::new(RecordingNotifier::default());
    let timers = Arc::new(TimerRegistry::new(clock.clone(), notifier.clone()));
    let service = Arc::new(AttemptService::new(store.clone(), timers.clone(), clock.clone()));
    Harness { store, clock, notifier, timers, service }
}

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) clock: Arc<ManualClock>,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();
    std::env::set_var("ADMIN_TOKEN", ADMIN_TOKEN);

    let settings = Settings::load().expect("settings");
    let clock = Arc::new(ManualClock::new(base_time()));
    let state = AppState::new(settings, seeded_store(), clock.clone());
    let app = api::router::router(state.clone());

    TestContext { state, app, clock, _guard: guard }
}

pub(crate) fn request(
    method: Method,
    uri: &str,
    user_id: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(crate) async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&body).expect("json body")
}
