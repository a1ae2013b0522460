use quiz_core::model::{CourseId, ModuleContent, ModuleId, OptionLetter, UserId};
use quiz_core::session::{Learner, QuizEvent, QuizIntent};
use quiz_core::time::fixed_clock;
use services::{AppServices, PersistenceError, PersistenceOutcome, QuizConfig};
use storage::repository::{ContentRepository, Storage};

const MODULE_1: &str = include_str!("../../storage/fixtures/module-1.json");
const CORRECT: [&str; 4] = ["D", "B", "A", "B"];

async fn services() -> (Storage, AppServices) {
    let storage = Storage::in_memory();
    let module: ModuleContent = serde_json::from_str(MODULE_1).unwrap();
    storage
        .content
        .upsert_module(&CourseId::new("ftce-elementary"), &module)
        .await
        .unwrap();
    let services = AppServices::from_storage(&storage, &QuizConfig::default(), fixed_clock())
        .unwrap();
    (storage, services)
}

async fn take_quiz(
    services: &AppServices,
    learner: Learner,
    letters: [&str; 4],
) -> (f64, PersistenceOutcome) {
    let quiz_loop = services.quiz_loop();
    let mut session = quiz_loop
        .start_quiz(
            &CourseId::new("ftce-elementary"),
            &ModuleId::new("module-1"),
            learner,
        )
        .await
        .unwrap();

    for (i, letter) in letters.iter().enumerate() {
        quiz_loop
            .handle(&mut session, QuizIntent::SelectCurrent(OptionLetter::new(*letter)))
            .unwrap();
        if i + 1 < letters.len() {
            quiz_loop.handle(&mut session, QuizIntent::Next).unwrap();
        }
    }
    quiz_loop.handle(&mut session, QuizIntent::Tick).unwrap();

    let step = quiz_loop.handle(&mut session, QuizIntent::Submit).unwrap();
    let QuizEvent::Submitted(result) = step.event else {
        panic!("expected submission");
    };
    let outcome = step.persistence.expect("persistence task").outcome().await;

    // Ticks after completion are ignored.
    let after = quiz_loop.handle(&mut session, QuizIntent::Tick).unwrap();
    assert_eq!(after.event, QuizEvent::Ignored);

    (result.score_percent, outcome)
}

#[tokio::test]
async fn enrolled_learner_attempt_is_saved_and_listed() {
    let (_storage, services) = services().await;
    let user = UserId::new("learner-1");
    services
        .enrollments()
        .enroll(&user, "FL", "ftce", "ftce-elementary")
        .await
        .unwrap();

    let (score, outcome) =
        take_quiz(&services, Learner::authenticated(user.clone()), CORRECT).await;
    assert_eq!(score, 100.0);
    let PersistenceOutcome::Saved(attempt_id) = outcome else {
        panic!("expected saved outcome, got {outcome:?}");
    };

    let history = services.history();
    let attempts = history
        .recent_attempts(&user, &CourseId::new("ftce-elementary"), 10)
        .await
        .unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].id, attempt_id);
    assert!(attempts[0].passed);

    let details = history.attempt_details(&user, attempt_id).await.unwrap();
    assert_eq!(details.answers.len(), 4);
    assert!(details.answers.iter().all(|a| a.is_correct));
}

#[tokio::test]
async fn anonymous_attempt_is_scored_but_not_saved() {
    let (_storage, services) = services().await;
    let (score, outcome) = take_quiz(&services, Learner::anonymous(), ["A", "B", "A", "A"]).await;
    assert_eq!(score, 50.0);
    assert!(matches!(outcome, PersistenceOutcome::Skipped));
}

#[tokio::test]
async fn unenrolled_attempt_keeps_local_result() {
    let (_storage, services) = services().await;
    let (score, outcome) = take_quiz(
        &services,
        Learner::authenticated(UserId::new("stranger")),
        CORRECT,
    )
    .await;
    assert_eq!(score, 100.0);
    assert!(matches!(
        outcome,
        PersistenceOutcome::Failed(PersistenceError::NotEnrolled)
    ));
    assert!(outcome.notice().is_some());
}
