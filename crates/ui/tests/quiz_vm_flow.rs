use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{
    CourseId, LessonId, LessonSummary, ModuleContent, ModuleId, QuestionDraft, QuestionKind,
    QuizContent,
};
use quiz_core::ElapsedTime;
use quiz_core::session::{Learner, QuizIntent};
use quiz_core::time::fixed_clock;
use services::{LocalGateway, QuizLoopService, SubmissionService};
use storage::repository::{ContentRepository, InMemoryRepository};
use ui::ViewError;
use ui::vm::{QuizVmOutcome, start_quiz};

async fn quiz_loop() -> QuizLoopService {
    let repo = InMemoryRepository::new();
    let module = ModuleContent {
        module_id: ModuleId::new("m1"),
        lessons: vec![LessonSummary {
            id: LessonId::new("l1"),
            number: 1,
            title: "Intro".into(),
            duration: None,
        }],
        quiz: QuizContent {
            title: Some("Check-in".into()),
            passing_score: None,
            questions: ["B", "A"]
                .iter()
                .enumerate()
                .map(|(i, c)| QuestionDraft {
                    id: format!("q{}", i + 1),
                    kind: QuestionKind::MultipleChoice,
                    prompt: format!("Question {}", i + 1),
                    options: vec!["A) a".into(), "B) b".into(), "C) c".into()],
                    correct_answer: (*c).into(),
                    explanation: format!("Explanation {}", i + 1),
                })
                .collect(),
        },
    };
    repo.upsert_module(&CourseId::new("c"), &module).await.unwrap();

    let submissions = Arc::new(SubmissionService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    ));
    QuizLoopService::new(
        fixed_clock(),
        Arc::new(repo),
        Arc::new(LocalGateway::new(submissions)),
    )
}

#[tokio::test]
async fn quiz_screen_tracks_answers_and_explanation() {
    let quiz_loop = quiz_loop().await;
    let mut vm = start_quiz(
        &quiz_loop,
        &CourseId::new("c"),
        &ModuleId::new("m1"),
        Learner::anonymous(),
    )
    .await
    .unwrap();

    let screen = vm.screen().unwrap();
    assert_eq!(screen.title, "Check-in");
    assert_eq!(screen.heading, "Question 1 of 2");
    assert_eq!(screen.progress_percent, 50);
    assert_eq!(screen.timer, "0:00");
    assert!(!screen.can_toggle_explanation);
    assert!(!screen.submit_enabled);

    // No explanation before an answer exists.
    vm.toggle_explanation();
    assert!(vm.screen().unwrap().explanation.is_none());

    vm.select(&quiz_loop, "B").unwrap();
    vm.toggle_explanation();
    let screen = vm.screen().unwrap();
    assert_eq!(screen.answered_line, "1 of 2 questions answered");
    let explanation = screen.explanation.expect("explanation shown");
    assert_eq!(explanation.correct_answer, "B");

    // Navigating hides it again.
    vm.apply(&quiz_loop, QuizIntent::Next).unwrap();
    let screen = vm.screen().unwrap();
    assert!(screen.explanation.is_none());
    assert!(screen.is_last);
    assert!(!screen.submit_enabled);

    assert_eq!(
        vm.select(&quiz_loop, "Z").err(),
        Some(ViewError::InvalidChoice)
    );

    vm.apply(&quiz_loop, QuizIntent::Tick).unwrap();
    vm.select(&quiz_loop, "C").unwrap();
    let screen = vm.screen().unwrap();
    assert!(screen.submit_enabled);
    assert_eq!(screen.timer, "0:01");
    assert!(screen.to_string().contains("[!] submit"));
}

#[tokio::test]
async fn submitting_produces_results_and_anonymous_notice() {
    let quiz_loop = quiz_loop().await;
    let mut vm = start_quiz(
        &quiz_loop,
        &CourseId::new("c"),
        &ModuleId::new("m1"),
        Learner::anonymous(),
    )
    .await
    .unwrap();

    vm.select(&quiz_loop, "B").unwrap();
    let Err(err) = vm.apply(&quiz_loop, QuizIntent::Submit) else {
        panic!("submit with a gap must fail");
    };
    assert_eq!(err, ViewError::Incomplete { unanswered: 1 });

    vm.apply(&quiz_loop, QuizIntent::Next).unwrap();
    vm.select(&quiz_loop, "C").unwrap();

    let QuizVmOutcome::Submitted {
        mut results,
        persistence,
    } = vm.apply(&quiz_loop, QuizIntent::Submit).unwrap()
    else {
        panic!("expected submission");
    };
    assert_eq!(results.percent, 50);
    assert_eq!(results.headline, "Keep Practicing!");
    assert_eq!(results.passing_line, "Passing score: 70% - You scored 50%");

    results.set_persistence(&persistence.outcome().await);
    assert_eq!(
        results.notice.as_deref(),
        Some("Sign in to save your quiz results.")
    );
    assert!(results.to_string().contains("Correct Answers:  1/2"));

    assert!(matches!(
        vm.apply(&quiz_loop, QuizIntent::Retake).unwrap(),
        QuizVmOutcome::Restarted
    ));
    assert_eq!(vm.session().answered_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn timer_stops_on_submit_and_restarts_on_retake() {
    let quiz_loop = quiz_loop().await;
    let mut vm = start_quiz(
        &quiz_loop,
        &CourseId::new("c"),
        &ModuleId::new("m1"),
        Learner::anonymous(),
    )
    .await
    .unwrap();
    assert!(vm.timer_running());

    let tick = vm.next_tick().await;
    vm.apply(&quiz_loop, tick).unwrap();
    assert_eq!(vm.session().elapsed(), ElapsedTime::from_secs(1));

    vm.select(&quiz_loop, "B").unwrap();
    vm.apply(&quiz_loop, QuizIntent::Next).unwrap();
    vm.select(&quiz_loop, "A").unwrap();
    // Leave ticks queued while the learner finishes.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(matches!(
        vm.apply(&quiz_loop, QuizIntent::Submit).unwrap(),
        QuizVmOutcome::Submitted { .. }
    ));
    assert!(!vm.timer_running());

    // Nothing ticks a finished session, queued ticks included.
    let waited = tokio::time::timeout(Duration::from_secs(5), vm.next_tick()).await;
    assert!(waited.is_err());
    assert_eq!(vm.session().elapsed(), ElapsedTime::from_secs(1));

    assert!(matches!(
        vm.apply(&quiz_loop, QuizIntent::Retake).unwrap(),
        QuizVmOutcome::Restarted
    ));
    assert!(vm.timer_running());
    assert_eq!(vm.session().elapsed(), ElapsedTime::ZERO);

    let tick = vm.next_tick().await;
    vm.apply(&quiz_loop, tick).unwrap();
    assert_eq!(vm.session().elapsed(), ElapsedTime::from_secs(1));
}
