//! Line-based quiz loop: input lines, timer ticks and the background save feed
//! one session.

use quiz_core::model::{CourseId, ModuleId, UserId};
use quiz_core::session::{Learner, QuizIntent};
use services::{AppServices, PersistenceOutcome, PersistenceTask, QuizLoopService};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use ui::ViewError;
use ui::vm::{QuizVm, QuizVmOutcome, persistence_notice, start_quiz};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(String),
    Next,
    Previous,
    Submit,
    Explain,
    Retake,
    Quit,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Answering,
    Finished,
}

/// While answering, every single letter is an answer; commands are symbols or
/// words. On the results screen `r` and `q` are free again.
fn parse_input(line: &str, phase: Phase) -> Input {
    let command = line.trim().to_ascii_lowercase();
    match (phase, command.as_str()) {
        (_, "quit" | "exit") | (Phase::Finished, "q") => Input::Quit,
        (Phase::Finished, "r" | "retake") => Input::Retake,
        (Phase::Answering, ">" | "next") => Input::Next,
        (Phase::Answering, "<" | "prev" | "previous") => Input::Previous,
        (Phase::Answering, "!" | "submit") => Input::Submit,
        (Phase::Answering, "?" | "explain") => Input::Explain,
        (Phase::Answering, letter)
            if letter.len() == 1 && letter.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            Input::Answer(letter.to_ascii_uppercase())
        }
        _ => Input::Unknown,
    }
}

/// What one interactive run did.
#[derive(Debug, Default, PartialEq, Eq)]
struct QuizRun {
    submitted: u32,
    /// Uploads still running when the learner quit; they are cancelled.
    abandoned_saves: u32,
}

fn draw(vm: &QuizVm) {
    match vm.screen() {
        Some(screen) => println!("\n{screen}"),
        None => println!("This quiz has no questions."),
    }
}

fn show_error(err: ViewError) {
    println!("! {}", err.message());
}

/// Resolves with the pending save's outcome; never resolves when there is none.
async fn saved(pending: &mut Option<PersistenceTask>) -> PersistenceOutcome {
    match pending {
        Some(task) => task.finished().await,
        None => std::future::pending().await,
    }
}

/// Run one interactive quiz on stdin until the learner quits or input closes.
///
/// # Errors
///
/// Returns an error if the quiz cannot be loaded or stdin fails.
pub async fn take_quiz(
    services: &AppServices,
    course_id: &CourseId,
    module_id: &ModuleId,
    user: Option<UserId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let learner = user.map_or_else(Learner::anonymous, Learner::authenticated);
    let input = BufReader::new(tokio::io::stdin());
    let run = run_quiz(&services.quiz_loop(), course_id, module_id, learner, input).await?;
    debug!(?run, "quiz loop finished");
    Ok(())
}

async fn run_quiz<R>(
    quiz_loop: &QuizLoopService,
    course_id: &CourseId,
    module_id: &ModuleId,
    learner: Learner,
    input: R,
) -> Result<QuizRun, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    let mut vm = start_quiz(quiz_loop, course_id, module_id, learner)
        .await
        .map_err(|err| err.message())?;
    let mut phase = Phase::Answering;
    let mut pending: Option<PersistenceTask> = None;
    let mut run = QuizRun::default();
    let mut lines = input.lines();

    draw(&vm);
    loop {
        tokio::select! {
            tick = vm.next_tick() => {
                // Ticks only advance the clock; the next redraw shows it.
                if let Err(err) = vm.apply(quiz_loop, tick) {
                    debug!(?err, "tick rejected");
                }
            }
            outcome = saved(&mut pending) => {
                pending = None;
                if let Some(notice) = persistence_notice(&outcome) {
                    println!("{notice}");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line, phase) {
                    Input::Quit => break,
                    Input::Explain => {
                        vm.toggle_explanation();
                        draw(&vm);
                    }
                    Input::Answer(letter) => match vm.select(quiz_loop, &letter) {
                        Ok(_) => draw(&vm),
                        Err(err) => show_error(err),
                    },
                    input @ (Input::Next | Input::Previous | Input::Submit) => {
                        let intent = match input {
                            Input::Next => QuizIntent::Next,
                            Input::Previous => QuizIntent::Previous,
                            _ => QuizIntent::Submit,
                        };
                        match vm.apply(quiz_loop, intent) {
                            Ok(QuizVmOutcome::Submitted { results, persistence }) => {
                                phase = Phase::Finished;
                                run.submitted += 1;
                                print!("\n{results}");
                                if pending.replace(persistence).is_some_and(|earlier| !earlier.is_finished()) {
                                    debug!("earlier save still running in the background");
                                }
                                println!("[r] retake  [q] quit");
                            }
                            Ok(_) => draw(&vm),
                            Err(err) => show_error(err),
                        }
                    }
                    Input::Retake => match vm.apply(quiz_loop, QuizIntent::Retake) {
                        Ok(_) => {
                            phase = Phase::Answering;
                            draw(&vm);
                        }
                        Err(err) => show_error(err),
                    },
                    Input::Unknown => match phase {
                        Phase::Finished => println!("[r] retake  [q] quit"),
                        Phase::Answering => println!("! Unrecognized input."),
                    },
                }
            }
        }
    }

    if let Some(task) = pending.take()
        && !task.is_finished()
    {
        task.abort();
        run.abandoned_saves += 1;
        warn!("quit before the last attempt was saved");
        println!("Your last results were still being saved and were not recorded.");
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::model::{
        AttemptId, AttemptResult, LessonId, LessonSummary, ModuleContent, QuestionDraft,
        QuestionKind, QuizContent,
    };
    use quiz_core::time::fixed_clock;
    use services::PersistenceError;
    use std::sync::Arc;
    use std::time::Duration;
    use storage::repository::{ContentRepository, InMemoryRepository};

    #[test]
    fn letters_are_answers_while_answering() {
        let answering = Phase::Answering;
        assert_eq!(parse_input(" > \n", answering), Input::Next);
        assert_eq!(parse_input("<", answering), Input::Previous);
        assert_eq!(parse_input("submit", answering), Input::Submit);
        assert_eq!(parse_input("?", answering), Input::Explain);
        for letter in ["e", "n", "p", "q", "r", "s"] {
            assert_eq!(
                parse_input(letter, answering),
                Input::Answer(letter.to_ascii_uppercase())
            );
        }
        assert_eq!(parse_input("quit", answering), Input::Quit);
        assert_eq!(parse_input("ab", answering), Input::Unknown);
        assert_eq!(parse_input("", answering), Input::Unknown);
    }

    #[test]
    fn results_screen_takes_short_commands() {
        assert_eq!(parse_input("r", Phase::Finished), Input::Retake);
        assert_eq!(parse_input("Q", Phase::Finished), Input::Quit);
        assert_eq!(parse_input("b", Phase::Finished), Input::Unknown);
        assert_eq!(parse_input(">", Phase::Finished), Input::Unknown);
    }

    struct StalledGateway;

    #[async_trait]
    impl services::PersistenceGateway for StalledGateway {
        async fn record_attempt(
            &self,
            _result: &AttemptResult,
        ) -> Result<AttemptId, PersistenceError> {
            std::future::pending().await
        }
    }

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
                title: None,
                passing_score: None,
                questions: ["E", "S"]
                    .iter()
                    .enumerate()
                    .map(|(i, c)| QuestionDraft {
                        id: format!("q{}", i + 1),
                        kind: QuestionKind::MultipleChoice,
                        prompt: format!("Question {}", i + 1),
                        options: ["A", "B", "C", "D", "E", "S"]
                            .iter()
                            .map(|l| format!("{l}) option"))
                            .collect(),
                        correct_answer: (*c).into(),
                        explanation: String::new(),
                    })
                    .collect(),
            },
        };
        repo.upsert_module(&CourseId::new("c"), &module).await.unwrap();
        QuizLoopService::new(fixed_clock(), Arc::new(repo), Arc::new(StalledGateway))
    }

    #[tokio::test(start_paused = true)]
    async fn quitting_is_not_held_up_by_a_stalled_save() {
        let quiz_loop = quiz_loop().await;
        let script: &[u8] = b"e\n>\ns\n!\nq\n";

        let run = tokio::time::timeout(
            Duration::from_secs(30),
            run_quiz(
                &quiz_loop,
                &CourseId::new("c"),
                &ModuleId::new("m1"),
                Learner::authenticated(UserId::new("u1")),
                script,
            ),
        )
        .await
        .expect("quiz loop should not wait for the save")
        .unwrap();

        assert_eq!(
            run,
            QuizRun {
                submitted: 1,
                abandoned_saves: 1,
            }
        );
    }
}
