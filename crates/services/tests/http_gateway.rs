use std::time::Duration;

use quiz_core::ElapsedTime;
use quiz_core::model::{
    AttemptId, AttemptResult, CourseId, ModuleId, OptionLetter, QuestionId, QuestionOutcome,
    QuizId, UserId,
};
use quiz_core::time::fixed_now;
use services::{GatewayConfig, HttpPersistenceGateway, PersistenceError, PersistenceGateway};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves exactly one HTTP response and hands back the raw request it received.
async fn respond_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            if request_complete(&raw) {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&raw).into_owned()
    });
    (base_url, handle)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some((head, body)) = text.split_once("\r\n\r\n") else {
        return false;
    };
    let length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    body.len() >= length
}

fn result() -> AttemptResult {
    AttemptResult {
        user_id: Some(UserId::new("learner-1")),
        course_id: CourseId::new("ftce-elementary"),
        module_id: ModuleId::new("module-1"),
        quiz_id: QuizId::new("module-1-quiz"),
        total_questions: 1,
        correct_answers: 1,
        score_percent: 100.0,
        elapsed: ElapsedTime::from_secs(150),
        passed: true,
        outcomes: vec![QuestionOutcome {
            question_id: QuestionId::new("q1"),
            selected: Some(OptionLetter::new("D")),
            correct_answer: OptionLetter::new("D"),
            is_correct: true,
        }],
        submitted_at: fixed_now(),
    }
}

fn gateway(base_url: String) -> HttpPersistenceGateway {
    let mut config = GatewayConfig::new(base_url);
    config.api_token = Some("test-token".into());
    config.timeout = Duration::from_secs(5);
    HttpPersistenceGateway::new(config).unwrap()
}

#[tokio::test]
async fn posts_camel_case_attempt_with_bearer_token() {
    let attempt_id = AttemptId::generate();
    let body = format!(
        r#"{{"success":true,"attemptId":"{}","score":100.0,"passed":true}}"#,
        attempt_id.value()
    );
    let (base_url, server) = respond_once("200 OK", body).await;

    let recorded = gateway(base_url).record_attempt(&result()).await.unwrap();
    assert_eq!(recorded, attempt_id);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /quiz/submit HTTP/1.1"));
    assert!(
        request
            .to_ascii_lowercase()
            .contains("authorization: bearer test-token")
    );
    assert!(request.contains(r#""userId":"learner-1""#));
    assert!(request.contains(r#""timeTakenMinutes":3"#));
    assert!(request.contains(r#""userAnswer":"D""#));
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let (base_url, server) =
        respond_once("403 Forbidden", r#"{"error":"Not enrolled"}"#.to_string()).await;

    let err = gateway(base_url).record_attempt(&result()).await.unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::HttpStatus(status) if status.as_u16() == 403
    ));
    server.await.unwrap();
}

#[tokio::test]
async fn anonymous_attempt_never_hits_the_network() {
    let mut anonymous = result();
    anonymous.user_id = None;
    // Nothing listens here; an actual request would fail with a transport error.
    let err = gateway("http://127.0.0.1:9".into())
        .record_attempt(&anonymous)
        .await
        .unwrap_err();
    assert!(matches!(err, PersistenceError::Unauthorized));
}
