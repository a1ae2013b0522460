use std::fmt;
use std::path::{Path, PathBuf};

use quiz_core::model::{CourseId, LessonId, ModuleContent, ModuleId, PassingThreshold, UserId};
use services::config::parse_passing_score;
use services::{
    AppServices, AttemptHistoryService, BookmarkError, CertificateServiceError, Clock, QuizConfig,
};
use storage::repository::{ContentRepository, Storage};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod terminal;

/// Recent study days listed under the streak.
const STREAK_DAYS_SHOWN: usize = 7;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidId { flag: &'static str, raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidPassingScore { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => {
                write!(f, "invalid {flag} value (expected a whole number): {raw}")
            }
            ArgsError::InvalidPassingScore { raw } => {
                write!(f, "invalid --passing-score value (expected 0-100): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn parse_number(flag: &'static str, raw: String) -> Result<u32, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    History,
    Enroll,
    Complete,
    Progress,
    Certificate,
    Achievements,
    Bookmark,
    Unbookmark,
    Bookmarks,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "history" => Some(Self::History),
            "enroll" => Some(Self::Enroll),
            "complete" => Some(Self::Complete),
            "progress" => Some(Self::Progress),
            "certificate" => Some(Self::Certificate),
            "achievements" => Some(Self::Achievements),
            "bookmark" => Some(Self::Bookmark),
            "unbookmark" => Some(Self::Unbookmark),
            "bookmarks" => Some(Self::Bookmarks),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: Option<String>,
    course_id: CourseId,
    module_id: Option<ModuleId>,
    user: Option<UserId>,
    file: Option<PathBuf>,
    state: String,
    exam: String,
    lesson: Option<LessonId>,
    minutes: u32,
    limit: u32,
    passing_score: Option<PassingThreshold>,
    course_name: Option<String>,
    name: Option<String>,
    notes: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: None,
            course_id: CourseId::new(
                std::env::var("TEACHCERT_COURSE_ID").unwrap_or_else(|_| "ftce-elementary".into()),
            ),
            module_id: None,
            user: None,
            file: None,
            state: "FL".into(),
            exam: "ftce".into(),
            lesson: None,
            minutes: 0,
            limit: AttemptHistoryService::DEFAULT_LIMIT,
            passing_score: None,
            course_name: std::env::var("TEACHCERT_COURSE_NAME").ok(),
            name: None,
            notes: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = Some(normalize_sqlite_url(value));
                }
                "--course" => {
                    parsed.course_id = parse_id("--course", require_value(args, "--course")?)?;
                }
                "--module" => {
                    parsed.module_id =
                        Some(parse_id("--module", require_value(args, "--module")?)?);
                }
                "--user" => {
                    parsed.user = Some(parse_id("--user", require_value(args, "--user")?)?);
                }
                "--lesson" => {
                    parsed.lesson = Some(parse_id("--lesson", require_value(args, "--lesson")?)?);
                }
                "--file" => parsed.file = Some(PathBuf::from(require_value(args, "--file")?)),
                "--state" => parsed.state = require_value(args, "--state")?,
                "--exam" => parsed.exam = require_value(args, "--exam")?,
                "--minutes" => {
                    parsed.minutes = parse_number("--minutes", require_value(args, "--minutes")?)?;
                }
                "--limit" => {
                    parsed.limit = parse_number("--limit", require_value(args, "--limit")?)?;
                }
                "--passing-score" => {
                    let value = require_value(args, "--passing-score")?;
                    let threshold = parse_passing_score(&value)
                        .map_err(|_| ArgsError::InvalidPassingScore { raw: value.clone() })?;
                    parsed.passing_score = Some(threshold);
                }
                "--course-name" => {
                    parsed.course_name = Some(require_value(args, "--course-name")?);
                }
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--notes" => parsed.notes = Some(require_value(args, "--notes")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn require_user(&self) -> Result<&UserId, ArgsError> {
        self.user
            .as_ref()
            .ok_or(ArgsError::MissingFlag { flag: "--user" })
    }

    fn require_module(&self) -> Result<&ModuleId, ArgsError> {
        self.module_id
            .as_ref()
            .ok_or(ArgsError::MissingFlag { flag: "--module" })
    }

    fn require_lesson(&self) -> Result<&LessonId, ArgsError> {
        self.lesson
            .as_ref()
            .ok_or(ArgsError::MissingFlag { flag: "--lesson" })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  teachcert [take] --module <id> [--user <id>] [options]");
    eprintln!("  teachcert history --user <id> [--limit <n>] [options]");
    eprintln!("  teachcert enroll --user <id> [--state <id>] [--exam <id>] [options]");
    eprintln!("  teachcert complete --user <id> --module <id> --lesson <id> [--minutes <n>]");
    eprintln!("  teachcert progress --user <id> [--module <id>] [options]");
    eprintln!("  teachcert certificate --user <id> [--course-name <text>] [--name <text>]");
    eprintln!("  teachcert achievements --user <id> [options]");
    eprintln!("  teachcert bookmark --user <id> --module <id> --lesson <id> [--notes <text>]");
    eprintln!("  teachcert unbookmark --user <id> --lesson <id>");
    eprintln!("  teachcert bookmarks --user <id> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://dev.sqlite3)");
    eprintln!("  --course <id>             Course id (default: ftce-elementary)");
    eprintln!("  --module <id>             Module whose quiz or lessons to use");
    eprintln!("  --user <id>               Signed-in user; omit to take a quiz anonymously");
    eprintln!("  --file <module.json>      Take the quiz from a module file in memory");
    eprintln!("  --passing-score <0-100>   Override every quiz's passing score");
    eprintln!("  --limit <n>               Attempts to list (default: 20)");
    eprintln!("  --course-name <text>      Course title printed on certificates");
    eprintln!("  --name <text>             Learner name printed on certificates");
    eprintln!("  --notes <text>            Notes saved with a bookmark");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TEACHCERT_DB_URL, TEACHCERT_COURSE_ID, TEACHCERT_COURSE_NAME,");
    eprintln!("  TEACHCERT_PASSING_SCORE,");
    eprintln!("  TEACHCERT_GATEWAY_URL, TEACHCERT_API_TOKEN, TEACHCERT_HTTP_TIMEOUT_SECS,");
    eprintln!("  RUST_LOG (default: warn)");
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim().to_string();
    if trimmed.starts_with("sqlite://") || trimmed.starts_with("sqlite::memory:") {
        return trimmed;
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(&trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn init_tracing() {
    // Diagnostics go to stderr so they never interleave with the quiz screen.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Services over an in-memory store seeded from a module file. The user, if any,
/// is enrolled so the attempt can be recorded.
async fn in_memory_services(
    path: &Path,
    args: &Args,
    config: &QuizConfig,
    clock: Clock,
) -> Result<(AppServices, ModuleId), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let module: ModuleContent = serde_json::from_str(&raw)?;
    let storage = Storage::in_memory();
    storage.content.upsert_module(&args.course_id, &module).await?;
    debug!(module_id = %module.module_id, path = %path.display(), "loaded module file");

    let services = AppServices::from_storage(&storage, config, clock)?;
    if let Some(user) = &args.user {
        services
            .enrollments()
            .enroll(user, &args.state, &args.exam, args.course_id.as_str())
            .await?;
    }
    Ok((services, module.module_id))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Take,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Take,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let args = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    let mut config = QuizConfig::from_env()?;
    if let Some(db_url) = &args.db_url {
        config.db_url.clone_from(db_url);
    }
    if args.passing_score.is_some() {
        config.passing_threshold = args.passing_score;
    }
    let clock = Clock::default_clock();

    if let (Command::Take, Some(path)) = (cmd, &args.file) {
        let (services, module_id) = in_memory_services(path, &args, &config, clock).await?;
        return terminal::take_quiz(&services, &args.course_id, &module_id, args.user).await;
    }

    prepare_sqlite_dir(&config.db_url)?;
    let services = AppServices::new_sqlite(&config, clock).await?;
    info!(command = ?cmd, db = %config.db_url, "starting");

    match cmd {
        Command::Take => {
            let module_id = args.require_module()?;
            terminal::take_quiz(&services, &args.course_id, module_id, args.user.clone()).await
        }
        Command::History => {
            let user = args.require_user()?;
            let records = services
                .history()
                .recent_attempts(user, &args.course_id, args.limit)
                .await?;
            print!(
                "{}",
                ui::render::HistoryView(&ui::vm::map_attempt_cards(&records))
            );
            Ok(())
        }
        Command::Enroll => {
            let user = args.require_user()?;
            let outcome = services
                .enrollments()
                .enroll(user, &args.state, &args.exam, args.course_id.as_str())
                .await?;
            if outcome.already_enrolled {
                println!("{user} is already enrolled in {}", args.course_id);
            } else {
                println!(
                    "Enrolled {user} in {} ({} {})",
                    args.course_id, outcome.enrollment.state_id, outcome.enrollment.exam_id
                );
            }
            Ok(())
        }
        Command::Complete => {
            let user = args.require_user()?;
            let module_id = args.require_module()?;
            let lesson_id = args.require_lesson()?;
            services
                .progress()
                .complete_lesson(user, &args.course_id, module_id, lesson_id, args.minutes)
                .await?;
            let summary = services
                .progress()
                .module_progress(user, &args.course_id, module_id)
                .await?;
            println!(
                "Lesson {lesson_id} complete. Module progress: {}/{} ({}%)",
                summary.completed, summary.total, summary.percent
            );
            Ok(())
        }
        Command::Progress => {
            let user = args.require_user()?;
            let progress = services.progress();
            let (label, summary) = match &args.module_id {
                Some(module_id) => (
                    format!("Module {module_id}"),
                    progress
                        .module_progress(user, &args.course_id, module_id)
                        .await?,
                ),
                None => (
                    format!("Course {}", args.course_id),
                    progress.course_progress(user, &args.course_id).await?,
                ),
            };
            println!(
                "{label}: {}/{} lessons ({}%)",
                summary.completed, summary.total, summary.percent
            );
            Ok(())
        }
        Command::Certificate => {
            let user = args.require_user()?;
            let course_name = args
                .course_name
                .clone()
                .unwrap_or_else(|| args.course_id.to_string());
            let certificate = match services
                .certificates()
                .issue(user, &args.course_id, &course_name)
                .await
            {
                Ok(certificate) => certificate,
                Err(CertificateServiceError::NotEligible {
                    lessons_remaining,
                    quizzes_remaining,
                }) => {
                    println!(
                        "Not finished yet: {lessons_remaining} lessons and \
                         {quizzes_remaining} module quizzes to go."
                    );
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };
            let vm = match &args.name {
                Some(name) => ui::vm::CertificateVm::new(&certificate, name.as_str()),
                None => ui::vm::CertificateVm::from(&certificate),
            };
            print!("{vm}");
            Ok(())
        }
        Command::Achievements => {
            let user = args.require_user()?;
            let activity = services.activity();
            let streak = activity.streak(user).await?;
            print!("{}", ui::vm::StreakVm::new(&streak, STREAK_DAYS_SHOWN));
            println!();
            let achievements = activity.achievements(user).await?;
            print!(
                "{}",
                ui::render::AchievementsView(&ui::vm::map_achievements(&achievements))
            );
            Ok(())
        }
        Command::Bookmark => {
            let user = args.require_user()?;
            let module_id = args.require_module()?;
            let lesson_id = args.require_lesson()?;
            services
                .bookmarks()
                .add(
                    user,
                    &args.course_id,
                    module_id,
                    lesson_id,
                    args.notes.as_deref(),
                )
                .await?;
            println!("Bookmarked lesson {lesson_id}.");
            Ok(())
        }
        Command::Unbookmark => {
            let user = args.require_user()?;
            let lesson_id = args.require_lesson()?;
            match services.bookmarks().remove(user, lesson_id).await {
                Ok(()) => println!("Removed bookmark for lesson {lesson_id}."),
                Err(BookmarkError::NotFound) => println!("Lesson {lesson_id} was not bookmarked."),
                Err(err) => return Err(err.into()),
            }
            Ok(())
        }
        Command::Bookmarks => {
            let user = args.require_user()?;
            let bookmarks = services.bookmarks().list(user).await?;
            print!(
                "{}",
                ui::render::BookmarksView(&ui::vm::map_bookmarks(&bookmarks))
            );
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

