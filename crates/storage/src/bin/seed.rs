use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use quiz_core::model::{CourseId, Enrollment, ModuleContent, UserId};
use storage::repository::{ContentRepository, EnrollmentRepository, Storage, StorageError};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    course_id: CourseId,
    modules: Vec<PathBuf>,
    user: Option<UserId>,
    state: String,
    exam: String,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCourse { raw: String },
    InvalidUser { raw: String },
    InvalidNow { raw: String },
    NoModules,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCourse { raw } => write!(f, "invalid --course value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --enroll value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
            ArgsError::NoModules => write!(f, "at least one --module <file> is required"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("TEACHCERT_DB_URL").unwrap_or_else(|_| "sqlite://dev.sqlite3".into());
        let mut course_id = CourseId::new(
            std::env::var("TEACHCERT_COURSE_ID").unwrap_or_else(|_| "ftce-elementary".into()),
        );
        let mut modules = Vec::new();
        let mut user = None;
        let mut state = "FL".to_string();
        let mut exam = "ftce".to_string();
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--course" => {
                    let value = require_value(&mut args, "--course")?;
                    course_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCourse { raw: value.clone() })?;
                }
                "--module" => {
                    modules.push(PathBuf::from(require_value(&mut args, "--module")?));
                }
                "--enroll" => {
                    let value = require_value(&mut args, "--enroll")?;
                    user = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidUser { raw: value.clone() })?,
                    );
                }
                "--state" => state = require_value(&mut args, "--state")?,
                "--exam" => exam = require_value(&mut args, "--exam")?,
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if modules.is_empty() {
            return Err(ArgsError::NoModules);
        }

        Ok(Self {
            db_url,
            course_id,
            modules,
            user,
            state,
            exam,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- --module <file.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://dev.sqlite3)");
    eprintln!("  --course <id>             Course the modules belong to (default: ftce-elementary)");
    eprintln!("  --module <file>           Module content JSON; repeat for several modules");
    eprintln!("  --enroll <user>           Also enroll this user in the course");
    eprintln!("  --state <id>              State for the enrollment (default: FL)");
    eprintln!("  --exam <id>               Exam for the enrollment (default: ftce)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TEACHCERT_DB_URL, TEACHCERT_COURSE_ID");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut questions = 0;
    for path in &args.modules {
        let raw = std::fs::read_to_string(path)?;
        let module: ModuleContent = serde_json::from_str(&raw)?;
        storage.content.upsert_module(&args.course_id, &module).await?;
        questions += module.quiz.questions.len();
    }

    if let Some(user) = args.user {
        let enrollment = Enrollment::new(
            user.clone(),
            &args.state,
            &args.exam,
            args.course_id.as_str(),
            now,
        )?;
        match storage.enrollments.insert_enrollment(&enrollment).await {
            Ok(()) => println!("Enrolled {user} in {}", args.course_id),
            Err(StorageError::Conflict) => println!("{user} already enrolled in {}", args.course_id),
            Err(err) => return Err(err.into()),
        }
    }

    println!(
        "Seeded {} module(s) with {} question(s) into {} for course {}",
        args.modules.len(),
        questions,
        args.db_url,
        args.course_id
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
