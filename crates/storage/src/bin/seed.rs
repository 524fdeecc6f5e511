use std::str::FromStr;

use chrono::{DateTime, Utc};
use course_core::evaluate_attempt;
use course_core::model::{
    Attempt, Chapter, ChapterId, CompletionSettingsDraft, ContentUnit, Course, CourseId,
    LearnerId, OrderingScoring, Page, PageId, ProgressRecord, Question, QuestionId, QuestionKind,
    QuizAnswer, QuizContent, ReflectionContent, ReorderContent, UnitContent, UnitId,
};
use storage::repository::Storage;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DB_URL: &str = "sqlite:dev.sqlite3";

/// What the seeder should write, resolved from env then flags.
#[derive(Debug, Clone, PartialEq)]
struct SeedPlan {
    db_url: String,
    course_id: CourseId,
    learner_id: LearnerId,
    now: Option<DateTime<Utc>>,
    settings: CompletionSettingsDraft,
    with_progress: bool,
    help: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum PlanError {
    #[error("{flag} requires a value")]
    MissingValue { flag: String },
    #[error("{flag} does not take a value")]
    UnexpectedValue { flag: String },
    #[error("unknown argument: {0}")]
    UnknownArg(String),
    #[error("invalid value for {source_name}: {raw:?}")]
    Invalid { source_name: String, raw: String },
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.into(),
            course_id: CourseId::new(1),
            learner_id: LearnerId::new(1),
            now: None,
            settings: CompletionSettingsDraft::default(),
            with_progress: true,
            help: false,
        }
    }
}

fn parse_as<T: FromStr>(source_name: &str, raw: &str) -> Result<T, PlanError> {
    raw.trim().parse().map_err(|_| PlanError::Invalid {
        source_name: source_name.into(),
        raw: raw.into(),
    })
}

fn parse_now(source_name: &str, raw: &str) -> Result<DateTime<Utc>, PlanError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| PlanError::Invalid {
            source_name: source_name.into(),
            raw: raw.into(),
        })
}

impl SeedPlan {
    /// Apply a setting by name. Env vars and flags share this path so they
    /// accept the same values.
    fn set(&mut self, key: &str, raw: &str) -> Result<(), PlanError> {
        match key {
            "--db" | "COURSE_DB_URL" => {
                if raw.trim().is_empty() {
                    return Err(PlanError::Invalid {
                        source_name: key.into(),
                        raw: raw.into(),
                    });
                }
                self.db_url = raw.trim().into();
            }
            "--course-id" | "COURSE_ID" => self.course_id = parse_as(key, raw)?,
            "--learner-id" | "COURSE_LEARNER_ID" => self.learner_id = parse_as(key, raw)?,
            "--now" | "COURSE_NOW" => self.now = Some(parse_now(key, raw)?),
            "--min-dwell" | "COURSE_MIN_DWELL_SECS" => {
                self.settings.min_dwell_secs = Some(parse_as(key, raw)?);
            }
            "--watch-threshold" | "COURSE_WATCH_THRESHOLD" => {
                self.settings.video_watch_threshold = Some(parse_as(key, raw)?);
            }
            _ => return Err(PlanError::UnknownArg(key.into())),
        }
        Ok(())
    }

    fn resolve(
        env: impl Fn(&str) -> Option<String>,
        args: impl IntoIterator<Item = String>,
    ) -> Result<Self, PlanError> {
        let mut plan = Self::default();
        for key in [
            "COURSE_DB_URL",
            "COURSE_ID",
            "COURSE_LEARNER_ID",
            "COURSE_NOW",
            "COURSE_MIN_DWELL_SECS",
            "COURSE_WATCH_THRESHOLD",
        ] {
            if let Some(raw) = env(key) {
                plan.set(key, &raw)?;
            }
        }

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_owned(), Some(value.to_owned()))
                }
                _ => (arg.clone(), None),
            };
            match flag.as_str() {
                "-h" | "--help" | "--no-progress" if inline.is_some() => {
                    return Err(PlanError::UnexpectedValue { flag: flag.clone() });
                }
                "-h" | "--help" => plan.help = true,
                "--no-progress" => plan.with_progress = false,
                _ if !flag.starts_with("--") => return Err(PlanError::UnknownArg(flag.clone())),
                _ => {
                    let raw = match inline {
                        Some(raw) => raw,
                        None => args
                            .next()
                            .ok_or_else(|| PlanError::MissingValue { flag: flag.clone() })?,
                    };
                    plan.set(&flag, &raw)?;
                }
            }
        }
        Ok(plan)
    }

    fn from_env() -> Result<Self, PlanError> {
        Self::resolve(|key| std::env::var(key).ok(), std::env::args().skip(1))
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options (also accepted as --flag=value):");
    eprintln!("  --db <sqlite_url>          SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --course-id <id>           Course id to upsert (default: 1)");
    eprintln!("  --learner-id <id>          Learner whose progress is seeded (default: 1)");
    eprintln!("  --now <rfc3339>            Fixed current time for deterministic seeding");
    eprintln!("  --min-dwell <secs>         Dwell needed for view completion");
    eprintln!("  --watch-threshold <pct>    Watched percentage needed for video completion");
    eprintln!("  --no-progress              Only upsert the course");
    eprintln!("  -h, --help                 Show this help");
    eprintln!();
    eprintln!("Environment (flags win):");
    eprintln!("  COURSE_DB_URL, COURSE_ID, COURSE_LEARNER_ID, COURSE_NOW,");
    eprintln!("  COURSE_MIN_DWELL_SECS, COURSE_WATCH_THRESHOLD");
    eprintln!("  RUST_LOG controls log output (default: info)");
}

fn text(id: u64, body: &str) -> ContentUnit {
    ContentUnit::new(UnitId::new(id), UnitContent::Text { body: body.into() })
}

fn demo_course(id: CourseId) -> Course {
    let quiz = QuizContent::new(vec![
        Question::new(
            QuestionId::new(1),
            "A borrowed reference may outlive its owner.",
            QuestionKind::TrueFalse { correct: 1 },
        ),
        Question::new(
            QuestionId::new(2),
            "Which trait lets a type be duplicated implicitly?",
            QuestionKind::ShortAnswer {
                accepted_answers: vec!["Copy".into()],
                case_sensitive: false,
            },
        ),
    ]);

    Course::new(
        id,
        "Ownership in Practice",
        vec![
            Chapter::new(
                ChapterId::new(1),
                "Moves and borrows",
                vec![
                    Page::new(
                        PageId::new(1),
                        "Welcome",
                        vec![
                            text(1, "Every value has a single owner."),
                            ContentUnit::new(
                                UnitId::new(2),
                                UnitContent::Video {
                                    url: "https://media.example.org/ownership.mp4".into(),
                                    duration_secs: Some(240),
                                },
                            ),
                            ContentUnit::new(UnitId::new(3), UnitContent::Divider),
                        ],
                    ),
                    Page::new(
                        PageId::new(2),
                        "Checkpoint",
                        vec![ContentUnit::new(UnitId::new(4), UnitContent::MicroQuiz(quiz))],
                    )
                    .gated(),
                ],
            ),
            Chapter::new(
                ChapterId::new(2),
                "Lifetimes",
                vec![
                    Page::new(
                        PageId::new(3),
                        "Order of drops",
                        vec![ContentUnit::new(
                            UnitId::new(5),
                            UnitContent::Reorder(ReorderContent::in_authored_order(
                                vec![
                                    "bind value".into(),
                                    "borrow it".into(),
                                    "last use of borrow".into(),
                                    "drop value".into(),
                                ],
                                OrderingScoring::PartialCredit,
                            )),
                        )],
                    ),
                    Page::new(
                        PageId::new(4),
                        "Reflect",
                        vec![
                            ContentUnit::new(
                                UnitId::new(6),
                                UnitContent::Reflection(ReflectionContent {
                                    prompt: "Where did the borrow checker surprise you?".into(),
                                    min_length: Some(20),
                                }),
                            )
                            .optional(),
                            ContentUnit::new(
                                UnitId::new(7),
                                UnitContent::DiscussionThread {
                                    topic: "Share a lifetime puzzle".into(),
                                },
                            ),
                        ],
                    ),
                ],
            ),
        ],
    )
}

fn demo_attempts() -> Vec<(UnitId, Attempt)> {
    vec![
        (
            UnitId::new(1),
            Attempt::View {
                dwell_secs: 45,
                watched_percentage: None,
            },
        ),
        (
            UnitId::new(2),
            Attempt::View {
                dwell_secs: 230,
                watched_percentage: Some(95),
            },
        ),
        (
            UnitId::new(4),
            Attempt::quiz([
                (QuestionId::new(1), QuizAnswer::Choice(1)),
                (QuestionId::new(2), QuizAnswer::Text("copy".into())),
            ]),
        ),
        (
            UnitId::new(5),
            Attempt::Reorder {
                order: vec![0, 2, 1, 3],
            },
        ),
    ]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let plan = SeedPlan::from_env().inspect_err(|e| {
        eprintln!("{e}");
        print_usage();
    })?;
    if plan.help {
        print_usage();
        return Ok(());
    }
    let settings = plan.settings.validate()?;

    let storage = Storage::sqlite(&plan.db_url).await?;
    let now = plan.now.unwrap_or_else(Utc::now);

    let course = demo_course(plan.course_id);
    course.validate()?;
    storage.courses.upsert_course(&course).await?;
    info!(course_id = %course.id, units = course.unit_ids().len(), "upserted demo course");

    let mut seeded = 0_usize;
    let attempts = if plan.with_progress { demo_attempts() } else { Vec::new() };
    for (unit_id, attempt) in attempts {
        let Some(unit) = course.find_unit(unit_id) else {
            continue;
        };
        let outcome = evaluate_attempt(unit, &attempt, &settings)?;

        let existing = storage.progress.get_progress(plan.learner_id, unit_id).await?;
        let expected = existing.as_ref().map(|record| record.version);
        let mut record =
            existing.unwrap_or_else(|| ProgressRecord::start(plan.learner_id, unit_id, now));
        record.record_attempt(attempt, &outcome, now);
        storage.progress.save_progress(&record, expected).await?;

        info!(
            unit_id = %unit_id,
            status = record.status.as_str(),
            score = ?record.score,
            "seeded progress"
        );
        seeded += 1;
    }

    println!(
        "Seeded course {} with {} progress records for learner {} into {}",
        course.id.value(),
        seeded,
        plan.learner_id.value(),
        plan.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
