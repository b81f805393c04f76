use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quiz_core::model::{Language, Level, Theme};
use services::{AppServices, Clock, PlayerProgress, QuestionSource, StaticQuestionBank};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidLevel { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLevel { raw } => write!(f, "invalid --level value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz register --user <name> --password <pw> --country <code>");
    eprintln!("  quiz login    --user <name> --password <pw>");
    eprintln!("  quiz logout");
    eprintln!("  quiz status");
    eprintln!("  quiz play     [--level <1-5>]");
    eprintln!("  quiz leaderboard");
    eprintln!("  quiz language [de|es]   # toggles without a value");
    eprintln!("  quiz theme    <light|dark>");
    eprintln!("  quiz passwd   --password <new> --confirm <new>");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <path|sqlite_url>   (default ./quiz.sqlite3)");
    eprintln!("  --questions <file.json>  (default: bundled question bank)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_QUESTIONS, QUIZ_LOG / RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Register,
    Login,
    Logout,
    Status,
    Play,
    Leaderboard,
    Language,
    Theme,
    Passwd,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "register" => Some(Self::Register),
            "login" => Some(Self::Login),
            "logout" => Some(Self::Logout),
            "status" => Some(Self::Status),
            "play" => Some(Self::Play),
            "leaderboard" => Some(Self::Leaderboard),
            "language" => Some(Self::Language),
            "theme" => Some(Self::Theme),
            "passwd" => Some(Self::Passwd),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    db_url: String,
    questions: Option<PathBuf>,
    user: Option<String>,
    password: Option<String>,
    confirm: Option<String>,
    country: Option<String>,
    level: Option<Level>,
    value: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: resolve_db_url(
                &std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "quiz.sqlite3".into()),
            )?,
            questions: std::env::var_os("QUIZ_QUESTIONS").map(PathBuf::from),
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => parsed.db_url = resolve_db_url(&require_value(args, "--db")?)?,
                "--questions" => {
                    parsed.questions = Some(require_value(args, "--questions")?.into());
                }
                "--user" => parsed.user = Some(require_value(args, "--user")?),
                "--password" => parsed.password = Some(require_value(args, "--password")?),
                "--confirm" => parsed.confirm = Some(require_value(args, "--confirm")?),
                "--country" => parsed.country = Some(require_value(args, "--country")?),
                "--level" => {
                    let value = require_value(args, "--level")?;
                    let level = value
                        .parse::<u8>()
                        .ok()
                        .and_then(|n| Level::new(n).ok())
                        .ok_or_else(|| ArgsError::InvalidLevel { raw: value.clone() })?;
                    parsed.level = Some(level);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if !other.starts_with("--") && parsed.value.is_none() => {
                    parsed.value = Some(other.to_owned());
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn required<'a>(
        value: Option<&'a String>,
        flag: &'static str,
    ) -> Result<&'a str, ArgsError> {
        value
            .map(String::as_str)
            .ok_or(ArgsError::MissingFlag { flag })
    }
}

const MEMORY_DB: &str = "sqlite::memory:";

/// Accept `sqlite:` URLs or bare paths; relative paths resolve against the
/// working directory.
fn resolve_db_url(raw: &str) -> Result<String, ArgsError> {
    let raw = raw.trim();
    if raw == MEMORY_DB || raw.contains("mode=memory") {
        return Ok(raw.to_owned());
    }
    let path = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .unwrap_or(raw);
    let (path, query) = path.split_once('?').unwrap_or((path, ""));
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: raw.to_owned(),
        });
    }

    let path = Path::new(path);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    let mut url = format!("sqlite://{}", path.display());
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }
    Ok(url)
}

/// The database file is created on connect, but its directory must exist.
fn ensure_db_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split_once('?').map_or(path, |(path, _)| path);
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUIZ_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("quiz=info,services=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_questions(
    path: Option<&PathBuf>,
) -> Result<Arc<dyn QuestionSource>, Box<dyn std::error::Error>> {
    let bank = match path {
        Some(path) => StaticQuestionBank::from_path(path)?,
        None => StaticQuestionBank::bundled()?,
    };
    tracing::debug!(questions = bank.len(), "question bank loaded");
    Ok(Arc::new(bank))
}

fn print_status(progress: &PlayerProgress, username: &str) {
    println!("{username}: {} points", progress.total_points);
    println!(
        "Level {} ({})",
        progress.current_level.level, progress.current_level.name
    );
    if progress.milestone.points_to_next > 0 {
        println!(
            "{} points to the next milestone ({:.0}%)",
            progress.milestone.points_to_next, progress.milestone.percent
        );
    } else {
        println!("All milestones reached");
    }
    let unlocked: Vec<String> = progress
        .unlocked
        .iter()
        .map(|info| format!("{} {}", info.level, info.name))
        .collect();
    println!("Playable: {}", unlocked.join(", "));
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    ensure_db_dir(&parsed.db_url)?;
    let questions = load_questions(parsed.questions.as_ref())?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), questions).await?;
    let auth = services.auth();

    match cmd {
        Command::Register => {
            let user = auth
                .register(
                    Args::required(parsed.user.as_ref(), "--user")?,
                    Args::required(parsed.password.as_ref(), "--password")?,
                    Args::required(parsed.country.as_ref(), "--country")?,
                )
                .await?;
            println!("Welcome, {} {}", user.username(), user.country().flag());
        }
        Command::Login => {
            let user = auth
                .login(
                    Args::required(parsed.user.as_ref(), "--user")?,
                    Args::required(parsed.password.as_ref(), "--password")?,
                )
                .await?;
            println!("Signed in as {}", user.username());
        }
        Command::Logout => {
            auth.logout().await?;
            println!("Signed out");
        }
        Command::Status => match auth.current_user().await? {
            Some(user) => {
                let progress = PlayerProgress::for_user(&user, services.exercises().levels());
                print_status(&progress, user.username());
            }
            None => println!("Not signed in"),
        },
        Command::Play => {
            // Default to the highest level the player's points unlock.
            let level = match parsed.level {
                Some(level) => level,
                None => auth
                    .current_user()
                    .await?
                    .and_then(|u| {
                        services
                            .exercises()
                            .levels()
                            .unlocked_levels(u.total_points())
                            .last()
                            .copied()
                    })
                    .unwrap_or_else(Level::first),
            };
            play::play(services.exercises(), level).await?;
        }
        Command::Leaderboard => {
            let standings = services.leaderboard().standings().await?;
            if standings.is_empty() {
                println!("No players yet");
            }
            for entry in standings {
                println!(
                    "{:>3}. {} {:<20} {:>6}",
                    entry.rank,
                    entry.country.flag(),
                    entry.username,
                    entry.total_points
                );
            }
        }
        Command::Language => {
            let settings = services.app_settings();
            let updated = match parsed.value.as_deref() {
                Some(raw) => settings.set_language(raw.parse::<Language>()?).await?,
                None => settings.toggle_language().await?,
            };
            println!("Language: {}", updated.language());
        }
        Command::Theme => {
            let raw = Args::required(parsed.value.as_ref(), "<light|dark>")?;
            let updated = services
                .app_settings()
                .set_theme(raw.parse::<Theme>()?)
                .await?;
            println!("Theme: {:?}", updated.theme());
        }
        Command::Passwd => {
            auth.change_password(
                Args::required(parsed.password.as_ref(), "--password")?,
                Args::required(parsed.confirm.as_ref(), "--confirm")?,
            )
            .await?;
            println!("Password changed");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_pass_through() {
        assert_eq!(resolve_db_url("sqlite::memory:").unwrap(), "sqlite::memory:");
        let shared = "sqlite:file:quiz?mode=memory&cache=shared";
        assert_eq!(resolve_db_url(shared).unwrap(), shared);
    }

    #[test]
    fn paths_become_absolute_urls() {
        assert_eq!(
            resolve_db_url("sqlite:///var/lib/quiz.db").unwrap(),
            "sqlite:///var/lib/quiz.db"
        );
        assert_eq!(
            resolve_db_url("/var/lib/quiz.db?mode=rwc").unwrap(),
            "sqlite:///var/lib/quiz.db?mode=rwc"
        );
        let relative = resolve_db_url("sqlite:data/quiz.db").unwrap();
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("data/quiz.db"));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(
            resolve_db_url("sqlite://"),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
    }

    #[test]
    fn subcommands_parse() {
        assert_eq!(Command::from_arg("play"), Some(Command::Play));
        assert_eq!(Command::from_arg("passwd"), Some(Command::Passwd));
        assert_eq!(Command::from_arg("decks"), None);
    }

    #[test]
    fn required_flags_borrow_their_value() {
        let user = Some("ana".to_string());
        assert_eq!(Args::required(user.as_ref(), "--user").unwrap(), "ana");
        assert!(matches!(
            Args::required(None, "--password"),
            Err(ArgsError::MissingFlag { flag: "--password" })
        ));
    }
}
