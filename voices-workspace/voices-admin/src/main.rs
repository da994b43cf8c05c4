use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use taxonomy::{Category, ContentType, Language};
use tracing_subscriber::EnvFilter;
use voices_core::commands::{ensure_initialized_at, SubmitError};
use voices_core::services::leaderboard::Metric;
use voices_core::services::store::SubmissionFilter;
use voices_core::{Commands, Notice, Session, SubmissionDraft, SubmitOptions};

#[derive(Parser)]
#[command(
    name = "voices-admin",
    about = "Manage a Bharat Voices collection from the command line"
)]
struct Cli {
    /// Data root; defaults to $VOICES_ROOT or .voices
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create the data root, default config and keyword tables
    Init,
    /// Submit a story, proverb or saying
    Submit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Content type label, e.g. "Proverb" or "Folk Tale"
        #[arg(long = "type")]
        content_type: ContentType,
        /// ISO code ("hi") or name ("Hindi")
        #[arg(long)]
        language: Language,
        #[arg(long)]
        dialect: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        context: Option<String>,
        /// English translation; skips machine translation
        #[arg(long)]
        translation: Option<String>,
        /// Category label; skips auto-categorization
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        no_translate: bool,
        #[arg(long)]
        no_categorize: bool,
    },
    /// Like a submission
    Like {
        #[arg(long)]
        user: String,
        id: String,
    },
    /// Newest submissions first
    Feed {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        language: Option<Language>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        featured: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Case-insensitive search over title, content and translation
    Search {
        query: String,
        #[arg(long)]
        language: Option<Language>,
    },
    /// A user's stats and achievement progress
    Stats { user: String },
    /// The badge catalog, split into earned and available for a user
    Badges { user: String },
    /// Top users by submissions, likes, badges or streak
    Leaderboard {
        #[arg(long, default_value = "submissions")]
        metric: Metric,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// The challenge for a date (default today, UTC)
    Challenge { date: Option<NaiveDate> },
    /// Collection-wide numbers
    Analytics,
    /// Mark or unmark a submission as featured
    Feature {
        id: String,
        #[arg(long)]
        off: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("voices_core=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Cmd::Init = cli.cmd {
        return init(cli.root);
    }
    let cmds = open(cli.root)?;
    match cli.cmd {
        Cmd::Init => Ok(()),
        Cmd::Submit {
            user,
            title,
            content,
            content_type,
            language,
            dialect,
            location,
            context,
            translation,
            category,
            no_translate,
            no_categorize,
        } => {
            let draft = SubmissionDraft {
                title,
                content,
                content_type: Some(content_type),
                language: Some(language),
                dialect,
                location,
                cultural_context: context,
                english_translation: translation,
                category,
                audio_url: None,
            };
            let options = SubmitOptions {
                auto_translate: !no_translate,
                auto_categorize: !no_categorize,
            };
            submit(&cmds, &user, draft, options)
        }
        Cmd::Like { user, id } => {
            let session = cmds.open_session(&user)?;
            match cmds.like(&session, &id)? {
                Some(likes) => println!("{id}: {likes} likes"),
                None => anyhow::bail!("no submission with id {id}"),
            }
            Ok(())
        }
        Cmd::Feed {
            user,
            language,
            category,
            featured,
            limit,
        } => {
            let filter = SubmissionFilter {
                user_id: user,
                language,
                category,
                featured: featured.then_some(true),
                ..SubmissionFilter::default()
            };
            print_json(&cmds.feed(&filter, limit)?)
        }
        Cmd::Search { query, language } => {
            let filter = SubmissionFilter {
                language,
                ..SubmissionFilter::default()
            };
            print_json(&cmds.search(&query, &filter)?)
        }
        Cmd::Stats { user } => {
            print_json(&cmds.user_stats(&user)?)?;
            print_json(&cmds.achievement_progress(&user)?)
        }
        Cmd::Badges { user } => {
            for b in cmds.user_badges(&user)? {
                println!("[x] {} {} - {}", b.icon, b.name, b.description);
            }
            for b in cmds.available_badges(&user)? {
                println!("[ ] {} {} - {}", b.icon, b.name, b.description);
            }
            Ok(())
        }
        Cmd::Leaderboard { metric, limit } => {
            for e in cmds.leaderboard(metric, limit)? {
                println!("{:>3}. {:<24} {}", e.rank, e.display_name, e.value);
            }
            Ok(())
        }
        Cmd::Challenge { date } => {
            let c = cmds.daily_challenge(date.unwrap_or_else(|| Utc::now().date_naive()));
            println!("{} {} (+{} points)\n{}", c.icon, c.title, c.reward_points, c.description);
            Ok(())
        }
        Cmd::Analytics => print_json(&cmds.analytics()?),
        Cmd::Feature { id, off } => {
            anyhow::ensure!(cmds.set_featured(&id, !off)?, "no submission with id {id}");
            println!("{id}: featured = {}", !off);
            Ok(())
        }
    }
}

fn init(root: Option<PathBuf>) -> Result<()> {
    let root = root.unwrap_or_else(voices_core::commands::init::voices_root);
    let report = ensure_initialized_at(&root)?;
    for path in &report.created {
        println!("created  {path}");
    }
    for path in &report.existed {
        println!("existing {path}");
    }
    println!("initialized {}", report.root.display());
    Ok(())
}

fn open(root: Option<PathBuf>) -> Result<Commands> {
    tracing::debug!(root = ?root, "opening collection");
    match root {
        Some(root) => {
            let report = ensure_initialized_at(&root)?;
            Commands::open(report.config)
        }
        None => Commands::open_default(),
    }
}

fn submit(cmds: &Commands, user: &str, draft: SubmissionDraft, options: SubmitOptions) -> Result<()> {
    let mut session = cmds.open_session(user)?;
    let receipt = match cmds.submit(&mut session, draft, options) {
        Ok(r) => r,
        Err(SubmitError::Validation(e)) => anyhow::bail!("rejected: {e}"),
        Err(e) => return Err(e).context("submit"),
    };
    print_notices(&mut session);
    print_json(&receipt)
}

fn print_notices(session: &mut Session) {
    for notice in session.take_notices() {
        match notice {
            Notice::Warning { message } => eprintln!("warning: {message}"),
            Notice::BadgeEarned { name, icon, .. } => eprintln!("badge earned: {icon} {name}"),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
