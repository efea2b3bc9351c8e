//! Command-line subcommands.

use std::sync::Arc;

use clap::Subcommand;
use tracing::{info, warn};

use crate::app;
use crate::auth::{AuthSession, TokenStore};
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{AuthError, Error};
use crate::levels;
use crate::protocol::{self, Credentials, QuizSource, WordPair};
use crate::session::{EndReason, SaveStatus, SessionController, SessionSummary};
use crate::terminal;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in and remember the token
    Login { username: String },
    /// Create an account
    Register { username: String },
    /// Forget the stored token
    Logout,
    /// Show the logged-in account
    Whoami,
    /// List word sets
    Sets,
    /// Show the words of a word set
    Words { id: i64 },
    /// Take a timed quiz on a word set
    Play { id: i64 },
    /// List your wrong answer note
    Wrong,
    /// Take a quiz built from your wrong answers
    Review,
    /// Show finished tests
    History,
    /// Delete a test record
    Forget { record_id: i64 },
    /// Show level and experience
    Level,
    /// Show the leaderboard
    Rankings,
}

impl Command {
    /// Commands that take over the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Command::Play { .. } | Command::Review)
    }
}

pub struct Context {
    config: Config,
    store: TokenStore,
}

impl Context {
    pub fn new(config: Config) -> Self {
        let store = TokenStore::new(config.token_file.clone());
        Self { config, store }
    }

    fn client(&self) -> Result<ApiClient, Error> {
        let auth = self.store.require()?;
        Ok(ApiClient::from_config(&self.config, Some(auth))?)
    }

    fn anonymous_client(&self) -> Result<ApiClient, Error> {
        Ok(ApiClient::from_config(&self.config, None)?)
    }

    /// Drop the stored token after the backend rejected it.
    fn forget_token(&self) {
        match self.store.clear() {
            Ok(_) => warn!("stored token rejected; logged out"),
            Err(e) => warn!("failed to remove rejected token: {e}"),
        }
    }
}

/// Run a command. A token rejected by the backend is always removed so the
/// next command asks for a fresh login.
pub async fn dispatch(ctx: &Context, command: Command) -> Result<(), Error> {
    let result = match command {
        Command::Login { username } => login(ctx, username).await,
        Command::Register { username } => register(ctx, username).await,
        Command::Logout => logout(ctx),
        Command::Whoami => whoami(ctx).await,
        Command::Sets => sets(ctx).await,
        Command::Words { id } => words(ctx, id).await,
        Command::Play { id } => play(ctx, QuizSource::WordSet(id)).await,
        Command::Wrong => wrong(ctx).await,
        Command::Review => review(ctx).await,
        Command::History => history(ctx).await,
        Command::Forget { record_id } => forget(ctx, record_id).await,
        Command::Level => level(ctx).await,
        Command::Rankings => rankings(ctx).await,
    };

    if let Err(e) = &result {
        if e.is_unauthorized() {
            ctx.forget_token();
        }
    }
    result
}

async fn login(ctx: &Context, username: String) -> Result<(), Error> {
    let Some(password) = terminal::read_secret("Password: ")? else {
        return Ok(());
    };
    let client = ctx.anonymous_client()?;
    let response = client.login(&Credentials { username, password }).await?;

    let token = response.token.ok_or(AuthError::MissingToken)?;
    let session = AuthSession::new(token)?;
    ctx.store.save(&session)?;

    info!(admin = response.is_admin, "logged in");
    println!("Logged in to {}.", client.base_url());
    Ok(())
}

async fn register(ctx: &Context, username: String) -> Result<(), Error> {
    protocol::validate_username(&username).map_err(AuthError::Invalid)?;

    let Some(password) = terminal::read_secret("Password: ")? else {
        return Ok(());
    };
    protocol::validate_password(&password).map_err(AuthError::Invalid)?;

    let Some(confirm) = terminal::read_secret("Confirm password: ")? else {
        return Ok(());
    };
    if confirm != password {
        return Err(AuthError::Invalid("Passwords do not match").into());
    }

    let client = ctx.anonymous_client()?;
    client.register(&Credentials { username, password }).await?;
    println!("Account created. Run `vocazoo login` to sign in.");
    Ok(())
}

fn logout(ctx: &Context) -> Result<(), Error> {
    if ctx.store.clear()? {
        println!("Logged out. Removed {}.", ctx.store.path().display());
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

async fn whoami(ctx: &Context) -> Result<(), Error> {
    let account = ctx.client()?.check_auth().await?;
    let level = account.level.unwrap_or(1);
    let exp = account.exp.unwrap_or(0);

    println!("{}", account.username.as_deref().unwrap_or("(unknown)"));
    println!(
        "  Lv.{level}  {exp} EXP  ({:.0}%)",
        levels::progress_percent(level, exp)
    );
    if let Some(score) = account.current_score {
        println!("  score: {score:.0}");
    }
    if let Some(tests) = account.completed_tests {
        println!("  completed tests: {tests}");
    }
    if account.is_admin {
        println!("  admin");
    }
    Ok(())
}

async fn sets(ctx: &Context) -> Result<(), Error> {
    let sets = ctx.client()?.word_sets().await?;
    if sets.is_empty() {
        println!("No word sets.");
        return Ok(());
    }

    println!("{:>5}  {:<24} {:>6}  {}", "ID", "NAME", "WORDS", "CREATED");
    for set in sets {
        let name = set.name.unwrap_or_else(|| format!("Word set #{}", set.id));
        let created = set
            .created_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default();
        println!("{:>5}  {:<24} {:>6}  {}", set.id, name, set.words.len(), created);
    }
    Ok(())
}

async fn words(ctx: &Context, id: i64) -> Result<(), Error> {
    let set = ctx.client()?.word_set(id).await?;
    for word in set.words {
        println!("{:<24} {}", word.english, word.korean);
    }
    Ok(())
}

async fn play(ctx: &Context, source: QuizSource) -> Result<(), Error> {
    let client = Arc::new(ctx.client()?);
    let controller = SessionController::new(client, source, ctx.config.timing());

    let summary = app::play(controller).await?;
    if summary.reason == EndReason::Unauthorized {
        ctx.forget_token();
    }
    print_summary(&summary);
    Ok(())
}

async fn wrong(ctx: &Context) -> Result<(), Error> {
    let entries = ctx.client()?.wrong_answers().await?;
    if entries.is_empty() {
        println!("No wrong answers.");
        return Ok(());
    }
    for entry in entries {
        println!("{:<24} {}", entry.question, entry.correct_answer);
    }
    Ok(())
}

async fn review(ctx: &Context) -> Result<(), Error> {
    let client = ctx.client()?;
    let level = client.level().await?.level;
    if !levels::review_unlocked(level) {
        return Err(Error::Locked {
            required: levels::REVIEW_MIN_LEVEL,
            level,
        });
    }

    let words: Vec<WordPair> = client
        .wrong_answers()
        .await?
        .iter()
        .map(|entry| entry.to_word_pair())
        .collect();
    if words.is_empty() {
        return Err(Error::NothingToReview);
    }

    play(ctx, QuizSource::WrongAnswers(words)).await
}

async fn history(ctx: &Context) -> Result<(), Error> {
    let records = ctx.client()?.test_history().await?;
    if records.is_empty() {
        println!("No tests yet.");
        return Ok(());
    }

    for record in records {
        let when = record
            .completed_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default();
        println!("#{:<6} {:<16} {:>5.0} pts", record.id, when, record.score);
        for entry in &record.wrong_answers {
            println!(
                "         {} → {} (answered {})",
                entry.question, entry.correct_answer, entry.user_answer
            );
        }
    }
    Ok(())
}

async fn forget(ctx: &Context, record_id: i64) -> Result<(), Error> {
    ctx.client()?.delete_test_record(record_id).await?;
    println!("Deleted test record #{record_id}.");
    Ok(())
}

async fn level(ctx: &Context) -> Result<(), Error> {
    let info = ctx.client()?.level().await?;
    if info.level >= levels::MAX_LEVEL {
        println!("Lv.{}", info.level);
        return Ok(());
    }

    let required = levels::exp_for_level(info.level);
    println!(
        "Lv.{} ({:.0}%)  {}/{} EXP to Lv.{}",
        info.level,
        levels::progress_percent(info.level, info.exp),
        info.exp,
        required,
        info.level + 1
    );
    if !levels::review_unlocked(info.level) {
        println!("Wrong answer review unlocks at Lv.{}.", levels::REVIEW_MIN_LEVEL);
    }
    Ok(())
}

async fn rankings(ctx: &Context) -> Result<(), Error> {
    let rankings = ctx.client()?.rankings().await?;

    for entry in &rankings.rankings {
        println!("{:>3}. {:<20} {:>6.0}", entry.rank, entry.username, entry.score);
    }
    if let Some(me) = &rankings.current_user {
        println!();
        println!("You: {}. {} ({:.0})", me.rank, me.username, me.score);
    }
    if !rankings.is_qualified {
        println!("Finish more tests to enter the ranking.");
    }
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    println!("{}", summary.reason);
    println!(
        "{:.0} pts  ·  {} solved  ·  {} wrong",
        summary.score,
        summary.solved_count,
        summary.wrong_answers.len()
    );
    if let Some(SaveStatus::Failed(e)) = &summary.save_status {
        println!("Result was not saved: {e}");
    }
}

/// `2024-03-01T09:30:12` → `2024-03-01 09:30`
fn format_timestamp(raw: &str) -> String {
    raw.chars()
        .take(16)
        .map(|c| if c == 'T' { ' ' } else { c })
        .collect()
}
