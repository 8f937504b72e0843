//! Command-line composition root.
//!
//! # Responsibility
//! - Build config, logging and every core component from flags/env.
//! - Keep presentation (stdout/stderr) out of `dailyquotes_core`.

use clap::{Args, Parser, Subcommand};
use dailyquotes_core::exec::{MainLoop, WorkerError};
use dailyquotes_core::notifier::{self, DailyQuoteJob, Notification, NotificationSink};
use dailyquotes_core::{
    init_logging, validate_note_input, AppConfig, Clock, Note, NoteQueue, NoteStoreResult,
    QuoteFeed, QuotesApiClient, RouteProbe, SettingsStore, SystemClock,
};
use log::{info, warn};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type CliResult<T = ()> = Result<T, Box<dyn Error + Send + Sync>>;

const WORKER_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "dailyquotes", version, about = "Notes, a quote feed and daily quote notifications")]
struct Cli {
    /// Directory holding the database, settings and logs.
    #[arg(long, global = true, env = "DAILYQUOTES_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "DAILYQUOTES_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage local notes.
    #[command(subcommand)]
    Notes(NotesCommand),
    /// Browse the remote quote feed.
    Quotes(QuotesArgs),
    /// Daily quote notifications.
    #[command(subcommand)]
    Notify(NotifyCommand),
}

#[derive(Debug, Subcommand)]
enum NotesCommand {
    /// Create a note.
    Add { title: String, description: String },
    /// Replace a note's title and description.
    Edit {
        id: String,
        title: String,
        description: String,
    },
    /// Delete a note (no error if it does not exist).
    Rm { id: String },
    /// List notes, newest first.
    Ls,
    /// Print one note.
    Show { id: String },
    /// Delete every note.
    Clear,
}

#[derive(Debug, Args)]
struct QuotesArgs {
    /// Number of pages to load.
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

#[derive(Debug, Subcommand)]
enum NotifyCommand {
    /// Turn notifications on and run the scheduler until Ctrl-C.
    Enable,
    /// Turn notifications off.
    Disable,
    /// Print the toggle and the last notification time.
    Status,
    /// Run the scheduler if notifications are enabled, until Ctrl-C.
    Run,
    /// Fetch and show one quote now.
    RunOnce,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult {
    let mut config = AppConfig::from_env_with_data_dir(cli.data_dir)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate()?;

    if let Err(err) = init_logging(&config.log_level, &config.log_dir()) {
        eprintln!("warning: file logging disabled: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok data_dir={}",
        config.data_dir.display()
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    match cli.command {
        Command::Notes(command) => run_notes(&config, clock, command),
        Command::Quotes(args) => run_quotes(&config, args),
        Command::Notify(command) => run_notify(&config, clock, command),
    }
}

fn run_notes(config: &AppConfig, clock: Arc<dyn Clock>, command: NotesCommand) -> CliResult {
    let queue = NoteQueue::open(config.db_path(), clock)?;
    let main = MainLoop::new();
    let handle = main.handle();

    match command {
        NotesCommand::Add { title, description } => {
            let (title, description) =
                validate_note_input(&title, &description).map_err(|err| err.user_message())?;
            let (slot, done) = reply_slot::<Note>();
            queue.create(&handle, title, description, done)?;
            let note = wait_reply(&main, &slot)?.map_err(|err| err.user_message())?;
            println!("created {}", note.id);
        }
        NotesCommand::Edit {
            id,
            title,
            description,
        } => {
            let (title, description) =
                validate_note_input(&title, &description).map_err(|err| err.user_message())?;
            let (slot, done) = reply_slot::<Note>();
            queue.update(&handle, id, title, description, done)?;
            let note = wait_reply(&main, &slot)?.map_err(|err| err.user_message())?;
            println!("updated {} at {}", note.id, note.updated_at);
        }
        NotesCommand::Rm { id } => {
            let (slot, done) = reply_slot::<()>();
            queue.delete(&handle, id.clone(), done)?;
            wait_reply(&main, &slot)?.map_err(|err| err.user_message())?;
            println!("deleted {id}");
        }
        NotesCommand::Ls => {
            let (slot, done) = reply_slot::<Vec<Note>>();
            queue.list(&handle, done)?;
            let notes = wait_reply(&main, &slot)?.map_err(|err| err.user_message())?;
            if notes.is_empty() {
                println!("no notes");
            }
            for note in notes {
                println!("{}  {}  {}", note.id, note.created_at, note.title);
            }
        }
        NotesCommand::Show { id } => {
            let (slot, done) = reply_slot::<Option<Note>>();
            queue.get(&handle, id.clone(), done)?;
            match wait_reply(&main, &slot)?.map_err(|err| err.user_message())? {
                Some(note) => {
                    println!("{}\n\n{}", note.title, note.description);
                    println!("\ncreated {}  updated {}", note.created_at, note.updated_at);
                }
                None => return Err(format!("note not found: {id}").into()),
            }
        }
        NotesCommand::Clear => {
            let removed = queue
                .submit(|store| store.clear())?
                .blocking_recv()
                .map_err(|_| WorkerError::Closed)?
                .map_err(|err| err.user_message())?;
            println!("deleted {removed} notes");
        }
    }

    queue.shutdown();
    Ok(())
}

type ReplySlot<T> = Arc<Mutex<Option<T>>>;

/// Shared slot plus the completion callback that fills it.
fn reply_slot<T: Send + 'static>() -> (
    ReplySlot<NoteStoreResult<T>>,
    impl FnOnce(NoteStoreResult<T>) + Send + 'static,
) {
    let slot: ReplySlot<NoteStoreResult<T>> = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    let done = move |result: NoteStoreResult<T>| {
        *sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(result);
    };
    (slot, done)
}

fn wait_reply<T>(main: &MainLoop, slot: &ReplySlot<T>) -> CliResult<T> {
    if !main.run_next(WORKER_REPLY_TIMEOUT) {
        return Err("timed out waiting for the notes database".into());
    }
    slot.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
        .ok_or_else(|| "notes database did not reply".into())
}

fn run_quotes(config: &AppConfig, args: QuotesArgs) -> CliResult {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let client = Arc::new(QuotesApiClient::new(&config.api_config())?);
        let mut feed = QuoteFeed::new(
            client,
            Arc::new(RouteProbe::default()),
            config.paginator_config(),
        );

        let mut printed = 0;
        for page in 0..args.pages.max(1) {
            let dispatched = if page == 0 {
                feed.load_first_page()
            } else {
                feed.load_more()
            };
            match dispatched {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    eprintln!("{}", err.user_message());
                    break;
                }
            }
            match feed.next_update().await {
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    eprintln!("{}", err.user_message());
                    break;
                }
                None => break,
            }
            for quote in &feed.paginator().accumulated()[printed..] {
                println!("{}\n\n", quote.attributed_text());
            }
            printed = feed.paginator().accumulated().len();
        }

        if !feed.paginator().has_more() {
            println!("(end of feed)");
        }
        Ok::<(), Box<dyn Error + Send + Sync>>(())
    })
}

/// Prints notifications to stdout.
struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn notify(&self, notification: &Notification) {
        println!("[{}]\n{}\n", notification.title, notification.big_text);
    }
}

fn run_notify(config: &AppConfig, clock: Arc<dyn Clock>, command: NotifyCommand) -> CliResult {
    let settings = Arc::new(SettingsStore::open(config.settings_path())?);
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let client = Arc::new(QuotesApiClient::new(&config.api_config())?);
        let job = Arc::new(DailyQuoteJob::new(
            client,
            Arc::new(StdoutSink),
            settings.clone(),
            clock,
        ));
        let scheduler = notifier::JobScheduler::default();

        match command {
            NotifyCommand::Enable => {
                notifier::set_notifications_enabled(
                    &settings,
                    &scheduler,
                    true,
                    config.notify_interval,
                    job,
                )?;
                println!(
                    "notifications enabled, every {}s; Ctrl-C to stop",
                    config.notify_interval.as_secs()
                );
                wait_for_ctrl_c().await?;
            }
            NotifyCommand::Disable => {
                notifier::set_notifications_enabled(
                    &settings,
                    &scheduler,
                    false,
                    config.notify_interval,
                    job,
                )?;
                println!("notifications disabled");
            }
            NotifyCommand::Status => {
                let snapshot = settings.snapshot();
                println!("enabled: {}", snapshot.notifications_enabled);
                println!("last notification (epoch ms): {}", snapshot.last_notification_ms);
            }
            NotifyCommand::Run => {
                if !notifier::restore_schedule(&settings, &scheduler, config.notify_interval, job)
                {
                    println!("notifications are disabled; run `dailyquotes notify enable`");
                    return Ok::<(), Box<dyn Error + Send + Sync>>(());
                }
                wait_for_ctrl_c().await?;
            }
            NotifyCommand::RunOnce => {
                let outcome = job.run_once().await;
                println!("outcome: {outcome:?}");
            }
        }
        scheduler.cancel_all();
        Ok::<(), Box<dyn Error + Send + Sync>>(())
    })
}

async fn wait_for_ctrl_c() -> CliResult {
    tokio::signal::ctrl_c().await?;
    warn!("event=cli_stop module=cli status=interrupted");
    Ok(())
}
