use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use eldershield::archive::format::{format_clock, format_duration, format_recency};
use eldershield::archive::{CallArchive, FileStore, MemoryStore, SharedStore};
use eldershield::audio::{ConsoleCapture, ScriptedCapture, UtteranceSource};
use eldershield::config::Config;
use eldershield::kernel::event::{Event, UserAction};
use eldershield::kernel::lifecycle::LifecycleSettings;
use eldershield::kernel::reactor::{Reactor, ReactorConfig, SurfaceEvent};
use eldershield::outputs::{play_transcript, CommandSpeech, LogSpeech, PlaybackOutcome, SpeechSink};
use eldershield::permissions::{Permission, PermissionMap, PermissionStore};

#[derive(Parser, Debug)]
#[command(name = "eldershield", about = "ElderShield call screening demo")]
struct Cli {
    /// JSON config file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the data directory for the archive and permissions
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory for this run
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted demo call
    Demo {
        #[arg(value_enum)]
        scenario: Scenario,
        /// Seconds to stay on the call before hanging up
        #[arg(long, default_value_t = 5)]
        hold: u64,
        /// Utterances the caller speaks in the recorded scenario
        #[arg(long = "line")]
        lines: Vec<String>,
        /// Discard instead of saving the recorded call
        #[arg(long)]
        discard: bool,
    },
    /// Drive the call screen from stdin
    Interactive,
    /// Saved call data
    Calls {
        #[command(subcommand)]
        command: CallsCommand,
    },
    /// Onboarding permission grants
    Permissions {
        #[command(subcommand)]
        command: PermissionsCommand,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Scenario {
    /// Blacklisted caller
    Flagged,
    /// Ordinary caller, recording declined
    Plain,
    /// Ordinary caller, recording allowed
    Recorded,
}

#[derive(Subcommand, Debug)]
enum CallsCommand {
    List,
    Show { id: String },
    Delete { id: String },
    /// Read a saved transcript aloud
    Play { id: String },
}

#[derive(Subcommand, Debug)]
enum PermissionsCommand {
    Show,
    /// Grant the given permissions, or all of them
    Grant {
        #[arg(value_enum)]
        permissions: Vec<PermissionArg>,
    },
    Revoke {
        #[arg(value_enum)]
        permissions: Vec<PermissionArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PermissionArg {
    RecordAudio,
    ReadPhoneState,
    ReadSms,
    ReceiveSms,
    SystemAlertWindow,
    PostNotifications,
}

impl From<PermissionArg> for Permission {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::RecordAudio => Permission::RecordAudio,
            PermissionArg::ReadPhoneState => Permission::ReadPhoneState,
            PermissionArg::ReadSms => Permission::ReadSms,
            PermissionArg::ReceiveSms => Permission::ReceiveSms,
            PermissionArg::SystemAlertWindow => Permission::SystemAlertWindow,
            PermissionArg::PostNotifications => Permission::PostNotifications,
        }
    }
}

const DEFAULT_SCRIPT: [&str; 2] = ["xin chào", "chuyển tiền ngay"];
const LINE_SPACING: Duration = Duration::from_millis(1500);

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    }
    .apply_env();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    let store: SharedStore = if cli.ephemeral {
        MemoryStore::shared()
    } else {
        let store = FileStore::open(&config.data_dir).with_context(|| {
            format!("failed to open data directory {}", config.data_dir.display())
        })?;
        Arc::new(store) as SharedStore
    };
    let archive = CallArchive::with_limit(store.clone(), config.archive_limit);
    let permissions = PermissionStore::new(store);
    let speech = speech_sink(&config);

    match cli.command {
        Command::Demo {
            scenario,
            hold,
            lines,
            discard,
        } => {
            onboard(&permissions)?;
            let lines = if lines.is_empty() {
                DEFAULT_SCRIPT.iter().map(|l| l.to_string()).collect()
            } else {
                lines
            };
            let capture = Box::new(ScriptedCapture::evenly(lines.clone(), LINE_SPACING));
            let script = demo_script(scenario, hold, lines.len(), discard);
            run_session(&config, archive, &permissions, speech, capture, |tx| async move {
                for (delay, event) in script {
                    tokio::time::sleep(delay).await;
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            })
            .await
        }

        Command::Interactive => {
            onboard(&permissions)?;
            let (capture, feed) = ConsoleCapture::new();
            println!("Commands: /flagged /plain /accept /reject /allow /deny /dismiss /yes /no /end /save /discard /quit");
            println!("Any other line is spoken by the caller while recording.");
            run_session(&config, archive, &permissions, speech, Box::new(capture), |tx| async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let event = match parse_command(line) {
                        Some(event) => event,
                        None if line.starts_with('/') => {
                            println!("unknown command: {}", line);
                            continue;
                        }
                        None => {
                            if !feed.push(line).await {
                                println!("(not recording)");
                            }
                            continue;
                        }
                    };
                    let quit = event == Event::Shutdown;
                    if tx.send(event).await.is_err() || quit {
                        break;
                    }
                }
                let _ = tx.send(Event::Shutdown).await;
            })
            .await
        }

        Command::Calls { command } => calls(command, &archive, speech, &config).await,

        Command::Permissions { command } => {
            match command {
                PermissionsCommand::Show => {}
                PermissionsCommand::Grant { permissions: args } => {
                    set_permissions(&permissions, &args, true)?
                }
                PermissionsCommand::Revoke { permissions: args } => {
                    if args.is_empty() {
                        bail!("name at least one permission to revoke");
                    }
                    set_permissions(&permissions, &args, false)?
                }
            }
            for (permission, granted) in permissions.load() {
                println!(
                    "{:<22} {:<5} {}",
                    format!("{:?}", permission),
                    if granted { "yes" } else { "no" },
                    permission.name()
                );
            }
            Ok(())
        }
    }
}

fn speech_sink(config: &Config) -> Arc<dyn SpeechSink> {
    match config
        .speech_command
        .as_deref()
        .and_then(CommandSpeech::from_command_line)
    {
        Some(command) => Arc::new(command),
        None => Arc::new(LogSpeech),
    }
}

/// First run: the demo grants everything, as the onboarding carousel would.
fn onboard(permissions: &PermissionStore) -> Result<()> {
    if permissions.has_requested() {
        return Ok(());
    }
    let grants: PermissionMap = Permission::ALL.iter().map(|p| (*p, true)).collect();
    permissions.save(&grants).context("failed to save permissions")?;
    tracing::info!("Onboarding complete: all permissions granted");
    Ok(())
}

fn set_permissions(store: &PermissionStore, args: &[PermissionArg], granted: bool) -> Result<()> {
    let targets: Vec<Permission> = if args.is_empty() {
        Permission::ALL.to_vec()
    } else {
        args.iter().map(|a| Permission::from(*a)).collect()
    };
    let mut grants = store.load();
    for permission in targets {
        grants.insert(permission, granted);
    }
    store.save(&grants).context("failed to save permissions")
}

async fn run_session<F, Fut>(
    config: &Config,
    archive: CallArchive,
    permissions: &PermissionStore,
    speech: Arc<dyn SpeechSink>,
    capture: Box<dyn UtteranceSource>,
    drive: F,
) -> Result<()>
where
    F: FnOnce(mpsc::Sender<Event>) -> Fut,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(100);
    let (surface_tx, mut surface_rx) = mpsc::unbounded_channel();

    let settings = LifecycleSettings::from_config(
        config,
        permissions.is_granted(Permission::RecordAudio),
    );
    let mut reactor = Reactor::new(
        rx,
        tx.clone(),
        settings,
        archive,
        speech,
        capture,
        ReactorConfig::from_config(config),
    )
    .with_surface(surface_tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = surface_rx.recv().await {
            print_surface(&event);
        }
    });

    let driver = tokio::spawn(drive(tx.clone()));
    let ctrl_c_tx = tx.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_tx.send(Event::Shutdown).await;
        }
    });
    drop(tx);

    reactor.run().await;

    let snapshot = reactor.telemetry.snapshot();
    tracing::info!(
        incoming = snapshot.call_stats.incoming,
        scam_alerts = snapshot.call_stats.scam_alerts,
        saved = snapshot.archive_stats.saved,
        "Session summary"
    );

    driver.abort();
    ctrl_c.abort();
    drop(reactor);
    let _ = printer.await;
    Ok(())
}

fn demo_script(scenario: Scenario, hold: u64, lines: usize, discard: bool) -> Vec<(Duration, Event)> {
    use UserAction::*;

    let beat = Duration::from_millis(800);
    let hold = Duration::from_secs(hold);
    let act = |delay: Duration, action: UserAction| (delay, Event::Action(action));

    match scenario {
        Scenario::Flagged => vec![
            act(Duration::ZERO, BeginFlaggedIncoming),
            act(beat * 2, Accept),
            act(beat, AnswerFeedback(true)),
            act(hold, End),
            (beat, Event::Shutdown),
        ],
        Scenario::Plain => vec![
            act(Duration::ZERO, BeginPlainIncoming),
            act(beat, Accept),
            act(beat, RecordingConsent(false)),
            act(hold, End),
            (beat, Event::Shutdown),
        ],
        Scenario::Recorded => {
            let speaking = LINE_SPACING * lines as u32 + beat;
            vec![
                act(Duration::ZERO, BeginPlainIncoming),
                act(beat, Accept),
                act(beat, RecordingConsent(true)),
                act(speaking.max(hold), DismissScamAlert),
                act(beat, AnswerFeedback(true)),
                act(beat, End),
                act(beat, SaveChoice(!discard)),
                (beat, Event::Shutdown),
            ]
        }
    }
}

fn parse_command(line: &str) -> Option<Event> {
    use UserAction::*;

    let action = match line {
        "/flagged" => BeginFlaggedIncoming,
        "/plain" => BeginPlainIncoming,
        "/accept" => Accept,
        "/reject" => Reject,
        "/allow" => RecordingConsent(true),
        "/deny" => RecordingConsent(false),
        "/dismiss" => DismissScamAlert,
        "/yes" => AnswerFeedback(true),
        "/no" => AnswerFeedback(false),
        "/end" => End,
        "/save" => SaveChoice(true),
        "/discard" => SaveChoice(false),
        "/quit" => return Some(Event::Shutdown),
        _ => return None,
    };
    Some(Event::Action(action))
}

fn print_surface(event: &SurfaceEvent) {
    match event {
        SurfaceEvent::StateChanged { to, .. } => println!("[STATE] {:?}", to),
        SurfaceEvent::Prompt(prompt) => println!("[PROMPT] {}", prompt.text()),
        SurfaceEvent::PromptCleared => {}
        SurfaceEvent::Notice(notice) => println!("[NOTICE] {}", notice.text()),
        SurfaceEvent::Elapsed(seconds) => println!("[CALL] {}", format_clock(*seconds)),
        SurfaceEvent::TranscriptLine(text) => println!("[CALLER] {}", text),
        SurfaceEvent::Warning(text) => println!("[WARNING] {}", text),
    }
}

async fn calls(
    command: CallsCommand,
    archive: &CallArchive,
    speech: Arc<dyn SpeechSink>,
    config: &Config,
) -> Result<()> {
    match command {
        CallsCommand::List => {
            let records = archive.list();
            if records.is_empty() {
                println!("No saved calls.");
            }
            let now = Utc::now();
            for record in records {
                println!(
                    "{}  {:<16} {:>6}  {:<14} {}",
                    record.id,
                    record.phone_number,
                    format_duration(record.duration_seconds),
                    format_recency(record.timestamp, now),
                    if record.is_scam { "⚠️ lừa đảo" } else { "" }
                );
            }
        }
        CallsCommand::Show { id } => {
            let record = archive
                .get(&id)
                .with_context(|| format!("no saved call with id {}", id))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        CallsCommand::Delete { id } => {
            if archive.delete(&id).context("failed to update archive")? {
                println!("Deleted {}", id);
            } else {
                println!("No saved call with id {}", id);
            }
        }
        CallsCommand::Play { id } => {
            let record = archive
                .get(&id)
                .with_context(|| format!("no saved call with id {}", id))?;
            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let outcome = play_transcript(
                speech.as_ref(),
                &record.transcript,
                &config.locale,
                config.speech_rate,
                config.playback_gap(),
                cancel,
            )
            .await;
            match outcome {
                PlaybackOutcome::Completed { lines } => println!("Played {} lines", lines),
                PlaybackOutcome::Cancelled { at } => println!("Stopped at line {}", at + 1),
                PlaybackOutcome::Failed { at, error } => {
                    bail!("playback failed at line {}: {}", at + 1, error)
                }
            }
        }
    }
    Ok(())
}
