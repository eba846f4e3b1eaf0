//! Rollcall CLI entry point.
//!
//! Provides `pending`, `compose`, and `session` subcommands: list clients
//! missing an identifier, run one scripted validation workflow, or drive the
//! workflow interactively while the roster file is watched for fixes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use rollcall::config::{config_dir, Config};
use rollcall::messaging::StdoutTransport;
use rollcall::roster::watcher::RosterWatcher;
use rollcall::roster::{CandidateRecord, JsonRosterFile, RosterSource};
use rollcall::selection::{EscrowPolicy, SelectionEngine};
use rollcall::session::{self, Flow};
use rollcall::workflow::{LoggingEditor, RecordEditor, Workflow, WorkflowObserver, WorkflowOptions};

/// Rollcall — send identity validation requests for selected clients.
#[derive(Parser)]
#[command(name = "rollcall", version, about)]
struct Cli {
    /// Config file (defaults to `$ROLLCALL_CONFIG_PATH` or `~/.rollcall/config.toml`).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// List clients, the ones missing an identifier first.
    Pending {
        /// Roster JSON file.
        #[arg(long, value_name = "FILE")]
        roster: PathBuf,
        /// Only list clients whose name contains this text.
        #[arg(long)]
        search: Option<String>,
    },
    /// Run one scripted workflow and print the composed message.
    Compose {
        /// Roster JSON file.
        #[arg(long, value_name = "FILE")]
        roster: PathBuf,
        /// Preselection hint applied when the workflow opens.
        #[arg(long, value_name = "ID")]
        preselect: Vec<String>,
        /// Clients to select, in order.
        #[arg(long, value_name = "ID")]
        select: Vec<String>,
        /// Select every client in the (filtered) roster.
        #[arg(long)]
        all: bool,
        /// Search text applied before `--all`.
        #[arg(long)]
        search: Option<String>,
        /// Recipient address.
        #[arg(long, value_name = "EMAIL")]
        recipient: Option<String>,
        /// Emit a JSON report.
        #[arg(long)]
        json: bool,
    },
    /// Drive the workflow interactively; roster edits are picked up live.
    Session {
        /// Roster JSON file.
        #[arg(long, value_name = "FILE")]
        roster: PathBuf,
        /// Preselection hint applied when the workflow opens.
        #[arg(long, value_name = "ID")]
        preselect: Vec<String>,
        /// Recipient address.
        #[arg(long, value_name = "EMAIL")]
        recipient: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Pending { roster, search } => {
            rollcall::logging::init_cli();
            handle_pending(&roster, search.as_deref())
        }
        Command::Compose {
            roster,
            preselect,
            select,
            all,
            search,
            recipient,
            json,
        } => {
            rollcall::logging::init_cli();
            let config = load_config(cli.config.as_deref())?;
            let script = ComposeScript {
                preselect,
                select,
                all,
                search,
                recipient,
            };
            handle_compose(&config, &roster, &script, json)
        }
        Command::Session {
            roster,
            preselect,
            recipient,
        } => {
            let logs_dir = config_dir()?.join("logs");
            let _logging_guard = rollcall::logging::init_production(&logs_dir)?;
            let config = load_config(cli.config.as_deref())?;
            handle_session(&config, roster, &preselect, recipient.as_deref()).await
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")
}

/// Print the escrow-first roster view.
fn handle_pending(roster: &Path, search: Option<&str>) -> anyhow::Result<()> {
    let candidates = JsonRosterFile::new(roster.to_path_buf()).snapshot()?;
    let mut engine = SelectionEngine::new(EscrowPolicy::default());
    engine.initialize(candidates, &[]);
    if let Some(text) = search {
        engine.set_filter(text);
    }

    let view = engine.filtered_view();
    if view.is_empty() {
        println!("no clients");
        return Ok(());
    }
    let missing = view.iter().filter(|c| !c.has_identifier()).count();
    for record in &view {
        if record.has_identifier() {
            println!("  {}\t{} - {}", record.id, record.display_name, record.identifier_str());
        } else {
            println!("! {}\t{}\t(sin identificación)", record.id, record.display_name);
        }
    }
    println!("{missing} of {} clients missing an identifier", view.len());
    Ok(())
}

/// Scripted operator actions for `compose`.
struct ComposeScript {
    preselect: Vec<String>,
    select: Vec<String>,
    all: bool,
    search: Option<String>,
    recipient: Option<String>,
}

fn handle_compose(
    config: &Config,
    roster: &Path,
    script: &ComposeScript,
    json: bool,
) -> anyhow::Result<()> {
    let candidates = JsonRosterFile::new(roster.to_path_buf()).snapshot()?;
    let mut workflow = Workflow::new(
        WorkflowOptions::from_config(config),
        Arc::new(LoggingEditor),
        Arc::new(StdoutTransport),
    );
    workflow.open(candidates, &script.preselect);

    if let Some(text) = &script.search {
        workflow.set_filter(text);
    }
    if script.all {
        workflow.select_all();
    }
    for id in &script.select {
        if !workflow.toggle_id(id) {
            warn!(id = %id, "unknown client id");
        }
    }
    if let Some(recipient) = &script.recipient {
        workflow.set_recipient(recipient);
    }

    if json {
        let report = serde_json::to_string_pretty(&workflow.snapshot())
            .context("failed to serialize report")?;
        println!("{report}");
    } else {
        print!("{}", session::render_state(&workflow));
        match workflow.transport_address() {
            Some(address) => println!("\n{address}"),
            None => println!("\n(sending disabled: needs a recipient and a selected client)"),
        }
    }
    Ok(())
}

/// Editor that points the operator at the roster file.
struct RosterFileEditor {
    roster: PathBuf,
}

impl RecordEditor for RosterFileEditor {
    fn request_edit(&self, record: &CandidateRecord) {
        println!(
            "add an identification number for {} (id {}) in {}",
            record.display_name,
            record.id,
            self.roster.display()
        );
    }
}

/// Observer that echoes the final selection so callers can reuse it.
struct PrintSelection;

impl WorkflowObserver for PrintSelection {
    fn on_close(&self, selected_ids: &[String]) {
        println!("selected: {}", selected_ids.join(","));
    }
}

async fn handle_session(
    config: &Config,
    roster_path: PathBuf,
    preselect: &[String],
    recipient: Option<&str>,
) -> anyhow::Result<()> {
    let roster = JsonRosterFile::new(roster_path.clone());
    let candidates = roster.snapshot()?;
    let (_watcher, mut changes) = RosterWatcher::spawn(&roster_path)?;

    let mut workflow = Workflow::new(
        WorkflowOptions::from_config(config),
        Arc::new(RosterFileEditor {
            roster: roster_path.clone(),
        }),
        Arc::new(StdoutTransport),
    );
    workflow.set_observer(Arc::new(PrintSelection));
    workflow.open(candidates, preselect);
    if let Some(recipient) = recipient {
        workflow.set_recipient(recipient);
    }

    println!("{}", session::render_state(&workflow));
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    workflow.close();
                    break;
                };
                match session::parse(&line) {
                    Ok(command) => {
                        let (output, flow) = session::apply(&mut workflow, command);
                        println!("{output}");
                        if flow == Flow::Quit {
                            break;
                        }
                    }
                    Err(message) => println!("{message}"),
                }
            }
            Some(()) = changes.recv() => {
                match roster.snapshot() {
                    Ok(updated) => {
                        info!(count = updated.len(), "roster reloaded");
                        workflow.candidates_changed(updated);
                        println!("{}", session::render_state(&workflow));
                    }
                    Err(e) => warn!(error = %e, "failed to reload roster"),
                }
            }
        }
    }

    Ok(())
}
