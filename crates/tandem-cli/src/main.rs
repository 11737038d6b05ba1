mod input;
mod presenter;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tandem_common::telemetry::{self, TelemetryConfig};
use tandem_common::transport::{CollabNode, GossipTransport, RoomCode, parse_node_id};
use tandem_common::{Config, FileStore};
use tandem_sync::{Command, MemoryDocument, Session};
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, oneshot};

use crate::input::{HELP, Input};
use crate::presenter::{TerminalPresenter, paint};

#[derive(Parser)]
#[command(version, about = "Pair-edit a text buffer over iroh gossip", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (.toml or .json). Defaults to the platform config dir.
    #[arg(long, global = true, env = "TANDEM_CONFIG")]
    config: Option<PathBuf>,

    /// Name shown to peers while you type
    #[arg(long, short, global = true)]
    name: Option<String>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh room code
    Room,
    /// Open a room and wait for a peer
    Host {
        /// Room code to use instead of a generated one
        #[arg(long)]
        room: Option<String>,

        /// Seed the buffer from this file; `:w` writes it back
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
    /// Join a room a peer is hosting
    Join {
        /// Six-digit room code
        room: String,

        /// Node id printed by `tandem host` (repeatable)
        #[arg(long = "peer", short, required = true)]
        peers: Vec<String>,

        /// Seed the buffer from this file; `:w` writes it back
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_miette();
    let cli = Cli::parse();

    let mut telemetry_config = TelemetryConfig::from_env("tandem");
    if cli.verbose {
        telemetry_config = telemetry_config.with_level(tracing::Level::DEBUG);
    }
    telemetry::init(telemetry_config);

    match cli.command {
        Commands::Room => {
            println!("{}", RoomCode::generate());
        }
        Commands::Host { ref room, ref file } => {
            let room = match room {
                Some(code) => RoomCode::parse(code)?,
                None => RoomCode::generate(),
            };
            let config = load_config(&cli).await?;
            pair(config, room, Vec::new(), file.clone()).await?;
        }
        Commands::Join {
            ref room,
            ref peers,
            ref file,
        } => {
            let room = RoomCode::parse(room)?;
            let config = load_config(&cli).await?;
            pair(config, room, peers.clone(), file.clone()).await?;
        }
    }

    Ok(())
}

async fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli
        .config
        .clone()
        .or_else(|| dirs::config_dir().map(|dir| dir.join("tandem").join("config.toml")));

    let mut config = match path {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "loading config");
            Config::load(&FileStore::new(&path)).await?
        }
        Some(path) if cli.config.is_some() => {
            return Err(miette::miette!("config file {} not found", path.display()));
        }
        _ => Config::default(),
    };
    config = config.with_env()?;

    if let Some(name) = &cli.name {
        config.username = name.as_str().into();
    }
    Ok(config)
}

async fn pair(
    config: Config,
    room: RoomCode,
    peers: Vec<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let bootstrap = peers
        .iter()
        .map(|peer| parse_node_id(peer))
        .collect::<Result<Vec<_>, _>>()?;

    let document = match &file {
        Some(path) if path.exists() => {
            let text = tokio::fs::read_to_string(path).await.into_diagnostic()?;
            MemoryDocument::from_text(&text)
        }
        _ => MemoryDocument::new(),
    };

    println!("→ Starting node...");
    let node = CollabNode::spawn(None).await?;
    println!("✓ Room {room}");
    println!("  node id: {}", node.node_id());
    if bootstrap.is_empty() {
        println!(
            "  peers join with: tandem join {room} --peer {}",
            node.node_id()
        );
    }

    let transport = GossipTransport::new(node, bootstrap);
    let (mut session, inbound) = Session::join(
        &transport,
        room,
        config.sync_settings(),
        document,
        TerminalPresenter::new(),
    )
    .await?;

    println!("  type text to append lines, :help for commands");
    let (commands, requests) = mpsc::channel(32);
    let (ran, read) = tokio::join!(
        session.run(inbound, requests),
        read_commands(commands, file.as_deref())
    );
    ran?;
    read
}

/// Turn stdin lines into session commands until `:quit`, end of input or the
/// session stopping on its own.
async fn read_commands(commands: mpsc::Sender<Command>, file: Option<&Path>) -> Result<()> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = commands.closed() => return Ok(()),
            line = lines.next_line() => line.into_diagnostic()?,
        };
        let input = match line.as_deref().map(input::parse) {
            None => Input::Quit,
            Some(Ok(input)) => input,
            Some(Err(e)) => {
                eprintln!("{:?}", miette::Report::new(e));
                continue;
            }
        };

        let command = match input {
            Input::Append(line) => Command::AppendLine(line),
            Input::Replace { range, text } => Command::Edit { range, text },
            Input::HardSync => Command::HardSync,
            Input::Quit => Command::Leave,
            Input::Show => {
                if let Some(text) = request(&commands, Command::Snapshot).await {
                    print!("{text}");
                    if !text.is_empty() && !text.ends_with('\n') {
                        println!();
                    }
                }
                continue;
            }
            Input::Who => {
                let who = request(&commands, Command::Collaborators).await;
                match who.as_deref() {
                    None | Some([]) => println!("  no one else has spoken yet"),
                    Some(collaborators) => {
                        for who in collaborators {
                            let status = if who.typing { "typing" } else { "idle" };
                            println!(
                                "  {} ({}) {status}",
                                paint(&who.display_name, who.color),
                                who.author
                            );
                        }
                    }
                }
                continue;
            }
            Input::Write => {
                match file {
                    Some(path) => {
                        if let Some(text) = request(&commands, Command::Snapshot).await {
                            tokio::fs::write(path, text).await.into_diagnostic()?;
                            println!("✓ Wrote {}", path.display());
                        }
                    }
                    None => eprintln!("no --file given"),
                }
                continue;
            }
            Input::Stats => {
                print!("{}", telemetry::render());
                continue;
            }
            Input::Help => {
                println!("{HELP}");
                continue;
            }
        };

        let leaving = matches!(command, Command::Leave);
        // A closed channel means the session already stopped
        if commands.send(command).await.is_err() || leaving {
            return Ok(());
        }
    }
}

/// Ask the session something and wait for the reply. `None` once the
/// session has stopped.
async fn request<T>(
    commands: &mpsc::Sender<Command>,
    ask: impl FnOnce(oneshot::Sender<T>) -> Command,
) -> Option<T> {
    let (reply, answer) = oneshot::channel();
    commands.send(ask(reply)).await.ok()?;
    answer.await.ok()
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
