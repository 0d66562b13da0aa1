use std::io;

use anyhow::Context;
use chess_core::GameId;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use url::Url;

use sync_client::commands::{parse_command, Command, HELP};
use sync_client::link::game_id_from_link;
use sync_client::{Controller, MemoryChannel, RemoteChannel, SyncChannel, TextBoard, UiEvent};

/// Play chess against someone else through a shared game document.
#[derive(Parser, Debug)]
#[command(name = "chess-sync", version)]
struct Cli {
    /// Base URL of the sync server
    #[arg(long, env = "CHESS_SYNC_SERVER", default_value = "http://localhost:8000")]
    server: String,

    /// Join an existing game by id
    #[arg(long, conflicts_with = "link")]
    game: Option<String>,

    /// Join an existing game from a share link (`...?game=<id>`)
    #[arg(long)]
    link: Option<String>,

    /// Keep the game in memory instead of talking to a server
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, the board owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let base = Url::parse(&cli.server).with_context(|| format!("invalid server URL {}", cli.server))?;

    let game_id = match (&cli.game, &cli.link) {
        (Some(id), _) => Some(GameId::parse(id)?),
        (None, Some(link)) => game_id_from_link(link)?,
        (None, None) => None,
    };

    if cli.offline {
        play(MemoryChannel::new(), game_id, &base).await
    } else {
        play(RemoteChannel::new(base.as_str())?, game_id, &base).await
    }
}

async fn play<C: SyncChannel>(channel: C, game_id: Option<GameId>, base: &Url) -> anyhow::Result<()> {
    let board = TextBoard::new(io::stdout());
    let (controller, updates) = Controller::start(board, channel, game_id);

    println!("Share this game: {}", controller.share_link(base));
    println!("Type 'help' for commands.");

    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    tokio::spawn(read_commands(ui_tx));

    let controller = controller.run(ui_rx, updates).await;
    // Let queued moves reach the store before the runtime goes away
    controller.channel().flush().await;
    Ok(())
}

/// Feed stdin lines to the controller until `quit` or end of input.
async fn read_commands(ui: mpsc::UnboundedSender<UiEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read input: {e}");
                break;
            }
        };

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(Command::Help)) => println!("{HELP}"),
            Ok(Some(Command::Ui(event))) => {
                if ui.send(event).is_err() {
                    break;
                }
            }
            Err(e) => println!("{e}"),
        }
    }
}
