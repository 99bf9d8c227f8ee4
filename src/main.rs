use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use icontale::avatar::AvatarStore;
use icontale::cli::{self, Command, TerminalRenderer};
use icontale::client::{self, transport::WsTransport};
use icontale::config::ClientConfig;
use icontale::state::Session;

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Logs go to stderr so they don't interleave with the game on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "icontale=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Icon Tale client...");

    let config = ClientConfig::from_env();
    let store = AvatarStore::new(&config.prefs_path);
    tracing::debug!("Avatar preferences at {}", store.path().display());
    let avatar = store.load_or_pick();
    tracing::info!("Using avatar {}", avatar);

    let transport = match WsTransport::connect(&config.server_url).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Could not reach {}: {}", config.server_url, e);
            std::process::exit(1);
        }
    };

    let (intent_tx, intent_rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            };
            match cli::parse_command(&line) {
                Ok(Command::Intent(intent)) => {
                    if intent_tx.send(intent).await.is_err() {
                        break;
                    }
                }
                Ok(Command::Help) => println!("{}", cli::HELP),
                Ok(Command::Quit) => break,
                Err(cli::ParseError::Empty) => {}
                Err(e) => println!("{}", e),
            }
        }
    });

    let mut renderer = TerminalRenderer::new(std::io::stdout());
    let session = Session::new(config.session(), avatar);
    client::run(
        session,
        transport,
        &mut renderer,
        intent_rx,
        Some(&store),
        config.tick,
    )
    .await;

    tracing::info!("Bye");
}
