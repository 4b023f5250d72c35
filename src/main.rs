use anyhow::Result;
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;

mod ui;
mod utils;

use crate::ui::ChatUi;
use palaver::client::transport;
use palaver::{CallManager, ChatStore, Notifier, Router, Session};
use palaver::storage::{keys, FileKv, KvStore, MemoryKv};

/// Command line arguments for Palaver
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Palaver: a terminal realtime chat client.",
    long_about = "Palaver is a terminal client for a realtime chat server.\n\n\
    Optional parameters:\n\
    --server <ADDR>       Chat server address\n\
    --config-dir <PATH>   Override the directory for the client state file and log\n\
    Use -h or --help to see all options."
)]
struct Args {
    /// Chat server address
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:4000")]
    server: String,

    /// Directory for the client state file and log
    #[arg(long, value_name = "PATH")]
    config_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file_path = match &args.config_dir {
        Some(dir) => {
            if !dir.exists() {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    eprintln!(
                        "Warning: Failed to create config directory {}: {}. Logging to the working directory.",
                        dir.display(),
                        e
                    );
                    PathBuf::from("palaver.log")
                } else {
                    dir.join("palaver.log")
                }
            } else {
                dir.join("palaver.log")
            }
        }
        None => PathBuf::from("palaver.log"),
    };

    utils::setup_logging(log_file_path.to_str(), LevelFilter::Debug)?;

    info!("Palaver chat client starting up");
    info!(
        "System information: {} {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    info!("Logging to file: {}", log_file_path.display());

    // Client-side state persists across runs; fall back to an in-memory store
    // rather than refusing to start.
    let kv: Box<dyn KvStore> = match FileKv::open_default(args.config_dir.clone()) {
        Ok(kv) => Box::new(kv),
        Err(e) => {
            warn!("Falling back to in-memory state: {}", e);
            Box::new(MemoryKv::new())
        }
    };
    let dark_mode = kv
        .get(keys::DARK_MODE)
        .map(|v| v == "true")
        .unwrap_or(false);

    let (notifier, notice_rx) = Notifier::new();

    println!("Connecting to chat server at {}... please wait...\n", args.server);
    let transport = match transport::connect(&args.server, notifier.clone()).await {
        Ok(handle) => handle,
        Err(e) => {
            let error_details = format!("Connection to chat server failed: {}", e);
            let error_display = format!(
                "Failed to connect to {}\n\
                 Details: {}\n\
                 Please check:\n\
                 - Network connectivity\n\
                 - Server address is correct\n\
                 - Server is running and accepting connections",
                args.server, error_details
            );
            error!("{}", error_details);
            eprintln!("{}", error_display);
            return Err(anyhow::anyhow!(error_details));
        }
    };

    let store = ChatStore::new(transport.outbound.clone(), notifier.clone(), kv);
    let session = Session::new(transport.outbound.clone(), notifier.clone());
    let calls = CallManager::new(transport.outbound.clone(), notifier.clone());
    let mut router = Router::new(store, session, calls, notifier);
    let mut inbound = transport.inbound;

    // Resume the previous session before the first draw so a valid stored
    // token skips the login form entirely.
    router.session.check_stored(router.store.kv_mut());

    let mut terminal = ui::setup_terminal()?;
    let mut chat_ui = ChatUi::new(notice_rx, dark_mode);

    run_main_loop(&mut chat_ui, &mut terminal, &mut router, &mut inbound).await?;

    ui::restore_terminal(terminal)?;

    println!("Chat session ended.");
    Ok(())
}

/// Run the main event loop
async fn run_main_loop(
    chat_ui: &mut ChatUi,
    terminal: &mut ui::Terminal<ui::CrosstermBackend<std::io::Stdout>>,
    router: &mut Router,
    inbound: &mut tokio::sync::mpsc::UnboundedReceiver<palaver::InboundEvent>,
) -> Result<()> {
    loop {
        // Apply everything the server sent since the last frame before
        // drawing, so a frame never shows half-applied state.
        while let Ok(event) = inbound.try_recv() {
            router.handle(event);
        }

        chat_ui.tick(router);

        terminal.draw(|f| chat_ui.draw(f, router))?;

        chat_ui.handle_input(router)?;

        if chat_ui.should_quit() {
            break;
        }
    }

    Ok(())
}
