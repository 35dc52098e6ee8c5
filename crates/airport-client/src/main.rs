use std::sync::Arc;

use airport_client::audio::{CueEngine, TracingAudioSink};
use airport_client::console::{self, ConsoleInput};
use airport_client::push;
use airport_client::render::TracingRenderer;
use airport_client::screen::ScreenStateMachine;
use airport_client::sync::{SyncChannel, SyncEvent, SyncHandle};
use airport_client::transport::HttpGameClient;
use airport_proto::config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = airport_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("client.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("airport log: {}", log_path.display());

    tracing::info!("airport client starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config: {}; using defaults", e);
        Config::default()
    });

    // ── Session pieces ───────────────────────────────────────────────────────
    let api = Arc::new(HttpGameClient::new(&config.server, config.sync.clone())?);
    let cues = CueEngine::new(config.audio.clone(), Box::new(TracingAudioSink));
    let summary_url = format!(
        "{}/{}",
        config.server.base_url.trim_end_matches('/'),
        config.server.summary_path.trim_start_matches('/')
    );
    let machine = ScreenStateMachine::new(Box::new(TracingRenderer), cues, summary_url);

    // ── SyncEvent channel (timers/push/console → SyncChannel) ───────────────
    let (event_tx, event_rx) = mpsc::channel::<SyncEvent>(1024);
    let channel = SyncChannel::new(api, machine, config.sync.clone(), event_tx.clone());
    let handle = channel.handle();
    let session = channel.cancellation_token();

    // ── Push listener ────────────────────────────────────────────────────────
    if config.push.enabled {
        push::spawn_push_listener(
            config.push.clone(),
            config.server.session_id.clone(),
            event_tx.clone(),
            session.child_token(),
        );
    }

    // ── Player input ─────────────────────────────────────────────────────────
    tokio::spawn(read_console(handle.clone()));

    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received");
            ctrl_c.teardown().await;
        }
    });

    let machine = channel.run(event_rx).await;
    let state = machine.state();
    tracing::info!(
        "airport client stopped on {:?} ({} message(s) seen)",
        state.current_screen(),
        machine.feed().len()
    );
    Ok(())
}

async fn read_console(handle: SyncHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("console: read error: {}", e);
                break;
            }
        };
        match console::parse_line(&line) {
            Ok(Some(ConsoleInput::Command(command))) => handle.command(command).await,
            Ok(Some(ConsoleInput::HoldPolling)) => handle.pause().await,
            Ok(Some(ConsoleInput::ResumePolling)) => handle.resume().await,
            Ok(Some(ConsoleInput::Exit)) => {
                handle.teardown().await;
                break;
            }
            Ok(None) => {}
            Err(hint) => eprintln!("{}", hint),
        }
    }
}
