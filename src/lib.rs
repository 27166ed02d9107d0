pub mod api;
pub mod automation;
pub mod buttons;
pub mod config;
pub mod errors;
pub mod executor;
pub mod perception;
pub mod resolver;
pub mod transcript;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, RwLock};

use crate::api::http_client::HttpApiClient;
use crate::automation::engine::AutomationEngine;
use crate::automation::state::EngineEvent;
use crate::buttons::ButtonRegistry;
use crate::errors::ScreenLoopResult;
use crate::executor::input::EnigoDispatcher;
use crate::perception::screenshot::PrimaryMonitorCapture;
use crate::transcript::{Sender, TranscriptLog};

pub async fn run() -> ScreenLoopResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let config = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config, using defaults");
            config::AppConfig {
                api: config::ApiConfig {
                    base_url: "http://127.0.0.1:8080".into(),
                    timeout_secs: 30,
                },
                automation: config::AutomationSettings::default(),
            }
        }
    };

    let client = Arc::new(HttpApiClient::new(&config.api)?);
    if let Ok(token) = std::env::var("SCREENLOOP_API_TOKEN") {
        client.set_token(token).await;
    } else {
        tracing::warn!("SCREENLOOP_API_TOKEN not set; API calls will fail until login");
    }

    let registry_path = buttons::default_registry_path();
    let registry = Arc::new(RwLock::new(ButtonRegistry::load_or_default(&registry_path)?));

    let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(32);
    let (transcript_tx, mut transcript_rx) = transcript::channel();

    // Drain the transcript to stdout and the session log.
    let log = TranscriptLog::new();
    tracing::info!(session = %log.session_id, "transcript session started");
    tokio::spawn(async move {
        while let Some(entry) = transcript_rx.recv().await {
            let tag = match entry.sender {
                Sender::User => "you",
                Sender::Assistant => "ai",
                Sender::Error => "error",
            };
            println!("[{}] {}: {}", entry.ts.format("%H:%M:%S"), tag, entry.text);
            if let Err(e) = log.append(&entry) {
                tracing::warn!(error = %e, "transcript log write failed");
            }
        }
    });

    let mut engine = AutomationEngine::new(
        client,
        Arc::new(PrimaryMonitorCapture),
        Arc::new(EnigoDispatcher),
        registry,
        config.automation.clone(),
        event_rx,
        transcript_tx,
    );
    let engine_task = tokio::spawn(async move { engine.run().await });

    // Stdin command surface standing in for the GUI hotkeys:
    //   /auto   toggle chain mode
    //   /shot   one-shot capture cycle
    //   /switch new chat session (resets conversation context)
    //   /quit   exit
    // Anything else is sent as a manual chat message.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        let event = match line.as_str() {
            "" => continue,
            "/auto" => EngineEvent::ToggleChain,
            "/shot" => EngineEvent::RunOnce,
            "/switch" => EngineEvent::ChatSwitched,
            "/quit" => {
                let _ = event_tx.send(EngineEvent::Shutdown).await;
                break;
            }
            _ => EngineEvent::UserMessage(line),
        };
        if event_tx.send(event).await.is_err() {
            break;
        }
    }

    let _ = engine_task.await;
    Ok(())
}
