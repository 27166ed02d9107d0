use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::api::provider::AiProvider;
use crate::automation::conversation::Conversation;
use crate::automation::state::{CycleOutcome, CycleState, EngineEvent};
use crate::buttons::ButtonRegistry;
use crate::config::AutomationSettings;
use crate::executor::input::ClickDispatcher;
use crate::perception::screenshot::ScreenCapture;
use crate::resolver::resolve_action;
use crate::transcript::{Sender, TranscriptEntry, TranscriptTx};

/// Drives the capture → analyze → act → reschedule chain.
///
/// The engine is a single task owning all cycle state, so at most one
/// capture/analyze/act cycle is ever in flight and shared state is mutated
/// from exactly one place. Control events queue on the mpsc channel and are
/// observed at scheduling boundaries; an in-flight cycle always completes.
pub struct AutomationEngine {
    state: CycleState,
    /// Whether chain mode is running. Flipped only at boundaries.
    enabled: bool,
    /// Whether the current cycle belongs to the chain (vs a one-shot).
    chained: bool,
    settings: AutomationSettings,
    conversation: Conversation,
    registry: Arc<RwLock<ButtonRegistry>>,
    api: Arc<dyn AiProvider>,
    capture: Arc<dyn ScreenCapture>,
    clicker: Arc<dyn ClickDispatcher>,
    events: mpsc::Receiver<EngineEvent>,
    transcript: TranscriptTx,
}

impl AutomationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: Arc<dyn AiProvider>,
        capture: Arc<dyn ScreenCapture>,
        clicker: Arc<dyn ClickDispatcher>,
        registry: Arc<RwLock<ButtonRegistry>>,
        settings: AutomationSettings,
        events: mpsc::Receiver<EngineEvent>,
        transcript: TranscriptTx,
    ) -> Self {
        Self {
            state: CycleState::Idle,
            enabled: false,
            chained: false,
            settings,
            conversation: Conversation::new(),
            registry,
            api,
            capture,
            clicker,
            events,
            transcript,
        }
    }

    pub async fn run(&mut self) {
        loop {
            match std::mem::replace(&mut self.state, CycleState::Idle) {
                CycleState::Idle => {
                    let Some(event) = self.events.recv().await else {
                        break;
                    };
                    if self.handle_idle_event(event).await {
                        break;
                    }
                }

                CycleState::Capturing { retried } => {
                    self.capture_frame(retried).await;
                }

                CycleState::Analyzing { frame } => {
                    self.analyze_frame(frame).await;
                }

                CycleState::ActingOnResult { reply } => {
                    let outcome = self.act_on_reply(&reply).await;
                    self.finish_cycle(outcome);
                }

                CycleState::Scheduled { delay } => {
                    if self.wait_out_delay(delay).await {
                        break;
                    }
                }
            }
        }
        tracing::info!("automation engine stopped");
    }

    // ── Event handling ────────────────────────────────────────────────────

    /// Handles an event received while idle. Returns true on shutdown.
    async fn handle_idle_event(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::ToggleChain => {
                self.enabled = true;
                self.chained = true;
                self.say(Sender::Assistant, "Auto screenshots: ON (chain mode)");
                tracing::info!("chain mode enabled, first capture fires immediately");
                self.state = CycleState::Capturing { retried: false };
            }
            EngineEvent::RunOnce => {
                self.chained = false;
                tracing::info!("one-shot capture requested");
                self.state = CycleState::Capturing { retried: false };
            }
            EngineEvent::UserMessage(message) => {
                self.handle_user_message(&message).await;
            }
            EngineEvent::ChatSwitched => {
                self.conversation.reset();
                tracing::info!("chat switched, conversation context reset");
            }
            EngineEvent::SettingsChanged(settings) => {
                tracing::info!(
                    automation = settings.enabled,
                    interval = settings.interval_seconds,
                    "settings updated"
                );
                self.settings = settings;
            }
            EngineEvent::Shutdown => return true,
        }
        false
    }

    /// Waits out an inter-cycle delay, observing control events while the
    /// timer runs. Returns true on shutdown.
    async fn wait_out_delay(&mut self, delay: std::time::Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => {
                    if self.enabled {
                        self.state = CycleState::Capturing { retried: false };
                    } else {
                        // Toggled off while scheduled: do not fire.
                        self.state = CycleState::Idle;
                    }
                    return false;
                }
                event = self.events.recv() => match event {
                    None | Some(EngineEvent::Shutdown) => return true,
                    Some(EngineEvent::ToggleChain) => {
                        self.enabled = !self.enabled;
                        self.say(
                            Sender::Assistant,
                            if self.enabled {
                                "Auto screenshots: ON (chain mode)"
                            } else {
                                "Auto screenshots: OFF"
                            },
                        );
                        if !self.enabled {
                            self.state = CycleState::Idle;
                            return false;
                        }
                    }
                    Some(EngineEvent::RunOnce) => {
                        tracing::debug!("one-shot request deferred, chain already running");
                    }
                    Some(EngineEvent::UserMessage(message)) => {
                        self.handle_user_message(&message).await;
                    }
                    Some(EngineEvent::ChatSwitched) => {
                        self.conversation.reset();
                        tracing::info!("chat switched, conversation context reset");
                    }
                    Some(EngineEvent::SettingsChanged(settings)) => {
                        self.settings = settings;
                    }
                },
            }
        }
    }

    // ── Cycle phases ──────────────────────────────────────────────────────

    async fn capture_frame(&mut self, retried: bool) {
        match self.capture.capture().await {
            Ok(frame) => {
                tracing::info!(bytes = frame.len(), retried, "screenshot captured");
                self.say(Sender::Assistant, "Screenshot captured, analyzing...");
                self.state = CycleState::Analyzing { frame };
            }
            Err(e) if !retried => {
                tracing::warn!(error = %e, "capture failed, retrying once");
                tokio::time::sleep(self.settings.capture_retry_delay()).await;
                self.state = CycleState::Capturing { retried: true };
            }
            Err(e) => {
                tracing::error!(error = %e, "capture failed after retry");
                self.say(
                    Sender::Error,
                    format!("Failed to capture screenshot: {e}"),
                );
                self.finish_cycle(CycleOutcome::CaptureFailed);
            }
        }
    }

    async fn analyze_frame(&mut self, frame: Vec<u8>) {
        let prompt = self.settings.prompt.clone();

        let analysis = match self.api.analyze_image(&frame, &prompt).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::error!(error = %e, "image analysis failed");
                self.say(Sender::Error, format!("Analysis error: {e}"));
                self.finish_cycle(CycleOutcome::TransportFailed);
                return;
            }
        };

        self.say(
            Sender::Assistant,
            format!("Screenshot analysis:\n\n{}", analysis.text),
        );

        // Forward the analysis through the shared conversation so the AI's
        // next turn (automated or manual) sees it in context.
        match self
            .api
            .send_message(&analysis.text, self.conversation.token())
            .await
        {
            Ok(reply) => {
                self.conversation.advance(reply.response_id.clone());
                self.say(Sender::Assistant, reply.text.clone());
                self.state = CycleState::ActingOnResult { reply: reply.text };
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to forward analysis to chat");
                self.say(Sender::Error, format!("Failed to send analysis to chat: {e}"));
                self.finish_cycle(CycleOutcome::TransportFailed);
            }
        }
    }

    async fn act_on_reply(&mut self, reply: &str) -> CycleOutcome {
        if !self.settings.enabled {
            tracing::debug!("automation disabled, resolver output ignored");
            return CycleOutcome::NoAction;
        }

        let action = {
            let registry = self.registry.read().await;
            resolve_action(reply, &registry)
        };

        let Some(button_id) = action else {
            tracing::info!("no action in reply");
            return CycleOutcome::NoAction;
        };

        self.say(Sender::Assistant, format!("Executing action: {button_id}"));
        if self.execute_action(&button_id).await {
            CycleOutcome::ActionExecuted
        } else {
            CycleOutcome::ActionFailed
        }
    }

    /// Clicks the center of a registered button. Returns false (after a
    /// transcript entry) when the id vanished from the registry or the
    /// click could not be issued.
    async fn execute_action(&mut self, button_id: &str) -> bool {
        let (center, name, available) = {
            let registry = self.registry.read().await;
            (
                registry.center_of(button_id),
                registry.resolve(button_id).map(|b| b.name.clone()),
                registry.available_ids(),
            )
        };

        let Some((x, y)) = center else {
            tracing::error!(button_id, ?available, "resolved button no longer registered");
            self.say(
                Sender::Error,
                format!(
                    "Button '{}' not found. Available buttons: {}",
                    button_id,
                    available.join(", ")
                ),
            );
            return false;
        };

        match self.clicker.dispatch_click(x, y).await {
            Ok(()) => {
                let name = name.unwrap_or_else(|| button_id.to_string());
                tracing::info!(button_id, x, y, "button clicked");
                self.say(
                    Sender::Assistant,
                    format!("Pressed button '{name}' ({button_id})"),
                );
                true
            }
            Err(e) => {
                tracing::error!(button_id, error = %e, "click dispatch failed");
                self.say(Sender::Error, format!("Click failed: {e}"));
                false
            }
        }
    }

    /// Manual chat message sharing the automation conversation. Executes a
    /// resolved action too, but never reschedules the chain.
    async fn handle_user_message(&mut self, message: &str) {
        self.say(Sender::User, message);

        match self.api.send_message(message, self.conversation.token()).await {
            Ok(reply) => {
                self.conversation.advance(reply.response_id.clone());
                self.say(Sender::Assistant, reply.text.clone());

                if self.settings.enabled {
                    let action = {
                        let registry = self.registry.read().await;
                        resolve_action(&reply.text, &registry)
                    };
                    if let Some(button_id) = action {
                        self.say(Sender::Assistant, format!("Executing action: {button_id}"));
                        self.execute_action(&button_id).await;
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "manual message failed");
                self.say(Sender::Error, format!("Send error: {e}"));
            }
        }
    }

    /// Exactly one scheduling decision per completed cycle: back to the
    /// chain when it is running, otherwise idle.
    fn finish_cycle(&mut self, outcome: CycleOutcome) {
        if !(self.chained && self.enabled) {
            tracing::info!(?outcome, "one-shot cycle complete");
            self.state = CycleState::Idle;
            return;
        }

        // Within the chain: the settle delay paces cycles while automation
        // may act; the configured interval applies when it may not.
        let delay = if self.settings.enabled {
            self.settings.settle_delay()
        } else {
            self.settings.interval()
        };
        tracing::info!(?outcome, ?delay, "cycle complete, rescheduling");
        self.state = CycleState::Scheduled { delay };
    }

    fn say(&self, sender: Sender, text: impl Into<String>) {
        let _ = self.transcript.send(TranscriptEntry::now(sender, text));
    }
}
