use std::time::Duration;

use crate::config::AutomationSettings;

/// Lifecycle states of one automation cycle. The engine owns exactly one of
/// these at a time; transitions happen only on the engine task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleState {
    /// Chain stopped; waiting for a toggle or a one-shot trigger.
    Idle,
    /// Obtaining a screen image. `retried` marks the single bounded retry.
    Capturing { retried: bool },
    /// A capture/analysis exchange is outstanding for this frame.
    Analyzing { frame: Vec<u8> },
    /// Consulting the resolver on the reply and, if applicable, clicking.
    ActingOnResult { reply: String },
    /// Waiting out the inter-cycle delay before the next capture.
    Scheduled { delay: Duration },
}

/// Commands sent into the engine loop. Events arriving while a cycle is in
/// flight queue on the channel and are observed at the next scheduling
/// boundary, so an in-flight cycle always completes first.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Flip chain mode on/off (the hotkey surface).
    ToggleChain,
    /// Run a single non-chained capture cycle.
    RunOnce,
    /// A manual chat message sharing the automation conversation.
    UserMessage(String),
    /// The active chat session changed; conversation context resets.
    ChatSwitched,
    /// Settings edited through the settings surface.
    SettingsChanged(AutomationSettings),
    /// Stop the engine task entirely.
    Shutdown,
}

/// How the just-completed cycle ended. Every variant schedules exactly once
/// while the chain is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    ActionExecuted,
    ActionFailed,
    NoAction,
    CaptureFailed,
    TransportFailed,
}
