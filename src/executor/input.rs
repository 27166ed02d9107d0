use async_trait::async_trait;
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};

use crate::errors::{ScreenLoopError, ScreenLoopResult};

/// Synthesized mouse input seam. The OS level has no meaningful failure
/// mode beyond setup errors, so success means "the click was issued".
#[async_trait]
pub trait ClickDispatcher: Send + Sync {
    async fn dispatch_click(&self, x: i32, y: i32) -> ScreenLoopResult<()>;
}

pub struct EnigoDispatcher;

#[async_trait]
impl ClickDispatcher for EnigoDispatcher {
    async fn dispatch_click(&self, x: i32, y: i32) -> ScreenLoopResult<()> {
        tokio::task::spawn_blocking(move || click_at(x, y))
            .await
            .map_err(|e| ScreenLoopError::Input(format!("input task failed: {e}")))?
    }
}

fn click_at(x: i32, y: i32) -> ScreenLoopResult<()> {
    let mut enigo = Enigo::new(&Settings::default())
        .map_err(|e| ScreenLoopError::Input(format!("input backend unavailable: {e}")))?;

    // Move first, then click, so hover-sensitive controls see the cursor.
    enigo
        .move_mouse(x, y, Coordinate::Abs)
        .map_err(|e| ScreenLoopError::Input(format!("mouse move failed: {e}")))?;
    enigo
        .button(Button::Left, Direction::Click)
        .map_err(|e| ScreenLoopError::Input(format!("mouse click failed: {e}")))?;

    tracing::info!(x, y, "click dispatched");
    Ok(())
}
