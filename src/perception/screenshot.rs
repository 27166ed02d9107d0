use std::io::Cursor;

use async_trait::async_trait;

use crate::errors::{ScreenLoopError, ScreenLoopResult};

/// Screen capture seam. Production captures the primary monitor; tests
/// substitute canned frames.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Returns the current screen as encoded PNG bytes.
    async fn capture(&self) -> ScreenLoopResult<Vec<u8>>;
}

pub struct PrimaryMonitorCapture;

#[async_trait]
impl ScreenCapture for PrimaryMonitorCapture {
    async fn capture(&self) -> ScreenLoopResult<Vec<u8>> {
        // xcap's capture path is blocking; keep it off the runtime threads.
        tokio::task::spawn_blocking(capture_primary)
            .await
            .map_err(|e| ScreenLoopError::Capture(format!("capture task failed: {e}")))?
    }
}

fn capture_primary() -> ScreenLoopResult<Vec<u8>> {
    let monitors = xcap::Monitor::all()
        .map_err(|e| ScreenLoopError::Capture(format!("monitor enumeration failed: {e}")))?;

    let monitor = monitors
        .iter()
        .find(|m| m.is_primary())
        .or_else(|| monitors.first())
        .ok_or_else(|| ScreenLoopError::Capture("no monitors found".into()))?;

    let frame = monitor
        .capture_image()
        .map_err(|e| ScreenLoopError::Capture(format!("screen capture failed: {e}")))?;

    tracing::debug!(
        width = frame.width(),
        height = frame.height(),
        "primary monitor captured"
    );

    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(frame)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}
