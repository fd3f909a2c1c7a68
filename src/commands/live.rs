//! Live scrolling waveform of an audio input device.

use anyhow::bail;
use std::time::Duration;
use wavestack::Palette;

use crate::capture::{LiveCapture, LiveCommand, WaveformTui};
use crate::config::{LiveConfig, WavestackConfig};

/// Captures audio and shows one scrolling waveform per channel until the
/// user quits.
///
/// # Errors
/// - If the configuration is invalid
/// - If the terminal or the audio device cannot be initialized
/// - If drawing or input handling fails
pub fn handle_live(
    device: Option<String>,
    samples_per_column: Option<usize>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== wavestack Live View Started ===");

    let config = WavestackConfig::load()?;
    let live = apply_overrides(config.live, device, samples_per_column);
    let palette = live.palette()?;
    if live.samples_per_column == 0 {
        bail!("live.samples_per_column must be at least 1");
    }

    tracing::info!(
        "Configuration loaded: device={}, samples_per_column={}, refresh={}ms",
        live.device,
        live.samples_per_column,
        live.refresh_ms
    );

    let mut tui = WaveformTui::new()?;
    let result = capture_and_draw(&mut tui, &live, palette);

    // Restore the terminal before any error reaches the user.
    tui.cleanup()?;

    if let Err(e) = &result {
        tracing::error!("Live view failed: {e}");
    }
    result
}

fn capture_and_draw(
    tui: &mut WaveformTui,
    live: &LiveConfig,
    palette: Palette,
) -> anyhow::Result<()> {
    let (width, pixel_height) = tui.canvas_size()?;
    let capture = LiveCapture::start(
        &live.device,
        width,
        pixel_height,
        live.samples_per_column,
        palette,
    )?;
    run_loop(tui, &capture, Duration::from_millis(live.refresh_ms))
}

fn run_loop(
    tui: &mut WaveformTui,
    capture: &LiveCapture,
    refresh: Duration,
) -> anyhow::Result<()> {
    let mut canvas = tui.canvas_size()?;
    let mut frame_count = 0u64;

    loop {
        match tui.handle_input(refresh)? {
            LiveCommand::Quit => break,
            LiveCommand::TogglePause => capture.toggle_pause(),
            LiveCommand::Continue => {}
        }

        let size = tui.canvas_size()?;
        if size != canvas {
            tracing::debug!("Canvas resized to {}x{}", size.0, size.1);
            capture.resize(size.0, size.1)?;
            canvas = size;
        }

        tui.draw(capture)?;

        frame_count += 1;
        if frame_count % 300 == 0 {
            tracing::debug!("Live view: {} frames drawn", frame_count);
        }
    }

    tracing::info!("Live view stopped after {} frames", frame_count);
    Ok(())
}

fn apply_overrides(
    mut live: LiveConfig,
    device: Option<String>,
    samples_per_column: Option<usize>,
) -> LiveConfig {
    if let Some(device) = device {
        live.device = device;
    }
    if let Some(samples_per_column) = samples_per_column {
        live.samples_per_column = samples_per_column;
    }
    live
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_replace_given_values() {
        let live = apply_overrides(LiveConfig::default(), Some("2".to_string()), None);
        assert_eq!(live.device, "2");
        assert_eq!(
            live.samples_per_column,
            LiveConfig::default().samples_per_column
        );

        let live = apply_overrides(LiveConfig::default(), None, Some(64));
        assert_eq!(live.device, "default");
        assert_eq!(live.samples_per_column, 64);
    }
}
