//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands::{self, RenderOptions};
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

/// Audio waveform images and a live scrolling waveform view
#[derive(Parser)]
#[command(name = "wavestack")]
#[command(version)]
#[command(
    long_about = "Audio waveform images and a live scrolling waveform view.\n\nEXAMPLES:\n    # Render a WAV file, one band per channel\n    $ wavestack render song.wav -o song.png\n\n    # Render raw interleaved f32 samples from another program\n    $ ffmpeg -i song.mp3 -f f32le -ac 2 - | wavestack render --raw --channels 2 - -o song.png\n\n    # Watch the default microphone\n    $ wavestack live"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/wavestack/wavestack.toml\n    Logs:               ~/.local/state/wavestack/wavestack.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an audio file to a PNG image
    ///
    /// Every channel is folded into a full-history waveform and the channels
    /// are stacked top to bottom.
    #[command(visible_alias = "r")]
    Render {
        /// WAV file, or raw samples with --raw ("-" reads stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// PNG file to write
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Read raw interleaved 32-bit float samples in native byte order
        #[arg(long)]
        raw: bool,

        /// Channel count of raw input
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        channels: u16,

        /// Samples folded into each image column (overrides config)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        samples_per_pair: Option<u64>,

        /// Height in pixels of each channel's band (overrides config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        height: Option<u32>,
    },

    /// Show a live scrolling waveform of an input device
    ///
    /// Space pauses and resumes, Escape/q quits.
    #[command(visible_alias = "l")]
    Live {
        /// Device: "default", an ID or a name from `list-devices` (overrides config)
        #[arg(short, long)]
        device: Option<String>,

        /// Samples folded into each on-screen column (overrides config)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        samples_per_column: Option<u64>,
    },

    /// List available audio input devices
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    Logs,

    /// Open configuration file in your preferred editor
    ///
    /// Writes the default configuration first if there is none.
    #[command(visible_alias = "c")]
    Config,

    /// Generate shell completion script
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging
    match &cli.command {
        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "wavestack", &mut io::stdout());
            return Ok(());
        }
        Commands::ListDevices => return commands::handle_list_devices(),
        Commands::Logs => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        Commands::Render {
            input,
            output,
            raw,
            channels,
            samples_per_pair,
            height,
        } => {
            let options = RenderOptions {
                input,
                output,
                raw,
                channels: usize::from(channels),
                samples_per_pair: samples_per_pair.map(to_usize).transpose()?,
                height,
            };
            commands::handle_render(options).inspect_err(|e| {
                tracing::error!("Render failed: {e:#}");
            })?;
        }
        Commands::Live {
            device,
            samples_per_column,
        } => {
            let samples_per_column = samples_per_column.map(to_usize).transpose()?;
            commands::handle_live(device, samples_per_column)?;
        }
        Commands::Config => {
            commands::handle_config()?;
        }
        Commands::Completions { .. } | Commands::ListDevices | Commands::Logs => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

fn to_usize(value: u64) -> anyhow::Result<usize> {
    usize::try_from(value).map_err(|_| anyhow::anyhow!("{value} is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "wavestack", "render", "--raw", "-c", "2", "-", "-o", "out.png",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                input,
                raw,
                channels,
                samples_per_pair,
                ..
            } => {
                assert_eq!(input, PathBuf::from("-"));
                assert!(raw);
                assert_eq!(channels, 2);
                assert_eq!(samples_per_pair, None);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_zero_values_are_rejected() {
        assert!(Cli::try_parse_from(["wavestack", "render", "a.wav", "-o", "a.png", "-s", "0"]).is_err());
        assert!(Cli::try_parse_from(["wavestack", "render", "a", "--raw", "-c", "0", "-o", "a.png"]).is_err());
        assert!(Cli::try_parse_from(["wavestack", "live", "-s", "0"]).is_err());
    }
}
