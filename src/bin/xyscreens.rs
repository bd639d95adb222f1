//! Command line control for XY Screens projector screens and lifts.
//!
//! ```text
//! xyscreens --device 192.168.1.100:9997 --address 01 --down-duration 30 down --wait
//! xyscreens --config screen.toml position 40
//! ```
//!
//! Each run starts from the configured initial position; nothing is
//! remembered between runs. `position` always waits for its stop, the other
//! movements only with `--wait`. Ctrl-C stops the waiting, not the screen.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use xyscreens::config::ScreenConfig;
use xyscreens::services::{Arrival, AsyncScreen};
use xyscreens::Address;

/// Control an XY Screens projector screen or lift.
#[derive(Parser, Debug)]
#[command(name = "xyscreens", version)]
struct Opts {
    /// Serial port path or host:port of a serial-over-IP bridge
    #[arg(short, long)]
    device: Option<String>,

    /// Receiver address in hex, 1 to 3 bytes (e.g. 01 or AAEEEE)
    #[arg(short, long, value_parser = parse_address)]
    address: Option<Address>,

    /// Seconds for full travel down
    #[arg(long)]
    down_duration: Option<f32>,

    /// Seconds for full travel up (defaults to the down duration)
    #[arg(long)]
    up_duration: Option<f32>,

    /// Position to assume at startup, 0 (up) to 100 (down)
    #[arg(long)]
    position: Option<f32>,

    /// TOML file with screen settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Wait for the automatic stop before exiting
    #[arg(short, long)]
    wait: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Retract fully
    Up,
    /// Extend fully
    Down,
    /// Stop immediately
    Stop,
    /// Put the receiver in pairing mode
    Program,
    /// Stop if moving, otherwise head for the other end
    Toggle,
    /// Move to a position and wait for it
    Position {
        /// Target, 0 (up) to 100 (down)
        percent: f32,
    },
    /// Switch the receiver channel
    Channel {
        /// Channel, 1 to 16
        channel: u8,
    },
}

fn parse_address(s: &str) -> Result<Address, String> {
    let s = s.trim().trim_start_matches("0x");
    if s.is_empty() || s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("{:?} is not an even number of hex digits", s));
    }
    let bytes = (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("{:?} is not hex: {}", s, e))?;
    Address::new(&bytes).map_err(|e| e.to_string())
}

impl Opts {
    fn screen_config(&self) -> anyhow::Result<ScreenConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                toml::from_str::<ScreenConfig>(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => ScreenConfig::default(),
        };

        if let Some(device) = &self.device {
            config.device = device.clone();
        }
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(down) = self.down_duration {
            config.down_duration_secs = down;
        }
        if self.up_duration.is_some() {
            config.up_duration_secs = self.up_duration;
        }
        if let Some(position) = self.position {
            config.initial_position = position;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let level = opts.log_level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("xyscreens={level}").into()),
        )
        .init();

    let config = opts.screen_config()?;
    info!(device = %config.device, "using screen");
    let mut screen = AsyncScreen::from_config(&config)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut wait = opts.wait;
    match opts.command {
        Command::Up => {
            screen.up(&cancel).await?;
        }
        Command::Down => {
            screen.down(&cancel).await?;
        }
        Command::Stop => {
            screen.stop(&cancel).await?;
        }
        Command::Program => screen.program(&cancel).await?,
        Command::Toggle => {
            screen.toggle(&cancel).await?;
        }
        Command::Position { percent } => {
            screen.set_position(percent, &cancel).await?;
            wait = true;
        }
        Command::Channel { channel } => screen.set_channel(channel, &cancel).await?,
    }

    if wait {
        match screen.wait_for_arrival(&cancel).await? {
            Arrival::Arrived => info!("arrived"),
            Arrival::Cancelled => warn!("stopped waiting; the screen may still be moving"),
        }
    }

    println!("{:.1}", screen.position().await);
    Ok(())
}
