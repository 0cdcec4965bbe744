//! Madrigal CLI application

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use madrigal_core::domain::outputs::OutputBank;
use madrigal_core::domain::{
    Channel, ChannelStrip, ConfigManager, DeviceContext, DeviceModel, InputChannel, LevelDb,
    MadrigalConfig, MixerBus, Pan, UsbTransport,
};
use madrigal_infra::usb::{OfflineTransport, RusbTransport};

#[derive(Parser)]
#[command(name = "madrigal")]
#[command(about = "Control panel for the Quartet USB audio interface", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run against a simulated device instead of real hardware
    #[arg(long)]
    offline: bool,

    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the device's mixer and output state
    Status {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a mixer channel fader level in dB (-48..=6)
    SetLevel {
        bus: usize,
        #[arg(value_parser = parse_channel)]
        channel: Channel,
        db: i32,
    },
    /// Set an input channel's pan position (-64..=64)
    SetPan {
        bus: usize,
        #[arg(value_parser = parse_channel)]
        channel: Channel,
        pan: i32,
    },
    /// Solo or unsolo a mixer channel
    Solo {
        bus: usize,
        #[arg(value_parser = parse_channel)]
        channel: Channel,
        on: bool,
    },
    /// Mute or unmute a mixer channel
    Mute {
        bus: usize,
        #[arg(value_parser = parse_channel)]
        channel: Channel,
        on: bool,
    },
    /// Set a bus master level in dB (-48 silences the whole bus)
    SetMaster { bus: usize, db: i32 },
    /// Select the host playback pair feeding a bus's software return
    SetReturnSource { bus: usize, source: u8 },
    /// Poll the device and mirror its state until interrupted
    Watch,
}

/// Mixer channels address as "1".."12" or "swr" for the software return
fn parse_channel(s: &str) -> Result<Channel, String> {
    if s.eq_ignore_ascii_case("swr") {
        return Ok(Channel::SoftwareReturn);
    }

    match s.parse::<usize>() {
        Ok(n) if (1..=12).contains(&n) => Ok(Channel::Input(n - 1)),
        _ => Err(format!("invalid channel {s:?}: expected 1..=12 or \"swr\"")),
    }
}

/// Full device mirror held by the CLI
struct Panel {
    ctx: DeviceContext,
    inputs: Vec<InputChannel>,
    buses: Vec<MixerBus>,
    outputs: OutputBank,
    /// When false, status output stops at the analog channels
    show_digital_inputs: bool,
}

#[derive(Serialize)]
struct DeviceStatus<'a> {
    product: &'static str,
    inputs: &'a [InputChannel],
    buses: Vec<BusStatus<'a>>,
    outputs: &'a OutputBank,
}

#[derive(Serialize)]
struct BusStatus<'a> {
    index: usize,
    master_db: i32,
    software_return_source: u8,
    channels: &'a [ChannelStrip],
    software_return: &'a ChannelStrip,
}

impl Panel {
    fn connect(offline: bool, show_digital_inputs: bool) -> anyhow::Result<Self> {
        let model = DeviceModel::quartet();
        let transport: Arc<dyn UsbTransport> = if offline {
            info!("running against a simulated device");
            Arc::new(OfflineTransport::new(&model))
        } else {
            Arc::new(RusbTransport::open(&model)?)
        };
        let ctx = DeviceContext::new(transport, model);

        let inputs = (0..ctx.model().analog_inputs).map(InputChannel::new).collect();
        let buses = (0..ctx.model().mixer_buses)
            .map(|i| MixerBus::new(i, ctx.model()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ctx,
            inputs,
            buses,
            outputs: OutputBank::new(),
            show_digital_inputs,
        })
    }

    /// Mixer channels included in status output: all 12, or only the
    /// analog ones when digital channels are hidden
    fn visible_channels(&self) -> usize {
        if self.show_digital_inputs {
            self.ctx.model().mixer_channels
        } else {
            self.ctx.model().analog_inputs
        }
    }

    fn refresh(&mut self) -> anyhow::Result<()> {
        for input in &mut self.inputs {
            input.refresh(&self.ctx)?;
        }
        for bus in &mut self.buses {
            bus.refresh(&self.ctx)?;
        }
        // line-level mismatches are logged inside the refresh; they do not
        // stop the rest of the poll
        self.outputs.refresh(&self.ctx)?;
        Ok(())
    }

    fn status(&self) -> DeviceStatus<'_> {
        let visible = self.visible_channels();
        DeviceStatus {
            product: self.ctx.model().product_name,
            inputs: &self.inputs,
            buses: self
                .buses
                .iter()
                .map(|bus| BusStatus {
                    index: bus.index(),
                    master_db: bus.master().db(),
                    software_return_source: bus.software_return_source(),
                    channels: &bus.inputs()[..visible],
                    software_return: bus.software_return(),
                })
                .collect(),
            outputs: &self.outputs,
        }
    }

    fn print_status(&self) {
        println!("{}", self.ctx.model().product_name);
        for input in &self.inputs {
            println!(
                "  in {}: {} gain {}{}{}",
                input.index() + 1,
                input.input_type.label(),
                input.active_gain(),
                if input.phantom { " +48V" } else { "" },
                if input.soft_limit { " limit" } else { "" },
            );
        }
        for bus in &self.buses {
            println!("  mixer {} (master {} dB):", bus.index() + 1, bus.master().db());
            for (i, strip) in bus.inputs()[..self.visible_channels()].iter().enumerate() {
                println!(
                    "    ch {:2}: {:3} dB pan {:3}{}{}",
                    i + 1,
                    strip.level.db(),
                    strip.pan.map(Pan::value).unwrap_or(0),
                    if strip.solo { " solo" } else { "" },
                    if strip.mute { " mute" } else { "" },
                );
            }
        }
    }
}

fn bus_mut(buses: &mut [MixerBus], index: usize) -> anyhow::Result<&mut MixerBus> {
    buses
        .get_mut(index)
        .ok_or_else(|| anyhow::anyhow!("no such mixer bus: {index}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let config = match &cli.config {
        Some(path) => MadrigalConfig::load_from_file(path).await?,
        None => ConfigManager::new(ConfigManager::default_config_dir()?).load().await,
    };

    let mut panel = Panel::connect(
        cli.offline || config.app.offline,
        config.app.show_digital_inputs,
    )?;
    panel.refresh()?;

    match cli.command {
        Command::Status { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&panel.status())?);
            } else {
                panel.print_status();
            }
        }
        Command::SetLevel { bus, channel, db } => {
            let level = LevelDb::new(db)?;
            bus_mut(&mut panel.buses, bus)?.set_level(&panel.ctx, channel, level)?;
        }
        Command::SetPan { bus, channel, pan } => {
            let pan = Pan::new(pan)?;
            bus_mut(&mut panel.buses, bus)?.set_pan(&panel.ctx, channel, pan)?;
        }
        Command::Solo { bus, channel, on } => {
            bus_mut(&mut panel.buses, bus)?.set_solo(&panel.ctx, channel, on)?;
        }
        Command::Mute { bus, channel, on } => {
            bus_mut(&mut panel.buses, bus)?.set_mute(&panel.ctx, channel, on)?;
        }
        Command::SetMaster { bus, db } => {
            let level = LevelDb::new(db)?;
            bus_mut(&mut panel.buses, bus)?.set_master_level(&panel.ctx, level)?;
        }
        Command::SetReturnSource { bus, source } => {
            bus_mut(&mut panel.buses, bus)?.set_software_return_source(&panel.ctx, source)?;
        }
        Command::Watch => {
            let mut interval =
                tokio::time::interval(Duration::from_millis(config.app.poll_interval_ms));
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            info!(
                interval_ms = config.app.poll_interval_ms,
                "watching device state"
            );
            loop {
                tokio::select! {
                    _ = interval.tick() => panel.refresh()?,
                    _ = &mut ctrl_c => {
                        info!("stopping watch");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
