//! imctl command-line client
//!
//! ```bash
//! # Query mode and objective position
//! imctl --host 192.168.0.10 status
//!
//! # Move the stage, then acquire a 5-slice brightfield stack
//! imctl move-xy 55.2 40.0
//! imctl acquire --light bf --exposure-ms 20 --z-center 1500 --slices 5 --step 2
//!
//! # Start a script on the delimiter port
//! imctl --dialect delimiter run-script /data/plate.scpt
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use imctl::{
    connection_params, init_logging, AcquisitionRequest, ChannelSettings, Command, Config,
    DialectKind, LightSource, SessionController, TemperatureProbe, ZStack, BUILD_DATE, VERSION,
};
use std::path::PathBuf;

/// Remote control for automated widefield imaging instruments
#[derive(Parser, Debug)]
#[command(name = "imctl")]
#[command(version)]
#[command(about = "Remote control for automated widefield imaging instruments", long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Instrument host, overrides the configuration
    #[arg(long)]
    host: Option<String>,

    /// Instrument port, overrides the configuration
    #[arg(long)]
    port: Option<u16>,

    /// Wire dialect (function_call or delimiter)
    #[arg(long)]
    dialect: Option<DialectKind>,

    /// Delay between a command and its response, in milliseconds
    #[arg(long)]
    settle_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Show mode, objective position and instrument details
    Status,
    /// Print the objective position as JSON
    Position,
    /// Move the objective in X/Y (mm)
    MoveXy { x: f64, y: f64 },
    /// Move the objective in Z (µm)
    MoveZ { z: f64 },
    /// Select an objective (1 to 4)
    Objective { index: u8 },
    /// Open or close the lid
    Lid {
        #[command(subcommand)]
        action: LidAction,
    },
    /// Set the regulation target temperature (°C)
    Temperature { celsius: f64 },
    /// Acquire a Z-stack with one light source
    Acquire {
        /// `brightfield`/`bf`, or a 6-character LED mask such as `010000`
        #[arg(long, default_value = "brightfield")]
        light: LightSource,
        #[arg(long, default_value_t = 1)]
        channel: u32,
        #[arg(long, default_value_t = 1)]
        filter: u8,
        #[arg(long, default_value_t = 100)]
        intensity: u8,
        #[arg(long, default_value_t = 10)]
        exposure_ms: u32,
        /// Stack center (µm), current Z when omitted
        #[arg(long)]
        z_center: Option<f64>,
        #[arg(long, default_value_t = 1)]
        slices: u32,
        /// Distance between slices (µm)
        #[arg(long, default_value_t = 0.0)]
        step: f64,
        /// Directory the images are saved to
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the software autofocus and print the best Z (µm)
    Autofocus {
        #[arg(long)]
        z_center: f64,
        #[arg(long, default_value_t = 11)]
        slices: u32,
        #[arg(long, default_value_t = 5.0)]
        step: f64,
    },
    /// Load and start a script
    RunScript { path: PathBuf },
    /// Stop the running script
    StopScript,
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum LidAction {
    Open,
    Close,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    init_logging(&config.logging)?;
    tracing::debug!("imctl {} (built {})", VERSION, BUILD_DATE);

    match cli.command {
        Action::Config { action } => run_config(action, &config, &config_path),
        action => run_instrument(action, &config).await,
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.connection.host = host.clone();
    }
    if let Some(dialect) = cli.dialect {
        if dialect != config.connection.dialect && cli.port.is_none() {
            // A configured port belongs to the configured dialect.
            config.connection.port = None;
        }
        config.connection.dialect = dialect;
    }
    if let Some(port) = cli.port {
        config.connection.port = Some(port);
    }
    if let Some(settle_delay_ms) = cli.settle_delay_ms {
        config.session.settle_delay_ms = settle_delay_ms;
    }
}

fn run_config(action: ConfigAction, config: &Config, path: &std::path::Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists, use --force to overwrite",
                    path.display()
                );
            }
            Config::default().save_to_file(path)?;
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}

async fn run_instrument(action: Action, config: &Config) -> anyhow::Result<()> {
    let params = connection_params(config);
    let mut session = SessionController::connect(&params).await?;

    let result = dispatch(&mut session, action).await;
    session.close().await;
    result
}

/// Print one status line, keeping going when the value is unavailable
fn report<T: std::fmt::Display>(label: &str, value: imctl::Result<T>) {
    match value {
        Ok(value) => println!("{:<10} {}", format!("{}:", label), value),
        Err(e) => {
            tracing::warn!("Could not read {}: {}", label, e);
            println!("{:<10} unavailable", format!("{}:", label));
        }
    }
}

async fn dispatch(session: &mut SessionController, action: Action) -> anyhow::Result<()> {
    match action {
        Action::Status => {
            println!("{:<10} {}", "dialect:", session.dialect_kind());
            if session.supports(&Command::GetVersion) {
                report("version", session.get_version().await);
            }
            report("mode", session.get_mode().await);
            report("position", session.get_position().await);
            if session.supports(&Command::GetObjective) {
                report("objective", session.get_objective_index().await);
            }
            if session.supports(&Command::IsLidClosed) {
                report("lid closed", session.is_lid_closed().await);
            }
            if session.supports(&Command::IsTemperatureRegulated) {
                report("regulated", session.is_temperature_regulated().await);
                report(
                    "sample °C",
                    session.get_temperature(TemperatureProbe::Sample).await,
                );
            }
        }
        Action::Position => {
            let position = session.get_position().await?;
            println!("{}", serde_json::to_string(&position)?);
        }
        Action::MoveXy { x, y } => session.go_to_xy(x, y).await?,
        Action::MoveZ { z } => session.go_to_z(z).await?,
        Action::Objective { index } => session.set_objective(index).await?,
        Action::Lid { action } => match action {
            LidAction::Open => session.open_lid().await?,
            LidAction::Close => session.close_lid().await?,
        },
        Action::Temperature { celsius } => session.set_target_temperature(celsius).await?,
        Action::Acquire {
            light,
            channel,
            filter,
            intensity,
            exposure_ms,
            z_center,
            slices,
            step,
            output,
        } => {
            let center = match z_center {
                Some(z) => z,
                None => session.get_position_z().await?,
            };
            let request = AcquisitionRequest {
                light_source: light,
                channel: ChannelSettings::new(channel, filter, intensity, exposure_ms, false)?,
                z_stack: ZStack::new(center, slices, step)?,
                save_directory: output,
            };
            session.acquire(&request).await?;
        }
        Action::Autofocus {
            z_center,
            slices,
            step,
        } => {
            let best = session
                .run_software_autofocus(ZStack::new(z_center, slices, step)?)
                .await?;
            println!("{:.1}", best);
        }
        Action::RunScript { path } => session.run_script(&path).await?,
        Action::StopScript => session.stop_script().await?,
        Action::Config { .. } => anyhow::bail!("configuration actions do not use the instrument"),
    }
    Ok(())
}
