//! Command-line operator for PJLink Class 1 projectors.
//!
//! Connects to one projector, sends a single command, prints the decoded
//! response, and exits. Example session:
//!
//! ```text
//! $ pjlink --host 192.168.0.20 power
//! power: cooling
//! $ pjlink --host 192.168.0.20 input rgb 2
//! input accepted
//! $ RUST_LOG=debug pjlink --host 192.168.0.20 errors
//! warnings: cover
//! errors:   lamp
//! ```

use std::sync::mpsc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pjlink_client::{PjlinkCommand, PjlinkPool, Projector, Settings};
use pjlink_core::protocol::codec::describe_status_bits;
use pjlink_core::InputType;

#[derive(Parser)]
#[command(name = "pjlink", about = "Operate a PJLink Class 1 projector", version)]
struct Cli {
    /// Projector address (IPv4/IPv6, optionally with an explicit port).
    #[arg(long)]
    host: String,

    /// Seconds to wait for the projector's reply.
    #[arg(long, default_value_t = 5)]
    wait: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn the projector on.
    PowerOn,
    /// Turn the projector off.
    PowerOff,
    /// Mute audio and video.
    MuteOn,
    /// Unmute audio and video.
    MuteOff,
    /// Query the power state.
    Power,
    /// Query the AV mute state.
    Mute,
    /// Query lamp usage hours.
    Lamp,
    /// Query the error status report.
    Errors,
    /// Select an input terminal.
    Input {
        #[arg(value_enum)]
        kind: InputKind,
        /// Input number, 1-9.
        number: u8,
    },
    /// Send a raw PJLink command body and value (use "?" to query).
    Raw { body: String, value: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputKind {
    Rgb,
    Video,
    Digital,
    Storage,
    Network,
}

impl From<InputKind> for InputType {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::Rgb => InputType::Rgb,
            InputKind::Video => InputType::Video,
            InputKind::Digital => InputType::Digital,
            InputKind::Storage => InputType::Storage,
            InputKind::Network => InputType::Network,
        }
    }
}

impl Command {
    fn build(&self) -> anyhow::Result<PjlinkCommand> {
        let cmd = match self {
            Command::PowerOn => PjlinkCommand::set_power(true),
            Command::PowerOff => PjlinkCommand::set_power(false),
            Command::MuteOn => PjlinkCommand::set_av_mute(true),
            Command::MuteOff => PjlinkCommand::set_av_mute(false),
            Command::Power => PjlinkCommand::get_power(),
            Command::Mute => PjlinkCommand::get_av_mute(),
            Command::Lamp => PjlinkCommand::get_lamp(),
            Command::Errors => PjlinkCommand::get_error(),
            Command::Input { kind, number } => {
                PjlinkCommand::set_input((*kind).into(), *number).context("invalid input selection")?
            }
            Command::Raw { body, value } => {
                PjlinkCommand::new(body, value).context("invalid raw command")?
            }
        };
        Ok(cmd)
    }
}

fn print_response(command: &Command, response: &PjlinkCommand) {
    match command {
        Command::PowerOn | Command::PowerOff | Command::MuteOn | Command::MuteOff => {
            if response.succeeded() {
                println!("ok");
            } else {
                println!("rejected: {:?}", response.response_code());
            }
        }
        Command::Power => println!("power: {}", response.power_status()),
        Command::Mute => println!("mute: {}", response.av_mute_status()),
        Command::Lamp => match response.lamp_hours() {
            Some(hours) => println!("lamp hours: {hours}"),
            None => println!("lamp hours unavailable: {:?}", response.response_code()),
        },
        Command::Errors => {
            let status = response.error_status();
            if status.is_clear() {
                println!("no warnings or errors");
            } else {
                println!("warnings: {}", describe_status_bits(status.warnings));
                println!("errors:   {}", describe_status_bits(status.errors));
            }
        }
        Command::Input { .. } => {
            if response.succeeded() {
                println!("input accepted");
            } else {
                println!("input rejected: {:?}", response.response_code());
            }
        }
        Command::Raw { .. } => {
            println!("{}", response.raw_response().unwrap_or("<no payload>"));
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let cmd = cli.command.build()?;

    let pool = PjlinkPool::new();
    pool.start().context("failed to start the I/O pool")?;

    let projector = Projector::with_settings("cli", &cli.host, true, Settings::default(), &pool)
        .context("invalid --host")?;
    projector
        .start()
        .with_context(|| format!("could not connect to {}", cli.host))?;
    debug!(host = %cli.host, "connected");

    let (tx, rx) = mpsc::channel();
    projector
        .response_signal()
        .connect(move |cmd: &PjlinkCommand| {
            let _ = tx.send(cmd.clone());
        });

    projector.send(cmd);

    let response = match rx.recv_timeout(Duration::from_secs(cli.wait)) {
        Ok(response) => response,
        Err(_) => {
            projector.stop();
            pool.stop();
            bail!("no response within {}s", cli.wait);
        }
    };
    print_response(&cli.command, &response);

    projector.stop();
    pool.stop();
    Ok(())
}
