//! Keylock simulator.
//!
//! Runs the access controller on simulated hardware: a 4x4 key matrix, the
//! motor and buzzer lines, the emergency button and a 2x16 LCD. Commands are
//! read from stdin, one per line:
//!
//! - keypad symbols, e.g. `32` or `3#`, are tapped in order
//! - `!` pulses the emergency line
//! - `s` prints a JSON status snapshot, including the foreground state and
//!   its recent transitions
//! - `q` quits

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use keylock_core::{
    AccessConfig, EntryMode,
    constants::{EMERGENCY_HOLD_MS, FAILURE_HOLD_MS, SECRET_CODE},
};
use keylock_emulator::{DisplayHandle, KeylockSystem};
use keylock_hardware::mock::{
    ActuatorProbe, MockActuators, MockEmergencyButton, MockEmergencyLine, MockMatrix,
    MockMatrixHandle,
};
use keylock_hardware::{InterruptFlag, MatrixKeypad, OutputController, TokioDelay};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "keylock")]
#[command(version)]
#[command(about = "Keypad access controller simulator with emergency stop")]
struct Args {
    /// Two-digit secret code (0-99).
    #[arg(long, default_value_t = SECRET_CODE)]
    secret: u8,

    /// Require '#' after the second digit.
    #[arg(long)]
    confirm: bool,

    /// Buzzer duration after a wrong code, in milliseconds.
    #[arg(long, default_value_t = FAILURE_HOLD_MS)]
    failure_hold_ms: u64,

    /// Buzzer duration after an emergency stop, in milliseconds.
    #[arg(long, default_value_t = EMERGENCY_HOLD_MS)]
    emergency_hold_ms: u64,

    /// How long `!` holds the emergency line, in milliseconds.
    #[arg(long, default_value_t = 200)]
    pulse_ms: u64,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,
}

/// One stdin command.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Keys(String),
    Emergency,
    Status,
    Quit,
    Empty,
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Command::Empty,
            "!" => Command::Emergency,
            "s" => Command::Status,
            "q" => Command::Quit,
            keys => Command::Keys(keys.chars().filter(|c| !c.is_whitespace()).collect()),
        }
    }
}

/// Handles onto the simulated board.
struct Simulator {
    system: KeylockSystem,
    matrix: MockMatrixHandle,
    button: MockEmergencyButton,
    probe: ActuatorProbe,
    display: DisplayHandle,
    key_hold: Duration,
    key_gap: Duration,
    pulse: Duration,
}

impl Simulator {
    async fn start(config: AccessConfig, pulse: Duration) -> Result<Self> {
        let (columns, rows, matrix) = MockMatrix::new(config.keymap);
        let keypad = MatrixKeypad::new(
            columns,
            rows,
            config.keymap,
            TokioDelay,
            config.timing.key_settle,
        );

        let flag = InterruptFlag::new();
        let (line, button) = MockEmergencyLine::new(flag.clone());
        let (motor, buzzer, probe) = MockActuators::new();
        let display = DisplayHandle::default();
        let outputs = OutputController::new(motor, buzzer, display.clone());

        // Hold each key for two scan passes, then leave the controller its
        // echo pacing before the next key.
        let key_hold = keypad.pass_duration() * 2;
        let key_gap = config.timing.digit_pacing;

        let system = KeylockSystem::start(config, keypad, outputs, line, flag, TokioDelay)
            .await
            .context("failed to start keylock system")?;

        Ok(Self {
            system,
            matrix,
            button,
            probe,
            display,
            key_hold,
            key_gap,
            pulse,
        })
    }

    async fn tap_keys(&self, keys: &str) {
        for symbol in keys.chars() {
            if let Err(error) = self.matrix.tap(symbol, self.key_hold).await {
                warn!(%error, "key skipped");
                continue;
            }
            tokio::time::sleep(self.key_gap).await;
        }
    }

    fn pulse_emergency(&self) {
        let button = self.button.clone();
        let width = self.pulse;
        tokio::spawn(async move { button.pulse(width).await });
    }

    fn status(&self) -> serde_json::Value {
        let bus = self.system.bus();
        let report = self.system.state_report();
        let transitions: Vec<serde_json::Value> = report
            .recent
            .iter()
            .map(|transition| {
                serde_json::json!({
                    "from": transition.from,
                    "to": transition.to,
                    "age_ms": transition.elapsed().as_millis() as u64,
                })
            })
            .collect();

        serde_json::json!({
            "state": report.state,
            "transitions": transitions,
            "outputs": self.probe.state(),
            "display": [self.display.line(0), self.display.line(1)],
            "emergency_active": self.system.emergency_active(),
            "masked": bus.is_masked(),
            "stats": self.system.stats(),
        })
    }
}

fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}

fn build_config(args: &Args) -> Result<AccessConfig> {
    let entry_mode = if args.confirm {
        EntryMode::Confirm
    } else {
        EntryMode::Immediate
    };
    AccessConfig::builder()
        .secret(args.secret)
        .entry_mode(entry_mode)
        .failure_hold(Duration::from_millis(args.failure_hold_ms))
        .emergency_hold(Duration::from_millis(args.emergency_hold_ms))
        .build()
        .context("invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(args.verbose);

    let config = build_config(&args)?;
    let simulator = Simulator::start(config, Duration::from_millis(args.pulse_ms)).await?;
    info!("type keypad symbols, '!' for emergency, 's' for status, 'q' to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Command::Keys(keys) => simulator.tap_keys(&keys).await,
            Command::Emergency => simulator.pulse_emergency(),
            Command::Status => println!("{}", serde_json::to_string_pretty(&simulator.status())?),
            Command::Quit => break,
            Command::Empty => {}
        }
    }

    simulator.system.shutdown().await;
    Ok(())
}
