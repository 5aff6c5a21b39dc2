//! enginectl: bench runner for the engine controller.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                      │
//! │                                                                │
//! │  EngineSimulator  CommandMailbox  LogEventSink  MemoryTagStore │
//! │  (SensorPort)     (CommandPort)   (EventSink)   (TagPort)      │
//! │  JsonConfigFile   MonotonicClock                               │
//! │  (ConfigPort)     (ClockPort)                                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ControlLoop (pure logic)                  │    │
//! │  │  Alarms · FSM · Status                                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `enginectl [config.json]`.  Commands are read from stdin, one
//! per line: `start`, `stop`, `estop`, `reset`, `mode <manual|auto|off>`,
//! `quit`.  End of input also stops the run.  Set `RUST_LOG=debug` for per-tick status lines.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result};
use log::{error, info, warn};

use enginectl::adapters::config_file::JsonConfigFile;
use enginectl::adapters::log_sink::LogEventSink;
use enginectl::adapters::tags::MemoryTagStore;
use enginectl::adapters::time::MonotonicClock;
use enginectl::app::ports::{ClockPort, ConfigPort};
use enginectl::sensors::simulator::EngineSimulator;
use enginectl::{CommandMailbox, ControlCommand, ControlLoop};

const DEFAULT_CONFIG_PATH: &str = "enginectl.json";

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("enginectl v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config ─────────────────────────────────────────────
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = JsonConfigFile::new(&path)
        .load()
        .with_context(|| format!("loading config from {path}"))?;

    // ── 3. Adapters ───────────────────────────────────────────
    let interval_ms = u64::from(config.control_loop_interval_ms);
    let mut sensors = EngineSimulator::new(interval_ms as f64 / 1000.0);
    let mut sink = LogEventSink::new();
    let mut tags = MemoryTagStore::new();
    let clock = MonotonicClock::new();
    let mailbox = Arc::new(CommandMailbox::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    spawn_console(Arc::clone(&mailbox), Arc::clone(&shutdown))
        .context("starting console reader")?;

    // ── 4. Control loop ───────────────────────────────────────
    let mut app = ControlLoop::new(config).context("constructing control loop")?;
    app.start(&mut sink);

    info!(
        "Ready. Ticking every {} ms. Commands: start | stop | estop | reset | mode <manual|auto|off> | quit",
        interval_ms
    );

    let mut commands = Arc::clone(&mailbox);
    let mut next_tick_ms = clock.now_ms();

    while !shutdown.load(Ordering::Relaxed) {
        sensors.follow_state(app.state());
        let status = app.tick(
            &mut sensors,
            &mut commands,
            &mut sink,
            &mut tags,
            clock.now_ms(),
        );

        // Fixed period: schedule from the previous deadline, not from now.
        next_tick_ms += interval_ms;
        let now = clock.now_ms();
        if now > next_tick_ms {
            warn!(
                "Tick {} overran its period by {} ms",
                status.tick,
                now - next_tick_ms
            );
            next_tick_ms = now;
        }
        thread::sleep(clock.until(next_tick_ms));
    }

    info!("Shutting down in state {}", app.state());
    info!("Final tags: {}", tags.to_json());
    Ok(())
}

/// Read operator commands from stdin on a background thread.
fn spawn_console(mailbox: Arc<CommandMailbox>, shutdown: Arc<AtomicBool>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Console read failed: {e}");
                        break;
                    }
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.eq_ignore_ascii_case("quit") {
                    break;
                }
                match trimmed.parse::<ControlCommand>() {
                    Ok(cmd) => {
                        info!("Console: {cmd}");
                        mailbox.post(cmd);
                    }
                    Err(e) => warn!("{e}"),
                }
            }
            shutdown.store(true, Ordering::Relaxed);
        })?;
    Ok(())
}
