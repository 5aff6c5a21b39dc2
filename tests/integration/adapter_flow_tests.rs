//! End-to-end flows through the real host adapters: config file, console
//! parsing, the command mailbox, the simulator and the tag store.

use std::sync::Arc;

use enginectl::adapters::config_file::JsonConfigFile;
use enginectl::adapters::log_sink::LogEventSink;
use enginectl::adapters::tags::MemoryTagStore;
use enginectl::app::ports::{ClockPort, ConfigPort};
use enginectl::sensors::simulator::EngineSimulator;
use enginectl::{CommandMailbox, ControlCommand, ControlLoop, EngineConfig, EngineState};

use crate::mock_io::{ManualClock, RecordingSink};

struct Bench {
    app: ControlLoop,
    sim: EngineSimulator,
    mailbox: Arc<CommandMailbox>,
    sink: RecordingSink,
    tags: MemoryTagStore,
    clock: ManualClock,
    period_ms: u64,
}

impl Bench {
    fn new(config: EngineConfig, sim: EngineSimulator) -> Self {
        let period_ms = u64::from(config.control_loop_interval_ms);
        Self {
            app: ControlLoop::new(config).unwrap(),
            sim,
            mailbox: Arc::new(CommandMailbox::new()),
            sink: RecordingSink::default(),
            tags: MemoryTagStore::new(),
            clock: ManualClock::default(),
            period_ms,
        }
    }

    fn tick(&mut self) -> EngineState {
        self.sim.follow_state(self.app.state());
        let mut commands = Arc::clone(&self.mailbox);
        let status = self.app.tick(
            &mut self.sim,
            &mut commands,
            &mut self.sink,
            &mut self.tags,
            self.clock.now_ms(),
        );
        self.clock.advance(self.period_ms);
        status.state
    }

    fn console(&self, line: &str) {
        self.mailbox.post(line.parse().unwrap());
    }
}

#[test]
fn simulated_engine_starts_runs_and_stops_from_console() {
    let sim = EngineSimulator::seeded(42, 1.0).with_crank_reads_to_start(Some(2));
    let mut bench = Bench::new(EngineConfig::default(), sim);

    bench.console("start");
    let mut reached_running = false;
    for _ in 0..30 {
        if bench.tick() == EngineState::Running {
            reached_running = true;
            break;
        }
    }
    assert!(reached_running, "simulated engine should start on the first attempt");
    assert_eq!(bench.app.crank_attempts(), 0);
    assert!(bench.app.faults().is_empty());

    bench.console("stop");
    assert_eq!(bench.tick(), EngineState::CoolingDown);
    bench.console("stop");
    assert_eq!(bench.tick(), EngineState::Stopped);

    // Stopped engine winds down in the simulator on the next read.
    bench.tick();
    assert!(!bench.sim.is_running());
    assert_eq!(
        bench.tags.get("engine_state"),
        Some(&serde_json::json!("stopped"))
    );
}

#[test]
fn simulated_engine_that_never_catches_ends_in_fault() {
    let sim = EngineSimulator::seeded(7, 1.0).with_crank_reads_to_start(None);
    let mut bench = Bench::new(EngineConfig::default(), sim);

    bench.console("start");
    for _ in 0..50 {
        bench.tick();
    }
    assert_eq!(bench.app.state(), EngineState::Fault);
    assert_eq!(bench.sink.entries_into(EngineState::Cranking), 3);

    bench.console("reset");
    assert_eq!(bench.tick(), EngineState::Stopped);
}

#[test]
fn console_estop_reaches_the_loop_from_another_thread() {
    let sim = EngineSimulator::seeded(1, 1.0);
    let mut bench = Bench::new(EngineConfig::default(), sim);
    bench.console("start");
    assert_eq!(bench.tick(), EngineState::PreCrank);

    let producer = Arc::clone(&bench.mailbox);
    std::thread::spawn(move || {
        let cmd: ControlCommand = "estop".parse().unwrap();
        producer.post(cmd);
    })
    .join()
    .unwrap();

    assert_eq!(bench.tick(), EngineState::Stopped);
}

#[test]
fn config_file_drives_the_sequence_timing() {
    let path = std::env::temp_dir().join(format!("enginectl-flow-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{ "pre_crank_secs": 1, "crank_time_secs": 2, "crank_rest_secs": 1, "max_crank_attempts": 2 }"#,
    )
    .unwrap();
    let config = JsonConfigFile::new(&path).load().unwrap();
    std::fs::remove_file(&path).ok();

    let sim = EngineSimulator::seeded(3, 1.0).with_crank_reads_to_start(None);
    let mut bench = Bench::new(config, sim);
    bench.console("start");

    // 1 s pre-crank + 2 × 2 s cranking + 1 s rest = 6 s.
    let states: Vec<EngineState> = (0..7).map(|_| bench.tick()).collect();
    assert_eq!(states[0], EngineState::PreCrank);
    assert_eq!(states[1], EngineState::Cranking);
    assert_eq!(states[5], EngineState::Cranking);
    assert_eq!(states[6], EngineState::Fault);
}

#[test]
fn log_sink_takes_rejections_and_status_without_side_effects() {
    let mut sim = EngineSimulator::seeded(9, 1.0).with_crank_reads_to_start(Some(1));
    let mut app = ControlLoop::new(EngineConfig::default()).unwrap();
    let mut sink = LogEventSink::new().with_verbose_status(true);
    let mut tags = MemoryTagStore::new();
    let mailbox = CommandMailbox::new();

    app.start(&mut sink);
    mailbox.post(ControlCommand::StopRequest);
    let mut commands = &mailbox;
    let status = app.tick(&mut sim, &mut commands, &mut sink, &mut tags, 0);
    assert_eq!(status.state, EngineState::Stopped);
    assert_eq!(tags.len(), 8);
}
