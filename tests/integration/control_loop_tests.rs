//! Integration tests for the ControlLoop → FSM → events pipeline.
//!
//! Every test drives the loop tick by tick with a manual clock (one tick
//! per second with the default config) and asserts on the recorded events.

use serde_json::json;

use crate::mock_io::{Rig, running_snapshot, stopped_snapshot};

use enginectl::error::Rejection;
use enginectl::{AppEvent, ControlCommand, EngineMode, EngineState, FaultKind, Trigger};

// ── Start sequence ────────────────────────────────────────────

#[test]
fn start_reaches_running_after_pre_crank_and_one_crank() {
    let mut rig = Rig::new();

    let status = rig.command(ControlCommand::StartRequest);
    assert_eq!(status.state, EngineState::PreCrank);
    assert_eq!(status.status_label, "Pre-crank");

    // Pre-crank lasts 3 s: still priming at t=1 s and t=2 s.
    assert_eq!(rig.tick().state, EngineState::PreCrank);
    assert_eq!(rig.tick().state, EngineState::PreCrank);
    let status = rig.tick();
    assert_eq!(status.state, EngineState::Cranking);
    assert_eq!(status.status_label, "Cranking (1)");
    assert_eq!(status.crank_attempts, 1);

    rig.sensors.current = running_snapshot();
    let status = rig.tick();
    assert_eq!(status.state, EngineState::Running);
    assert_eq!(status.crank_attempts, 0);
    assert!(status.active_faults.is_empty());

    let entered: Vec<_> = rig.sink.entered().into_iter().map(|(to, t, _)| (to, t)).collect();
    assert_eq!(
        entered,
        [
            (EngineState::PreCrank, Trigger::StartRequest),
            (EngineState::Cranking, Trigger::Crank),
            (EngineState::Running, Trigger::EngineStarted),
        ]
    );
}

#[test]
fn engine_that_never_fires_faults_after_exactly_max_attempts() {
    let mut rig = Rig::new();
    rig.command(ControlCommand::StartRequest);

    // 3 s pre-crank + 3 × 10 s cranking + 2 × 5 s rest = 43 s.
    let status = rig.tick_until(EngineState::Fault, 50);
    assert_eq!(rig.clock_now_secs(), 44);
    assert_eq!(status.crank_attempts, 3);
    assert!(status.fault_reset_available);
    // Crank exhaustion is a latched state, not a live alarm.
    assert!(status.active_faults.is_empty());

    assert_eq!(rig.sink.entries_into(EngineState::Cranking), 3);
    let labels: Vec<String> = rig
        .sink
        .entered()
        .into_iter()
        .filter(|(to, ..)| *to == EngineState::Cranking)
        .map(|(.., label)| label)
        .collect();
    assert_eq!(labels, ["Cranking (1)", "Cranking (2)", "Cranking (3)"]);

    // The final rest chains straight into Fault.
    let tail: Vec<_> = rig.sink.entered().into_iter().rev().take(2).collect();
    assert_eq!(tail[0].0, EngineState::Fault);
    assert_eq!(tail[0].1, Trigger::MaxCranksExceeded);
    assert_eq!(tail[1].0, EngineState::CrankRest);

    let status = rig.command(ControlCommand::ResetFault);
    assert_eq!(status.state, EngineState::Stopped);
    assert_eq!(status.crank_attempts, 0);
}

// ── Stop sequence ─────────────────────────────────────────────

#[test]
fn stop_cools_down_for_the_configured_time() {
    let mut rig = Rig::new();
    rig.run_engine();

    let status = rig.command(ControlCommand::StopRequest);
    assert_eq!(status.state, EngineState::CoolingDown);
    assert_eq!(status.status_label, "Cooling Down");

    for _ in 0..59 {
        assert_eq!(rig.tick().state, EngineState::CoolingDown);
    }
    let status = rig.tick();
    assert_eq!(status.state, EngineState::Stopped);
    let (to, trigger, _) = rig.sink.entered().pop().unwrap();
    assert_eq!((to, trigger), (EngineState::Stopped, Trigger::ShutdownComplete));
}

#[test]
fn second_stop_during_cooldown_stops_immediately() {
    let mut rig = Rig::new();
    rig.run_engine();
    rig.command(ControlCommand::StopRequest);
    rig.tick();

    let status = rig.command(ControlCommand::StopRequest);
    assert_eq!(status.state, EngineState::Stopped);
    let (_, trigger, _) = rig.sink.entered().pop().unwrap();
    assert_eq!(trigger, Trigger::ImmediateStop);
}

#[test]
fn emergency_stop_from_running_skips_cooldown() {
    let mut rig = Rig::new();
    rig.run_engine();

    rig.mailbox.post(ControlCommand::StartRequest);
    let status = rig.command(ControlCommand::EmergencyStop);
    assert_eq!(status.state, EngineState::Stopped);
    assert_eq!(rig.sink.entries_into(EngineState::CoolingDown), 0);
    // The pending start was superseded by the emergency stop.
    assert!(rig.mailbox.is_empty());
}

#[test]
fn emergency_stop_while_cranking_aborts_the_attempt() {
    let mut rig = Rig::new();
    rig.command(ControlCommand::StartRequest);
    rig.tick_until(EngineState::Cranking, 5);

    let status = rig.command(ControlCommand::EmergencyStop);
    assert_eq!(status.state, EngineState::Stopped);
    assert_eq!(status.crank_attempts, 0);

    // Nothing left armed: no timeout fires afterwards.
    for _ in 0..20 {
        assert_eq!(rig.tick().state, EngineState::Stopped);
    }
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn alarm_while_running_faults_and_reset_needs_clear_readings() {
    let mut rig = Rig::new();
    rig.run_engine();
    rig.sink.clear();

    rig.sensors.current.rpm = 2300.0;
    let status = rig.tick();
    assert_eq!(status.state, EngineState::Fault);
    assert!(status.has_fault(FaultKind::Overspeed));
    assert!(rig.sink.events.contains(&AppEvent::FaultRaised(FaultKind::Overspeed)));
    assert_eq!(rig.tags.get("active_faults"), Some(&json!(["overspeed"])));

    // Reset while the condition persists: back to Stopped for one tick,
    // then straight back into Fault.
    let status = rig.command(ControlCommand::ResetFault);
    assert_eq!(status.state, EngineState::Stopped);
    assert!(status.active_faults.is_empty());
    assert_eq!(rig.tick().state, EngineState::Fault);

    // Engine winds down; the alarm clears and a reset sticks.
    rig.sensors.current = stopped_snapshot();
    let status = rig.tick();
    assert_eq!(status.state, EngineState::Fault);
    assert!(status.active_faults.is_empty());
    assert!(rig.sink.events.contains(&AppEvent::FaultCleared(FaultKind::Overspeed)));

    rig.command(ControlCommand::ResetFault);
    assert_eq!(rig.tick().state, EngineState::Stopped);
}

#[test]
fn fault_preempts_engine_started_while_cranking() {
    let mut rig = Rig::new();
    rig.command(ControlCommand::StartRequest);
    rig.tick_until(EngineState::Cranking, 5);

    // Engine catches but with no oil pressure.
    rig.sensors.current = running_snapshot();
    rig.sensors.current.oil_pressure_psi = 5.0;
    let status = rig.tick();
    assert_eq!(status.state, EngineState::Fault);
    assert!(status.has_fault(FaultKind::LowOilPressure));
    assert_eq!(rig.sink.entries_into(EngineState::Running), 0);
}

#[test]
fn low_battery_faults_even_when_stopped() {
    let mut rig = Rig::new();
    rig.sensors.current.battery_voltage_v = 10.9;
    let status = rig.tick();
    assert_eq!(status.state, EngineState::Fault);
    assert!(status.has_fault(FaultKind::LowBatteryVoltage));
}

#[test]
fn reset_with_persisting_alarm_raises_it_again() {
    let mut rig = Rig::new();
    rig.sensors.current.battery_voltage_v = 10.0;
    assert_eq!(rig.tick().state, EngineState::Fault);

    rig.sink.clear();
    let status = rig.command(ControlCommand::ResetFault);
    assert_eq!(status.state, EngineState::Stopped);
    assert!(status.active_faults.is_empty());

    let status = rig.tick();
    assert_eq!(status.state, EngineState::Fault);
    assert!(status.has_fault(FaultKind::LowBatteryVoltage));
    let raised = rig
        .sink
        .events
        .iter()
        .filter(|e| **e == AppEvent::FaultRaised(FaultKind::LowBatteryVoltage))
        .count();
    assert_eq!(raised, 1);
}

#[test]
fn underspeed_is_reported_but_never_faults() {
    let mut rig = Rig::new();
    rig.run_engine();
    rig.sensors.current.rpm = 1200.0;
    let status = rig.tick();
    assert_eq!(status.state, EngineState::Running);
    assert!(status.underspeed);
    assert!(status.active_faults.is_empty());
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn invalid_command_is_rejected_without_state_change() {
    let mut rig = Rig::new();
    let status = rig.command(ControlCommand::StopRequest);
    assert_eq!(status.state, EngineState::Stopped);
    assert_eq!(
        rig.sink.rejections(),
        [&AppEvent::CommandRejected {
            command: ControlCommand::StopRequest,
            state: EngineState::Stopped,
            reason: Rejection::InvalidInState {
                trigger: Trigger::StopRequest,
                state: EngineState::Stopped,
            },
        }]
    );
}

#[test]
fn start_while_running_is_rejected() {
    let mut rig = Rig::new();
    rig.run_engine();
    let status = rig.command(ControlCommand::StartRequest);
    assert_eq!(status.state, EngineState::Running);
    assert_eq!(rig.sink.rejections().len(), 1);
}

#[test]
fn one_command_per_tick() {
    let mut rig = Rig::new();
    rig.mailbox.post(ControlCommand::SetMode(EngineMode::Auto));
    rig.mailbox.post(ControlCommand::StartRequest);

    let status = rig.tick();
    assert_eq!(status.state, EngineState::PreCrank);
    assert_eq!(status.mode, EngineMode::Manual);

    let status = rig.tick();
    assert_eq!(status.mode, EngineMode::Auto);
    assert!(rig.sink.events.contains(&AppEvent::ModeChanged {
        from: EngineMode::Manual,
        to: EngineMode::Auto,
    }));
}

#[test]
fn mode_off_stops_a_running_engine_and_blocks_starts() {
    let mut rig = Rig::new();
    rig.run_engine();

    let status = rig.command(ControlCommand::SetMode(EngineMode::Off));
    assert_eq!(status.state, EngineState::CoolingDown);
    assert_eq!(status.mode, EngineMode::Off);

    let status = rig.command(ControlCommand::StopRequest);
    assert_eq!(status.state, EngineState::Stopped);

    rig.sensors.current = stopped_snapshot();
    let status = rig.command(ControlCommand::StartRequest);
    assert_eq!(status.state, EngineState::Stopped);
    assert!(matches!(
        rig.sink.rejections().last(),
        Some(AppEvent::CommandRejected {
            reason: Rejection::ModeOff,
            ..
        })
    ));
}

// ── Sensors and status ────────────────────────────────────────

#[test]
fn missing_sensor_data_reuses_last_snapshot() {
    let mut rig = Rig::new();
    rig.run_engine();

    rig.sensors.silent = true;
    let status = rig.tick();
    assert!(status.stale);
    assert_eq!(status.state, EngineState::Running);
    assert!((status.rpm - 1500.0).abs() < f64::EPSILON);

    rig.sensors.silent = false;
    rig.sensors.current.rpm = 1510.0;
    let status = rig.tick();
    assert!(!status.stale);
    assert!((status.rpm - 1510.0).abs() < f64::EPSILON);
}

#[test]
fn status_emitted_every_tick_with_increasing_tick_numbers() {
    let mut rig = Rig::new();
    for _ in 0..5 {
        rig.tick();
    }
    let ticks: Vec<u64> = rig.sink.statuses().iter().map(|s| s.tick).collect();
    assert_eq!(ticks, [1, 2, 3, 4, 5]);
    assert_eq!(rig.sensors.reads, 5);
}

#[test]
fn tags_track_the_latest_status() {
    let mut rig = Rig::new();
    rig.tick();
    assert_eq!(rig.tags.get("engine_state"), Some(&json!("stopped")));
    assert_eq!(rig.tags.get("active_faults"), Some(&json!([])));

    rig.run_engine();
    assert_eq!(rig.tags.get("engine_state"), Some(&json!("running")));
    assert_eq!(rig.tags.get("engine_rpm"), Some(&json!(1500.0)));
    assert_eq!(rig.tags.get("oil_pressure"), Some(&json!(40.0)));
    assert_eq!(rig.tags.get("battery_voltage"), Some(&json!(14.2)));
}

#[test]
fn status_serializes_for_the_dashboard() {
    let mut rig = Rig::new();
    rig.sensors.current.battery_voltage_v = 15.0;
    let status = rig.tick();
    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["state"], json!("fault"));
    assert_eq!(value["status_label"], json!("FAULT"));
    assert_eq!(value["mode"], json!("manual"));
    assert_eq!(value["active_faults"], json!(["high_battery_voltage"]));
    assert_eq!(value["fault_reset_available"], json!(true));
}
