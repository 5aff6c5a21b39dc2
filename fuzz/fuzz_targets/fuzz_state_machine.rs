//! Fuzz target: `EngineStateMachine` driven by arbitrary trigger streams.
//!
//! Each input byte pair is `(trigger, elapsed)`: the low nibble of the
//! first byte picks a trigger (or a timeout poll), the second advances
//! the clock in 100 ms steps.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Crank attempts never exceed the configured maximum
//! - A deadline is armed exactly in the states that have a timeout
//! - Rejected triggers leave state, attempts and deadline untouched
//!
//! cargo fuzz run fuzz_state_machine

#![no_main]

use enginectl::fsm::states::timeout_trigger;
use enginectl::{EngineConfig, EngineStateMachine, Trigger};
use libfuzzer_sys::fuzz_target;

const TRIGGERS: [Trigger; 12] = [
    Trigger::StartRequest,
    Trigger::Crank,
    Trigger::EngineStarted,
    Trigger::CrankTimeout,
    Trigger::RetryCrank,
    Trigger::MaxCranksExceeded,
    Trigger::StopRequest,
    Trigger::ShutdownComplete,
    Trigger::ImmediateStop,
    Trigger::EmergencyStop,
    Trigger::FaultDetected,
    Trigger::ResetFault,
];

fuzz_target!(|data: &[u8]| {
    let config = EngineConfig::default();
    let mut fsm = EngineStateMachine::new(&config).unwrap();
    let mut now = 0u64;

    for pair in data.chunks_exact(2) {
        now += u64::from(pair[1]) * 100;
        let selector = usize::from(pair[0] & 0x0F);

        let before = (fsm.state(), fsm.crank_attempts(), fsm.deadline());
        match TRIGGERS.get(selector) {
            Some(&trigger) => {
                if fsm.apply(trigger, now).is_err() {
                    assert_eq!(before, (fsm.state(), fsm.crank_attempts(), fsm.deadline()));
                }
            }
            None => {
                let running = pair[0] & 0x10 != 0;
                let fault = pair[0] & 0x20 != 0;
                fsm.evaluate_state(running, fault, now);
                fsm.poll_timeout(now);
            }
        }

        assert!(fsm.crank_attempts() <= fsm.max_crank_attempts());
        assert_eq!(
            fsm.deadline().is_some(),
            timeout_trigger(fsm.state()).is_some()
        );
    }
});
