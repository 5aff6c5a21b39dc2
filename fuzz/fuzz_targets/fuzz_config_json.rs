//! Fuzz target: `EngineConfig` JSON parsing and validation.
//!
//! Any byte string either fails to parse, fails validation, or yields a
//! config the state machine accepts.  Never a panic.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use enginectl::{ControlLoop, EngineConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<EngineConfig>(data) else {
        return;
    };
    match config.validate() {
        Ok(()) => assert!(ControlLoop::new(config).is_ok()),
        Err(_) => assert!(ControlLoop::new(config).is_err()),
    }
});
