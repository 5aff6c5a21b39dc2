//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises the control loop
//! against mock adapters and a manual clock.  Nothing here sleeps.

mod adapter_flow_tests;
mod control_loop_tests;
