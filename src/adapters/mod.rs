//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements  | Connects to                 |
//! |---------------|-------------|-----------------------------|
//! | `config_file` | ConfigPort  | JSON file on disk           |
//! | `log_sink`    | EventSink   | `log` facade / console      |
//! | `tags`        | TagPort     | In-memory key/value store   |
//! | `time`        | ClockPort   | `std::time::Instant`        |
//!
//! The simulated sensor source lives in
//! [`sensors::simulator`](crate::sensors::simulator); the command mailbox
//! in [`app::commands`](crate::app::commands).

pub mod config_file;
pub mod log_sink;
pub mod tags;
pub mod time;
