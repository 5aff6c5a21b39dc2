//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing the per-tick status line to the
//! `log` facade (console in the bench binary).  Transitions, alarm edges,
//! rejections and mode changes are already logged where they happen, so
//! this sink does not repeat them.  A dashboard or telemetry publisher
//! would implement the same trait and consume every event.

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that renders each [`AppEvent::Status`] as one console line.
///
/// Status lines go out at `debug` unless `verbose_status` is set.
#[derive(Debug, Default)]
pub struct LogEventSink {
    verbose_status: bool,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose_status(mut self, verbose: bool) -> Self {
        self.verbose_status = verbose;
        self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        if let AppEvent::Status(s) = event {
            let faults: Vec<&str> = s.active_faults.iter().map(|f| f.tag()).collect();
            let line = format!(
                "STATUS | #{} {} ({}) | rpm={:.0} oil={:.1}psi coolant={:.1}\u{00b0}C \
                 batt={:.1}V fuel={:.0}% hours={:.1} | faults=[{}]{}{}",
                s.tick,
                s.status_label,
                s.mode,
                s.rpm,
                s.oil_pressure_psi,
                s.coolant_temp_c,
                s.battery_voltage_v,
                s.fuel_level_pct,
                s.engine_hours,
                faults.join(","),
                if s.underspeed { " UNDERSPEED" } else { "" },
                if s.stale { " STALE" } else { "" },
            );
            if self.verbose_status {
                info!("{line}");
            } else {
                debug!("{line}");
            }
        }
    }
}
