//! Per-step timing metrics for the driver.
//!
//! [`StepMetrics`] captures the timing split of one outer step summed over
//! every system; [`MetricsWindow`] averages them between log lines.

use trotter_ensemble::StepTimings;

/// Timing collected during a single outer step.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step including outputs.
    pub total_us: u64,
    /// Momentum updates, including force evaluation.
    pub ptime_us: u64,
    /// Position updates and free ring-polymer propagation.
    pub qtime_us: u64,
    /// Thermostat half-steps.
    pub ttime_us: u64,
    /// Output dispatch.
    pub output_us: u64,
}

impl StepMetrics {
    /// Add one system's phase timings.
    pub fn add_timings(&mut self, t: &StepTimings) {
        self.ptime_us += t.ptime.as_micros() as u64;
        self.qtime_us += t.qtime.as_micros() as u64;
        self.ttime_us += t.ttime.as_micros() as u64;
    }
}

/// Running sums over the steps since the last log line.
#[derive(Clone, Debug, Default)]
pub(crate) struct MetricsWindow {
    steps: u64,
    sum: StepMetrics,
}

impl MetricsWindow {
    pub(crate) fn record(&mut self, m: &StepMetrics) {
        self.steps += 1;
        self.sum.total_us += m.total_us;
        self.sum.ptime_us += m.ptime_us;
        self.sum.qtime_us += m.qtime_us;
        self.sum.ttime_us += m.ttime_us;
        self.sum.output_us += m.output_us;
    }

    pub(crate) fn len(&self) -> u64 {
        self.steps
    }

    /// Average over the window, then reset it.
    pub(crate) fn drain(&mut self) -> StepMetrics {
        let n = self.steps.max(1);
        let avg = StepMetrics {
            total_us: self.sum.total_us / n,
            ptime_us: self.sum.ptime_us / n,
            qtime_us: self.sum.qtime_us / n,
            ttime_us: self.sum.ttime_us / n,
            output_us: self.sum.output_us / n,
        };
        *self = Self::default();
        avg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.ptime_us, 0);
        assert_eq!(m.qtime_us, 0);
        assert_eq!(m.ttime_us, 0);
        assert_eq!(m.output_us, 0);
    }

    #[test]
    fn timings_accumulate_across_systems() {
        let mut m = StepMetrics::default();
        let t = StepTimings {
            ptime: Duration::from_micros(30),
            qtime: Duration::from_micros(5),
            ttime: Duration::from_micros(2),
        };
        m.add_timings(&t);
        m.add_timings(&t);
        assert_eq!(m.ptime_us, 60);
        assert_eq!(m.qtime_us, 10);
        assert_eq!(m.ttime_us, 4);
    }

    #[test]
    fn window_averages_and_resets() {
        let mut w = MetricsWindow::default();
        for total in [10, 20, 30] {
            w.record(&StepMetrics {
                total_us: total,
                ptime_us: 2 * total,
                ..Default::default()
            });
        }
        assert_eq!(w.len(), 3);
        let avg = w.drain();
        assert_eq!(avg.total_us, 20);
        assert_eq!(avg.ptime_us, 40);
        assert_eq!(w.len(), 0);
    }
}
