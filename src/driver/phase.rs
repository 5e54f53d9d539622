use crate::config::Phase;
use crate::simulation::SignalMap;

/// Walks an externally supplied phase sequence on model time, wrapping after
/// the last phase. It never reorders or resizes phases.
#[derive(Debug, Clone)]
pub struct PhaseCursor {
    phases: Vec<Phase>,
    index: usize,
    elapsed: f32,
    cycles: u64,
}

impl PhaseCursor {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self {
            phases,
            index: 0,
            elapsed: 0.0,
            cycles: 0,
        }
    }

    pub fn active_phase(&self) -> Option<&Phase> {
        self.phases.get(self.index)
    }

    pub fn active_index(&self) -> usize {
        self.index
    }

    pub fn completed_cycles(&self) -> u64 {
        self.cycles
    }

    /// Moves model time forward by `dt`; returns true when the active phase changed.
    pub fn advance(&mut self, dt: f32) -> bool {
        let cycle: f32 = self.phases.iter().map(|p| p.duration().max(0.0)).sum();
        if cycle <= 0.0 || !dt.is_finite() {
            return false;
        }

        let start = self.index;
        let start_cycles = self.cycles;
        self.elapsed += dt.max(0.0);

        // Whole cycles land back on the same phase.
        if self.elapsed >= cycle {
            self.cycles += (self.elapsed / cycle).floor() as u64;
            self.elapsed %= cycle;
        }

        loop {
            let duration = self.phases[self.index].duration();
            if self.elapsed < duration {
                break;
            }
            self.elapsed -= duration.max(0.0);
            self.index += 1;
            if self.index == self.phases.len() {
                self.index = 0;
                self.cycles += 1;
            }
        }

        let changed = self.index != start || self.cycles != start_cycles;
        if changed {
            log::debug!(
                "Phase {} active{}",
                self.index + 1,
                self.active_phase()
                    .and_then(|p| p.active_road.as_deref())
                    .map(|road| format!(" ({})", road))
                    .unwrap_or_default()
            );
        }

        changed
    }

    /// Signal mapping currently in force. An empty schedule yields an empty
    /// map, which reads red everywhere.
    pub fn signals(&self) -> SignalMap {
        self.active_phase()
            .map(|phase| phase.signals_at(self.elapsed))
            .unwrap_or_default()
    }
}
