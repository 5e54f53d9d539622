use crate::config::{Phase, SimulationConfig};
use crate::engine::{Engine, TickEngine};
use crate::simulation::{IdmParams, PopulationRequest, SignalMap, SimulationState, Viewport};
use std::time::Duration;

pub mod clock;
pub mod phase;

pub use clock::*;
pub use phase::*;

pub const DEFAULT_MAX_STEP: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy)]
pub struct DriverSettings {
    pub viewport: Viewport,
    pub params: IdmParams,
    pub max_step: Duration,
    pub seed: Option<u64>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            params: IdmParams::default(),
            max_step: DEFAULT_MAX_STEP,
            seed: None,
        }
    }
}

/// Glue between the external phase schedule and the tick engine. Holds no
/// vehicle data of its own; the engine owns the snapshot.
pub struct SimulationDriver {
    engine: Engine,
    phases: PhaseCursor,
    clock: FrameClock,
    settings: DriverSettings,
    running: bool,
    frames: u64,
    rebuilds: u32,
}

impl SimulationDriver {
    pub fn new(request: &PopulationRequest, phases: Vec<Phase>, settings: DriverSettings) -> Self {
        let engine = Engine::build(request, settings.viewport, settings.params, settings.seed);
        log::info!(
            "Built {} engine for {} with {} vehicles",
            engine.name(),
            request.topology.name(),
            engine.snapshot().vehicles.len()
        );

        Self {
            engine,
            phases: PhaseCursor::new(phases),
            clock: FrameClock::new(settings.max_step),
            settings,
            running: true,
            frames: 0,
            rebuilds: 0,
        }
    }

    /// `seed` overrides the seed from the scene file.
    pub fn from_config(config: &SimulationConfig, seed: Option<u64>) -> Self {
        let settings = DriverSettings {
            viewport: config.scene.scene.viewport,
            params: config.scene.model,
            max_step: config.scene.driver.max_step(),
            seed: seed.or(config.scene.random.seed),
        };
        Self::new(
            &config.scene.population_request(),
            config.phases.phases.clone(),
            settings,
        )
    }

    /// Discards the current snapshot and builds a new one. Nothing from the
    /// old layout carries over.
    pub fn rebuild(&mut self, request: &PopulationRequest) {
        // Each rebuild gets its own seed derived from the configured one.
        let seed = self.settings.seed.map(|seed| seed.wrapping_add(self.rebuilds as u64 + 1));
        self.engine = Engine::build(request, self.settings.viewport, self.settings.params, seed);
        self.rebuilds += 1;
        log::info!(
            "Rebuilt {} with {} vehicles",
            request.topology.name(),
            self.engine.snapshot().vehicles.len()
        );
    }

    /// One animation frame driven by real elapsed time. `None` once stopped.
    pub fn frame(&mut self) -> Option<f32> {
        if !self.running {
            return None;
        }
        let dt = self.clock.tick();
        Some(self.step(dt))
    }

    /// One update with an explicit step, clamped to the maximum step.
    /// Returns the step actually applied.
    pub fn step(&mut self, dt: f32) -> f32 {
        if !self.running {
            return 0.0;
        }

        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.settings.max_step.as_secs_f32())
        } else {
            0.0
        };

        let signals = self.phases.signals();
        self.engine.update(&signals, dt);
        self.phases.advance(dt);
        self.frames += 1;
        dt
    }

    /// Stops at the current tick boundary.
    pub fn stop(&mut self) {
        if self.running {
            log::info!("Simulation stopped after {} frames", self.frames);
        }
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
        self.clock.reset();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn snapshot(&self) -> &SimulationState {
        self.engine.snapshot()
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn active_phase(&self) -> Option<&Phase> {
        self.phases.active_phase()
    }

    pub fn active_signals(&self) -> SignalMap {
        self.phases.signals()
    }

    pub fn phase_cursor(&self) -> &PhaseCursor {
        &self.phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{SignalState, Topology, VehicleClass};

    fn schedule() -> Vec<Phase> {
        vec![
            Phase {
                active_road: Some("North".into()),
                green_duration: 1.0,
                yellow_duration: 0.5,
                signals: SignalMap::new()
                    .with("North", SignalState::Green)
                    .with("South", SignalState::Red),
            },
            Phase {
                active_road: Some("South".into()),
                green_duration: 1.0,
                yellow_duration: 0.5,
                signals: SignalMap::new()
                    .with("North", SignalState::Red)
                    .with("South", SignalState::Green),
            },
        ]
    }

    fn driver(topology: Topology) -> SimulationDriver {
        let request = PopulationRequest::new(topology)
            .with_vehicles("North", VehicleClass::Car, 3)
            .with_vehicles("South", VehicleClass::Bus, 2);
        let settings = DriverSettings {
            seed: Some(5),
            ..DriverSettings::default()
        };
        SimulationDriver::new(&request, schedule(), settings)
    }

    #[test]
    fn steps_are_clamped() {
        let mut driver = driver(Topology::TwoWay);
        assert_eq!(driver.step(5.0), DEFAULT_MAX_STEP.as_secs_f32());
        assert_eq!(driver.step(-1.0), 0.0);
        assert_eq!(driver.step(f32::NAN), 0.0);
    }

    #[test]
    fn schedule_advances_with_model_time() {
        let mut driver = driver(Topology::TwoWay);
        for _ in 0..40 {
            driver.step(0.05);
        }
        assert_eq!(driver.active_phase().and_then(|p| p.active_road.as_deref()), Some("South"));
        assert_eq!(driver.active_signals().state_for("South"), SignalState::Green);
    }

    #[test]
    fn stopped_driver_does_not_advance() {
        let mut driver = driver(Topology::TwoWay);
        driver.step(0.05);
        let time = driver.snapshot().time;
        driver.stop();
        assert!(driver.frame().is_none());
        assert_eq!(driver.step(0.05), 0.0);
        assert_eq!(driver.snapshot().time, time);

        driver.resume();
        assert!(driver.frame().is_some());
    }

    #[test]
    fn rebuild_replaces_the_snapshot() {
        let mut driver = driver(Topology::TwoWay);
        driver.step(0.05);
        assert_eq!(driver.engine_name(), "intersection");

        let request = PopulationRequest::new(Topology::Roundabout)
            .with_vehicles("West", VehicleClass::Car, 2);
        driver.rebuild(&request);

        let snapshot = driver.snapshot();
        assert_eq!(driver.engine_name(), "roundabout");
        assert_eq!(snapshot.vehicles.len(), 2);
        assert_eq!(snapshot.approaches.len(), 5);
        assert_eq!(snapshot.time, 0.0);
    }
}
