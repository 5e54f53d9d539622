use nalgebra::{Point2, Vector2};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod geometry;
pub mod physics;
pub mod population;
pub mod signal;
pub mod vehicle;

pub use geometry::*;
pub use physics::*;
pub use population::*;
pub use signal::*;
pub use vehicle::*;

pub type Vec2 = Vector2<f32>;
pub type Point = Point2<f32>;

/// Speed below which a vehicle counts as queued.
pub const QUEUED_SPEED: f32 = 1.0;

/// The simulation snapshot: every vehicle plus the geometry it moves on.
/// Owned by one tick engine and replaced wholesale on rebuild.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub vehicles: Vec<Vehicle>,
    pub approaches: Vec<Approach>,
    pub topology: Topology,
    pub layout: Layout,
    pub viewport: Viewport,
    /// Model time in seconds.
    pub time: f32,
    pub total_recycled: u64,
}

impl SimulationState {
    pub fn new(topology: Topology, approaches: Vec<Approach>, viewport: Viewport) -> Self {
        Self {
            vehicles: Vec::new(),
            approaches,
            topology,
            layout: topology.layout(),
            viewport,
            time: 0.0,
            total_recycled: 0,
        }
    }

    pub fn approach(&self, id: ApproachId) -> Option<&Approach> {
        self.approaches.get(id.0)
    }

    pub fn approach_by_road(&self, road: &str) -> Option<&Approach> {
        self.approaches.iter().find(|a| a.road == road)
    }

    pub fn get_vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicles_on<'a>(&'a self, road: &'a str) -> impl Iterator<Item = &'a Vehicle> + 'a {
        let ids: Vec<ApproachId> = self
            .approaches
            .iter()
            .filter(|a| a.road == road)
            .map(|a| a.id)
            .collect();
        self.vehicles.iter().filter(move |v| ids.contains(&v.approach))
    }

    /// Screen position of a vehicle's centre, for renderers.
    pub fn screen_position(&self, vehicle: &Vehicle) -> Option<Point> {
        self.approach(vehicle.approach).map(|a| a.position_at(vehicle.progress))
    }

    /// Visible, nearly stopped vehicles short of their stop line, per road.
    pub fn queue_lengths(&self) -> BTreeMap<String, usize> {
        let mut queues: BTreeMap<String, usize> =
            self.approaches.iter().map(|a| (a.road.clone(), 0)).collect();

        for vehicle in &self.vehicles {
            let Some(approach) = self.approach(vehicle.approach) else {
                continue;
            };
            let queued = vehicle.velocity < QUEUED_SPEED && vehicle.front() <= approach.stop_line;
            if vehicle.is_visible() && queued {
                *queues.entry(approach.road.clone()).or_insert(0) += 1;
            }
        }

        queues
    }

    pub fn class_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for vehicle in &self.vehicles {
            *counts.entry(vehicle.class.label()).or_insert(0) += 1;
        }
        counts
    }

    pub fn mean_speed(&self) -> f32 {
        if self.vehicles.is_empty() {
            return 0.0;
        }
        self.vehicles.iter().map(|v| v.velocity).sum::<f32>() / self.vehicles.len() as f32
    }
}

/// Rolling window of per-tick update durations.
#[derive(Debug)]
pub struct PerformanceTracker {
    samples: Vec<Duration>,
    max_samples: usize,
    current_tick_start: Option<instant::Instant>,
}

impl PerformanceTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            current_tick_start: None,
        }
    }

    pub fn start_tick(&mut self) {
        self.current_tick_start = Some(instant::Instant::now());
    }

    pub fn end_tick(&mut self) {
        if let Some(start) = self.current_tick_start.take() {
            if self.samples.len() >= self.max_samples {
                self.samples.remove(0);
            }
            self.samples.push(start.elapsed());
        }
    }

    pub fn average_tick_time(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
