use super::{
    resolve_approaches, IdmParams, Layout, SimulationState, Topology, Vehicle, VehicleClass,
    VehicleId, Viewport,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const REGULAR_CLASS_CAP: u32 = 8;
pub const ROUNDABOUT_CLASS_CAP: u32 = 6;
/// Bumper-to-bumper spacing added between spawned vehicles.
pub const SPAWN_GAP: f32 = 14.0;
/// Upper bound of the random extra spacing between spawned vehicles.
pub const SPAWN_JITTER: f32 = 24.0;
/// Roundabout traffic aims for this fraction of the base desired speed.
pub const ROUNDABOUT_SPEED_FACTOR: f32 = 0.8;
pub const MIN_INITIAL_SPEED_FRACTION: f32 = 0.6;
pub const MAX_INITIAL_SPEED_FRACTION: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VehicleCount {
    #[serde(alias = "type")]
    pub class: VehicleClass,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RoadPopulation {
    pub road: String,
    #[serde(default)]
    pub vehicles: Vec<VehicleCount>,
}

/// Everything the builder needs to lay out a fresh snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationRequest {
    pub topology: Topology,
    /// Road label per approach, in approach order. Empty means the topology defaults.
    pub roads: Vec<String>,
    pub population: Vec<RoadPopulation>,
}

impl PopulationRequest {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            roads: Vec::new(),
            population: Vec::new(),
        }
    }

    pub fn with_vehicles(mut self, road: &str, class: VehicleClass, count: u32) -> Self {
        let entry = VehicleCount { class, count };
        match self.population.iter_mut().find(|p| p.road == road) {
            Some(existing) => existing.vehicles.push(entry),
            None => self.population.push(RoadPopulation {
                road: road.to_string(),
                vehicles: vec![entry],
            }),
        }
        self
    }

    pub fn road_labels(&self) -> Vec<String> {
        if self.roads.is_empty() {
            self.topology.road_labels()
        } else {
            self.roads.clone()
        }
    }
}

pub fn class_cap(layout: Layout) -> u32 {
    match layout {
        Layout::Regular => REGULAR_CLASS_CAP,
        Layout::Roundabout => ROUNDABOUT_CLASS_CAP,
    }
}

pub fn desired_speed_for(layout: Layout, params: &IdmParams) -> f32 {
    match layout {
        Layout::Regular => params.desired_speed,
        Layout::Roundabout => params.desired_speed * ROUNDABOUT_SPEED_FACTOR,
    }
}

/// Centre-to-centre distance between a vehicle and the one spawned ahead of it.
pub fn spawn_spacing<R: Rng + ?Sized>(ahead_length: f32, length: f32, rng: &mut R) -> f32 {
    ahead_length.max(length) + SPAWN_GAP + rng.gen_range(0.0..SPAWN_JITTER)
}

pub fn initial_speed<R: Rng + ?Sized>(desired_speed: f32, rng: &mut R) -> f32 {
    desired_speed * rng.gen_range(MIN_INITIAL_SPEED_FRACTION..=MAX_INITIAL_SPEED_FRACTION)
}

/// Progress for a vehicle rejoining the back of its approach. Always off-scene,
/// and never overlapping the current tail.
pub fn rejoin_progress<R: Rng + ?Sized>(tail: Option<(f32, f32)>, length: f32, rng: &mut R) -> f32 {
    let fresh = -(length / 2.0 + rng.gen_range(0.0..SPAWN_JITTER));
    match tail {
        Some((tail_progress, tail_length)) => {
            fresh.min(tail_progress - spawn_spacing(tail_length, length, rng))
        }
        None => fresh,
    }
}

pub struct PopulationBuilder {
    params: IdmParams,
    viewport: Viewport,
}

impl PopulationBuilder {
    pub fn new(params: IdmParams, viewport: Viewport) -> Self {
        Self { params, viewport }
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        request: &PopulationRequest,
        rng: &mut R,
    ) -> SimulationState {
        let topology = request.topology;
        let layout = topology.layout();
        let approaches = resolve_approaches(topology, &request.road_labels(), self.viewport);
        let mut state = SimulationState::new(topology, approaches, self.viewport);

        let cap = class_cap(layout);
        let desired_speed = desired_speed_for(layout, &self.params);
        let mut next_id = 0;

        for road in &request.population {
            if state.approach_by_road(&road.road).is_none() {
                log::warn!(
                    "Road '{}' is not an approach of the {}, skipping",
                    road.road,
                    topology.name()
                );
            }
        }

        for approach in &state.approaches {
            // Duplicate labels: the first approach carrying the label owns its vehicles.
            if state.approach_by_road(&approach.road).map(|a| a.id) != Some(approach.id) {
                log::warn!("Road '{}' is assigned to more than one approach", approach.road);
                continue;
            }

            // (progress, length) of the last vehicle placed on this approach.
            let mut tail: Option<(f32, f32)> = None;
            let mut placed: HashMap<VehicleClass, u32> = HashMap::new();

            let requested = request
                .population
                .iter()
                .filter(|p| p.road == approach.road)
                .flat_map(|p| p.vehicles.iter());

            for entry in requested {
                let so_far = placed.entry(entry.class).or_insert(0);
                let allowed = entry.count.min(cap - *so_far);
                if allowed < entry.count {
                    log::debug!(
                        "Capping {} {} on '{}' at {} per class",
                        entry.count,
                        entry.class.label(),
                        approach.road,
                        cap
                    );
                }
                *so_far += allowed;

                for _ in 0..allowed {
                    let length = entry.class.footprint().length;
                    let progress = match tail {
                        Some((ahead, ahead_length)) => {
                            ahead - spawn_spacing(ahead_length, length, rng)
                        }
                        None => rejoin_progress(None, length, rng),
                    };
                    let velocity = initial_speed(desired_speed, rng);

                    state.vehicles.push(Vehicle::new(
                        VehicleId(next_id),
                        entry.class,
                        approach.id,
                        progress,
                        velocity,
                    ));
                    next_id += 1;
                    tail = Some((progress, length));
                }
            }
        }

        log::debug!(
            "Built {} with {} vehicles on {} approaches",
            topology.name(),
            state.vehicles.len(),
            state.approaches.len()
        );

        state
    }
}
