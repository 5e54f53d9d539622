use crate::simulation::{
    initial_speed, rejoin_progress, ApproachId, IdmParams, Layout, PopulationBuilder,
    PopulationRequest, SignalMap, SignalState, SimulationState, Vehicle, Viewport,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

pub mod intersection;
pub mod roundabout;

pub use intersection::*;
pub use roundabout::*;

/// Distance past the end of an approach before a vehicle is recycled.
pub const EXIT_MARGIN: f32 = 60.0;
/// Hysteresis past the stop line (or yield boundary) before a vehicle counts as through.
pub const CROSSING_MARGIN: f32 = 2.0;

/// A per-frame update step over an owned snapshot.
pub trait TickEngine {
    fn update(&mut self, signals: &SignalMap, dt: f32);
    fn snapshot(&self) -> &SimulationState;
    fn name(&self) -> &'static str;
}

pub enum Engine {
    Intersection(IntersectionEngine),
    Roundabout(RoundaboutEngine),
}

impl Engine {
    /// Builds a fresh population and wraps it in the engine matching its layout.
    pub fn build(
        request: &PopulationRequest,
        viewport: Viewport,
        params: IdmParams,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = seeded_rng(seed);
        let state = PopulationBuilder::new(params, viewport).build(request, &mut rng);
        Self::from_state(state, params, rng)
    }

    pub fn from_state(state: SimulationState, params: IdmParams, rng: StdRng) -> Self {
        match state.layout {
            Layout::Regular => Engine::Intersection(IntersectionEngine::new(state, params, rng)),
            Layout::Roundabout => Engine::Roundabout(RoundaboutEngine::new(state, params, rng)),
        }
    }
}

impl TickEngine for Engine {
    fn update(&mut self, signals: &SignalMap, dt: f32) {
        match self {
            Engine::Intersection(engine) => engine.update(signals, dt),
            Engine::Roundabout(engine) => engine.update(signals, dt),
        }
    }

    fn snapshot(&self) -> &SimulationState {
        match self {
            Engine::Intersection(engine) => engine.snapshot(),
            Engine::Roundabout(engine) => engine.snapshot(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Engine::Intersection(engine) => engine.name(),
            Engine::Roundabout(engine) => engine.name(),
        }
    }
}

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_entropy()
    }
}

/// Whatever limits a vehicle this tick: a real leader or a virtual stationary one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub gap: f32,
    pub closing_speed: f32,
    pub virtual_leader: bool,
}

impl Constraint {
    pub const FREE_ROAD: Constraint = Constraint {
        gap: f32::INFINITY,
        closing_speed: 0.0,
        virtual_leader: false,
    };

    pub fn behind(follower: &Vehicle, leader: Option<&Vehicle>) -> Self {
        match leader {
            Some(leader) => Constraint {
                gap: leader.progress
                    - follower.progress
                    - leader.footprint.half_length()
                    - follower.footprint.half_length(),
                closing_speed: follower.velocity - leader.velocity,
                virtual_leader: false,
            },
            None => Constraint::FREE_ROAD,
        }
    }

    /// Replaces the real leader with a stationary obstacle at `line` when the
    /// line is the nearer of the two.
    pub fn stop_at(self, vehicle: &Vehicle, line: f32) -> Self {
        let to_line = line - vehicle.front();
        if to_line < self.gap {
            Constraint {
                gap: to_line,
                closing_speed: vehicle.velocity,
                virtual_leader: true,
            }
        } else {
            self
        }
    }
}

/// Vehicle indices per approach, each list ordered front-most first.
pub fn lanes(vehicles: &[Vehicle]) -> BTreeMap<ApproachId, Vec<usize>> {
    let mut groups: BTreeMap<ApproachId, Vec<usize>> = BTreeMap::new();
    for (index, vehicle) in vehicles.iter().enumerate() {
        groups.entry(vehicle.approach).or_default().push(index);
    }
    for members in groups.values_mut() {
        members.sort_by(|&a, &b| {
            vehicles[b]
                .progress
                .total_cmp(&vehicles[a].progress)
                .then(vehicles[a].id.cmp(&vehicles[b].id))
        });
    }
    groups
}

/// Signal governing an approach. Lookup is by road label, so approaches that
/// share a label always read the entry of the first approach carrying it.
/// Unknown approaches read red.
pub fn signal_for(
    state: &SimulationState,
    approach: ApproachId,
    signals: &SignalMap,
) -> SignalState {
    state
        .approach(approach)
        .and_then(|a| state.approach_by_road(&a.road))
        .map(|first| signals.state_for(&first.road))
        .unwrap_or(SignalState::Red)
}

/// Per-vehicle result of the planning pass, applied after every vehicle is planned.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VehicleUpdate {
    pub index: usize,
    pub acceleration: f32,
    pub velocity: f32,
    pub progress: f32,
    pub crossed: bool,
}

impl VehicleUpdate {
    pub fn apply(self, vehicles: &mut [Vehicle]) {
        let vehicle = &mut vehicles[self.index];
        vehicle.acceleration = self.acceleration;
        vehicle.velocity = self.velocity;
        vehicle.progress = self.progress;
        vehicle.has_crossed_stop_line = self.crossed;
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum RecycleSpeed {
    /// Random fraction of the desired speed, as at spawn time.
    Randomized(f32),
    Fixed(f32),
}

/// Sends every vehicle past its approach's exit bound back behind the tail of
/// its queue. Identity and class survive; returns the number recycled.
pub(crate) fn recycle_exited<R: Rng + ?Sized>(
    state: &mut SimulationState,
    groups: &BTreeMap<ApproachId, Vec<usize>>,
    rng: &mut R,
    speed: RecycleSpeed,
) -> usize {
    let mut recycled = 0;

    for (approach_id, members) in groups {
        let Some(exit) = state.approach(*approach_id).map(|a| a.travel_length + EXIT_MARGIN) else {
            continue;
        };

        for &index in members {
            if state.vehicles[index].progress <= exit {
                continue;
            }

            let tail = members
                .iter()
                .filter(|&&other| other != index)
                .map(|&other| &state.vehicles[other])
                .min_by(|a, b| a.progress.total_cmp(&b.progress))
                .map(|v| (v.progress, v.footprint.length));

            let vehicle = &mut state.vehicles[index];
            vehicle.progress = rejoin_progress(tail, vehicle.footprint.length, rng);
            vehicle.velocity = match speed {
                RecycleSpeed::Randomized(desired_speed) => initial_speed(desired_speed, rng),
                RecycleSpeed::Fixed(velocity) => velocity,
            };
            vehicle.acceleration = 0.0;
            vehicle.has_crossed_stop_line = false;
            vehicle.passes += 1;
            recycled += 1;

            log::debug!(
                "Recycled {} {} on approach {} to {:.1}",
                vehicle.class.label(),
                vehicle.id.0,
                approach_id.0,
                vehicle.progress
            );
        }
    }

    state.total_recycled += recycled as u64;
    recycled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{resolve_approaches, Topology, VehicleClass, VehicleId};

    fn vehicle(id: usize, approach: usize, progress: f32, velocity: f32) -> Vehicle {
        Vehicle::new(VehicleId(id), VehicleClass::Car, ApproachId(approach), progress, velocity)
    }

    #[test]
    fn lanes_are_ordered_front_first() {
        let vehicles = vec![
            vehicle(0, 0, -50.0, 0.0),
            vehicle(1, 1, 10.0, 0.0),
            vehicle(2, 0, 120.0, 0.0),
            vehicle(3, 0, 40.0, 0.0),
        ];
        let groups = lanes(&vehicles);
        assert_eq!(groups[&ApproachId(0)], vec![2, 3, 0]);
        assert_eq!(groups[&ApproachId(1)], vec![1]);
    }

    #[test]
    fn gap_subtracts_both_half_lengths() {
        let leader = vehicle(0, 0, 100.0, 10.0);
        let follower = vehicle(1, 0, 40.0, 30.0);
        let constraint = Constraint::behind(&follower, Some(&leader));
        assert_eq!(constraint.gap, 60.0 - 36.0);
        assert_eq!(constraint.closing_speed, 20.0);
        assert_eq!(Constraint::behind(&follower, None), Constraint::FREE_ROAD);
    }

    #[test]
    fn nearer_stop_line_becomes_the_leader() {
        let follower = vehicle(0, 0, 100.0, 30.0);
        let constrained = Constraint::FREE_ROAD.stop_at(&follower, 200.0);
        assert!(constrained.virtual_leader);
        assert_eq!(constrained.gap, 200.0 - 118.0);
        assert_eq!(constrained.closing_speed, 30.0);

        let leader = vehicle(1, 0, 130.0, 0.0);
        let behind_leader = Constraint::behind(&follower, Some(&leader)).stop_at(&follower, 200.0);
        assert!(!behind_leader.virtual_leader);
    }

    #[test]
    fn duplicate_road_labels_share_one_signal() {
        let roads = vec!["North".to_string(), "North".to_string()];
        let viewport = Viewport::default();
        let state = SimulationState::new(
            Topology::TwoWay,
            resolve_approaches(Topology::TwoWay, &roads, viewport),
            viewport,
        );
        let signals = SignalMap::new().with("North", SignalState::Green);
        assert_eq!(signal_for(&state, ApproachId(1), &signals), SignalState::Green);
        assert_eq!(signal_for(&state, ApproachId(7), &signals), SignalState::Red);
    }
}
