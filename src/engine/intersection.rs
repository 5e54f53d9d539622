use super::{
    lanes, recycle_exited, signal_for, Constraint, RecycleSpeed, TickEngine, VehicleUpdate,
    CROSSING_MARGIN,
};
use crate::simulation::{IdmParams, SignalMap, SimulationState};
use rand::rngs::StdRng;

/// Tick engine for the 1/2/3/4-way layouts: straight lanes, one stop line each.
pub struct IntersectionEngine {
    state: SimulationState,
    params: IdmParams,
    rng: StdRng,
}

impl IntersectionEngine {
    pub fn new(state: SimulationState, params: IdmParams, rng: StdRng) -> Self {
        Self { state, params, rng }
    }

    pub fn desired_speed(&self) -> f32 {
        self.params.desired_speed
    }

    fn plan(&self, signals: &SignalMap, dt: f32) -> Vec<VehicleUpdate> {
        let vehicles = &self.state.vehicles;
        let desired_speed = self.desired_speed();
        let mut updates = Vec::with_capacity(vehicles.len());

        for (approach_id, members) in lanes(vehicles) {
            let Some(approach) = self.state.approach(approach_id) else {
                log::warn!(
                    "Vehicles reference missing approach {}, leaving them in place",
                    approach_id.0
                );
                continue;
            };
            let signal = signal_for(&self.state, approach_id, signals);

            for (rank, &index) in members.iter().enumerate() {
                let vehicle = &vehicles[index];
                let leader = rank.checked_sub(1).map(|ahead| &vehicles[members[ahead]]);

                let mut constraint = Constraint::behind(vehicle, leader);
                if !vehicle.has_crossed_stop_line && !signal.permits_crossing() {
                    constraint = constraint.stop_at(vehicle, approach.stop_line);
                }

                let acceleration = self.params.clamp_acceleration(self.params.acceleration(
                    vehicle.velocity,
                    constraint.closing_speed,
                    constraint.gap,
                    desired_speed,
                ));
                let (velocity, progress) = self.params.integrate(
                    vehicle.velocity,
                    vehicle.progress,
                    acceleration,
                    desired_speed,
                    dt,
                );

                updates.push(VehicleUpdate {
                    index,
                    acceleration,
                    velocity,
                    progress,
                    crossed: vehicle.has_crossed_stop_line
                        || progress > approach.stop_line + CROSSING_MARGIN,
                });
            }
        }

        updates
    }
}

impl TickEngine for IntersectionEngine {
    fn update(&mut self, signals: &SignalMap, dt: f32) {
        let dt = dt.max(0.0);
        let updates = self.plan(signals, dt);

        for update in updates {
            update.apply(&mut self.state.vehicles);
        }

        let groups = lanes(&self.state.vehicles);
        recycle_exited(
            &mut self.state,
            &groups,
            &mut self.rng,
            RecycleSpeed::Randomized(self.params.desired_speed),
        );

        self.state.time += dt;
    }

    fn snapshot(&self) -> &SimulationState {
        &self.state
    }

    fn name(&self) -> &'static str {
        "intersection"
    }
}
