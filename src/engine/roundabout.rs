use super::{
    lanes, recycle_exited, signal_for, Constraint, RecycleSpeed, TickEngine, VehicleUpdate,
    CROSSING_MARGIN,
};
use crate::simulation::{desired_speed_for, IdmParams, Layout, SignalMap, SimulationState};
use rand::rngs::StdRng;

/// Recycled roundabout traffic re-enters at this fraction of the roundabout desired speed.
pub const ROUNDABOUT_REENTRY_FRACTION: f32 = 0.5;

/// Tick engine for the 5-arm roundabout. Each arm has one yield boundary and
/// no memory of having passed it: position alone decides.
pub struct RoundaboutEngine {
    state: SimulationState,
    params: IdmParams,
    rng: StdRng,
}

impl RoundaboutEngine {
    pub fn new(state: SimulationState, params: IdmParams, rng: StdRng) -> Self {
        Self { state, params, rng }
    }

    pub fn desired_speed(&self) -> f32 {
        desired_speed_for(Layout::Roundabout, &self.params)
    }

    fn plan(&self, signals: &SignalMap, dt: f32) -> Vec<VehicleUpdate> {
        let vehicles = &self.state.vehicles;
        let desired_speed = self.desired_speed();
        let mut updates = Vec::with_capacity(vehicles.len());

        for (arm_id, members) in lanes(vehicles) {
            let Some(arm) = self.state.approach(arm_id) else {
                log::warn!("Vehicles reference missing arm {}, leaving them in place", arm_id.0);
                continue;
            };
            let must_yield = !signal_for(&self.state, arm_id, signals).permits_crossing();
            let yield_line = arm.stop_line;

            for (rank, &index) in members.iter().enumerate() {
                let vehicle = &vehicles[index];
                let leader = rank.checked_sub(1).map(|ahead| &vehicles[members[ahead]]);

                let mut constraint = Constraint::behind(vehicle, leader);
                if must_yield && vehicle.progress <= yield_line + CROSSING_MARGIN {
                    constraint = constraint.stop_at(vehicle, yield_line);
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
                    crossed: false,
                });
            }
        }

        updates
    }
}

impl TickEngine for RoundaboutEngine {
    fn update(&mut self, signals: &SignalMap, dt: f32) {
        let dt = dt.max(0.0);
        let updates = self.plan(signals, dt);

        for update in updates {
            update.apply(&mut self.state.vehicles);
        }

        let groups = lanes(&self.state.vehicles);
        let reentry_speed = self.desired_speed() * ROUNDABOUT_REENTRY_FRACTION;
        recycle_exited(&mut self.state, &groups, &mut self.rng, RecycleSpeed::Fixed(reentry_speed));

        self.state.time += dt;
    }

    fn snapshot(&self) -> &SimulationState {
        &self.state
    }

    fn name(&self) -> &'static str {
        "roundabout"
    }
}
