use serde::{Deserialize, Serialize};

/// Smallest gap handed to the model; keeps `s*/s` finite.
pub const GAP_EPSILON: f32 = 0.1;
/// Floor for the desired speed so the free-road ratio stays defined.
pub const MIN_DESIRED_SPEED: f32 = 0.1;
/// Velocity ceiling as a multiple of the desired speed.
pub const MAX_SPEED_FACTOR: f32 = 1.2;

/// Intelligent Driver Model parameters, in scene units and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IdmParams {
    /// Desired cruising speed on an open road.
    pub desired_speed: f32,
    pub max_acceleration: f32,
    pub comfortable_deceleration: f32,
    /// Jam distance `s0`.
    pub min_gap: f32,
    /// Desired time headway `T`.
    pub time_headway: f32,
    /// Free-road exponent `δ`.
    pub exponent: f32,
}

impl Default for IdmParams {
    fn default() -> Self {
        Self {
            desired_speed: 80.0,
            max_acceleration: 60.0,
            comfortable_deceleration: 90.0,
            min_gap: 8.0,
            time_headway: 1.0,
            exponent: 4.0,
        }
    }
}

impl IdmParams {
    /// Desired dynamic gap `s*`.
    pub fn desired_gap(&self, speed: f32, closing_speed: f32) -> f32 {
        let braking = 2.0 * (self.max_acceleration * self.comfortable_deceleration).sqrt();
        let dynamic = speed * self.time_headway + speed * closing_speed / braking;
        self.min_gap + dynamic.max(0.0)
    }

    pub fn free_road_term(&self, speed: f32, desired_speed: f32) -> f32 {
        let v0 = desired_speed.max(MIN_DESIRED_SPEED);
        self.max_acceleration * (1.0 - (speed / v0).powf(self.exponent))
    }

    pub fn interaction_term(&self, speed: f32, closing_speed: f32, gap: f32) -> f32 {
        let gap = gap.max(GAP_EPSILON);
        let ratio = self.desired_gap(speed, closing_speed) / gap;
        -self.max_acceleration * ratio * ratio
    }

    /// Unclamped IDM acceleration; see [`IdmParams::clamp_acceleration`].
    pub fn acceleration(
        &self,
        speed: f32,
        closing_speed: f32,
        gap: f32,
        desired_speed: f32,
    ) -> f32 {
        self.free_road_term(speed, desired_speed) + self.interaction_term(speed, closing_speed, gap)
    }

    pub fn clamp_acceleration(&self, acceleration: f32) -> f32 {
        acceleration.clamp(-2.0 * self.comfortable_deceleration, self.max_acceleration)
    }

    /// Semi-implicit Euler step: velocity first, then position with the new velocity.
    /// Returns `(velocity, progress)`.
    pub fn integrate(
        &self,
        velocity: f32,
        progress: f32,
        acceleration: f32,
        desired_speed: f32,
        dt: f32,
    ) -> (f32, f32) {
        let ceiling = MAX_SPEED_FACTOR * desired_speed.max(MIN_DESIRED_SPEED);
        let velocity = (velocity + acceleration * dt).clamp(0.0, ceiling);
        (velocity, progress + velocity * dt)
    }
}

/// Stateless IDM acceleration shared by every topology.
pub fn idm_acceleration(
    params: &IdmParams,
    speed: f32,
    closing_speed: f32,
    gap: f32,
    desired_speed: f32,
) -> f32 {
    params.acceleration(speed, closing_speed, gap, desired_speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_road_accelerates_from_rest() {
        let params = IdmParams::default();
        let acc = idm_acceleration(&params, 0.0, 0.0, f32::INFINITY, params.desired_speed);
        assert_eq!(acc, params.max_acceleration);
    }

    #[test]
    fn cruising_on_free_road_is_steady() {
        let params = IdmParams::default();
        let v0 = params.desired_speed;
        let acc = idm_acceleration(&params, v0, 0.0, f32::INFINITY, v0);
        assert!(acc.abs() < 1e-4);
    }

    #[test]
    fn follower_at_jam_distance_brakes_hard() {
        let params = IdmParams::default();
        let v = 40.0;
        let interaction = params.interaction_term(v, 0.0, params.min_gap);
        assert!(interaction <= -params.max_acceleration);
        let acc = idm_acceleration(&params, v, 0.0, params.min_gap, params.desired_speed);
        assert!(acc < -params.max_acceleration * 0.5);
    }

    #[test]
    fn degenerate_gap_is_floored() {
        let params = IdmParams::default();
        let acc = params.acceleration(10.0, 10.0, -5.0, params.desired_speed);
        assert!(acc.is_finite());
        assert_eq!(params.clamp_acceleration(acc), -2.0 * params.comfortable_deceleration);
    }

    #[test]
    fn zero_desired_speed_is_floored() {
        let params = IdmParams::default();
        let acc = params.acceleration(0.0, 0.0, 100.0, 0.0);
        assert!(acc.is_finite());
    }

    #[test]
    fn integration_keeps_velocity_in_bounds() {
        let params = IdmParams::default();
        let (v, x) = params.integrate(1.0, 10.0, -500.0, 80.0, 0.05);
        assert_eq!(v, 0.0);
        assert_eq!(x, 10.0);

        let (v, _) = params.integrate(95.0, 0.0, 500.0, 80.0, 0.05);
        assert!((v - MAX_SPEED_FACTOR * 80.0).abs() < 1e-3);
    }
}
