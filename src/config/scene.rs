use super::Validate;
use crate::simulation::{IdmParams, PopulationRequest, RoadPopulation, Topology, Viewport};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneConfig {
    pub scene: Scene,
    #[serde(default)]
    pub model: IdmParams,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub population: Vec<RoadPopulation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scene {
    pub name: String,
    pub topology: Topology,
    /// Road label per approach; defaults to the topology's labels.
    #[serde(default)]
    pub roads: Vec<String>,
    #[serde(default)]
    pub viewport: Viewport,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Largest integration step handed to the engine, in milliseconds.
    pub max_step_ms: u64,
    pub target_fps: f32,
    pub timing_samples: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_step_ms: 50,
            target_fps: 60.0,
            timing_samples: 120,
        }
    }
}

impl DriverConfig {
    pub fn max_step(&self) -> Duration {
        Duration::from_millis(self.max_step_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RandomConfig {
    pub seed: Option<u64>,
}

impl SceneConfig {
    pub fn road_labels(&self) -> Vec<String> {
        if self.scene.roads.is_empty() {
            self.scene.topology.road_labels()
        } else {
            self.scene.roads.clone()
        }
    }

    pub fn population_request(&self) -> PopulationRequest {
        PopulationRequest {
            topology: self.scene.topology,
            roads: self.scene.roads.clone(),
            population: self.population.clone(),
        }
    }
}

impl Validate for SceneConfig {
    fn validate(&self) -> Result<()> {
        let scene = &self.scene;
        let road_count = scene.topology.road_count();

        if scene.viewport.width <= 0.0 || scene.viewport.height <= 0.0 {
            return Err(anyhow!("Viewport dimensions must be positive"));
        }

        if scene.roads.len() > road_count {
            return Err(anyhow!(
                "{} has {} approaches but {} roads were named",
                scene.topology.name(),
                road_count,
                scene.roads.len()
            ));
        }

        let mut seen = HashSet::new();
        for road in &scene.roads {
            if road.trim().is_empty() {
                return Err(anyhow!("Road labels must not be empty"));
            }
            if !seen.insert(road.as_str()) {
                log::warn!("Road '{}' is named twice; both approaches will share its signal", road);
            }
        }

        let labels = self.road_labels();
        for road in &self.population {
            if !labels.contains(&road.road) {
                return Err(anyhow!(
                    "Population given for road '{}', which is not one of {:?}",
                    road.road,
                    labels
                ));
            }
        }

        let model = &self.model;
        if model.desired_speed <= 0.0 {
            return Err(anyhow!("Desired speed must be positive"));
        }

        if model.max_acceleration <= 0.0 || model.comfortable_deceleration <= 0.0 {
            return Err(anyhow!("Acceleration and comfortable deceleration must be positive"));
        }

        if model.min_gap < 0.0 || model.time_headway < 0.0 {
            return Err(anyhow!("Minimum gap and time headway must be non-negative"));
        }

        if model.exponent <= 0.0 {
            return Err(anyhow!("Free-road exponent must be positive"));
        }

        let driver = &self.driver;
        if driver.max_step_ms == 0 {
            return Err(anyhow!("Maximum step must be at least 1 ms"));
        }

        if driver.target_fps <= 0.0 {
            return Err(anyhow!("Target frame rate must be positive"));
        }

        if driver.timing_samples == 0 {
            return Err(anyhow!("Timing samples must be greater than zero"));
        }

        Ok(())
    }
}
