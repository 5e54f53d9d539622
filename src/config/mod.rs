use anyhow::{Context, Result};

pub mod phases;
pub mod scene;

pub use phases::*;
pub use scene::*;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub scene: SceneConfig,
    pub phases: PhasesConfig,
}

impl SimulationConfig {
    pub fn load_from_files(scene_path: &str, phases_path: &str) -> Result<Self> {
        let scene_content = std::fs::read_to_string(scene_path)
            .with_context(|| format!("reading scene file {}", scene_path))?;
        let phases_content = std::fs::read_to_string(phases_path)
            .with_context(|| format!("reading phase schedule {}", phases_path))?;

        Self::from_toml(&scene_content, &phases_content)
    }

    pub fn from_toml(scene_content: &str, phases_content: &str) -> Result<Self> {
        let scene: SceneConfig = toml::from_str(scene_content)?;
        let phases: PhasesConfig = toml::from_str(phases_content)?;

        // Validate configurations
        scene.validate()?;
        phases.validate()?;

        let config = SimulationConfig { scene, phases };
        config.warn_unsignalled_roads();
        Ok(config)
    }

    /// Roads the schedule never mentions stay red for the whole run.
    fn warn_unsignalled_roads(&self) {
        for road in self.scene.road_labels() {
            let mentioned = self.phases.phases.iter().any(|p| p.signals.get(&road).is_some());
            if !mentioned {
                log::warn!("Road '{}' has no entry in any phase and will stay red", road);
            }
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{SignalState, Topology, VehicleClass};

    const SCENE: &str = r#"
        [scene]
        name = "Test crossroad"
        topology = 4

        [random]
        seed = 7

        [[population]]
        road = "North"
        vehicles = [{ class = "ambulance", count = 1 }, { type = "car", count = 3 }]
    "#;

    const PHASES: &str = r#"
        [[phases]]
        active_road = "North"
        green_duration = 30.0
        yellow_duration = 5.0
        signals = { North = "GREEN", South = "RED", East = "RED", West = "RED" }
    "#;

    #[test]
    fn loads_scene_and_schedule() -> Result<()> {
        let config = SimulationConfig::from_toml(SCENE, PHASES)?;
        assert_eq!(config.scene.scene.topology, Topology::FourWay);
        assert_eq!(config.scene.random.seed, Some(7));
        assert_eq!(config.scene.driver.max_step_ms, 50);
        assert_eq!(config.scene.population[0].vehicles[0].class, VehicleClass::Ambulance);
        assert_eq!(config.phases.phases[0].signals.state_for("North"), SignalState::Green);
        Ok(())
    }

    #[test]
    fn rejects_unknown_topology() {
        let scene = SCENE.replace("topology = 4", "topology = 9");
        let err = SimulationConfig::from_toml(&scene, PHASES).unwrap_err();
        assert!(err.to_string().contains("unknown intersection type 9"), "{}", err);
    }

    #[test]
    fn rejects_population_on_missing_road() {
        let scene = SCENE
            .replace("topology = 4", "topology = 1")
            .replace("road = \"North\"", "road = \"West\"");
        assert!(SimulationConfig::from_toml(&scene, PHASES).is_err());
    }

    #[test]
    fn rejects_unknown_signal_state() {
        let phases = PHASES.replace("South = \"RED\"", "South = \"BLUE\"");
        assert!(SimulationConfig::from_toml(SCENE, &phases).is_err());
    }
}
