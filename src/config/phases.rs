use super::Validate;
use crate::simulation::{SignalMap, SignalState};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PhasesConfig {
    #[serde(default)]
    pub phases: Vec<Phase>,
}

/// One interval of the externally computed schedule.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Phase {
    #[serde(default)]
    pub active_road: Option<String>,
    pub green_duration: f32,
    #[serde(default)]
    pub yellow_duration: f32,
    pub signals: SignalMap,
}

impl Phase {
    pub fn duration(&self) -> f32 {
        self.green_duration + self.yellow_duration
    }

    /// Mapping in force `elapsed` seconds into the phase. During the yellow
    /// interval every road this phase shows green reads yellow instead.
    pub fn signals_at(&self, elapsed: f32) -> SignalMap {
        if elapsed < self.green_duration {
            return self.signals.clone();
        }

        self.signals
            .iter()
            .map(|(road, state)| {
                let state = match state {
                    SignalState::Green => SignalState::Yellow,
                    other => other,
                };
                (road.to_string(), state)
            })
            .collect()
    }
}

impl Validate for PhasesConfig {
    fn validate(&self) -> Result<()> {
        for (index, phase) in self.phases.iter().enumerate() {
            if !phase.green_duration.is_finite() || phase.green_duration < 0.0 {
                return Err(anyhow!(
                    "Phase {} green duration must be a non-negative number",
                    index + 1
                ));
            }

            if !phase.yellow_duration.is_finite() || phase.yellow_duration < 0.0 {
                return Err(anyhow!(
                    "Phase {} yellow duration must be a non-negative number",
                    index + 1
                ));
            }
        }

        if !self.phases.is_empty() && self.phases.iter().all(|p| p.duration() <= 0.0) {
            return Err(anyhow!("At least one phase must have a positive duration"));
        }

        if self.phases.is_empty() {
            log::warn!("Phase schedule is empty; every road stays red");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(green: f32, yellow: f32) -> Phase {
        Phase {
            active_road: Some("North".to_string()),
            green_duration: green,
            yellow_duration: yellow,
            signals: SignalMap::new()
                .with("North", SignalState::Green)
                .with("South", SignalState::Red),
        }
    }

    #[test]
    fn green_turns_yellow_after_green_duration() {
        let phase = phase(30.0, 5.0);
        assert_eq!(phase.signals_at(10.0).state_for("North"), SignalState::Green);
        let late = phase.signals_at(31.0);
        assert_eq!(late.state_for("North"), SignalState::Yellow);
        assert_eq!(late.state_for("South"), SignalState::Red);
    }

    #[test]
    fn negative_durations_are_rejected() {
        let config = PhasesConfig { phases: vec![phase(-1.0, 5.0)] };
        assert!(config.validate().is_err());

        let config = PhasesConfig { phases: vec![phase(0.0, 0.0)] };
        assert!(config.validate().is_err());

        assert!(PhasesConfig::default().validate().is_ok());
    }
}
