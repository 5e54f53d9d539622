use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalState {
    Red,
    Yellow,
    Green,
}

impl SignalState {
    /// Only green lets a vehicle cross its stop line.
    pub fn permits_crossing(self) -> bool {
        self == SignalState::Green
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SignalState::Red => "RED",
            SignalState::Yellow => "YELLOW",
            SignalState::Green => "GREEN",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown signal state '{0}', expected RED, YELLOW or GREEN")]
pub struct ParseSignalError(pub String);

impl FromStr for SignalState {
    type Err = ParseSignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RED" => Ok(SignalState::Red),
            "YELLOW" | "AMBER" => Ok(SignalState::Yellow),
            "GREEN" => Ok(SignalState::Green),
            _ => Err(ParseSignalError(s.to_string())),
        }
    }
}

/// Road label -> signal state for one instant. Lookups fail closed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SignalMap(HashMap<String, SignalState>);

impl SignalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every road in `roads` set to `state`.
    pub fn uniform<'a>(roads: impl IntoIterator<Item = &'a str>, state: SignalState) -> Self {
        roads.into_iter().map(|road| (road.to_string(), state)).collect()
    }

    pub fn set(&mut self, road: impl Into<String>, state: SignalState) {
        self.0.insert(road.into(), state);
    }

    pub fn with(mut self, road: impl Into<String>, state: SignalState) -> Self {
        self.set(road, state);
        self
    }

    /// State for `road`; a road without an entry reads as red.
    pub fn state_for(&self, road: &str) -> SignalState {
        self.0.get(road).copied().unwrap_or(SignalState::Red)
    }

    pub fn get(&self, road: &str) -> Option<SignalState> {
        self.0.get(road).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SignalState)> {
        self.0.iter().map(|(road, state)| (road.as_str(), *state))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, SignalState)> for SignalMap {
    fn from_iter<I: IntoIterator<Item = (String, SignalState)>>(iter: I) -> Self {
        SignalMap(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_road_reads_red() {
        let signals = SignalMap::new().with("North", SignalState::Green);
        assert_eq!(signals.state_for("North"), SignalState::Green);
        assert_eq!(signals.state_for("South"), SignalState::Red);
        assert_eq!(signals.get("South"), None);
    }

    #[test]
    fn only_green_permits_crossing() {
        assert!(SignalState::Green.permits_crossing());
        assert!(!SignalState::Yellow.permits_crossing());
        assert!(!SignalState::Red.permits_crossing());
    }

    #[test]
    fn parse_signal_states() {
        assert_eq!("green".parse::<SignalState>(), Ok(SignalState::Green));
        assert_eq!(" YELLOW ".parse::<SignalState>(), Ok(SignalState::Yellow));
        assert!("blue".parse::<SignalState>().is_err());
    }

    #[test]
    fn deserializes_from_toml_table() {
        let signals: SignalMap = toml::from_str("North = \"GREEN\"\nSouth = \"RED\"").unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals.state_for("North"), SignalState::Green);
    }
}
