use super::geometry::ApproachId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

/// Closed catalog of road users. `Generic` absorbs every label the catalog
/// does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum VehicleClass {
    Car,
    Bus,
    TwoWheeler,
    AutoRickshaw,
    Ambulance,
    FireEngine,
    PoliceVehicle,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub width: f32,
    pub length: f32,
}

impl Footprint {
    pub const DEFAULT: Footprint = Footprint { width: 20.0, length: 36.0 };

    pub fn half_length(&self) -> f32 {
        self.length / 2.0
    }
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 7] = [
        VehicleClass::Ambulance,
        VehicleClass::FireEngine,
        VehicleClass::Car,
        VehicleClass::Bus,
        VehicleClass::PoliceVehicle,
        VehicleClass::AutoRickshaw,
        VehicleClass::TwoWheeler,
    ];

    /// Lenient label lookup: case, spaces, dashes and underscores are ignored
    /// and a trailing plural `s` is accepted.
    pub fn from_label(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let key = key.strip_suffix('s').filter(|k| !k.ends_with('u')).unwrap_or(&key);

        match key {
            "car" => VehicleClass::Car,
            "bus" | "buse" => VehicleClass::Bus,
            "twowheeler" | "bike" | "motorcycle" => VehicleClass::TwoWheeler,
            "autorickshaw" | "autorikshaw" | "rickshaw" | "auto" => VehicleClass::AutoRickshaw,
            "ambulance" => VehicleClass::Ambulance,
            "fireengine" | "firetruck" => VehicleClass::FireEngine,
            "policevehicle" | "police" | "policecar" => VehicleClass::PoliceVehicle,
            _ => {
                log::debug!("Unknown vehicle class '{}', using generic footprint", label);
                VehicleClass::Generic
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Bus => "bus",
            VehicleClass::TwoWheeler => "two-wheeler",
            VehicleClass::AutoRickshaw => "auto-rickshaw",
            VehicleClass::Ambulance => "ambulance",
            VehicleClass::FireEngine => "fire-engine",
            VehicleClass::PoliceVehicle => "police-vehicle",
            VehicleClass::Generic => "generic",
        }
    }

    pub fn footprint(self) -> Footprint {
        let (width, length) = match self {
            VehicleClass::Car => (20.0, 36.0),
            VehicleClass::Bus => (26.0, 70.0),
            VehicleClass::TwoWheeler => (10.0, 20.0),
            VehicleClass::AutoRickshaw => (16.0, 26.0),
            VehicleClass::Ambulance => (22.0, 44.0),
            VehicleClass::FireEngine => (26.0, 64.0),
            VehicleClass::PoliceVehicle => (20.0, 38.0),
            VehicleClass::Generic => return Footprint::DEFAULT,
        };
        Footprint { width, length }
    }

    /// Emergency priority used by phase schedulers; 0 for ordinary traffic.
    pub fn priority(self) -> u8 {
        match self {
            VehicleClass::Ambulance => 5,
            VehicleClass::FireEngine => 3,
            _ => 0,
        }
    }

    pub fn is_emergency(self) -> bool {
        self.priority() > 0
    }
}

impl From<String> for VehicleClass {
    fn from(label: String) -> Self {
        VehicleClass::from_label(&label)
    }
}

impl From<VehicleClass> for String {
    fn from(class: VehicleClass) -> String {
        class.label().to_string()
    }
}

/// One simulated road user. Fields are public for the engines; renderers
/// read them and never write.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub approach: ApproachId,
    pub progress: f32,
    pub velocity: f32,
    pub acceleration: f32,
    pub footprint: Footprint,
    pub has_crossed_stop_line: bool,
    /// Completed trips through the scene.
    pub passes: u32,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        class: VehicleClass,
        approach: ApproachId,
        progress: f32,
        velocity: f32,
    ) -> Self {
        Self {
            id,
            class,
            approach,
            progress,
            velocity,
            acceleration: 0.0,
            footprint: class.footprint(),
            has_crossed_stop_line: false,
            passes: 0,
        }
    }

    pub fn front(&self) -> f32 {
        self.progress + self.footprint.half_length()
    }

    pub fn is_visible(&self) -> bool {
        self.progress >= 0.0
    }
}
