use super::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use thiserror::Error;

/// Half of the paved width of the crossing road, measured from the junction centre.
pub const ROAD_HALF_WIDTH: f32 = 60.0;
/// Distance between the stop line and the edge of the crossing road.
pub const STOP_LINE_SETBACK: f32 = 12.0;
/// Perpendicular offset that keeps opposing traffic apart.
pub const LANE_OFFSET: f32 = 22.0;

pub const ROUNDABOUT_ARMS: usize = 5;
/// Yield boundary position as a fraction of an arm's far distance.
pub const YIELD_FRACTION: f32 = 0.65;
/// Ring radius as a fraction of the smaller viewport dimension.
pub const RING_RADIUS_FRACTION: f32 = 0.12;

const ROAD_LABELS: [&str; 5] = ["North", "South", "East", "West", "Southwest"];

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(900.0, 700.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseTopologyError {
    #[error("unknown intersection type {0}, expected 1-5")]
    UnknownId(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Topology {
    OneWay,
    TwoWay,
    ThreeWay,
    FourWay,
    Roundabout,
}

impl TryFrom<u8> for Topology {
    type Error = ParseTopologyError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Topology::OneWay),
            2 => Ok(Topology::TwoWay),
            3 => Ok(Topology::ThreeWay),
            4 => Ok(Topology::FourWay),
            5 => Ok(Topology::Roundabout),
            other => Err(ParseTopologyError::UnknownId(other)),
        }
    }
}

impl From<Topology> for u8 {
    fn from(topology: Topology) -> u8 {
        topology.id()
    }
}

impl Topology {
    pub const ALL: [Topology; 5] = [
        Topology::OneWay,
        Topology::TwoWay,
        Topology::ThreeWay,
        Topology::FourWay,
        Topology::Roundabout,
    ];

    /// Resolves an id, falling back to the 4-way crossroad for anything unknown.
    pub fn from_id_or_default(id: u8) -> Self {
        Topology::try_from(id).unwrap_or_else(|err| {
            log::warn!("{}, using 4-way crossroad", err);
            Topology::FourWay
        })
    }

    pub fn id(self) -> u8 {
        match self {
            Topology::OneWay => 1,
            Topology::TwoWay => 2,
            Topology::ThreeWay => 3,
            Topology::FourWay => 4,
            Topology::Roundabout => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Topology::OneWay => "1-Way Signal",
            Topology::TwoWay => "2-Way Signal",
            Topology::ThreeWay => "3-Way Signal",
            Topology::FourWay => "4-Way Signal",
            Topology::Roundabout => "5-Way Roundabout",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Topology::OneWay => "Single road with one signal controlling flow",
            Topology::TwoWay => "Two opposing roads with alternating signals",
            Topology::ThreeWay => "T-intersection with three-phase signal cycle",
            Topology::FourWay => "Standard crossroad with four-phase signal cycle",
            Topology::Roundabout => "Roundabout with five entry points and yield signals",
        }
    }

    pub fn road_count(self) -> usize {
        self.id() as usize
    }

    /// Default road labels, one per approach.
    pub fn road_labels(self) -> Vec<String> {
        ROAD_LABELS[..self.road_count()]
            .iter()
            .map(|label| label.to_string())
            .collect()
    }

    pub fn layout(self) -> Layout {
        match self {
            Topology::Roundabout => Layout::Roundabout,
            _ => Layout::Regular,
        }
    }
}

/// Topology discriminator carried by the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Regular,
    Roundabout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Loose lookup by road label; `None` for labels that are not cardinal.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "south" | "s" => Some(Direction::South),
            "east" | "e" => Some(Direction::East),
            "west" | "w" => Some(Direction::West),
            _ => None,
        }
    }

    /// Unit vector of travel toward the junction (screen coordinates, y down).
    pub fn heading(self) -> Vec2 {
        match self {
            Direction::North => Vec2::new(0.0, 1.0),
            Direction::South => Vec2::new(0.0, -1.0),
            Direction::East => Vec2::new(-1.0, 0.0),
            Direction::West => Vec2::new(1.0, 0.0),
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }
}

/// The approach set of a topology.
#[derive(Debug, Clone, PartialEq)]
pub enum Approaches {
    Linear(Vec<Direction>),
    /// Roundabout sentinel carrying the arm count.
    Radial(usize),
}

pub fn approaches_for(topology: Topology) -> Approaches {
    use Direction::*;
    match topology {
        Topology::OneWay => Approaches::Linear(vec![North]),
        Topology::TwoWay => Approaches::Linear(vec![North, South]),
        Topology::ThreeWay => Approaches::Linear(vec![North, South, East]),
        Topology::FourWay => Approaches::Linear(vec![North, South, East, West]),
        Topology::Roundabout => Approaches::Radial(ROUNDABOUT_ARMS),
    }
}

/// Distance from the spawn origin to the stop line.
pub fn stop_line_offset(direction: Direction, width: f32, height: f32) -> f32 {
    let half_extent = if direction.is_vertical() { height } else { width } / 2.0;
    (half_extent - ROAD_HALF_WIDTH - STOP_LINE_SETBACK).max(0.0)
}

/// Length of an approach from the spawn origin to the opposite viewport edge.
pub fn travel_length(direction: Direction, width: f32, height: f32) -> f32 {
    if direction.is_vertical() {
        height.max(0.0)
    } else {
        width.max(0.0)
    }
}

pub fn lane_offset(direction: Direction) -> Vec2 {
    perpendicular(direction.heading()) * LANE_OFFSET
}

pub fn spawn_origin(direction: Direction, width: f32, height: f32) -> Point {
    match direction {
        Direction::North => Point::new(width / 2.0, 0.0),
        Direction::South => Point::new(width / 2.0, height),
        Direction::East => Point::new(width, height / 2.0),
        Direction::West => Point::new(0.0, height / 2.0),
    }
}

/// Outward angle of a roundabout arm; arm 0 points up.
pub fn arm_angle(arm: usize) -> f32 {
    -PI / 2.0 + arm as f32 * (2.0 * PI / ROUNDABOUT_ARMS as f32)
}

/// Distance from the viewport centre to its edge along an arm.
pub fn arm_far_distance(arm: usize, width: f32, height: f32) -> f32 {
    let angle = arm_angle(arm);
    let (dx, dy) = (angle.cos().abs(), angle.sin().abs());
    let tx = if dx > 1e-6 { (width / 2.0) / dx } else { f32::INFINITY };
    let ty = if dy > 1e-6 { (height / 2.0) / dy } else { f32::INFINITY };
    tx.min(ty).max(0.0)
}

/// Progress at which an arm's vehicles yield to the ring.
pub fn yield_offset(arm: usize, width: f32, height: f32) -> f32 {
    arm_far_distance(arm, width, height) * YIELD_FRACTION
}

pub fn ring_radius(width: f32, height: f32) -> f32 {
    width.min(height).max(0.0) * RING_RADIUS_FRACTION
}

fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApproachId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApproachKind {
    Lane(Direction),
    Arm(usize),
}

/// One resolved approach: a road label plus everything needed to turn
/// scalar progress into a place on screen.
#[derive(Debug, Clone)]
pub struct Approach {
    pub id: ApproachId,
    pub road: String,
    pub kind: ApproachKind,
    pub origin: Point,
    pub heading: Vec2,
    pub lane_offset: Vec2,
    /// Stop line for lanes, yield boundary for roundabout arms.
    pub stop_line: f32,
    /// Progress past which a vehicle has left the scene.
    pub travel_length: f32,
}

impl Approach {
    pub fn position_at(&self, progress: f32) -> Point {
        self.origin + self.heading * progress + self.lane_offset
    }
}

/// Resolves the approaches of `topology`, pairing them with `roads` in order.
/// Surplus road labels are dropped; missing ones fall back to the defaults.
pub fn resolve_approaches(
    topology: Topology,
    roads: &[String],
    viewport: Viewport,
) -> Vec<Approach> {
    let Viewport { width, height } = viewport;
    let defaults = topology.road_labels();

    let kinds: Vec<ApproachKind> = match approaches_for(topology) {
        Approaches::Linear(directions) => directions.into_iter().map(ApproachKind::Lane).collect(),
        Approaches::Radial(arms) => (0..arms).map(ApproachKind::Arm).collect(),
    };

    if roads.len() > kinds.len() {
        log::warn!(
            "{} has {} approaches, ignoring roads {:?}",
            topology.name(),
            kinds.len(),
            &roads[kinds.len()..]
        );
    }

    kinds
        .into_iter()
        .enumerate()
        .map(|(index, kind)| {
            let road = roads
                .get(index)
                .or_else(|| defaults.get(index))
                .cloned()
                .unwrap_or_else(|| format!("Road {}", index + 1));

            match kind {
                ApproachKind::Lane(direction) => Approach {
                    id: ApproachId(index),
                    road,
                    kind,
                    origin: spawn_origin(direction, width, height),
                    heading: direction.heading(),
                    lane_offset: lane_offset(direction),
                    stop_line: stop_line_offset(direction, width, height),
                    travel_length: travel_length(direction, width, height),
                },
                ApproachKind::Arm(arm) => {
                    let far = arm_far_distance(arm, width, height);
                    let angle = arm_angle(arm);
                    let outward = Vec2::new(angle.cos(), angle.sin());
                    let heading = -outward;
                    Approach {
                        id: ApproachId(index),
                        road,
                        kind,
                        origin: viewport.center() + outward * far,
                        heading,
                        lane_offset: perpendicular(heading) * LANE_OFFSET,
                        stop_line: yield_offset(arm, width, height),
                        // In through the ring and out along the far side.
                        travel_length: 2.0 * far,
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_sets_per_topology() {
        assert_eq!(approaches_for(Topology::OneWay), Approaches::Linear(vec![Direction::North]));
        assert_eq!(
            approaches_for(Topology::ThreeWay),
            Approaches::Linear(vec![Direction::North, Direction::South, Direction::East])
        );
        assert_eq!(approaches_for(Topology::Roundabout), Approaches::Radial(5));
    }

    #[test]
    fn unknown_topology_falls_back_to_crossroad() {
        assert_eq!(Topology::try_from(9), Err(ParseTopologyError::UnknownId(9)));
        assert_eq!(Topology::from_id_or_default(0), Topology::FourWay);
        assert_eq!(Topology::from_id_or_default(5), Topology::Roundabout);
    }

    #[test]
    fn stop_line_sits_before_the_crossing_road() {
        let stop = stop_line_offset(Direction::North, 900.0, 700.0);
        assert_eq!(stop, 350.0 - ROAD_HALF_WIDTH - STOP_LINE_SETBACK);
        assert!(stop < travel_length(Direction::North, 900.0, 700.0) / 2.0);

        let stop = stop_line_offset(Direction::East, 900.0, 700.0);
        assert_eq!(stop, 450.0 - ROAD_HALF_WIDTH - STOP_LINE_SETBACK);

        // Tiny viewports never produce a negative offset.
        assert_eq!(stop_line_offset(Direction::West, 20.0, 20.0), 0.0);
    }

    #[test]
    fn opposing_lanes_are_separated() {
        let north = spawn_origin(Direction::North, 900.0, 700.0) + lane_offset(Direction::North);
        let south = spawn_origin(Direction::South, 900.0, 700.0) + lane_offset(Direction::South);
        assert!((north.x - south.x).abs() >= 2.0 * LANE_OFFSET - 1e-3);
    }

    #[test]
    fn progress_maps_onto_the_viewport() {
        let roads = Topology::FourWay.road_labels();
        let approaches = resolve_approaches(Topology::FourWay, &roads, Viewport::default());
        let west = approaches.iter().find(|a| a.road == "West").unwrap();
        let end = west.position_at(west.travel_length);
        assert!((end.x - 900.0).abs() < 1e-3);
    }

    #[test]
    fn roundabout_arms_yield_outside_the_ring() {
        let viewport = Viewport::new(800.0, 800.0);
        let approaches = resolve_approaches(Topology::Roundabout, &[], viewport);
        assert_eq!(approaches.len(), 5);
        assert_eq!(approaches[4].road, "Southwest");

        let ring = ring_radius(viewport.width, viewport.height);
        for approach in &approaches {
            let far = approach.travel_length / 2.0;
            assert!(
                far - approach.stop_line > ring,
                "arm {:?} yields inside the ring",
                approach.kind
            );
            let centre = approach.position_at(far) - approach.lane_offset;
            assert!((centre - viewport.center()).norm() < 1e-2);
        }
    }

    #[test]
    fn surplus_roads_are_ignored() {
        let roads: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let approaches = resolve_approaches(Topology::TwoWay, &roads, Viewport::default());
        assert_eq!(approaches.len(), 2);
        assert_eq!(approaches[1].road, "B");
    }
}
