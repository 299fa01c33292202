//! Die type catalog
//!
//! Each die type knows its side count, its collision shape and, when its value
//! can be read from orientation, a fixed table of local-space face normals.

use std::sync::LazyLock;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Golden ratio, used by the d12 and d20 tables
const PHI: f32 = 1.618_034;

/// Polyhedron class of a die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DieType {
    Coin,
    D3,
    D4,
    D5,
    D6,
    D8,
    D10,
    D12,
    D20,
    /// Logical d100, realised as a tens die plus a ones die
    Percentile,
    PercentileTens,
    PercentileOnes,
}

impl DieType {
    /// Types offered by the selection panel, in display order
    pub const SELECTABLE: [DieType; 10] = [
        DieType::Coin,
        DieType::D3,
        DieType::D4,
        DieType::D5,
        DieType::D6,
        DieType::D8,
        DieType::D10,
        DieType::D12,
        DieType::D20,
        DieType::Percentile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DieType::Coin => "d2",
            DieType::D3 => "d3",
            DieType::D4 => "d4",
            DieType::D5 => "d5",
            DieType::D6 => "d6",
            DieType::D8 => "d8",
            DieType::D10 => "d10",
            DieType::D12 => "d12",
            DieType::D20 => "d20",
            DieType::Percentile => "d100",
            DieType::PercentileTens => "d10-tens",
            DieType::PercentileOnes => "d10-ones",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "d2" | "coin" => Some(DieType::Coin),
            "d3" => Some(DieType::D3),
            "d4" => Some(DieType::D4),
            "d5" => Some(DieType::D5),
            "d6" => Some(DieType::D6),
            "d8" => Some(DieType::D8),
            "d10" => Some(DieType::D10),
            "d12" => Some(DieType::D12),
            "d20" => Some(DieType::D20),
            "d100" | "d%" => Some(DieType::Percentile),
            "d10-tens" => Some(DieType::PercentileTens),
            "d10-ones" => Some(DieType::PercentileOnes),
            _ => None,
        }
    }

    /// Parse an identifier, treating anything unknown as a d6
    pub fn from_id_or_default(id: &str) -> Self {
        Self::from_id(id).unwrap_or_else(|| {
            log::warn!("Unknown die type {:?}, rolling a d6 instead", id);
            DieType::D6
        })
    }

    /// Nominal number of outcomes
    pub fn sides(&self) -> u32 {
        match self {
            DieType::Coin => 2,
            DieType::D3 => 3,
            DieType::D4 => 4,
            DieType::D5 => 5,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 | DieType::PercentileTens | DieType::PercentileOnes => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::Percentile => 100,
        }
    }

    /// Collision shape of one physical body of this type
    pub fn shape(&self) -> Shape {
        match self {
            DieType::Coin => Shape::Cylinder {
                radius: 0.6,
                height: 0.12,
                segments: 12,
            },
            DieType::D3 => Shape::Cylinder {
                radius: 0.5,
                height: 1.5,
                segments: 3,
            },
            DieType::D4 => Shape::Sphere { radius: 0.5 },
            DieType::D6 => Shape::Box {
                half_extents: Vec3::splat(0.6),
            },
            DieType::D8 => Shape::Sphere { radius: 0.55 },
            DieType::D5
            | DieType::D10
            | DieType::D12
            | DieType::D20
            | DieType::Percentile
            | DieType::PercentileTens
            | DieType::PercentileOnes => Shape::Sphere { radius: 0.6 },
        }
    }

    /// Face-normal table, if this type has one. Table order breaks ties.
    pub fn face_table(&self) -> Option<&'static [FaceNormal]> {
        match self {
            DieType::D4 => Some(D4_FACES.as_slice()),
            DieType::D6 => Some(D6_FACES.as_slice()),
            DieType::D8 => Some(D8_FACES.as_slice()),
            DieType::D10 => Some(D10_FACES.as_slice()),
            DieType::D12 => Some(D12_FACES.as_slice()),
            DieType::D20 => Some(D20_FACES.as_slice()),
            _ => None,
        }
    }

    /// True for the sub-dice of a compound roll
    pub fn is_compound_member(&self) -> bool {
        matches!(self, DieType::PercentileTens | DieType::PercentileOnes)
    }
}

impl std::fmt::Display for DieType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collision shape descriptor, in the body's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Prism around the local Y axis; `segments` vertices per cap
    Cylinder { radius: f32, height: f32, segments: u32 },
}

impl Shape {
    /// Vertices of the convex hull in the local frame: box corners or prism
    /// rim vertices. Spheres have none.
    pub fn hull_points(&self) -> Vec<Vec3> {
        match *self {
            Shape::Box { half_extents: h } => {
                let mut corners = Vec::with_capacity(8);
                for sx in [-1.0, 1.0] {
                    for sy in [-1.0, 1.0] {
                        for sz in [-1.0, 1.0] {
                            corners.push(Vec3::new(sx * h.x, sy * h.y, sz * h.z));
                        }
                    }
                }
                corners
            }
            Shape::Sphere { .. } => Vec::new(),
            Shape::Cylinder {
                radius,
                height,
                segments,
            } => {
                let segments = segments.max(3);
                let half_h = height / 2.0;
                let mut rim = Vec::with_capacity(segments as usize * 2);
                for i in 0..segments {
                    let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
                    let (s, c) = theta.sin_cos();
                    rim.push(Vec3::new(c * radius, half_h, s * radius));
                    rim.push(Vec3::new(c * radius, -half_h, s * radius));
                }
                rim
            }
        }
    }
}

/// One entry of a face-normal table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceNormal {
    /// Outward unit normal in the die's local frame
    pub normal: Vec3,
    pub value: u32,
}

impl FaceNormal {
    fn new(normal: Vec3, value: u32) -> Self {
        Self {
            normal: normal.normalize(),
            value,
        }
    }
}

/// Build a table where each listed face gets values 1, 2, .. and its opposite
/// face gets the complement, so opposite faces sum to `sides + 1`
fn opposed_faces(half: &[Vec3]) -> Vec<FaceNormal> {
    let sides = half.len() as u32 * 2;
    let mut faces = Vec::with_capacity(sides as usize);
    for (i, &n) in half.iter().enumerate() {
        let value = i as u32 + 1;
        faces.push(FaceNormal::new(n, value));
        faces.push(FaceNormal::new(-n, sides + 1 - value));
    }
    faces
}

static D4_FACES: LazyLock<Vec<FaceNormal>> = LazyLock::new(|| {
    vec![
        FaceNormal::new(Vec3::new(0.0, 1.0, 0.0), 1),
        FaceNormal::new(Vec3::new(0.94, -0.33, 0.0), 2),
        FaceNormal::new(Vec3::new(-0.47, -0.33, 0.82), 3),
        FaceNormal::new(Vec3::new(-0.47, -0.33, -0.82), 4),
    ]
});

static D6_FACES: LazyLock<Vec<FaceNormal>> = LazyLock::new(|| {
    vec![
        FaceNormal::new(Vec3::Y, 1),
        FaceNormal::new(Vec3::NEG_Y, 6),
        FaceNormal::new(Vec3::X, 2),
        FaceNormal::new(Vec3::NEG_X, 5),
        FaceNormal::new(Vec3::Z, 3),
        FaceNormal::new(Vec3::NEG_Z, 4),
    ]
});

static D8_FACES: LazyLock<Vec<FaceNormal>> = LazyLock::new(|| {
    opposed_faces(&[
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
    ])
});

/// Pentagonal trapezohedron: five upper kite faces, the lower five are their opposites
static D10_FACES: LazyLock<Vec<FaceNormal>> = LazyLock::new(|| {
    let elevation: f32 = 0.45;
    let ring = (1.0 - elevation * elevation).sqrt();
    let upper: Vec<Vec3> = (0..5)
        .map(|i| {
            let theta = i as f32 * std::f32::consts::TAU / 5.0;
            Vec3::new(theta.cos() * ring, elevation, theta.sin() * ring)
        })
        .collect();
    opposed_faces(&upper)
});

/// Dodecahedron face normals point at the vertices of an icosahedron
static D12_FACES: LazyLock<Vec<FaceNormal>> = LazyLock::new(|| {
    opposed_faces(&[
        Vec3::new(0.0, 1.0, PHI),
        Vec3::new(0.0, 1.0, -PHI),
        Vec3::new(1.0, PHI, 0.0),
        Vec3::new(-1.0, PHI, 0.0),
        Vec3::new(PHI, 0.0, 1.0),
        Vec3::new(-PHI, 0.0, 1.0),
    ])
});

/// Icosahedron face normals point at the vertices of a dodecahedron
static D20_FACES: LazyLock<Vec<FaceNormal>> = LazyLock::new(|| {
    let inv = 1.0 / PHI;
    opposed_faces(&[
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(0.0, inv, PHI),
        Vec3::new(0.0, inv, -PHI),
        Vec3::new(inv, PHI, 0.0),
        Vec3::new(-inv, PHI, 0.0),
        Vec3::new(PHI, 0.0, inv),
        Vec3::new(-PHI, 0.0, inv),
    ])
});
