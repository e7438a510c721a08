//! Scene components read by the snap resolver.
//!
//! Blocks, parcels and road network elements are plain entities. The resolver
//! never mutates them; it only reads their geometry through [`crate::lookup`].

use std::f32::consts::FRAC_1_SQRT_2;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::HALF_CELL;
use crate::footprint::lot_corners;
use crate::geometry::{left_of, Bezier, Bounds2, Line2};

// ---------------------------------------------------------------------------
// Zoning
// ---------------------------------------------------------------------------

/// Rectangular zoning block facing a road.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ZoneBlock {
    pub position: Vec3,
    /// Horizontal forward direction (towards the road).
    pub direction: Vec2,
    /// Width and depth in cells.
    pub size: IVec2,
}

impl ZoneBlock {
    pub fn half_extents(&self) -> Vec2 {
        self.size.as_vec2() * HALF_CELL
    }

    /// Front-left, front-right, back-right, back-left.
    pub fn corners(&self) -> [Vec2; 4] {
        lot_corners(self.position.xz(), self.direction, self.half_extents())
    }

    /// Front edge from the front-left to the front-right corner.
    pub fn front_edge(&self) -> Line2 {
        let [fl, fr, _, _] = self.corners();
        Line2::new(fl, fr)
    }

    pub fn bounds(&self) -> Bounds2 {
        Bounds2::from_points(&self.corners())
    }
}

/// Marks a block that a parcel already owns. Owned blocks never attract
/// zone-side snaps.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ParcelOwned;

/// Placed parcel. Position and rotation come from the entity `Transform`.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Parcel {
    pub lot_size: IVec2,
}

// ---------------------------------------------------------------------------
// Road network
// ---------------------------------------------------------------------------

/// Bitmask of network layers a composition occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetLayers(pub u32);

impl NetLayers {
    pub const NONE: Self = Self(0);
    pub const ROAD: Self = Self(1);
    pub const PATHWAY: Self = Self(1 << 1);
    pub const TRAM: Self = Self(1 << 2);
    pub const TRAIN: Self = Self(1 << 3);
    pub const WATERWAY: Self = Self(1 << 4);
    pub const ALL: Self = Self(u32::MAX);

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for NetLayers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Static properties of a road or node type.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct NetComposition {
    /// Full width of the carriageway.
    pub width: f32,
    /// Allowed curve height relative to the ground, `(min, max)`.
    pub height_range: Vec2,
    pub layers: NetLayers,
    /// Bridges and similar elements that ignore the vertical check.
    pub floating: bool,
}

impl NetComposition {
    pub fn road(width: f32) -> Self {
        Self {
            width,
            height_range: Vec2::new(-1.0, 1.0),
            layers: NetLayers::ROAD,
            floating: false,
        }
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct NetNode {
    pub position: Vec3,
}

/// Edges attached to a node, maintained by whoever builds the network.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ConnectedEdges(pub Vec<Entity>);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct NetEdge {
    pub start: Entity,
    pub end: Entity,
}

/// Centerline of an edge.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct NetCurve {
    pub bezier: Bezier,
}

/// Pair of parallel boundary curves. `length` holds the horizontal lengths
/// of `left` and `right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub left: Bezier,
    pub right: Bezier,
    pub length: Vec2,
}

impl Segment {
    pub fn new(left: Bezier, right: Bezier) -> Self {
        Self {
            left,
            right,
            length: Vec2::new(left.length_xz(), right.length_xz()),
        }
    }

    /// Degenerate segment collapsed onto a single point.
    pub fn point(at: Vec3) -> Self {
        Self::new(Bezier::line(at, at), Bezier::line(at, at))
    }

    pub fn bounds(&self) -> Bounds2 {
        self.left.bounds_xz().union(&self.right.bounds_xz())
    }
}

/// Side geometry of an edge, split into the half nearest the start node and
/// the half nearest the end node.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct EdgeGeometry {
    pub start: Segment,
    pub end: Segment,
}

impl EdgeGeometry {
    /// Straight edge of constant width.
    pub fn straight(from: Vec3, to: Vec3, half_width: f32) -> Self {
        let dir = (to - from).xz().normalize_or_zero();
        let l = left_of(dir) * half_width;
        let side = Vec3::new(l.x, 0.0, l.y);
        let mid = from.lerp(to, 0.5);
        Self {
            start: Segment::new(
                Bezier::line(from + side, mid + side),
                Bezier::line(from - side, mid - side),
            ),
            end: Segment::new(
                Bezier::line(mid + side, to + side),
                Bezier::line(mid - side, to - side),
            ),
        }
    }

    pub fn bounds(&self) -> Bounds2 {
        self.start.bounds().union(&self.end.bounds())
    }
}

/// Node-end geometry of an edge. At a dead end `left` and `right` trace the
/// rounded cap; at junctions they trace the corner fillets. `middle` is only
/// used where the node is not shared with other edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    pub left: Segment,
    pub right: Segment,
    pub middle: Segment,
}

impl NodeGeometry {
    /// Cap at an edge endpoint `point`. `edge_dir` is the direction of the
    /// whole edge (start to end); `at_end` selects which endpoint is capped.
    ///
    /// Both halves run from the edge sides towards the tip when capping the
    /// end node and from the tip back towards the sides at the start node,
    /// so a side curve's own left/right always matches its tag.
    pub fn dead_end(point: Vec3, edge_dir: Vec2, half_width: f32, at_end: bool) -> Self {
        let outward = if at_end { edge_dir } else { -edge_dir };
        let l = left_of(edge_dir);
        let lift = |v: Vec2| point + Vec3::new(v.x, 0.0, v.y) * half_width;

        let a = lift(l);
        let b = lift((l + outward) * FRAC_1_SQRT_2);
        let c = lift(outward);
        let d = lift((outward - l) * FRAC_1_SQRT_2);
        let e = lift(-l);

        let (left, right) = if at_end {
            (
                Segment::new(Bezier::line(a, b), Bezier::line(b, c)),
                Segment::new(Bezier::line(e, d), Bezier::line(d, c)),
            )
        } else {
            (
                Segment::new(Bezier::line(c, b), Bezier::line(b, a)),
                Segment::new(Bezier::line(c, d), Bezier::line(d, e)),
            )
        };
        Self {
            left,
            right,
            middle: Segment::point(c),
        }
    }

    /// Endpoint shared with other edges. Every segment collapses onto the
    /// node so only the edge's own sides attract snaps.
    pub fn junction(point: Vec3) -> Self {
        Self {
            left: Segment::point(point),
            right: Segment::point(point),
            middle: Segment::point(point),
        }
    }

    pub fn bounds(&self) -> Bounds2 {
        self.left
            .bounds()
            .union(&self.right.bounds())
            .union(&self.middle.bounds())
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct StartNodeGeometry(pub NodeGeometry);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct EndNodeGeometry(pub NodeGeometry);
