/// World-space size of one zoning cell. Lot sizes are expressed in cells.
pub const CELL_SIZE: f32 = 8.0;
pub const HALF_CELL: f32 = CELL_SIZE * 0.5;

/// World bounds covered by the spatial indexes. Entries outside still work,
/// they just land in the root node.
pub const WORLD_MIN: f32 = -8192.0;
pub const WORLD_MAX: f32 = 8192.0;

// ---------------------------------------------------------------------------
// Snap levels (categorical part of `SnapPriority`)
// ---------------------------------------------------------------------------

pub const SNAP_LEVEL_NONE: f32 = 0.0;
pub const SNAP_LEVEL_ROAD_SIDE: f32 = 1.0;
pub const SNAP_LEVEL_ZONE_SIDE: f32 = 2.0;
pub const SNAP_LEVEL_PARCEL_EDGE: f32 = 3.0;
pub const SNAP_LEVEL_FRONT_ALIGN: f32 = 4.0;

// ---------------------------------------------------------------------------
// Zone-Side
// ---------------------------------------------------------------------------

/// Maximum distance between the search line and a block front edge.
pub const ZONE_SEARCH_DISTANCE: f32 = CELL_SIZE;

/// Extra reach added to both ends of the zone search line.
pub const ZONE_SEARCH_PAD: f32 = CELL_SIZE;

/// Largest bonus (in world units) awarded to an exact overlap at the
/// midpoint of the search line.
pub const ZONE_CENTER_BONUS: f32 = 0.1;

// ---------------------------------------------------------------------------
// Road-Side
// ---------------------------------------------------------------------------

/// Fixed pad added to half the lot depth to size the road search radius.
pub const ROAD_SEARCH_PAD: f32 = 16.0;

/// Node geometry segments at or below this length are ignored.
pub const MIN_NODE_CURVE_LENGTH: f32 = 1.0;

/// Number of curve slots gathered per matched edge.
pub const MAX_SNAP_CURVES: usize = 16;

// ---------------------------------------------------------------------------
// Parcel-Edge / Front-Align
// ---------------------------------------------------------------------------

/// Tolerance on the direction dot product when classifying relative facing.
pub const RELATION_TOLERANCE: f32 = 1e-3;

/// Corner-lock candidates further than this from the hit point are ignored.
pub const FRONT_ALIGN_RADIUS: f32 = CELL_SIZE * 2.0;

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Maximum terrain height in world units. Noise [0,1] maps to [0, TERRAIN_HEIGHT_SCALE].
pub const TERRAIN_HEIGHT_SCALE: f32 = 40.0;
pub const TERRAIN_BASE_FREQUENCY: f32 = 0.008;
pub const WATER_THRESHOLD: f32 = 0.35;

/// World-space Y of the water surface. Sampling never returns less than this
/// over water.
pub const WATER_LEVEL_Y: f32 = WATER_THRESHOLD * TERRAIN_HEIGHT_SCALE;
