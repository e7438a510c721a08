//! Planar and curve geometry used by the snap generators.
//!
//! Everything here works in the horizontal XZ plane, with `Vec2` holding
//! `(x, z)`. Curves keep their full 3D control points so the road-side
//! vertical checks can read heights off the same data.

pub mod bezier;
pub mod bounds;
pub mod direction;
pub mod line;


pub use bezier::Bezier;
pub use bounds::Bounds2;
pub use direction::{
    direction_to_rotation, heading, left_of, relative_heading, right_angle_residual, right_of,
    rotate_direction, rotation_to_direction,
};
pub use line::Line2;
