//! A .bvh (Biovision Hierarchy) parser with forward kinematics.
//!
//! ```no_run
//! let bvh = bvh_kinematics::load_bvh_from_file("walk.bvh")?;
//! for joint in bvh.joints() {
//!     println!("{} {:?}", joint.name(), joint.position(0));
//! }
//! # Ok::<(), bvh_kinematics::BvhError>(())
//! ```

pub mod error;
pub mod kinematics;
pub mod parse;
pub mod types;
pub mod utils;

pub use error::{BvhError, Result};
pub use kinematics::recalculate_transforms;
pub use parse::{
    load_bvh_from_file, load_bvh_from_reader, load_bvh_from_string, parse, parse_into,
    parse_with_config, ParserConfig,
};
pub use types::{Axis, Bvh, Channel, Index, Joint, Matrix, Position, Quaternion, END_SITE};
