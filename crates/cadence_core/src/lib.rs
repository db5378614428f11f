//! Cadence Core
//!
//! Foundational types shared by the Cadence crates:
//!
//! - **Geometry**: [`Point`], [`Size`], [`Rect`]
//! - **Views**: [`View`] and its shared handle [`ViewRef`], the owner objects
//!   animations are keyed on and act upon

pub mod geometry;
pub mod view;

pub use geometry::{Point, Rect, Size};
pub use view::{View, ViewId, ViewRef};
