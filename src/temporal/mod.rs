//! Temporal values: partial points, calendar arithmetic, word conversions
//! and the resolution of relative expressions.

pub mod calendar;
pub mod point;
pub mod prenormalise;
pub mod reference;
pub mod resolve;
pub mod unit;
pub mod words;

// Re-export the types most callers need
pub use point::{Component, PointError, TimePoint};
pub use prenormalise::{PreNormalised, duration_value, prenormalise};
pub use reference::{Anchoring, ReferenceTracker};
pub use resolve::{PointClass, PreNormal, resolve};
pub use unit::{Unit, split_fractional};
