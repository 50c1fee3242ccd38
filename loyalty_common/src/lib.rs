mod helpers;
mod points;

pub mod op;
mod secret;

pub use helpers::parse_boolean_flag;
pub use points::{Points, PointsConversionError};
pub use secret::Secret;
