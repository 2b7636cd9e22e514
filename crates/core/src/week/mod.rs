//! Week board state
//!
//! Client-side projection of one Monday-start week: seven day columns and
//! the pure transitions applied to them ahead of server confirmation.

mod data;
mod model;

pub use data::WeekData;
pub use model::*;
