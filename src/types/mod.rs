mod models;
mod tier;

pub use models::*;
pub use tier::{Feature, Template, Tier};
