// Domain layer - Core analysis types and scoring rules

pub mod errors;
pub mod model;
pub mod rules;
