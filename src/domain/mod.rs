// Domain layer - Core types, policies and errors

pub mod errors;
pub mod model;
pub mod rules;
