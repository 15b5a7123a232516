//! Team Formation Engine (C3): composes a Team for a Task via one of the
//! enumerated strategies (CAPABILITY, PERFORMANCE, COST, SPECIALIZATION,
//! BALANCED, DIVERSITY), scores and ranks candidates, and writes results
//! back through the Entity Store.

pub mod diversity;
pub mod engine;
pub mod error;
pub mod strategy;

pub use engine::TeamFormationEngine;
pub use error::{Error, Result};
pub use strategy::{spec_match, FormationStrategy};
