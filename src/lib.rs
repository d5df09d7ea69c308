pub mod config;
pub mod demand;
pub mod error;
pub mod render;
pub mod solver;
pub mod types;

pub use error::CatalogError;
pub use solver::{calculate_optimal_cuts, calculate_optimal_cuts_with};
