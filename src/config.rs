//! Tuning constants for the cut search.
//!
//! The proportional windows are empirically tuned, so they live in a plain
//! value that tests and callers can override.

/// Demand share at or above which a size counts as priority.
pub const PRIORITY_THRESHOLD: f64 = 0.15;

/// Lengths within this distance (m) of each other are considered equal.
pub const LENGTH_TOLERANCE: f64 = 0.001;

/// Rough average piece length (m) used to estimate how many pieces a roll yields.
pub const AVERAGE_PIECE_LENGTH: f64 = 2.5;

/// How far (in pieces) the search strays from a priority size's preferred count
/// before falling back to the full range.
pub const PRIORITY_SPREAD: u32 = 3;

/// Multiplier on an optional size's demand share when bounding its count.
pub const OPTIONAL_DEMAND_FACTOR: f64 = 2.0;

/// Pieces at or below this length (m) are capped at `SMALL_PIECE_CAP`.
pub const SMALL_PIECE_LENGTH: f64 = 1.5;
pub const SMALL_PIECE_CAP: u32 = 3;

/// Above this many optional (or priority) sizes the subset enumeration is
/// skipped.
pub const MAX_OPTIONAL_SIZES: usize = 16;

/// Longest roll, in millimetres, for which exact reachability is tabulated.
pub const REACHABILITY_LIMIT_MM: usize = 1_000_000;

/// Fabric width ("panna") in centimetres reported when the caller gives none.
pub const DEFAULT_FABRIC_WIDTH_CM: u32 = 97;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    pub priority_threshold: f64,
    pub tolerance: f64,
    pub average_piece_length: f64,
    pub priority_spread: u32,
    pub optional_demand_factor: f64,
    pub small_piece_length: f64,
    pub small_piece_cap: u32,
    pub max_optional_sizes: usize,
    pub reachability_limit_mm: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            priority_threshold: PRIORITY_THRESHOLD,
            tolerance: LENGTH_TOLERANCE,
            average_piece_length: AVERAGE_PIECE_LENGTH,
            priority_spread: PRIORITY_SPREAD,
            optional_demand_factor: OPTIONAL_DEMAND_FACTOR,
            small_piece_length: SMALL_PIECE_LENGTH,
            small_piece_cap: SMALL_PIECE_CAP,
            max_optional_sizes: MAX_OPTIONAL_SIZES,
            reachability_limit_mm: REACHABILITY_LIMIT_MM,
        }
    }
}
