use thiserror::Error;

/// Rejections raised while reading a fabric catalogue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("invalid catalog entry {index}: size must be a positive length, got {size}")]
    InvalidCatalogEntry { index: usize, size: f64 },
}
