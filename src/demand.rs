//! Turns raw weekly demand into probabilities and priority classes.

use crate::error::CatalogError;
use crate::types::{FabricSize, PriorityClass};

/// Returns a copy of `sizes` with `probability = weekly_demand / total demand`
/// filled in, or zero everywhere when nothing is demanded. Input order is kept.
pub fn normalize(sizes: &[FabricSize]) -> Result<Vec<FabricSize>, CatalogError> {
    for (index, s) in sizes.iter().enumerate() {
        if s.size.is_nan() || s.size <= 0.0 || s.size.is_infinite() {
            return Err(CatalogError::InvalidCatalogEntry {
                index,
                size: s.size,
            });
        }
    }

    let total: u64 = sizes.iter().map(|s| s.weekly_demand as u64).sum();
    Ok(sizes
        .iter()
        .map(|s| FabricSize {
            probability: if total > 0 {
                s.weekly_demand as f64 / total as f64
            } else {
                0.0
            },
            ..*s
        })
        .collect())
}

pub fn classify(probability: f64, threshold: f64) -> PriorityClass {
    if probability >= threshold {
        PriorityClass::Priority
    } else {
        PriorityClass::Optional
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PRIORITY_THRESHOLD;
    use crate::types::default_fabric_sizes;

    #[test]
    fn test_probabilities_sum_to_one() {
        let sizes = normalize(&default_fabric_sizes()).unwrap();
        let sum: f64 = sizes.iter().map(|s| s.probability).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!((sizes[0].probability - 10.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_demand_is_all_optional() {
        let sizes = normalize(&[FabricSize::new(2.0, 0), FabricSize::new(3.0, 0)]).unwrap();
        assert!(sizes.iter().all(|s| s.probability == 0.0));
        assert!(
            sizes
                .iter()
                .all(|s| s.class(PRIORITY_THRESHOLD) == PriorityClass::Optional)
        );
    }

    #[test]
    fn test_order_preserved_and_input_untouched() {
        let input = vec![FabricSize::new(1.0, 1), FabricSize::new(5.0, 3)];
        let out = normalize(&input).unwrap();
        assert_eq!(out[0].size, 1.0);
        assert_eq!(out[1].size, 5.0);
        assert_eq!(input[0].probability, 0.0);
    }

    #[test]
    fn test_stale_probability_is_recomputed() {
        let mut input = normalize(&default_fabric_sizes()).unwrap();
        input[0].weekly_demand = 0;
        let out = normalize(&input).unwrap();
        assert_eq!(out[0].probability, 0.0);
        assert!((out[1].probability - 7.0 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_classes() {
        let sizes = normalize(&default_fabric_sizes()).unwrap();
        let classes: Vec<PriorityClass> =
            sizes.iter().map(|s| s.class(PRIORITY_THRESHOLD)).collect();
        assert_eq!(
            classes,
            vec![
                PriorityClass::Priority,
                PriorityClass::Priority,
                PriorityClass::Priority,
                PriorityClass::Optional,
                PriorityClass::Optional,
                PriorityClass::Optional,
            ]
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(classify(0.15, 0.15), PriorityClass::Priority);
        assert_eq!(classify(0.1499, 0.15), PriorityClass::Optional);
    }

    #[test]
    fn test_rejects_non_positive_size() {
        let err = normalize(&[FabricSize::new(2.0, 1), FabricSize::new(0.0, 4)]).unwrap_err();
        assert_eq!(err, CatalogError::InvalidCatalogEntry { index: 1, size: 0.0 });
        assert!(normalize(&[FabricSize::new(-1.0, 1)]).is_err());
        assert!(normalize(&[FabricSize::new(f64::NAN, 1)]).is_err());
    }

    #[test]
    fn test_empty_catalogue() {
        assert!(normalize(&[]).unwrap().is_empty());
    }
}
