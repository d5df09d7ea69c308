use serde::{Deserialize, Deserializer, Serialize};

/// Built-in catalogue: (size in metres, weekly demand).
pub const DEFAULT_CATALOGUE: [(f64, u32); 6] = [
    (2.5, 10),
    (3.0, 7),
    (2.25, 5),
    (2.0, 4),
    (5.0, 3),
    (1.0, 1),
];

/// A catalogue entry. `probability` is derived by [`crate::demand::normalize`]
/// and is zero until the catalogue has been normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricSize {
    pub size: f64,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub weekly_demand: u32,
    #[serde(default)]
    pub probability: f64,
}

impl FabricSize {
    pub fn new(size: f64, weekly_demand: u32) -> Self {
        Self {
            size,
            weekly_demand,
            probability: 0.0,
        }
    }

    pub fn class(&self, threshold: f64) -> PriorityClass {
        crate::demand::classify(self.probability, threshold)
    }
}

impl std::fmt::Display for FabricSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.size)
    }
}

pub fn default_fabric_sizes() -> Vec<FabricSize> {
    DEFAULT_CATALOGUE
        .iter()
        .map(|&(size, demand)| FabricSize::new(size, demand))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorityClass {
    Priority,
    Optional,
}

impl PriorityClass {
    pub fn is_priority(self) -> bool {
        self == PriorityClass::Priority
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutResult {
    pub size: f64,
    pub pieces: u32,
    pub total: f64,
}

impl CutResult {
    pub fn new(size: f64, pieces: u32) -> Self {
        Self {
            size,
            pieces,
            total: size * pieces as f64,
        }
    }

    pub fn add_piece(&mut self) {
        self.pieces += 1;
        self.total = self.size * self.pieces as f64;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub cuts: Vec<CutResult>,
    pub leftover: f64,
    pub total_used: f64,
    pub fabric_width_cm: u32,
}

impl CalculationResult {
    pub fn empty(fabric_width_cm: u32) -> Self {
        Self {
            cuts: vec![],
            leftover: 0.0,
            total_used: 0.0,
            fabric_width_cm,
        }
    }

    pub fn total_pieces(&self) -> u32 {
        self.cuts.iter().map(|c| c.pieces).sum()
    }

    /// True only for a zero-leftover plan that actually cuts something.
    pub fn is_perfect(&self) -> bool {
        !self.cuts.is_empty() && self.leftover == 0.0
    }
}

/// Rounds a length to millimetres.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Accepts integral JSON numbers (`10` or `10.0`) for count-like fields.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative whole number, got {value}"
        )));
    }
    Ok(value as u32)
}

/// Reads a roll length typed by a person. Anything that is not a number
/// becomes NaN, which plans as an empty result.
pub fn parse_length(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Lenient counterpart of [`parse_length`] for JSON: numbers and numeric
/// strings are read, anything else (including `null`) becomes NaN.
pub fn deserialize_length<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => parse_length(&s),
        _ => f64::NAN,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalogue() {
        let sizes = default_fabric_sizes();
        assert_eq!(sizes.len(), 6);
        assert_eq!(sizes[0], FabricSize::new(2.5, 10));
        assert!(sizes.iter().all(|s| s.probability == 0.0));
    }

    #[test]
    fn test_cut_result_totals() {
        let mut cut = CutResult::new(2.25, 2);
        assert_eq!(cut.total, 4.5);
        cut.add_piece();
        assert_eq!(cut.pieces, 3);
        assert_eq!(cut.total, 6.75);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.1 + 0.2), 0.3);
        assert_eq!(round3(32.5004), 32.5);
        assert_eq!(round3(-0.0004), 0.0);
    }

    #[test]
    fn test_perfect_requires_cuts() {
        let empty = CalculationResult::empty(97);
        assert!(!empty.is_perfect());
        assert_eq!(empty.total_pieces(), 0);

        let result = CalculationResult {
            cuts: vec![CutResult::new(3.0, 2), CutResult::new(1.0, 1)],
            leftover: 0.0,
            total_used: 7.0,
            fabric_width_cm: 97,
        };
        assert!(result.is_perfect());
        assert_eq!(result.total_pieces(), 3);
    }

    #[test]
    fn test_fabric_size_wire_format() {
        let size: FabricSize = serde_json::from_str(r#"{"size": 2.5, "weeklyDemand": 10.0}"#).unwrap();
        assert_eq!(size, FabricSize::new(2.5, 10));

        let err = serde_json::from_str::<FabricSize>(r#"{"size": 2.5, "weeklyDemand": 1.5}"#);
        assert!(err.is_err());
        let err = serde_json::from_str::<FabricSize>(r#"{"size": 2.5, "weeklyDemand": -1}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_result_wire_format() {
        let result = CalculationResult::empty(97);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalUsed"], 0.0);
        assert_eq!(json["fabricWidthCm"], 97);
        assert!(json["cuts"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("32.5"), 32.5);
        assert_eq!(parse_length(" 7 "), 7.0);
        assert_eq!(parse_length("-5"), -5.0);
        assert!(parse_length("abc").is_nan());
        assert!(parse_length("").is_nan());
    }

    #[test]
    fn test_deserialize_length() {
        #[derive(Deserialize)]
        struct Roll {
            #[serde(deserialize_with = "deserialize_length")]
            length: f64,
        }

        let read = |json: &str| serde_json::from_str::<Roll>(json).unwrap().length;
        assert_eq!(read(r#"{"length": 12}"#), 12.0);
        assert_eq!(read(r#"{"length": "12.5"}"#), 12.5);
        assert!(read(r#"{"length": "abc"}"#).is_nan());
        assert!(read(r#"{"length": null}"#).is_nan());
        assert!(read(r#"{"length": [1]}"#).is_nan());
    }
}
