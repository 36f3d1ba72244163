//! Query answers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of solving a query: either a consistent answer with its value and
/// the named variable bindings of the optimum, or an inconsistent KB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    consistent: bool,
    value: f64,
    #[serde(default)]
    unbounded: bool,
    #[serde(default)]
    bindings: BTreeMap<String, f64>,
}

impl Solution {
    pub fn new(value: f64) -> Self {
        Self {
            consistent: true,
            value,
            unbounded: false,
            bindings: BTreeMap::new(),
        }
    }

    pub fn with_bindings(value: f64, bindings: BTreeMap<String, f64>) -> Self {
        Self {
            consistent: true,
            value,
            unbounded: false,
            bindings,
        }
    }

    /// The designated answer for an ontology without models
    pub fn inconsistent() -> Self {
        Self {
            consistent: false,
            value: 0.0,
            unbounded: false,
            bindings: BTreeMap::new(),
        }
    }

    /// Consistent, but the solver reported no finite optimum. The value is
    /// clamped to `floor`, the least value the objective takes within the
    /// variable bounds (`-inf` only for models with free variables).
    pub fn unbounded(floor: f64) -> Self {
        Self {
            consistent: true,
            value: floor,
            unbounded: true,
            bindings: BTreeMap::new(),
        }
    }

    pub fn is_consistent_kb(&self) -> bool {
        self.consistent
    }

    pub fn is_unbounded(&self) -> bool {
        self.unbounded
    }

    /// Optimal value; `0.0` for an inconsistent KB
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn bindings(&self) -> &BTreeMap<String, f64> {
        &self.bindings
    }

    pub fn binding(&self, name: &str) -> Option<f64> {
        self.bindings.get(name).copied()
    }

    /// Apply `f` to the finite value of a consistent solution
    pub fn map_value<F: FnOnce(f64) -> f64>(mut self, f: F) -> Self {
        if self.consistent && self.value.is_finite() {
            self.value = f(self.value);
        }
        self
    }

    /// Round the value to `digits` decimal places, removing solver noise
    pub fn rounded(self, digits: u32) -> Self {
        let scale = 10f64.powi(digits as i32);
        self.map_value(|v| {
            let r = (v * scale).round() / scale;
            if r == 0.0 { 0.0 } else { r }
        })
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.consistent {
            write!(f, "{:?}", self.value)
        } else {
            write!(f, "Inconsistent KB")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_contract() {
        assert_eq!(Solution::new(0.6).to_string(), "0.6");
        assert_eq!(Solution::new(-1.0).to_string(), "-1.0");
        assert_eq!(Solution::new(1.0).to_string(), "1.0");
        assert_eq!(Solution::inconsistent().to_string(), "Inconsistent KB");
    }

    #[test]
    fn test_rounding_removes_noise() {
        let s = Solution::new(0.6000000000000001).rounded(6);
        assert_eq!(s.value(), 0.6);
        let s = Solution::new(-0.0000000001).rounded(6);
        assert_eq!(s.to_string(), "0.0");
    }

    #[test]
    fn test_map_value_skips_inconsistent() {
        let s = Solution::inconsistent().map_value(|v| v + 1.0);
        assert!(!s.is_consistent_kb());
        assert_eq!(s.value(), 0.0);
    }

    #[test]
    fn test_clamped_unbounded_value_is_mapped() {
        let s = Solution::unbounded(-1.0).map_value(|v| -v);
        assert!(s.is_consistent_kb());
        assert!(s.is_unbounded());
        assert_eq!(s.to_string(), "1.0");
        let free = Solution::unbounded(f64::NEG_INFINITY).map_value(|v| -v);
        assert_eq!(free.value(), f64::NEG_INFINITY);
    }
}
