//! Fuzzy membership functions, modifiers, quantifiers and fuzzy numbers

use crate::FuzzyDlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Sub};

/// Membership function of a concrete-domain concept over `[k1, k2]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MembershipFunction {
    /// 1 on `[a, b]`, 0 elsewhere
    Crisp { k1: f64, k2: f64, a: f64, b: f64 },

    /// 1 up to `a`, linear down to 0 at `b`
    LeftShoulder { k1: f64, k2: f64, a: f64, b: f64 },

    /// 0 up to `a`, linear up to 1 at `b`
    RightShoulder { k1: f64, k2: f64, a: f64, b: f64 },

    /// 0 at `k1`, `b` at `a`, 1 at `k2`
    Linear { k1: f64, k2: f64, a: f64, b: f64 },

    /// 0 up to `a`, 1 at `b`, 0 from `c`
    Triangular { k1: f64, k2: f64, a: f64, b: f64, c: f64 },

    /// 0 up to `a`, 1 on `[b, c]`, 0 from `d`
    Trapezoidal { k1: f64, k2: f64, a: f64, b: f64, c: f64, d: f64 },
}

fn ordered(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.windows(2).all(|w| w[0] <= w[1])
}

impl MembershipFunction {
    /// Check parameter ordering `k1 ≤ a ≤ … ≤ k2`
    pub fn validate(&self) -> Result<(), FuzzyDlError> {
        let ok = match *self {
            MembershipFunction::Crisp { k1, k2, a, b }
            | MembershipFunction::LeftShoulder { k1, k2, a, b }
            | MembershipFunction::RightShoulder { k1, k2, a, b } => ordered(&[k1, a, b, k2]),
            MembershipFunction::Linear { k1, k2, a, b } => {
                ordered(&[k1, a, k2]) && (0.0..=1.0).contains(&b)
            }
            MembershipFunction::Triangular { k1, k2, a, b, c } => ordered(&[k1, a, b, c, k2]),
            MembershipFunction::Trapezoidal { k1, k2, a, b, c, d } => {
                ordered(&[k1, a, b, c, d, k2])
            }
        };
        if ok && self.domain().0 < self.domain().1 {
            Ok(())
        } else {
            Err(FuzzyDlError::InvalidConcept(format!(
                "ill-formed membership function {}",
                self
            )))
        }
    }

    /// Domain `[k1, k2]`
    pub fn domain(&self) -> (f64, f64) {
        match *self {
            MembershipFunction::Crisp { k1, k2, .. }
            | MembershipFunction::LeftShoulder { k1, k2, .. }
            | MembershipFunction::RightShoulder { k1, k2, .. }
            | MembershipFunction::Linear { k1, k2, .. }
            | MembershipFunction::Triangular { k1, k2, .. }
            | MembershipFunction::Trapezoidal { k1, k2, .. } => (k1, k2),
        }
    }

    /// Breakpoints of the piecewise-linear graph, left to right. Two points
    /// sharing an abscissa describe a jump.
    pub fn breakpoints(&self) -> Vec<(f64, f64)> {
        let points = match *self {
            MembershipFunction::Crisp { k1, k2, a, b } => {
                vec![(k1, 0.0), (a, 0.0), (a, 1.0), (b, 1.0), (b, 0.0), (k2, 0.0)]
            }
            MembershipFunction::LeftShoulder { k1, k2, a, b } => {
                vec![(k1, 1.0), (a, 1.0), (b, 0.0), (k2, 0.0)]
            }
            MembershipFunction::RightShoulder { k1, k2, a, b } => {
                vec![(k1, 0.0), (a, 0.0), (b, 1.0), (k2, 1.0)]
            }
            MembershipFunction::Linear { k1, k2, a, b } => vec![(k1, 0.0), (a, b), (k2, 1.0)],
            MembershipFunction::Triangular { k1, k2, a, b, c } => {
                vec![(k1, 0.0), (a, 0.0), (b, 1.0), (c, 0.0), (k2, 0.0)]
            }
            MembershipFunction::Trapezoidal { k1, k2, a, b, c, d } => {
                vec![(k1, 0.0), (a, 0.0), (b, 1.0), (c, 1.0), (d, 0.0), (k2, 0.0)]
            }
        };
        dedup_points(points)
    }

    /// Membership degree of `x`; points outside the domain have degree 0
    pub fn evaluate(&self, x: f64) -> f64 {
        let (k1, k2) = self.domain();
        if x < k1 || x > k2 {
            return 0.0;
        }
        evaluate_piecewise(&self.breakpoints(), x)
    }

    fn parameters(&self) -> Vec<f64> {
        match *self {
            MembershipFunction::Crisp { k1, k2, a, b }
            | MembershipFunction::LeftShoulder { k1, k2, a, b }
            | MembershipFunction::RightShoulder { k1, k2, a, b }
            | MembershipFunction::Linear { k1, k2, a, b } => vec![k1, k2, a, b],
            MembershipFunction::Triangular { k1, k2, a, b, c } => vec![k1, k2, a, b, c],
            MembershipFunction::Trapezoidal { k1, k2, a, b, c, d } => vec![k1, k2, a, b, c, d],
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            MembershipFunction::Crisp { .. } => "crisp",
            MembershipFunction::LeftShoulder { .. } => "left-shoulder",
            MembershipFunction::RightShoulder { .. } => "right-shoulder",
            MembershipFunction::Linear { .. } => "linear",
            MembershipFunction::Triangular { .. } => "triangular",
            MembershipFunction::Trapezoidal { .. } => "trapezoidal",
        }
    }
}

/// Drop consecutive duplicates produced by parameters touching the domain ends
fn dedup_points(points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let mut result: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    for point in points {
        if result.last() != Some(&point) {
            result.push(point);
        }
    }
    result
}

/// Value of a piecewise-linear graph; at a jump the larger value wins
pub(crate) fn evaluate_piecewise(points: &[(f64, f64)], x: f64) -> f64 {
    let mut best: Option<f64> = None;
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        if x < x0 || x > x1 {
            continue;
        }
        let y = if x1 == x0 {
            y0.max(y1)
        } else {
            y0 + (y1 - y0) * (x - x0) / (x1 - x0)
        };
        best = Some(best.map_or(y, |b: f64| b.max(y)));
    }
    best.unwrap_or(0.0)
}

impl Hash for MembershipFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.keyword().hash(state);
        for p in self.parameters() {
            p.to_bits().hash(state);
        }
    }
}

impl fmt::Display for MembershipFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters().iter().map(|p| p.to_string()).collect();
        write!(f, "{}({})", self.keyword(), params.join(", "))
    }
}

/// Shape of a fuzzy modifier over `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModifierKind {
    /// `lm(c)`: through `(0,0)`, `(c/(c+1), 1/(c+1))`, `(1,1)`
    Linear { c: f64 },

    /// 0 up to `a`, 1 at `b`, 0 from `c`
    Triangular { a: f64, b: f64, c: f64 },
}

/// Named fuzzy modifier, e.g. `very = linear(4)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    pub kind: ModifierKind,
}

impl Modifier {
    pub fn linear(name: impl Into<String>, c: f64) -> Result<Self, FuzzyDlError> {
        let modifier = Self {
            name: name.into(),
            kind: ModifierKind::Linear { c },
        };
        modifier.validate()?;
        Ok(modifier)
    }

    pub fn triangular(name: impl Into<String>, a: f64, b: f64, c: f64) -> Result<Self, FuzzyDlError> {
        let modifier = Self {
            name: name.into(),
            kind: ModifierKind::Triangular { a, b, c },
        };
        modifier.validate()?;
        Ok(modifier)
    }

    pub fn validate(&self) -> Result<(), FuzzyDlError> {
        let ok = match self.kind {
            ModifierKind::Linear { c } => c.is_finite() && c > 0.0,
            ModifierKind::Triangular { a, b, c } => ordered(&[0.0, a, b, c, 1.0]),
        };
        if ok {
            Ok(())
        } else {
            Err(FuzzyDlError::InvalidConcept(format!(
                "ill-formed modifier {}",
                self.name
            )))
        }
    }

    pub fn breakpoints(&self) -> Vec<(f64, f64)> {
        match self.kind {
            ModifierKind::Linear { c } => {
                vec![(0.0, 0.0), (c / (c + 1.0), 1.0 / (c + 1.0)), (1.0, 1.0)]
            }
            ModifierKind::Triangular { a, b, c } => {
                dedup_points(vec![(0.0, 0.0), (a, 0.0), (b, 1.0), (c, 0.0), (1.0, 0.0)])
            }
        }
    }

    pub fn apply(&self, degree: f64) -> f64 {
        evaluate_piecewise(&self.breakpoints(), degree.clamp(0.0, 1.0))
    }
}

impl Hash for Modifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        match self.kind {
            ModifierKind::Linear { c } => c.to_bits().hash(state),
            ModifierKind::Triangular { a, b, c } => {
                for p in [a, b, c] {
                    p.to_bits().hash(state);
                }
            }
        }
    }
}

/// Fuzzy quantifier over proportions, used to derive quantifier-guided OWA
/// weights `w_i = Q(i/n) − Q((i−1)/n)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyQuantifier {
    pub name: String,
    pub function: MembershipFunction,
}

impl FuzzyQuantifier {
    pub fn new(name: impl Into<String>, function: MembershipFunction) -> Result<Self, FuzzyDlError> {
        function.validate()?;
        let quantifier = Self {
            name: name.into(),
            function,
        };
        let (k1, k2) = quantifier.function.domain();
        if k1 != 0.0 || k2 != 1.0 {
            return Err(FuzzyDlError::InvalidConcept(format!(
                "quantifier {} must be defined over [0, 1]",
                quantifier.name
            )));
        }
        Ok(quantifier)
    }

    pub fn weights(&self, n: usize) -> Vec<f64> {
        (1..=n)
            .map(|i| {
                let hi = self.function.evaluate(i as f64 / n as f64);
                let lo = self.function.evaluate((i - 1) as f64 / n as f64);
                hi - lo
            })
            .collect()
    }
}

impl Hash for FuzzyQuantifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.function.hash(state);
    }
}

/// Triangular fuzzy number `(a, b, c)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyNumber {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl FuzzyNumber {
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self, FuzzyDlError> {
        if !ordered(&[a, b, c]) {
            return Err(FuzzyDlError::InvalidConcept(format!(
                "fuzzy number ({}, {}, {}) is not ordered",
                a, b, c
            )));
        }
        Ok(Self { a, b, c })
    }

    /// A crisp value as a degenerate fuzzy number
    pub fn crisp(value: f64) -> Self {
        Self {
            a: value,
            b: value,
            c: value,
        }
    }

    /// Best non-fuzzy performance: `(a + b + c) / 3`
    pub fn bnp(&self) -> f64 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Breakpoints inside the concrete range `[k1, k2]`
    pub fn breakpoints(&self, k1: f64, k2: f64) -> Vec<(f64, f64)> {
        dedup_points(vec![
            (k1, 0.0),
            (self.a.max(k1), 0.0),
            (self.b.clamp(k1, k2), 1.0),
            (self.c.min(k2), 0.0),
            (k2, 0.0),
        ])
    }
}

impl Add for FuzzyNumber {
    type Output = FuzzyNumber;

    fn add(self, other: FuzzyNumber) -> FuzzyNumber {
        FuzzyNumber {
            a: self.a + other.a,
            b: self.b + other.b,
            c: self.c + other.c,
        }
    }
}

impl Sub for FuzzyNumber {
    type Output = FuzzyNumber;

    fn sub(self, other: FuzzyNumber) -> FuzzyNumber {
        FuzzyNumber {
            a: self.a - other.c,
            b: self.b - other.b,
            c: self.c - other.a,
        }
    }
}

impl Mul<f64> for FuzzyNumber {
    type Output = FuzzyNumber;

    fn mul(self, k: f64) -> FuzzyNumber {
        if k >= 0.0 {
            FuzzyNumber {
                a: self.a * k,
                b: self.b * k,
                c: self.c * k,
            }
        } else {
            FuzzyNumber {
                a: self.c * k,
                b: self.b * k,
                c: self.a * k,
            }
        }
    }
}

impl Hash for FuzzyNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for p in [self.a, self.b, self.c] {
            p.to_bits().hash(state);
        }
    }
}

impl fmt::Display for FuzzyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.a, self.b, self.c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_shoulder() {
        let f = MembershipFunction::LeftShoulder { k1: 0.0, k2: 100.0, a: 20.0, b: 40.0 };
        assert!(f.validate().is_ok());
        assert_eq!(f.evaluate(10.0), 1.0);
        assert!((f.evaluate(30.0) - 0.5).abs() < 1e-12);
        assert_eq!(f.evaluate(50.0), 0.0);
    }

    #[test]
    fn test_crisp_jump_points() {
        let f = MembershipFunction::Crisp { k1: 0.0, k2: 10.0, a: 2.0, b: 4.0 };
        assert_eq!(f.evaluate(2.0), 1.0);
        assert_eq!(f.evaluate(3.0), 1.0);
        assert_eq!(f.evaluate(5.0), 0.0);
    }

    #[test]
    fn test_invalid_trapezoid() {
        let f = MembershipFunction::Trapezoidal { k1: 0.0, k2: 100.0, a: 60.0, b: 40.0, c: 70.0, d: 80.0 };
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_breakpoints_at_domain_edges() {
        let f = MembershipFunction::RightShoulder { k1: 0.0, k2: 1.0, a: 0.0, b: 1.0 };
        assert_eq!(f.breakpoints(), vec![(0.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_linear_modifier() {
        let very = Modifier::linear("very", 4.0).unwrap();
        assert!((very.apply(0.7) - 0.175).abs() < 1e-12);
        assert!((very.apply(0.9) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_triangular_modifier() {
        let m = Modifier::triangular("around", 0.2, 0.5, 0.8).unwrap();
        assert!((m.apply(0.6) - 2.0 / 3.0).abs() < 1e-12);
        assert!(Modifier::triangular("bad", 0.5, 0.2, 0.8).is_err());
    }

    #[test]
    fn test_quantifier_weights_sum_to_one() {
        let most = FuzzyQuantifier::new(
            "most",
            MembershipFunction::RightShoulder { k1: 0.0, k2: 1.0, a: 0.3, b: 0.8 },
        )
        .unwrap();
        let weights = most.weights(4);
        assert_eq!(weights.len(), 4);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fuzzy_number_arithmetic() {
        let x = FuzzyNumber::new(1.0, 2.0, 6.0).unwrap();
        let y = FuzzyNumber::new(0.0, 1.0, 2.0).unwrap();
        assert_eq!(x + y, FuzzyNumber { a: 1.0, b: 3.0, c: 8.0 });
        assert_eq!(x - y, FuzzyNumber { a: -1.0, b: 1.0, c: 6.0 });
        assert_eq!(x * -1.0, FuzzyNumber { a: -6.0, b: -2.0, c: -1.0 });
        assert!((x.bnp() - 3.0).abs() < 1e-12);
    }
}
