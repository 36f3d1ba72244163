//! Mixed-integer encodings of non-linear degree functions

use crate::concept::ThresholdKind;
use fuzzowl_core::{Expression, MilpModel};

/// `v = min(values)`, one binary per operand selecting the minimum
pub(crate) fn exact_min(model: &mut MilpModel, values: &[Expression]) -> Expression {
    match values {
        [] => Expression::new(1.0),
        [single] => single.clone(),
        _ => {
            let v = model.new_degree_variable();
            let mut selected = Expression::zero();
            for value in values {
                let y = model.new_binary();
                model.add_le(v, value.clone());
                // y = 1 ⇒ v ≥ value
                model.add_ge(v, value.clone() - 1.0 + y);
                selected = selected + y;
            }
            model.add_eq(selected, 1.0);
            Expression::from(v)
        }
    }
}

/// `v = max(values)`, one binary per operand selecting the maximum
pub(crate) fn exact_max(model: &mut MilpModel, values: &[Expression]) -> Expression {
    match values {
        [] => Expression::zero(),
        [single] => single.clone(),
        _ => {
            let v = model.new_degree_variable();
            let mut selected = Expression::zero();
            for value in values {
                let y = model.new_binary();
                model.add_ge(v, value.clone());
                // y = 1 ⇒ v ≤ value
                model.add_le(v, value.clone() + 1.0 - y);
                selected = selected + y;
            }
            model.add_eq(selected, 1.0);
            Expression::from(v)
        }
    }
}

/// Values sorted decreasingly: `s₁ ≥ s₂ ≥ … ≥ sₙ` with a permutation
/// matrix of binaries assigning every operand to one position.
pub(crate) fn sorted_descending(model: &mut MilpModel, values: &[Expression]) -> Vec<Expression> {
    let n = values.len();
    if n <= 1 {
        return values.to_vec();
    }
    let sorted: Vec<_> = (0..n).map(|_| model.new_degree_variable()).collect();
    let assignment: Vec<Vec<_>> = (0..n)
        .map(|_| (0..n).map(|_| model.new_binary()).collect())
        .collect();
    for i in 0..n {
        let mut row = Expression::zero();
        let mut column = Expression::zero();
        for j in 0..n {
            row = row + assignment[i][j];
            column = column + assignment[j][i];
        }
        model.add_eq(row, 1.0);
        model.add_eq(column, 1.0);
    }
    for (i, value) in values.iter().enumerate() {
        for (j, s) in sorted.iter().enumerate() {
            let z = assignment[i][j];
            // z = 1 ⇒ s_j = value_i
            model.add_ge(*s, value.clone() - 1.0 + z);
            model.add_le(*s, value.clone() + 1.0 - z);
        }
    }
    for pair in sorted.windows(2) {
        model.add_ge(pair[0], pair[1]);
    }
    sorted.into_iter().map(Expression::from).collect()
}

/// `v = f(x)` for the piecewise-linear `f` through `points`; `x` ranges
/// over `[points[0].0, points[last].0]`. A vertical segment lets `v` take
/// any value of the jump.
pub(crate) fn piecewise(model: &mut MilpModel, x: Expression, points: &[(f64, f64)]) -> Expression {
    if points.len() < 2 {
        return Expression::new(points.first().map(|p| p.1).unwrap_or(0.0));
    }
    let lo = points[0].0;
    let hi = points[points.len() - 1].0;
    let width = (hi - lo).max(1.0);
    let v = model.new_degree_variable();
    let mut selected = Expression::zero();
    for segment in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (segment[0], segment[1]);
        let y = model.new_binary();
        selected = selected + y;
        let slack = Expression::new(1.0) - y;
        // selected segment contains x
        model.add_ge(x.clone(), slack.clone() * (-width) + x0);
        model.add_le(x.clone(), slack.clone() * width + x1);
        if x1 > x0 {
            let slope = (y1 - y0) / (x1 - x0);
            let big_m = 1.0 + slope.abs() * width;
            // v − (y0 + slope·(x − x0)) vanishes on the selected segment
            let line = x.clone() * slope + (y0 - slope * x0);
            let gap = Expression::from(v) - line;
            model.add_le(gap.clone(), slack.clone() * big_m);
            model.add_ge(gap, slack * (-big_m));
        } else {
            model.add_ge(v, slack.clone() * (-1.0) + y0.min(y1));
            model.add_le(v, slack + y0.max(y1));
        }
    }
    model.add_eq(selected, 1.0);
    Expression::from(v)
}

/// Extend a graph with zero-valued pieces so that it covers `[lo, hi]`
pub(crate) fn cover_range(points: &[(f64, f64)], lo: f64, hi: f64) -> Vec<(f64, f64)> {
    let mut result = Vec::with_capacity(points.len() + 4);
    if let Some(&(first, _)) = points.first() {
        if lo < first {
            result.push((lo, 0.0));
            result.push((first, 0.0));
        }
    }
    result.extend_from_slice(points);
    if let Some(&(last, _)) = points.last() {
        if hi > last {
            result.push((last, 0.0));
            result.push((hi, 0.0));
        }
    }
    result
}

/// Crisp indicator of `value ⋈ weight`; strict comparisons keep a gap of `epsilon`
pub(crate) fn threshold(
    model: &mut MilpModel,
    value: Expression,
    weight: Expression,
    kind: ThresholdKind,
    epsilon: f64,
) -> Expression {
    let y = model.new_binary();
    match kind {
        ThresholdKind::AtLeast | ThresholdKind::LessThan => {
            // y = 1 ⇔ value ≥ weight
            model.add_ge(value.clone(), weight.clone() - 1.0 + y);
            model.add_le(value, weight + Expression::from(y) * (1.0 + epsilon) - epsilon);
        }
        ThresholdKind::AtMost | ThresholdKind::GreaterThan => {
            // y = 1 ⇔ value ≤ weight
            model.add_le(value.clone(), weight.clone() + 1.0 - y);
            model.add_ge(value, weight - Expression::from(y) * (1.0 + epsilon) + epsilon);
        }
    }
    match kind {
        ThresholdKind::AtLeast | ThresholdKind::AtMost => Expression::from(y),
        ThresholdKind::LessThan | ThresholdKind::GreaterThan => Expression::new(1.0) - y,
    }
}

/// Indicator `y = 1 ⇔ c ≤ d` for degrees
pub(crate) fn less_or_equal(model: &mut MilpModel, c: Expression, d: Expression, epsilon: f64) -> Expression {
    let y = model.new_binary();
    // y = 1 ⇒ c ≤ d; y = 0 ⇒ c ≥ d + ε
    model.add_le(c.clone(), d.clone() + 1.0 - y);
    model.add_ge(c, d - Expression::from(y) * (1.0 + epsilon) + epsilon);
    Expression::from(y)
}

/// Gödel residuum `c ⇒ d`: 1 if `c ≤ d`, otherwise `d`
pub(crate) fn goedel_implication(model: &mut MilpModel, c: Expression, d: Expression, epsilon: f64) -> Expression {
    let y = less_or_equal(model, c, d.clone(), epsilon);
    let v = model.new_degree_variable();
    model.add_ge(v, y.clone());
    model.add_ge(v, d.clone());
    model.add_le(v, d + y);
    Expression::from(v)
}

/// Product of a degree with a binary: `v = t · value`
pub(crate) fn gated(model: &mut MilpModel, value: Expression, gate: Expression) -> Expression {
    let v = model.new_degree_variable();
    model.add_le(v, value.clone());
    model.add_le(v, gate.clone());
    model.add_ge(v, value - 1.0 + gate);
    Expression::from(v)
}
