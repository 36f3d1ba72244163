//! Fuzzy truth degrees

use crate::linear::{Expression, Term, Variable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fuzzy truth value: a known constant, an unresolved optimisation
/// variable, or a linear combination of variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Degree {
    Numeric(f64),
    Variable(Variable),
    Expression(Expression),
}

impl Degree {
    pub fn one() -> Self {
        Degree::Numeric(1.0)
    }

    pub fn zero() -> Self {
        Degree::Numeric(0.0)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Degree::Numeric(_))
    }

    /// Constant value, also for expressions without variables
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            Degree::Numeric(value) => Some(*value),
            Degree::Variable(_) => None,
            Degree::Expression(expr) if expr.is_constant() => Some(expr.constant()),
            Degree::Expression(_) => None,
        }
    }

    /// Whether the degree is the constant zero
    pub fn is_zero(&self) -> bool {
        self.numeric_value().map(|v| v == 0.0).unwrap_or(false)
    }

    /// Degree as it appears on the left of a constraint: `expr += degree`
    pub fn add_to_expression(&self, expr: &mut Expression) {
        match self {
            Degree::Numeric(value) => expr.add_constant(*value),
            Degree::Variable(variable) => expr.add_term(Term::new(1.0, *variable)),
            Degree::Expression(other) => expr.add_expression(other),
        }
    }

    /// Degree as it appears on the right of a constraint: `expr -= degree`
    pub fn subtract_from_expression(&self, expr: &mut Expression) {
        match self {
            Degree::Numeric(value) => expr.add_constant(-*value),
            Degree::Variable(variable) => expr.add_term(Term::new(-1.0, *variable)),
            Degree::Expression(other) => expr.subtract_expression(other),
        }
    }

    pub fn to_expression(&self) -> Expression {
        let mut expr = Expression::zero();
        self.add_to_expression(&mut expr);
        expr
    }

    /// `1 − degree`
    pub fn complement(&self) -> Degree {
        match self {
            Degree::Numeric(value) => Degree::Numeric(1.0 - value),
            other => {
                let mut expr = Expression::new(1.0);
                other.subtract_from_expression(&mut expr);
                Degree::Expression(expr)
            }
        }
    }
}

impl From<f64> for Degree {
    fn from(value: f64) -> Self {
        Degree::Numeric(value)
    }
}

impl From<Variable> for Degree {
    fn from(variable: Variable) -> Self {
        Degree::Variable(variable)
    }
}

impl From<Expression> for Degree {
    fn from(expression: Expression) -> Self {
        if expression.is_constant() {
            Degree::Numeric(expression.constant())
        } else {
            Degree::Expression(expression)
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degree::Numeric(value) => write!(f, "{}", value),
            Degree::Variable(variable) => write!(f, "{}", variable),
            Degree::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_lowering() {
        let mut expr = Expression::zero();
        Degree::Numeric(0.7).add_to_expression(&mut expr);
        Degree::Numeric(0.2).subtract_from_expression(&mut expr);
        assert!((expr.constant() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_variable_lowering_sides() {
        let x = Variable(2);
        let mut left = Expression::zero();
        Degree::Variable(x).add_to_expression(&mut left);
        let mut right = Expression::zero();
        Degree::Variable(x).subtract_from_expression(&mut right);
        assert_eq!(left.coefficient_of(x), 1.0);
        assert_eq!(right.coefficient_of(x), -1.0);
    }

    #[test]
    fn test_complement() {
        assert_eq!(Degree::Numeric(0.25).complement(), Degree::Numeric(0.75));
        let x = Variable(0);
        let c = Degree::Variable(x).complement();
        let expr = c.to_expression();
        assert_eq!(expr.constant(), 1.0);
        assert_eq!(expr.coefficient_of(x), -1.0);
    }

    #[test]
    fn test_constant_expression_collapses() {
        let degree: Degree = Expression::new(0.3).into();
        assert!(degree.is_numeric());
        assert_eq!(degree.numeric_value(), Some(0.3));
    }
}
