//! Linear algebra kernel: variables, terms, expressions and inequations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Handle of an optimisation variable inside a [`crate::MilpModel`] pool.
///
/// The handle is only meaningful for the model that created it; metadata
/// (name, kind, bounds) lives in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable(pub(crate) usize);

impl Variable {
    /// Position of the variable in its model pool
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// `coefficient × variable`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub coefficient: f64,
    pub variable: Variable,
}

impl Term {
    pub fn new(coefficient: f64, variable: Variable) -> Self {
        Self { coefficient, variable }
    }
}

impl Neg for Term {
    type Output = Term;

    fn neg(self) -> Term {
        Term::new(-self.coefficient, self.variable)
    }
}

impl Mul<f64> for Term {
    type Output = Term;

    fn mul(self, factor: f64) -> Term {
        Term::new(self.coefficient * factor, self.variable)
    }
}

impl From<Variable> for Term {
    fn from(variable: Variable) -> Self {
        Term::new(1.0, variable)
    }
}

/// `constant + Σ cᵢ·xᵢ`, at most one term per variable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Expression {
    constant: f64,
    terms: Vec<Term>,
}

impl Expression {
    pub fn new(constant: f64) -> Self {
        Self {
            constant,
            terms: Vec::new(),
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0)
    }

    pub fn from_variable(variable: Variable) -> Self {
        Self::from_term(Term::from(variable))
    }

    pub fn from_term(term: Term) -> Self {
        let mut expression = Self::zero();
        expression.add_term(term);
        expression
    }

    /// `constant + coefficient × variable`
    pub fn affine(constant: f64, coefficient: f64, variable: Variable) -> Self {
        let mut expression = Self::new(constant);
        expression.add_term(Term::new(coefficient, variable));
        expression
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// True when the expression has no variable left
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of `variable`, zero if absent
    pub fn coefficient_of(&self, variable: Variable) -> f64 {
        self.terms
            .iter()
            .find(|term| term.variable == variable)
            .map(|term| term.coefficient)
            .unwrap_or(0.0)
    }

    /// In-place accumulation; a term for an existing variable merges its
    /// coefficient, and terms cancelling to zero are removed.
    pub fn add_term(&mut self, term: Term) {
        if term.coefficient == 0.0 {
            return;
        }
        match self.terms.iter().position(|t| t.variable == term.variable) {
            Some(pos) => {
                self.terms[pos].coefficient += term.coefficient;
                if self.terms[pos].coefficient.abs() < 1e-15 {
                    self.terms.remove(pos);
                }
            }
            None => self.terms.push(term),
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// In-place `self += other`
    pub fn add_expression(&mut self, other: &Expression) {
        self.constant += other.constant;
        for term in &other.terms {
            self.add_term(*term);
        }
    }

    /// In-place `self -= other`
    pub fn subtract_expression(&mut self, other: &Expression) {
        self.constant -= other.constant;
        for term in &other.terms {
            self.add_term(-*term);
        }
    }

    pub fn scaled(&self, factor: f64) -> Expression {
        let mut result = Expression::new(self.constant * factor);
        for term in &self.terms {
            result.add_term(*term * factor);
        }
        result
    }

    /// Value of the expression under an assignment indexed by variable
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms.iter().fold(self.constant, |acc, term| {
            acc + term.coefficient * values.get(term.variable.0).copied().unwrap_or(0.0)
        })
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Expression::from_variable(variable)
    }
}

impl From<Term> for Expression {
    fn from(term: Term) -> Self {
        Expression::from_term(term)
    }
}

impl From<f64> for Expression {
    fn from(constant: f64) -> Self {
        Expression::new(constant)
    }
}

impl Add<&Expression> for &Expression {
    type Output = Expression;

    fn add(self, other: &Expression) -> Expression {
        let mut result = self.clone();
        result.add_expression(other);
        result
    }
}

impl Add<Expression> for Expression {
    type Output = Expression;

    fn add(mut self, other: Expression) -> Expression {
        self.add_expression(&other);
        self
    }
}

impl Add<Term> for Expression {
    type Output = Expression;

    fn add(mut self, term: Term) -> Expression {
        self.add_term(term);
        self
    }
}

impl Add<Variable> for Expression {
    type Output = Expression;

    fn add(mut self, variable: Variable) -> Expression {
        self.add_term(Term::from(variable));
        self
    }
}

impl Add<f64> for Expression {
    type Output = Expression;

    fn add(mut self, constant: f64) -> Expression {
        self.constant += constant;
        self
    }
}

impl Sub<&Expression> for &Expression {
    type Output = Expression;

    fn sub(self, other: &Expression) -> Expression {
        let mut result = self.clone();
        result.subtract_expression(other);
        result
    }
}

impl Sub<Expression> for Expression {
    type Output = Expression;

    fn sub(mut self, other: Expression) -> Expression {
        self.subtract_expression(&other);
        self
    }
}

impl Sub<Term> for Expression {
    type Output = Expression;

    fn sub(mut self, term: Term) -> Expression {
        self.add_term(-term);
        self
    }
}

impl Sub<Variable> for Expression {
    type Output = Expression;

    fn sub(mut self, variable: Variable) -> Expression {
        self.add_term(Term::new(-1.0, variable));
        self
    }
}

impl Sub<f64> for Expression {
    type Output = Expression;

    fn sub(mut self, constant: f64) -> Expression {
        self.constant -= constant;
        self
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    fn mul(self, factor: f64) -> Expression {
        self.scaled(factor)
    }
}

impl Mul<f64> for &Expression {
    type Output = Expression;

    fn mul(self, factor: f64) -> Expression {
        self.scaled(factor)
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        self.scaled(-1.0)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constant)?;
        for term in &self.terms {
            if term.coefficient < 0.0 {
                write!(f, " - {}*{}", -term.coefficient, term.variable)?;
            } else {
                write!(f, " + {}*{}", term.coefficient, term.variable)?;
            }
        }
        Ok(())
    }
}

/// Relation of an inequation against zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InequalityType {
    LessThan,
    GreaterThan,
    Equal,
}

impl InequalityType {
    pub fn flipped(self) -> Self {
        match self {
            InequalityType::LessThan => InequalityType::GreaterThan,
            InequalityType::GreaterThan => InequalityType::LessThan,
            InequalityType::Equal => InequalityType::Equal,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            InequalityType::LessThan => "<=",
            InequalityType::GreaterThan => ">=",
            InequalityType::Equal => "=",
        }
    }
}

/// `expression (≤ | ≥ | =) 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inequation {
    expression: Expression,
    kind: InequalityType,
}

impl Inequation {
    /// Normalise `lhs (kind) rhs` into `lhs − rhs (kind) 0`
    pub fn new(lhs: Expression, kind: InequalityType, rhs: Expression) -> Self {
        Self {
            expression: lhs - rhs,
            kind,
        }
    }

    pub fn against_zero(expression: Expression, kind: InequalityType) -> Self {
        Self { expression, kind }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn kind(&self) -> InequalityType {
        self.kind
    }

    /// Right-hand side once the constant is moved across: `Σ terms (kind) rhs`
    pub fn rhs(&self) -> f64 {
        -self.expression.constant()
    }

    /// Check the inequation under an assignment
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let value = self.expression.evaluate(values);
        match self.kind {
            InequalityType::LessThan => value <= tolerance,
            InequalityType::GreaterThan => value >= -tolerance,
            InequalityType::Equal => value.abs() <= tolerance,
        }
    }

    /// For constant inequations: whether they hold. `None` if variables remain.
    pub fn constant_truth(&self, tolerance: f64) -> Option<bool> {
        if !self.expression.is_constant() {
            return None;
        }
        Some(self.is_satisfied(&[], tolerance))
    }
}

impl fmt::Display for Inequation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} 0", self.expression, self.kind.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_term_merges_coefficients() {
        let x = Variable(0);
        let y = Variable(1);
        let mut e = Expression::new(1.0);
        e.add_term(Term::new(2.0, x));
        e.add_term(Term::new(3.0, y));
        e.add_term(Term::new(-0.5, x));
        assert_eq!(e.terms().len(), 2);
        assert_eq!(e.coefficient_of(x), 1.5);
        assert_eq!(e.coefficient_of(y), 3.0);
    }

    #[test]
    fn test_cancelling_terms_disappear() {
        let x = Variable(0);
        let e = Expression::from_variable(x) - x;
        assert!(e.is_constant());
    }

    #[test]
    fn test_inequation_moves_everything_left() {
        let x = Variable(0);
        let ineq = Inequation::new(
            Expression::from_variable(x),
            InequalityType::GreaterThan,
            Expression::new(0.4),
        );
        assert_eq!(ineq.expression().constant(), -0.4);
        assert!((ineq.rhs() - 0.4).abs() < 1e-12);
        assert!(ineq.is_satisfied(&[0.5], 1e-9));
        assert!(!ineq.is_satisfied(&[0.3], 1e-9));
    }

    #[test]
    fn test_constant_truth() {
        let holds = Inequation::new(Expression::new(0.2), InequalityType::LessThan, Expression::new(0.3));
        let fails = Inequation::new(Expression::new(0.9), InequalityType::LessThan, Expression::new(0.1));
        assert_eq!(holds.constant_truth(1e-9), Some(true));
        assert_eq!(fails.constant_truth(1e-9), Some(false));
        let open = Inequation::against_zero(Expression::from_variable(Variable(3)), InequalityType::Equal);
        assert_eq!(open.constant_truth(1e-9), None);
    }

    #[test]
    fn test_operators_return_new_values() {
        let x = Variable(0);
        let a = Expression::affine(1.0, 2.0, x);
        let b = &a * 2.0;
        let c = &a + &b;
        assert_eq!(a.coefficient_of(x), 2.0);
        assert_eq!(c.coefficient_of(x), 6.0);
        assert_eq!(c.constant(), 3.0);
        assert_eq!((-c).constant(), -3.0);
    }
}
