//! MILP model builder: variable pool, constraints and objective

use crate::linear::{Expression, InequalityType, Inequation, Variable};
use crate::solution::Solution;
use crate::solver::{MilpProblem, MilpSolver, SolverOutcome};
use crate::MilpError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// Domain of an optimisation variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    /// 0 or 1
    Binary,
    /// Real within its bounds
    Continuous,
    /// Integer within its bounds
    Integer,
}

/// Pool entry for one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub kind: VariableKind,
    pub lower: f64,
    pub upper: f64,
}

impl VariableInfo {
    pub fn is_integral(&self) -> bool {
        matches!(self.kind, VariableKind::Binary | VariableKind::Integer)
    }
}

/// Owns the optimisation variables, the accumulated inequations and the
/// objective of one knowledge base.
///
/// Named variables are memoised: asking twice for the same key returns the
/// same [`Variable`], which is what lets independently generated constraints
/// about one membership degree share a single unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilpModel {
    variables: Vec<VariableInfo>,
    by_name: HashMap<String, Variable>,
    constraints: Vec<Inequation>,
    objective: Option<Expression>,
    trivially_infeasible: bool,
    fresh_counter: usize,
    tolerance: f64,
}

impl MilpModel {
    pub fn new() -> Self {
        Self {
            tolerance: 1e-9,
            ..Default::default()
        }
    }

    /// Tolerance used to evaluate constraints without variables
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Default::default()
        }
    }

    /// Memoised `[0, 1]` continuous variable for a degree key
    pub fn get_variable(&mut self, name: &str) -> Variable {
        self.get_typed_variable(name, VariableKind::Continuous, 0.0, 1.0)
    }

    /// Memoised binary variable
    pub fn get_binary_variable(&mut self, name: &str) -> Variable {
        self.get_typed_variable(name, VariableKind::Binary, 0.0, 1.0)
    }

    /// Memoised variable of any kind; the kind and bounds of the first request win
    pub fn get_typed_variable(
        &mut self,
        name: &str,
        kind: VariableKind,
        lower: f64,
        upper: f64,
    ) -> Variable {
        if let Some(variable) = self.by_name.get(name) {
            return *variable;
        }
        let variable = self.push(name.to_string(), kind, lower, upper);
        self.by_name.insert(name.to_string(), variable);
        variable
    }

    /// Variable for `name` if it has been requested before
    pub fn lookup(&self, name: &str) -> Option<Variable> {
        self.by_name.get(name).copied()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Anonymous variable, never shared
    pub fn new_variable(&mut self, kind: VariableKind, lower: f64, upper: f64) -> Variable {
        self.fresh_counter += 1;
        let prefix = match kind {
            VariableKind::Binary => "_b",
            VariableKind::Continuous => "_v",
            VariableKind::Integer => "_i",
        };
        let name = format!("{}{}", prefix, self.fresh_counter);
        self.push(name, kind, lower, upper)
    }

    pub fn new_binary(&mut self) -> Variable {
        self.new_variable(VariableKind::Binary, 0.0, 1.0)
    }

    /// Anonymous `[0, 1]` continuous variable
    pub fn new_degree_variable(&mut self) -> Variable {
        self.new_variable(VariableKind::Continuous, 0.0, 1.0)
    }

    fn push(&mut self, name: String, kind: VariableKind, lower: f64, upper: f64) -> Variable {
        let (lower, upper) = match kind {
            VariableKind::Binary => (0.0, 1.0),
            _ => (lower, upper),
        };
        let variable = Variable(self.variables.len());
        trace!("new variable {} = {} ({:?})", variable, name, kind);
        self.variables.push(VariableInfo {
            name,
            kind,
            lower,
            upper,
        });
        variable
    }

    /// Narrow the bounds of an existing variable
    pub fn restrict_bounds(&mut self, variable: Variable, lower: f64, upper: f64) {
        if let Some(info) = self.variables.get_mut(variable.index()) {
            info.lower = info.lower.max(lower);
            info.upper = info.upper.min(upper);
            if info.lower > info.upper + self.tolerance {
                self.trivially_infeasible = true;
            }
        }
    }

    pub fn info(&self, variable: Variable) -> Option<&VariableInfo> {
        self.variables.get(variable.index())
    }

    pub fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn constraints(&self) -> &[Inequation] {
        &self.constraints
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Record an inequation. Constraints without variables are evaluated on
    /// the spot: true ones are dropped, false ones mark the model infeasible.
    pub fn add_inequation(&mut self, inequation: Inequation) {
        match inequation.constant_truth(self.tolerance) {
            Some(true) => {}
            Some(false) => {
                debug!("constant constraint violated: {}", inequation);
                self.trivially_infeasible = true;
            }
            None => {
                trace!("constraint {}", inequation);
                self.constraints.push(inequation);
            }
        }
    }

    pub fn add_constraint(&mut self, lhs: Expression, kind: InequalityType, rhs: Expression) {
        self.add_inequation(Inequation::new(lhs, kind, rhs));
    }

    /// `lhs ≥ rhs`
    pub fn add_ge(&mut self, lhs: impl Into<Expression>, rhs: impl Into<Expression>) {
        self.add_constraint(lhs.into(), InequalityType::GreaterThan, rhs.into());
    }

    /// `lhs ≤ rhs`
    pub fn add_le(&mut self, lhs: impl Into<Expression>, rhs: impl Into<Expression>) {
        self.add_constraint(lhs.into(), InequalityType::LessThan, rhs.into());
    }

    /// `lhs = rhs`
    pub fn add_eq(&mut self, lhs: impl Into<Expression>, rhs: impl Into<Expression>) {
        self.add_constraint(lhs.into(), InequalityType::Equal, rhs.into());
    }

    /// A violated constant constraint or empty bound interval was recorded
    pub fn is_trivially_infeasible(&self) -> bool {
        self.trivially_infeasible
    }

    /// Minimised by [`MilpModel::solve`]
    pub fn set_objective(&mut self, objective: Option<Expression>) {
        self.objective = objective;
    }

    pub fn objective(&self) -> Option<&Expression> {
        self.objective.as_ref()
    }

    pub fn problem(&self) -> MilpProblem<'_> {
        MilpProblem {
            variables: &self.variables,
            constraints: &self.constraints,
            objective: self.objective.as_ref(),
        }
    }

    /// Least value of the objective over the variable bounds alone
    fn objective_floor(&self) -> f64 {
        let Some(objective) = &self.objective else {
            return 0.0;
        };
        objective.terms().iter().fold(objective.constant(), |acc, term| {
            let c = term.coefficient;
            let low = match self.variables.get(term.variable.index()) {
                _ if c == 0.0 => 0.0,
                Some(info) if c > 0.0 => c * info.lower,
                Some(info) => c * info.upper,
                None => f64::NEG_INFINITY,
            };
            acc + low
        })
    }

    /// Run `solver` on the model.
    ///
    /// Infeasibility is a regular answer ([`Solution::inconsistent`]); a
    /// solver time limit is an error since the answer is unknown.
    pub fn solve(&self, solver: &dyn MilpSolver) -> Result<Solution, MilpError> {
        if self.trivially_infeasible {
            debug!("model infeasible before optimisation");
            return Ok(Solution::inconsistent());
        }
        debug!(
            "solving model with {} variables and {} constraints",
            self.variables.len(),
            self.constraints.len()
        );
        match solver.optimize(&self.problem())? {
            SolverOutcome::Optimal { objective, values } => {
                let bindings: BTreeMap<String, f64> = self
                    .variables
                    .iter()
                    .zip(values.iter())
                    .filter(|(info, _)| !info.name.starts_with('_'))
                    .map(|(info, value)| (info.name.clone(), *value))
                    .collect();
                Ok(Solution::with_bindings(objective, bindings))
            }
            SolverOutcome::Infeasible => Ok(Solution::inconsistent()),
            SolverOutcome::Unbounded => Ok(Solution::unbounded(self.objective_floor())),
            SolverOutcome::TimeLimit => Err(MilpError::TimeLimit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_variables_are_memoised() {
        let mut model = MilpModel::new();
        let a = model.get_variable("a:C");
        let b = model.get_variable("a:D");
        let again = model.get_variable("a:C");
        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(model.num_variables(), 2);
    }

    #[test]
    fn test_fresh_variables_are_distinct() {
        let mut model = MilpModel::new();
        let x = model.new_binary();
        let y = model.new_binary();
        assert_ne!(x, y);
        assert_eq!(model.info(x).map(|i| i.kind), Some(VariableKind::Binary));
    }

    #[test]
    fn test_constant_constraints() {
        let mut model = MilpModel::new();
        model.add_ge(0.5, 0.2);
        assert_eq!(model.num_constraints(), 0);
        assert!(!model.is_trivially_infeasible());
        model.add_ge(0.2, 0.5);
        assert!(model.is_trivially_infeasible());
    }

    #[test]
    fn test_restrict_bounds_detects_empty_interval() {
        let mut model = MilpModel::new();
        let x = model.get_variable("x");
        model.restrict_bounds(x, 0.6, 1.0);
        assert!(!model.is_trivially_infeasible());
        model.restrict_bounds(x, 0.0, 0.4);
        assert!(model.is_trivially_infeasible());
    }
}
