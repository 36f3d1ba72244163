//! Built-in MILP solver: dense two-phase simplex with Bland's rule inside a
//! depth-first branch-and-bound.

use crate::linear::InequalityType;
use crate::milp::VariableKind;
use crate::solver::{MilpProblem, MilpSolver, SolverConfig, SolverOutcome};
use crate::MilpError;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Feasibility slack accepted at the end of phase one
const PHASE_ONE_TOLERANCE: f64 = 1e-7;

/// Default solver used by the reasoner
#[derive(Debug, Clone, Default)]
pub struct SimplexSolver {
    config: SolverConfig,
}

impl SimplexSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

/// Result of one LP relaxation
#[derive(Debug, Clone, PartialEq)]
enum LpOutcome {
    Optimal(Vec<f64>),
    Infeasible,
    Unbounded,
}

/// How an original variable maps onto non-negative tableau columns:
/// `x = offset + sign·pos − neg`
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    offset: f64,
    pos: Option<(usize, f64)>,
    neg: Option<usize>,
}

/// A constraint row over tableau columns before slack handling
struct Row {
    coefficients: Vec<f64>,
    kind: InequalityType,
    rhs: f64,
}

struct Tableau {
    rows: Vec<Vec<f64>>,
    basis: Vec<usize>,
    /// Reduced costs; the last entry holds minus the objective value
    costs: Vec<f64>,
    width: usize,
}

impl Tableau {
    fn rhs(&self, row: usize) -> f64 {
        self.rows[row][self.width]
    }

    fn pivot(&mut self, row: usize, column: usize) {
        let pivot = self.rows[row][column];
        for value in self.rows[row].iter_mut() {
            *value /= pivot;
        }
        let pivot_row = self.rows[row].clone();
        for (i, current) in self.rows.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = current[column];
            if factor != 0.0 {
                for (value, p) in current.iter_mut().zip(pivot_row.iter()) {
                    *value -= factor * p;
                }
            }
        }
        let factor = self.costs[column];
        if factor != 0.0 {
            for (value, p) in self.costs.iter_mut().zip(pivot_row.iter()) {
                *value -= factor * p;
            }
        }
        self.basis[row] = column;
    }

    /// Reduced costs of `cost` against the current basis
    fn price(&mut self, cost: &[f64]) {
        let mut costs = vec![0.0; self.width + 1];
        costs[..cost.len()].copy_from_slice(cost);
        for (row, &basic) in self.rows.iter().zip(self.basis.iter()) {
            let cb = cost.get(basic).copied().unwrap_or(0.0);
            if cb != 0.0 {
                for (value, r) in costs.iter_mut().zip(row.iter()) {
                    *value -= cb * r;
                }
            }
        }
        self.costs = costs;
    }

    /// Primal simplex with Bland's rule over columns `< allowed`.
    /// Returns `false` when the objective is unbounded.
    fn iterate(
        &mut self,
        allowed: usize,
        tolerance: f64,
        pivots: &mut usize,
        max_pivots: usize,
    ) -> Result<bool, MilpError> {
        loop {
            let entering = (0..allowed).find(|&j| self.costs[j] < -tolerance);
            let column = match entering {
                Some(column) => column,
                None => return Ok(true),
            };

            let mut leaving: Option<(usize, f64)> = None;
            for i in 0..self.rows.len() {
                let a = self.rows[i][column];
                if a > tolerance {
                    let ratio = self.rhs(i) / a;
                    leaving = match leaving {
                        None => Some((i, ratio)),
                        Some((best, best_ratio)) => {
                            if ratio < best_ratio - tolerance
                                || (ratio <= best_ratio + tolerance
                                    && self.basis[i] < self.basis[best])
                            {
                                Some((i, ratio))
                            } else {
                                Some((best, best_ratio))
                            }
                        }
                    };
                }
            }
            let row = match leaving {
                Some((row, _)) => row,
                None => return Ok(false),
            };

            *pivots += 1;
            if *pivots > max_pivots {
                return Err(MilpError::SolverError(format!(
                    "simplex exceeded {} pivots",
                    max_pivots
                )));
            }
            self.pivot(row, column);
        }
    }
}

impl SimplexSolver {
    /// Solve the LP relaxation of `problem` under the given bounds
    fn solve_relaxation(
        &self,
        problem: &MilpProblem<'_>,
        lower: &[f64],
        upper: &[f64],
    ) -> Result<LpOutcome, MilpError> {
        let tolerance = self.config.tolerance;
        let n = problem.variables.len();

        // Column layout of the structural variables
        let mut maps = Vec::with_capacity(n);
        let mut columns = 0usize;
        let mut bound_rows: Vec<(usize, f64)> = Vec::new();
        for j in 0..n {
            let (l, u) = (lower[j], upper[j]);
            if l > u + PHASE_ONE_TOLERANCE {
                return Ok(LpOutcome::Infeasible);
            }
            let map = if l.is_finite() && u.is_finite() && (u - l).abs() <= tolerance {
                ColumnMap { offset: l, pos: None, neg: None }
            } else if l.is_finite() {
                let column = columns;
                columns += 1;
                if u.is_finite() {
                    bound_rows.push((column, u - l));
                }
                ColumnMap { offset: l, pos: Some((column, 1.0)), neg: None }
            } else if u.is_finite() {
                let column = columns;
                columns += 1;
                ColumnMap { offset: u, pos: Some((column, -1.0)), neg: None }
            } else {
                let column = columns;
                columns += 2;
                ColumnMap { offset: 0.0, pos: Some((column, 1.0)), neg: Some(column + 1) }
            };
            maps.push(map);
        }
        let structural = columns;

        // Constraint rows over structural columns
        let mut rows: Vec<Row> = Vec::new();
        for inequation in problem.constraints {
            let mut coefficients = vec![0.0; structural];
            let mut rhs = inequation.rhs();
            for term in inequation.expression().terms() {
                let map = &maps[term.variable.index()];
                rhs -= term.coefficient * map.offset;
                if let Some((column, sign)) = map.pos {
                    coefficients[column] += term.coefficient * sign;
                }
                if let Some(column) = map.neg {
                    coefficients[column] -= term.coefficient;
                }
            }
            if coefficients.iter().all(|c| c.abs() <= tolerance) {
                let holds = match inequation.kind() {
                    InequalityType::LessThan => 0.0 <= rhs + PHASE_ONE_TOLERANCE,
                    InequalityType::GreaterThan => 0.0 >= rhs - PHASE_ONE_TOLERANCE,
                    InequalityType::Equal => rhs.abs() <= PHASE_ONE_TOLERANCE,
                };
                if holds {
                    continue;
                }
                return Ok(LpOutcome::Infeasible);
            }
            rows.push(Row { coefficients, kind: inequation.kind(), rhs });
        }
        for (column, width) in bound_rows {
            let mut coefficients = vec![0.0; structural];
            coefficients[column] = 1.0;
            rows.push(Row { coefficients, kind: InequalityType::LessThan, rhs: width });
        }

        // Normalise to non-negative right-hand sides
        for row in rows.iter_mut() {
            if row.rhs < 0.0 {
                row.rhs = -row.rhs;
                for c in row.coefficients.iter_mut() {
                    *c = -*c;
                }
                row.kind = row.kind.flipped();
            }
        }

        let slacks = rows
            .iter()
            .filter(|r| r.kind != InequalityType::Equal)
            .count();
        let artificials = rows
            .iter()
            .filter(|r| r.kind != InequalityType::LessThan)
            .count();
        let artificial_start = structural + slacks;
        let width = artificial_start + artificials;

        let mut tableau = Tableau {
            rows: Vec::with_capacity(rows.len()),
            basis: Vec::with_capacity(rows.len()),
            costs: Vec::new(),
            width,
        };
        let mut next_slack = structural;
        let mut next_artificial = artificial_start;
        for row in &rows {
            let mut line = vec![0.0; width + 1];
            line[..structural].copy_from_slice(&row.coefficients);
            line[width] = row.rhs;
            match row.kind {
                InequalityType::LessThan => {
                    line[next_slack] = 1.0;
                    tableau.basis.push(next_slack);
                    next_slack += 1;
                }
                InequalityType::GreaterThan => {
                    line[next_slack] = -1.0;
                    next_slack += 1;
                    line[next_artificial] = 1.0;
                    tableau.basis.push(next_artificial);
                    next_artificial += 1;
                }
                InequalityType::Equal => {
                    line[next_artificial] = 1.0;
                    tableau.basis.push(next_artificial);
                    next_artificial += 1;
                }
            }
            tableau.rows.push(line);
        }

        let mut pivots = 0usize;
        let max_pivots = self.config.max_pivots;

        // Phase one: minimise the sum of artificials
        if artificials > 0 {
            let mut phase_one = vec![0.0; width];
            for c in phase_one.iter_mut().skip(artificial_start) {
                *c = 1.0;
            }
            tableau.price(&phase_one);
            tableau.iterate(width, tolerance, &mut pivots, max_pivots)?;
            let infeasibility = -tableau.costs[width];
            if infeasibility > PHASE_ONE_TOLERANCE {
                return Ok(LpOutcome::Infeasible);
            }

            // Drive remaining artificials out of the basis
            let mut redundant = Vec::new();
            for row in 0..tableau.rows.len() {
                if tableau.basis[row] < artificial_start {
                    continue;
                }
                let replacement =
                    (0..artificial_start).find(|&j| tableau.rows[row][j].abs() > tolerance);
                match replacement {
                    Some(column) => tableau.pivot(row, column),
                    None => redundant.push(row),
                }
            }
            for row in redundant.into_iter().rev() {
                tableau.rows.remove(row);
                tableau.basis.remove(row);
            }
        }

        // Phase two over the real objective
        let mut cost = vec![0.0; width];
        if let Some(objective) = problem.objective {
            for term in objective.terms() {
                let map = &maps[term.variable.index()];
                if let Some((column, sign)) = map.pos {
                    cost[column] += term.coefficient * sign;
                }
                if let Some(column) = map.neg {
                    cost[column] -= term.coefficient;
                }
            }
        }
        tableau.price(&cost);
        if !tableau.iterate(artificial_start, tolerance, &mut pivots, max_pivots)? {
            return Ok(LpOutcome::Unbounded);
        }

        let mut column_values = vec![0.0; width];
        for (row, &basic) in tableau.basis.iter().enumerate() {
            column_values[basic] = tableau.rhs(row);
        }
        let values = maps
            .iter()
            .map(|map| {
                let mut value = map.offset;
                if let Some((column, sign)) = map.pos {
                    value += sign * column_values[column];
                }
                if let Some(column) = map.neg {
                    value -= column_values[column];
                }
                value
            })
            .collect();
        trace!("relaxation solved in {} pivots", pivots);
        Ok(LpOutcome::Optimal(values))
    }

    /// Integral variable with the most fractional value
    fn branching_variable(
        &self,
        problem: &MilpProblem<'_>,
        values: &[f64],
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for (j, info) in problem.variables.iter().enumerate() {
            if !info.is_integral() {
                continue;
            }
            let value = values[j];
            let fraction = (value - value.floor()).min(value.ceil() - value);
            if fraction > self.config.integrality_tolerance
                && best.map(|(_, _, f)| fraction > f).unwrap_or(true)
            {
                best = Some((j, value, fraction));
            }
        }
        best.map(|(j, value, _)| (j, value))
    }
}

impl MilpSolver for SimplexSolver {
    fn optimize(&self, problem: &MilpProblem<'_>) -> Result<SolverOutcome, MilpError> {
        let n = problem.variables.len();
        let foreign = problem
            .constraints
            .iter()
            .map(|c| c.expression())
            .chain(problem.objective)
            .flat_map(|e| e.terms().iter())
            .find(|t| t.variable.index() >= n);
        if let Some(term) = foreign {
            return Err(MilpError::InvalidModel(format!(
                "variable {} is not in the pool of {} variables",
                term.variable, n
            )));
        }

        let started = Instant::now();
        let deadline = self.config.time_limit_ms.map(Duration::from_millis);

        let mut lower = Vec::with_capacity(problem.variables.len());
        let mut upper = Vec::with_capacity(problem.variables.len());
        for info in problem.variables {
            let (l, u) = match info.kind {
                VariableKind::Binary => (info.lower.max(0.0), info.upper.min(1.0)),
                VariableKind::Integer => (info.lower.ceil(), info.upper.floor()),
                VariableKind::Continuous => (info.lower, info.upper),
            };
            lower.push(l);
            upper.push(u);
        }

        let feasibility_only = problem.objective.is_none();
        let mut stack = vec![(lower, upper)];
        let mut incumbent: Option<(f64, Vec<f64>)> = None;
        let mut nodes = 0usize;

        while let Some((lower, upper)) = stack.pop() {
            nodes += 1;
            if nodes > self.config.max_nodes
                || deadline.map(|d| started.elapsed() > d).unwrap_or(false)
            {
                debug!("branch-and-bound stopped after {} nodes", nodes - 1);
                return Ok(SolverOutcome::TimeLimit);
            }

            let values = match self.solve_relaxation(problem, &lower, &upper)? {
                LpOutcome::Infeasible => continue,
                LpOutcome::Unbounded => return Ok(SolverOutcome::Unbounded),
                LpOutcome::Optimal(values) => values,
            };
            let objective = problem
                .objective
                .map(|o| o.evaluate(&values))
                .unwrap_or(0.0);
            if let Some((best, _)) = &incumbent {
                if objective >= best - self.config.tolerance {
                    continue;
                }
            }

            match self.branching_variable(problem, &values) {
                None => {
                    incumbent = Some((objective, values));
                    if feasibility_only {
                        break;
                    }
                }
                Some((j, value)) => {
                    let mut down = (lower.clone(), upper.clone());
                    down.1[j] = value.floor();
                    let mut up = (lower, upper);
                    up.0[j] = value.ceil();
                    // the branch closer to the relaxed value is explored first
                    if value - value.floor() > 0.5 {
                        stack.push(down);
                        stack.push(up);
                    } else {
                        stack.push(up);
                        stack.push(down);
                    }
                }
            }
        }

        debug!("branch-and-bound explored {} nodes", nodes);
        Ok(match incumbent {
            Some((objective, mut values)) => {
                for (value, info) in values.iter_mut().zip(problem.variables.iter()) {
                    if info.is_integral() {
                        *value = value.round();
                    }
                }
                SolverOutcome::Optimal { objective, values }
            }
            None => SolverOutcome::Infeasible,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::{Expression, Term};
    use crate::milp::MilpModel;

    fn solve(model: &MilpModel) -> SolverOutcome {
        SimplexSolver::default()
            .optimize(&model.problem())
            .expect("solver error")
    }

    fn optimum(model: &MilpModel) -> (f64, Vec<f64>) {
        match solve(model) {
            SolverOutcome::Optimal { objective, values } => (objective, values),
            other => panic!("expected optimum, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_lp() {
        // max x + y  s.t. x + 2y <= 1, x <= 0.6
        let mut model = MilpModel::new();
        let x = model.get_variable("x");
        let y = model.get_variable("y");
        model.add_le(Expression::from(x) + Term::new(2.0, y), 1.0);
        model.add_le(x, 0.6);
        model.set_objective(Some(-(Expression::from(x) + y)));
        let (objective, values) = optimum(&model);
        assert!((objective + 0.8).abs() < 1e-9);
        assert!((values[x.index()] - 0.6).abs() < 1e-9);
        assert!((values[y.index()] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_ge_and_equality_rows() {
        // min x  s.t. x + y = 1, y <= 0.3
        let mut model = MilpModel::new();
        let x = model.get_variable("x");
        let y = model.get_variable("y");
        model.add_eq(Expression::from(x) + y, 1.0);
        model.add_le(y, 0.3);
        model.set_objective(Some(Expression::from(x)));
        let (objective, _) = optimum(&model);
        assert!((objective - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible() {
        let mut model = MilpModel::new();
        let x = model.get_variable("x");
        model.add_ge(x, 0.8);
        model.add_le(x, 0.3);
        assert_eq!(solve(&model), SolverOutcome::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let mut model = MilpModel::new();
        let x = model.get_typed_variable("x", VariableKind::Continuous, 0.0, f64::INFINITY);
        model.add_ge(x, 1.0);
        model.set_objective(Some(-Expression::from(x)));
        assert_eq!(solve(&model), SolverOutcome::Unbounded);
    }

    #[test]
    fn test_free_variable() {
        let mut model = MilpModel::new();
        let x = model.get_typed_variable("x", VariableKind::Continuous, f64::NEG_INFINITY, f64::INFINITY);
        model.add_ge(x, -3.5);
        model.set_objective(Some(Expression::from(x)));
        let (objective, _) = optimum(&model);
        assert!((objective + 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_binary_branching() {
        // max z  s.t. z <= x + 1 - y, z <= 0.4 + y, y binary, x <= 0.2
        let mut model = MilpModel::new();
        let x = model.get_variable("x");
        let z = model.get_variable("z");
        let y = model.new_binary();
        model.add_le(x, 0.2);
        model.add_le(z, Expression::from(x) + 1.0 - y);
        model.add_le(z, Expression::new(0.4) + y);
        model.set_objective(Some(-Expression::from(z)));
        let (objective, values) = optimum(&model);
        assert!((objective + 0.4).abs() < 1e-9);
        assert!(values[y.index()] == 0.0 || values[y.index()] == 1.0);
    }

    #[test]
    fn test_integer_infeasible() {
        // 2b = 1 has no binary solution
        let mut model = MilpModel::new();
        let b = model.new_binary();
        model.add_eq(Expression::from(b) * 2.0, 1.0);
        assert_eq!(solve(&model), SolverOutcome::Infeasible);
    }

    #[test]
    fn test_node_limit_reports_time_limit() {
        let mut model = MilpModel::new();
        let b = model.new_binary();
        model.add_eq(Expression::from(b) * 2.0, 1.0);
        let solver = SimplexSolver::new(SolverConfig {
            max_nodes: 1,
            ..SolverConfig::default()
        });
        let outcome = solver.optimize(&model.problem()).expect("solver error");
        assert_eq!(outcome, SolverOutcome::TimeLimit);
    }
}
