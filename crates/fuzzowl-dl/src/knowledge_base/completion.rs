//! Completion rules
//!
//! Every `(individual, concept)` pair scheduled by an assertion is expanded
//! once. Deterministic rules run first; existential restrictions wait in a
//! separate queue so that labels are as complete as possible when blocking
//! is decided. Degrees attached to assertions are lower bounds: the rule of
//! `a : C` constrains `x(a:C)` from above by what the structure supports.

use super::encoding;
use super::{IndividualKind, KnowledgeBase};
use crate::concept::{expand_approximation, AggregationOperator, Concept, ConceptKind, LogicFamily, Weight};
use crate::config::Semantics;
use crate::FuzzyDlError;
use fuzzowl_core::{Degree, Expression, Variable};
use tracing::{debug, trace};

impl KnowledgeBase {
    /// Apply completion rules until no rule is applicable
    pub(crate) fn complete(&mut self) -> Result<(), FuzzyDlError> {
        let mut steps = 0usize;
        loop {
            if let Some((individual, concept)) = self.state.pending.pop_front() {
                steps += 1;
                if self.resolve(&individual) == individual {
                    self.apply_rule(&individual, &concept)?;
                }
                continue;
            }
            if let Some((individual, concept)) = self.state.generating.pop_front() {
                steps += 1;
                if self.resolve(&individual) == individual {
                    self.expand_existential(&individual, &concept)?;
                }
                continue;
            }
            if self.state.dynamic && self.release_unblocked() {
                continue;
            }
            break;
        }
        if steps > 0 {
            debug!(
                "completion applied {} rules: {} individuals, {} blocked restrictions, {} constraints",
                steps,
                self.individuals.len(),
                self.state.blocked_pending.len(),
                self.model.num_constraints()
            );
        }
        Ok(())
    }

    fn apply_rule(&mut self, a: &str, concept: &Concept) -> Result<(), FuzzyDlError> {
        if self.config.debug {
            trace!("rule for {} : {}", a, concept);
        }
        let z = self.membership(a, concept);
        match concept.kind() {
            ConceptKind::Top | ConceptKind::Bottom => Ok(()),
            ConceptKind::Atomic(name) => self.atomic_rule(a, name, z),
            ConceptKind::Not(inner) => {
                if inner.is_atomic() {
                    self.touch(a, inner);
                    Ok(())
                } else if inner.is_concrete() {
                    Err(misuse(inner, a))
                } else {
                    let v = self.exact_degree(a, inner)?;
                    self.model.add_le(z, Expression::new(1.0) - v);
                    Ok(())
                }
            }
            ConceptKind::And { family, operands } => self.conjunction_rule(a, *family, operands, z),
            ConceptKind::Or { family, operands } => self.disjunction_rule(a, *family, operands, z),
            ConceptKind::Implies {
                family,
                antecedent,
                consequent,
            } => self.implication_rule(a, *family, antecedent, consequent, z),
            ConceptKind::Some { role, .. } | ConceptKind::All { role, .. }
                if self.tbox.roles.feature(role).is_some() =>
            {
                let v = self.exact_degree(a, concept)?;
                self.model.add_le(z, v);
                Ok(())
            }
            ConceptKind::Some { .. } => {
                self.state
                    .generating
                    .push_back((a.to_string(), concept.clone()));
                Ok(())
            }
            ConceptKind::All { role, .. } => {
                self.state
                    .universals
                    .entry(a.to_string())
                    .or_default()
                    .push(concept.clone());
                let successors: Vec<String> = self
                    .individuals
                    .get(a)
                    .map(|node| node.successors(role).cloned().collect())
                    .unwrap_or_default();
                for b in successors {
                    self.apply_universal(a, concept, &b)?;
                }
                Ok(())
            }
            ConceptKind::HasValue { role, individual } => {
                self.ensure_individual(individual, IndividualKind::Named)?;
                let b = self.resolve(individual).to_string();
                self.relate(a, role, &b, Degree::Expression(z))
            }
            ConceptKind::SelfRestriction { role } => self.relate(a, role, a, Degree::Expression(z)),
            ConceptKind::Threshold { .. }
            | ConceptKind::Weighted { .. }
            | ConceptKind::Aggregation { .. }
            | ConceptKind::Qowa { .. }
            | ConceptKind::Modified { .. }
            | ConceptKind::SigmaCount { .. } => {
                let v = self.exact_degree(a, concept)?;
                self.model.add_le(z, v);
                Ok(())
            }
            ConceptKind::Approximation { kind, role, filler } => {
                let rewritten = expand_approximation(*kind, role, filler);
                self.assert_degree(a, &rewritten, Degree::Expression(z))
            }
            ConceptKind::Concrete { .. } | ConceptKind::FuzzyNumber(_) => Err(misuse(concept, a)),
        }
    }

    fn atomic_rule(&mut self, a: &str, name: &str, z: Expression) -> Result<(), FuzzyDlError> {
        let atom = Concept::atomic(name);
        if let Some(definition) = self.tbox.definitions.get(name).cloned() {
            self.assert_degree(a, &definition, Degree::Expression(z.clone()))?;
            let upper = Expression::new(1.0) - z.clone();
            self.assert_degree(a, &definition.negate(), Degree::Expression(upper))?;
        }
        for concept in self.tbox.primitives.get(name).cloned().unwrap_or_default() {
            self.assert_degree(a, &concept, Degree::Expression(z.clone()))?;
        }
        for inclusion in self.tbox.absorbed.get(name).cloned().unwrap_or_default() {
            // ⟨A ⊑ D, 1⟩ under a residuum is x(a:D) ≥ x(a:A)
            if inclusion.degree >= 1.0 && inclusion.family != LogicFamily::KleeneDienes {
                self.assert_degree(a, &inclusion.sup, Degree::Expression(z.clone()))?;
            } else {
                let implication = Concept::implies(inclusion.family, atom.clone(), inclusion.sup.clone())?;
                self.assert_degree(a, &implication, Degree::Numeric(inclusion.degree))?;
            }
        }
        let family = self.config.semantics.family();
        for other in self.tbox.disjoint.get(name).cloned().unwrap_or_default() {
            let both = Concept::and(family, vec![atom.clone(), Concept::atomic(other)])?;
            self.assert_degree(a, &both.negate(), Degree::one())?;
        }
        Ok(())
    }

    fn conjunction_rule(
        &mut self,
        a: &str,
        family: LogicFamily,
        operands: &[Concept],
        z: Expression,
    ) -> Result<(), FuzzyDlError> {
        if family.is_min_based() {
            for operand in operands {
                self.assert_degree(a, operand, Degree::Expression(z.clone()))?;
            }
            return Ok(());
        }
        // Σxᵢ − (n − 1) ≥ z unless z is switched off by y
        let n = operands.len() as f64;
        let mut sum = Expression::zero();
        for operand in operands {
            sum = sum + self.membership(a, operand);
            self.touch(a, operand);
        }
        let y = self.model.new_binary();
        self.model
            .add_ge(sum - (n - 1.0), z.clone() - Expression::from(y) * (n - 1.0));
        self.model.add_le(z, Expression::new(1.0) - y);
        Ok(())
    }

    fn disjunction_rule(
        &mut self,
        a: &str,
        family: LogicFamily,
        operands: &[Concept],
        z: Expression,
    ) -> Result<(), FuzzyDlError> {
        if family.is_min_based() {
            let mut selected = Expression::zero();
            for operand in operands {
                let m = self.membership(a, operand);
                self.touch(a, operand);
                let y = self.model.new_binary();
                self.model.add_le(z.clone(), m + 1.0 - y);
                selected = selected + y;
            }
            self.model.add_eq(selected, 1.0);
        } else {
            let mut sum = Expression::zero();
            for operand in operands {
                sum = sum + self.membership(a, operand);
                self.touch(a, operand);
            }
            self.model.add_le(z, sum);
        }
        Ok(())
    }

    fn implication_rule(
        &mut self,
        a: &str,
        family: LogicFamily,
        antecedent: &Concept,
        consequent: &Concept,
        z: Expression,
    ) -> Result<(), FuzzyDlError> {
        let negated = antecedent.negate();
        let not_c = self.membership(a, &negated);
        self.touch(a, &negated);
        let d = self.membership(a, consequent);
        self.touch(a, consequent);
        match family {
            LogicFamily::Lukasiewicz => self.model.add_le(z, not_c + d),
            LogicFamily::KleeneDienes | LogicFamily::Classical => {
                let y = self.model.new_binary();
                self.model.add_le(z.clone(), not_c + y);
                self.model.add_le(z, d + 1.0 - y);
            }
            LogicFamily::Goedel => {
                // y = 1: C ≤ D; y = 0: z ≤ D
                let y = self.model.new_binary();
                self.model.add_ge(not_c + d.clone(), y);
                self.model.add_le(z, d + y);
            }
            LogicFamily::Zadeh => {
                let y = self.model.new_binary();
                self.model.add_le(z, y);
                self.model.add_ge(not_c + d, y);
            }
        }
        Ok(())
    }

    /// Generating rule for `a : ∃r.C`
    fn expand_existential(&mut self, a: &str, concept: &Concept) -> Result<(), FuzzyDlError> {
        let (role, filler) = match concept.kind() {
            ConceptKind::Some { role, filler } => (role.clone(), filler.clone()),
            _ => return Ok(()),
        };
        if self.is_blocked(a) {
            trace!("{} is blocked, {} postponed", a, concept);
            self.state
                .blocked_pending
                .push((a.to_string(), concept.clone()));
            return Ok(());
        }
        let z = self.membership(a, concept);
        let existing = if self.tbox.roles.is_functional(&role) {
            self.individuals
                .get(a)
                .and_then(|node| node.successors(&role).next().cloned())
        } else {
            None
        };
        let b = match existing {
            Some(b) => b,
            None => self.create_individual(a, &role)?,
        };
        match self.config.semantics {
            Semantics::Lukasiewicz => {
                self.relate(a, &role, &b, Degree::zero())?;
                let b = self.resolve(&b).to_string();
                let r = self.relation_variable(a, &role, &b);
                let m = self.membership(&b, &filler);
                self.touch(&b, &filler);
                let y = self.model.new_binary();
                self.model.add_ge(m + r - 1.0, z.clone() - y);
                self.model.add_le(z, Expression::new(1.0) - y);
                Ok(())
            }
            Semantics::Zadeh | Semantics::Classical => {
                self.relate(a, &role, &b, Degree::Expression(z.clone()))?;
                let b = self.resolve(&b).to_string();
                self.assert_degree(&b, &filler, Degree::Expression(z))
            }
        }
    }

    /// `a : ∀r.C` applied along the edge `r(a, b)`
    fn apply_universal(&mut self, a: &str, universal: &Concept, b: &str) -> Result<(), FuzzyDlError> {
        let key = (a.to_string(), universal.clone(), b.to_string());
        if !self.state.applied.insert(key) {
            return Ok(());
        }
        let (role, filler) = match universal.kind() {
            ConceptKind::All { role, filler } => (role.clone(), filler.clone()),
            _ => return Ok(()),
        };
        let z = self.membership(a, universal);
        let r = self.relation_variable(a, &role, b);
        self.universal_constraint(z.clone(), r, b, &filler);
        if self.tbox.roles.is_transitive(&role) {
            self.universal_constraint(z, r, b, universal);
        }
        Ok(())
    }

    /// `z ≤ r ⇒ x(b:target)`
    fn universal_constraint(&mut self, z: Expression, r: Variable, b: &str, target: &Concept) {
        let m = self.membership(b, target);
        self.touch(b, target);
        match self.config.semantics {
            Semantics::Lukasiewicz => self.model.add_le(z, m + 1.0 - r),
            Semantics::Zadeh | Semantics::Classical => {
                let y = self.model.new_binary();
                self.model
                    .add_le(z.clone(), Expression::new(1.0) - r + y);
                self.model.add_le(z, m + 1.0 - y);
            }
        }
    }

    /// Add the edge `role(a, b) ≥ degree` and everything the role box
    /// derives from it.
    pub(crate) fn relate(&mut self, a: &str, role: &str, b: &str, degree: Degree) -> Result<(), FuzzyDlError> {
        let a = self.resolve(a).to_string();
        let b = self.resolve(b).to_string();
        self.ensure_individual(&a, IndividualKind::Named)?;
        self.ensure_individual(&b, IndividualKind::Named)?;

        if self.tbox.roles.is_functional(role) {
            let other = self
                .individuals
                .get(&a)
                .and_then(|node| node.successors(role).find(|t| **t != b).cloned());
            if let Some(other) = other {
                let (kept, dropped) = self.merge_order(&other, &b);
                self.merge(&kept, &dropped)?;
                return self.relate(&a, role, &kept, degree);
            }
        }
        if self.tbox.roles.is_inverse_functional(role) {
            let other = self
                .individuals
                .get(&b)
                .and_then(|node| node.predecessors(role).find(|s| **s != a).cloned());
            if let Some(other) = other {
                let (kept, dropped) = self.merge_order(&other, &a);
                self.merge(&kept, &dropped)?;
                return self.relate(&kept, role, &b, degree);
            }
        }

        let x = self.relation_variable(&a, role, &b);
        self.add_lower_bound(Expression::from(x), &degree);
        let is_new = match self.individuals.get_mut(&a) {
            Some(node) => node
                .successors
                .entry(role.to_string())
                .or_default()
                .insert(b.clone()),
            None => false,
        };
        if !is_new {
            return Ok(());
        }
        if let Some(node) = self.individuals.get_mut(&b) {
            node.predecessors
                .entry(role.to_string())
                .or_default()
                .insert(a.clone());
        }
        if self.config.debug {
            trace!("edge {}({}, {})", role, a, b);
        }

        for (parent, n) in self.tbox.roles.parents_of(role) {
            if n >= 1.0 {
                self.relate(&a, &parent, &b, Degree::Variable(x))?;
            } else if self.config.semantics == Semantics::Lukasiewicz {
                self.relate(&a, &parent, &b, Degree::Expression(Expression::from(x) + (n - 1.0)))?;
            } else {
                self.relate(&a, &parent, &b, Degree::zero())?;
                let s = self.relation_variable(&a, &parent, &b);
                self.min_lower_bound(s, Expression::from(x), Expression::new(n));
            }
        }
        for inverse in self.tbox.roles.inverses_of(role) {
            self.relate(&b, &inverse, &a, Degree::Variable(x))?;
        }
        if self.tbox.roles.is_symmetric(role) {
            self.relate(&b, role, &a, Degree::Variable(x))?;
        }
        if self.tbox.roles.is_transitive(role) {
            self.close_transitive(&a, role, &b, x)?;
        }
        let domains = self.tbox.roles.domains.get(role).cloned().unwrap_or_default();
        for concept in domains {
            self.assert_degree(&a, &concept, Degree::Variable(x))?;
        }
        let ranges = self.tbox.roles.ranges.get(role).cloned().unwrap_or_default();
        for concept in ranges {
            self.assert_degree(&b, &concept, Degree::Variable(x))?;
        }
        let universals: Vec<Concept> = self
            .state
            .universals
            .get(&a)
            .map(|all| {
                all.iter()
                    .filter(|c| matches!(c.kind(), ConceptKind::All { role: r, .. } if r == role))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for universal in universals {
            self.apply_universal(&a, &universal, &b)?;
        }
        Ok(())
    }

    /// Transitive closure between named individuals; created individuals are
    /// covered by the propagation of universal restrictions.
    fn close_transitive(&mut self, a: &str, role: &str, b: &str, x: Variable) -> Result<(), FuzzyDlError> {
        let named = |kb: &KnowledgeBase, n: &str| kb.individuals.get(n).map(|i| i.is_named()).unwrap_or(false);
        if !named(self, a) || !named(self, b) {
            return Ok(());
        }
        let forward: Vec<String> = self
            .individuals
            .get(b)
            .map(|node| node.successors(role).filter(|c| named(self, c)).cloned().collect())
            .unwrap_or_default();
        for c in forward {
            let next = self.relation_variable(b, role, &c);
            self.chain(a, role, &c, x, next)?;
        }
        let backward: Vec<String> = self
            .individuals
            .get(a)
            .map(|node| node.predecessors(role).filter(|p| named(self, p)).cloned().collect())
            .unwrap_or_default();
        for p in backward {
            let previous = self.relation_variable(&p, role, a);
            self.chain(&p, role, b, previous, x)?;
        }
        Ok(())
    }

    /// `role(a, c) ≥ t(first, second)`
    fn chain(&mut self, a: &str, role: &str, c: &str, first: Variable, second: Variable) -> Result<(), FuzzyDlError> {
        match self.config.semantics {
            Semantics::Lukasiewicz => {
                let degree = Expression::from(first) + second - 1.0;
                self.relate(a, role, c, Degree::Expression(degree))
            }
            Semantics::Zadeh | Semantics::Classical => {
                self.relate(a, role, c, Degree::zero())?;
                let target = self.relation_variable(a, role, c);
                self.min_lower_bound(target, Expression::from(first), Expression::from(second));
                Ok(())
            }
        }
    }

    /// `target ≥ min(first, second)`
    fn min_lower_bound(&mut self, target: Variable, first: Expression, second: Expression) {
        let y = self.model.new_binary();
        self.model.add_ge(target, first - y);
        self.model.add_ge(target, second - 1.0 + y);
    }

    /// Named individuals survive merges; otherwise the older node stays
    fn merge_order(&self, existing: &str, incoming: &str) -> (String, String) {
        let incoming_named = self.individuals.get(incoming).map(|i| i.is_named()).unwrap_or(false);
        let existing_named = self.individuals.get(existing).map(|i| i.is_named()).unwrap_or(false);
        if incoming_named && !existing_named {
            (incoming.to_string(), existing.to_string())
        } else {
            (existing.to_string(), incoming.to_string())
        }
    }

    /// Expression equal to the degree of `a : concept` in every model
    pub(crate) fn exact_degree(&mut self, a: &str, concept: &Concept) -> Result<Expression, FuzzyDlError> {
        match concept.kind() {
            ConceptKind::Top => return Ok(Expression::new(1.0)),
            ConceptKind::Bottom => return Ok(Expression::zero()),
            ConceptKind::Atomic(_) => {
                self.touch(a, concept);
                return Ok(self.membership(a, concept));
            }
            ConceptKind::Not(inner) if inner.is_atomic() => {
                self.touch(a, inner);
                return Ok(self.membership(a, concept));
            }
            _ => {}
        }
        let key = (a.to_string(), concept.clone());
        if let Some(cached) = self.state.exact.get(&key) {
            return Ok(cached.clone());
        }
        let epsilon = self.config.epsilon;
        let value = match concept.kind() {
            ConceptKind::Some { role, filler } | ConceptKind::All { role, filler }
                if self.tbox.roles.feature(role).is_some() =>
            {
                self.concrete_degree(a, role, filler)?
            }
            ConceptKind::Not(inner) if has_direct_encoding(inner) => {
                Expression::new(1.0) - self.exact_degree(a, inner)?
            }
            ConceptKind::HasValue { role, individual } => {
                self.ensure_individual(individual, IndividualKind::Named)?;
                let b = self.resolve(individual).to_string();
                self.relate(a, role, &b, Degree::zero())?;
                let a = self.resolve(a).to_string();
                Expression::from(self.relation_variable(&a, role, &b))
            }
            ConceptKind::SelfRestriction { role } => {
                self.relate(a, role, a, Degree::zero())?;
                let a = self.resolve(a).to_string();
                Expression::from(self.relation_variable(&a, role, &a))
            }
            ConceptKind::Implies {
                family: LogicFamily::Goedel,
                antecedent,
                consequent,
            } => {
                let c = self.exact_degree(a, antecedent)?;
                let d = self.exact_degree(a, consequent)?;
                encoding::goedel_implication(&mut self.model, c, d, epsilon)
            }
            ConceptKind::Implies {
                family: LogicFamily::Zadeh,
                antecedent,
                consequent,
            } => {
                let c = self.exact_degree(a, antecedent)?;
                let d = self.exact_degree(a, consequent)?;
                encoding::less_or_equal(&mut self.model, c, d, epsilon)
            }
            ConceptKind::Threshold {
                kind,
                weight,
                filler,
            } => {
                let value = self.exact_degree(a, filler)?;
                let weight = match weight {
                    Weight::Value(w) => Expression::new(*w),
                    Weight::Variable(name) => Expression::from(self.model.get_variable(name)),
                };
                encoding::threshold(&mut self.model, value, weight, *kind, epsilon)
            }
            ConceptKind::Weighted { weight, filler } => self.exact_degree(a, filler)? * *weight,
            ConceptKind::Aggregation {
                operator,
                weights,
                operands,
            } => {
                let values = self.exact_degrees(a, operands)?;
                self.aggregate(*operator, weights, values)
            }
            ConceptKind::Qowa {
                quantifier,
                operands,
            } => {
                let weights = quantifier.weights(operands.len());
                let values = self.exact_degrees(a, operands)?;
                self.aggregate(AggregationOperator::Owa, &weights, values)
            }
            ConceptKind::Modified { modifier, filler } => {
                let value = self.exact_degree(a, filler)?;
                encoding::piecewise(&mut self.model, value, &modifier.breakpoints())
            }
            ConceptKind::SigmaCount {
                role,
                filler,
                individuals,
                function,
            } => self.sigma_count(a, role, filler, individuals, function)?,
            ConceptKind::Approximation { kind, role, filler } => {
                self.exact_degree(a, &expand_approximation(*kind, role, filler))?
            }
            _ => {
                // rules bound the degree from below, the negation from above
                let v = self.membership(a, concept);
                self.touch(a, concept);
                let upper = Expression::new(1.0) - v.clone();
                self.assert_degree(a, &concept.negate(), Degree::Expression(upper))?;
                v
            }
        };
        self.state.exact.insert(key, value.clone());
        Ok(value)
    }

    fn exact_degrees(&mut self, a: &str, concepts: &[Concept]) -> Result<Vec<Expression>, FuzzyDlError> {
        concepts.iter().map(|c| self.exact_degree(a, c)).collect()
    }

    fn aggregate(&mut self, operator: AggregationOperator, weights: &[f64], values: Vec<Expression>) -> Expression {
        let model = &mut self.model;
        match operator {
            AggregationOperator::WeightedSum => weighted_sum(weights, &values),
            AggregationOperator::WeightedSumZero => {
                // t = 1 iff every operand is positive
                let t = model.new_binary();
                let mut positives = Expression::zero();
                for value in &values {
                    let y = model.new_binary();
                    model.add_le(value.clone(), y);
                    model.add_ge(value.clone(), Expression::from(y) * self.config.epsilon);
                    model.add_le(t, y);
                    positives = positives + y;
                }
                model.add_ge(Expression::from(t), positives - (values.len() as f64 - 1.0));
                encoding::gated(model, weighted_sum(weights, &values), Expression::from(t))
            }
            AggregationOperator::WeightedMax => {
                let terms: Vec<Expression> = weights
                    .iter()
                    .zip(values)
                    .map(|(w, v)| encoding::exact_min(model, &[Expression::new(*w), v]))
                    .collect();
                encoding::exact_max(model, &terms)
            }
            AggregationOperator::WeightedMin => {
                let terms: Vec<Expression> = weights
                    .iter()
                    .zip(values)
                    .map(|(w, v)| encoding::exact_max(model, &[Expression::new(1.0 - w), v]))
                    .collect();
                encoding::exact_min(model, &terms)
            }
            AggregationOperator::Owa => {
                let sorted = encoding::sorted_descending(model, &values);
                weighted_sum(weights, &sorted)
            }
            AggregationOperator::Choquet => {
                let sorted = encoding::sorted_descending(model, &values);
                let mut result = Expression::zero();
                for (j, w) in weights.iter().enumerate() {
                    let next = sorted.get(j + 1).cloned().unwrap_or_else(Expression::zero);
                    result = result + (sorted[j].clone() - next) * *w;
                }
                result
            }
            AggregationOperator::Sugeno => {
                let sorted = encoding::sorted_descending(model, &values);
                let terms: Vec<Expression> = weights
                    .iter()
                    .zip(sorted)
                    .map(|(w, s)| encoding::exact_min(model, &[s, Expression::new(*w)]))
                    .collect();
                encoding::exact_max(model, &terms)
            }
            AggregationOperator::QuasiSugeno => {
                let sorted = encoding::sorted_descending(model, &values);
                let terms: Vec<Expression> = weights.iter().zip(sorted).map(|(w, s)| s * *w).collect();
                encoding::exact_max(model, &terms)
            }
        }
    }

    /// Degree of `a : ∃F.D` for a concrete feature `F`; the feature is
    /// functional, so the universal restriction has the same degree.
    fn concrete_degree(&mut self, a: &str, feature: &str, filler: &Concept) -> Result<Expression, FuzzyDlError> {
        let (positive, inner) = match filler.kind() {
            ConceptKind::Not(inner) => (false, inner.clone()),
            _ => (true, filler.clone()),
        };
        let range = self
            .tbox
            .roles
            .feature(feature)
            .cloned()
            .ok_or_else(|| FuzzyDlError::Undefined {
                kind: "concrete feature",
                name: feature.to_string(),
            })?;
        let points = match inner.kind() {
            ConceptKind::Concrete { function, .. } => {
                encoding::cover_range(&function.breakpoints(), range.k1, range.k2)
            }
            ConceptKind::FuzzyNumber(number) => number.breakpoints(range.k1, range.k2),
            _ => {
                return Err(FuzzyDlError::ConcreteMisuse(format!(
                    "abstract concept {} used with concrete feature {}",
                    inner, feature
                )))
            }
        };
        let x = self.feature_variable(a, feature)?;
        let mu = encoding::piecewise(&mut self.model, Expression::from(x), &points);
        Ok(if positive { mu } else { Expression::new(1.0) - mu })
    }

    fn sigma_count(
        &mut self,
        a: &str,
        role: &str,
        filler: &Concept,
        individuals: &[String],
        function: &crate::membership::MembershipFunction,
    ) -> Result<Expression, FuzzyDlError> {
        let mut count = Expression::zero();
        for name in individuals {
            self.ensure_individual(name, IndividualKind::Named)?;
            let b = self.resolve(name).to_string();
            self.relate(a, role, &b, Degree::zero())?;
            let source = self.resolve(a).to_string();
            let r = Expression::from(self.relation_variable(&source, role, &b));
            let c = self.exact_degree(&b, filler)?;
            let both = match self.config.semantics {
                Semantics::Lukasiewicz => {
                    encoding::exact_max(&mut self.model, &[Expression::zero(), r + c - 1.0])
                }
                Semantics::Zadeh | Semantics::Classical => encoding::exact_min(&mut self.model, &[r, c]),
            };
            count = count + both;
        }
        let (k1, k2) = function.domain();
        let points = encoding::cover_range(
            &function.breakpoints(),
            k1.min(0.0),
            k2.max(individuals.len() as f64),
        );
        Ok(encoding::piecewise(&mut self.model, count, &points))
    }
}

fn weighted_sum(weights: &[f64], values: &[Expression]) -> Expression {
    weights
        .iter()
        .zip(values)
        .fold(Expression::zero(), |acc, (w, v)| acc + v.clone() * *w)
}

/// Constructs whose degree is computed directly from exact operand degrees
fn has_direct_encoding(concept: &Concept) -> bool {
    matches!(
        concept.kind(),
        ConceptKind::HasValue { .. }
            | ConceptKind::SelfRestriction { .. }
            | ConceptKind::Threshold { .. }
            | ConceptKind::Weighted { .. }
            | ConceptKind::Aggregation { .. }
            | ConceptKind::Qowa { .. }
            | ConceptKind::Modified { .. }
            | ConceptKind::SigmaCount { .. }
            | ConceptKind::Implies {
                family: LogicFamily::Goedel | LogicFamily::Zadeh,
                ..
            }
    )
}

fn misuse(concept: &Concept, individual: &str) -> FuzzyDlError {
    FuzzyDlError::ConcreteMisuse(format!(
        "concrete concept {} asserted on {} outside a concrete feature",
        concept, individual
    ))
}
