//! Blocking of created individuals
//!
//! Only created individuals are blocked, and only by created ancestors.
//! A blocked node postpones its existential restrictions; when completion
//! ends, the quantified labels of a directly blocked node are bounded by the
//! degrees of its blocker, so the blocker's successors can stand in for the
//! ones that were never generated.

use super::KnowledgeBase;
use crate::concept::ConceptKind;
use crate::config::BlockingType;
use tracing::{debug, trace};

impl KnowledgeBase {
    /// Blocking type in force; inverse or symmetric roles require pairwise blocking
    pub(crate) fn effective_blocking(&self) -> BlockingType {
        match self.config.blocking {
            BlockingType::NoBlocking => BlockingType::NoBlocking,
            _ if self.tbox.roles.needs_pairwise_blocking() => BlockingType::Pairwise,
            other => other,
        }
    }

    /// Whether `name` is directly or indirectly blocked
    pub(crate) fn is_blocked(&mut self, name: &str) -> bool {
        if self.effective_blocking() == BlockingType::NoBlocking {
            return false;
        }
        if !self.individuals.get(name).map(|i| i.is_created()).unwrap_or(false) {
            return false;
        }
        let dynamic = self.state.dynamic;
        if !dynamic && self.state.blocked.contains_key(name) {
            return true;
        }
        if let Some(blocker) = self.find_blocker(name) {
            debug!("{} blocked by {}", name, blocker);
            if !dynamic {
                self.state.blocked.insert(name.to_string(), blocker);
            }
            return true;
        }
        // indirect
        for ancestor in self.created_ancestors(name) {
            if !dynamic && self.state.blocked.contains_key(&ancestor) {
                return true;
            }
            if dynamic && self.find_blocker(&ancestor).is_some() {
                return true;
            }
        }
        false
    }

    /// Closest created ancestor whose labels block `name`
    pub(crate) fn find_blocker(&self, name: &str) -> Option<String> {
        let node = self.individuals.get(name)?;
        if !node.is_created() {
            return None;
        }
        let kind = self.effective_blocking();
        self.created_ancestors(name).into_iter().find(|candidate| {
            let other = match self.individuals.get(candidate) {
                Some(other) => other,
                None => return false,
            };
            match kind {
                BlockingType::NoBlocking => false,
                BlockingType::Subset => node.labels.is_subset(&other.labels),
                BlockingType::Set => node.labels == other.labels,
                BlockingType::Pairwise => {
                    node.labels == other.labels
                        && generating_role(node) == generating_role(other)
                        && self.parent_labels_match(node.parent(), other.parent())
                }
            }
        })
    }

    fn parent_labels_match(&self, first: Option<&str>, second: Option<&str>) -> bool {
        match (first, second) {
            (Some(a), Some(b)) => match (self.individual(a), self.individual(b)) {
                (Some(a), Some(b)) => a.labels == b.labels,
                _ => false,
            },
            _ => false,
        }
    }

    /// Created ancestors of `name`, nearest first
    fn created_ancestors(&self, name: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut current = self
            .individuals
            .get(name)
            .and_then(|node| node.parent())
            .map(str::to_string);
        while let Some(parent) = current {
            let node = match self.individual(&parent) {
                Some(node) if node.is_created() => node,
                _ => break,
            };
            if result.contains(&node.name) {
                break;
            }
            result.push(node.name.clone());
            current = node.parent().map(str::to_string);
        }
        result
    }

    /// Move postponed restrictions of nodes that are no longer blocked back
    /// to the generating queue
    pub(crate) fn release_unblocked(&mut self) -> bool {
        let postponed = std::mem::take(&mut self.state.blocked_pending);
        let mut released = false;
        for (name, concept) in postponed {
            if self.resolve(&name) != name {
                continue;
            }
            if self.is_blocked(&name) {
                self.state.blocked_pending.push((name, concept));
            } else {
                trace!("{} unblocked, resuming {}", name, concept);
                self.state.generating.push_back((name, concept));
                released = true;
            }
        }
        released
    }

    /// Bound the quantified labels of each directly blocked node by its
    /// blocker's degrees
    pub(crate) fn add_reuse_constraints(&mut self) {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (name, _) in &self.state.blocked_pending {
            let blocker = if self.state.dynamic {
                self.find_blocker(name)
            } else {
                self.state.blocked.get(name).cloned()
            };
            if let Some(blocker) = blocker {
                let pair = (name.clone(), blocker);
                if !pairs.contains(&pair) && !self.state.reused.contains(&pair) {
                    pairs.push(pair);
                }
            }
        }
        for (blocked, blocker) in pairs {
            let labels: Vec<_> = match self.individuals.get(&blocked) {
                Some(node) => node
                    .labels
                    .iter()
                    .filter(|c| matches!(c.kind(), ConceptKind::Some { .. } | ConceptKind::All { .. }))
                    .cloned()
                    .collect(),
                None => continue,
            };
            for label in &labels {
                let own = self.membership(&blocked, label);
                let reused = self.membership(&blocker, label);
                self.model.add_le(own, reused);
            }
            debug!("{} reuses {} quantified labels of {}", blocked, labels.len(), blocker);
            self.state.reused.insert((blocked, blocker));
        }
    }
}

fn generating_role(node: &super::Individual) -> Option<&str> {
    match node.kind() {
        super::IndividualKind::Created { role, .. } => Some(role),
        super::IndividualKind::Named => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::axiom::Axiom;
    use crate::concept::Concept;
    use crate::config::{BlockingType, ReasonerConfig};
    use crate::knowledge_base::KnowledgeBase;
    use crate::FuzzyDlError;

    fn cyclic_kb(blocking: BlockingType) -> KnowledgeBase {
        let config = ReasonerConfig {
            blocking,
            max_created_individuals: 50,
            ..Default::default()
        };
        let mut kb = KnowledgeBase::new(config);
        let a = Concept::atomic("A");
        kb.add_axiom(Axiom::gci(a.clone(), Concept::some("r", a.clone()), 1.0)).unwrap();
        kb.add_assertion("a", a, 0.8).unwrap();
        kb
    }

    #[test]
    fn test_subset_blocking_terminates() {
        let mut kb = cyclic_kb(BlockingType::Subset);
        kb.complete().unwrap();
        let created = kb.individuals().values().filter(|i| i.is_created()).count();
        assert!(created <= 3, "created {} individuals", created);
        assert!(!kb.state.blocked_pending.is_empty());
        assert!(kb.is_consistent().unwrap());
    }

    #[test]
    fn test_no_blocking_hits_the_limit() {
        let mut kb = cyclic_kb(BlockingType::NoBlocking);
        assert!(matches!(kb.complete(), Err(FuzzyDlError::ExpansionLimit(50))));
    }

    #[test]
    fn test_pairwise_forced_by_inverse_roles() {
        let mut kb = KnowledgeBase::default();
        kb.add_axiom(Axiom::InverseRoles("r".into(), "s".into())).unwrap();
        assert_eq!(kb.effective_blocking(), BlockingType::Pairwise);
    }

    #[test]
    fn test_named_individuals_never_blocked() {
        let mut kb = cyclic_kb(BlockingType::Subset);
        kb.complete().unwrap();
        assert!(!kb.is_blocked("a"));
    }
}
