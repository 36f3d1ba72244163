//! Concept hierarchy
//!
//! Nodes are sets of equivalent concept names stored in an arena; edges
//! point from a node to its direct subsumees. Unsatisfiable names share the
//! bottom node.

use super::KnowledgeBase;
use crate::concept::Concept;
use crate::query::{MaxSatisfiableQuery, MinSubsumesQuery, Query};
use crate::FuzzyDlError;
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

const TOP: &str = "*top*";
const BOTTOM: &str = "*bottom*";
const TOLERANCE: f64 = 1e-6;

/// Equivalent concept names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationNode {
    pub names: BTreeSet<String>,
}

/// Hasse diagram of the subsumption order between concept names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationGraph {
    nodes: Vec<ClassificationNode>,
    index: BTreeMap<String, usize>,
    children: BTreeMap<usize, BTreeSet<usize>>,
    parents: BTreeMap<usize, BTreeSet<usize>>,
    top: usize,
    bottom: usize,
}

impl ClassificationGraph {
    fn new() -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            index: BTreeMap::new(),
            children: BTreeMap::new(),
            parents: BTreeMap::new(),
            top: 0,
            bottom: 0,
        };
        graph.top = graph.add_node([TOP.to_string()]);
        graph.bottom = graph.add_node([BOTTOM.to_string()]);
        graph
    }

    fn add_node(&mut self, names: impl IntoIterator<Item = String>) -> usize {
        let id = self.nodes.len();
        let names: BTreeSet<String> = names.into_iter().collect();
        for name in &names {
            self.index.insert(name.clone(), id);
        }
        self.nodes.push(ClassificationNode { names });
        id
    }

    fn add_to_node(&mut self, id: usize, name: String) {
        self.index.insert(name.clone(), id);
        self.nodes[id].names.insert(name);
    }

    fn add_edge(&mut self, parent: usize, child: usize) {
        self.children.entry(parent).or_default().insert(child);
        self.parents.entry(child).or_default().insert(parent);
    }

    /// Classify the concept names of the terminology of `kb`.
    ///
    /// `A ⊑ B` holds when the infimum degree of the subsumption under the
    /// default implication is 1.
    pub fn compute(kb: &KnowledgeBase) -> Result<Self, FuzzyDlError> {
        let names: Vec<String> = kb.tbox.concept_names().into_iter().collect();
        let family = kb.semantics().default_implication();
        info!("classifying {} concept names", names.len());
        let mut graph = Self::new();

        let mut satisfiable = Vec::new();
        for name in names {
            let degree = MaxSatisfiableQuery::new(Concept::atomic(name.as_str())).solve(kb)?;
            if degree.is_consistent_kb() && degree.value() > TOLERANCE {
                satisfiable.push(name);
            } else {
                debug!("{} is unsatisfiable", name);
                graph.add_to_node(graph.bottom, name);
            }
        }

        // a satisfiable name means the ABox is consistent, so pairs are
        // decided on the terminology alone
        let terminology = kb.clone_without_abox();
        let n = satisfiable.len();
        let mut subsumes = vec![vec![false; n]; n];
        for (i, sub) in satisfiable.iter().enumerate() {
            for (j, sup) in satisfiable.iter().enumerate() {
                if i == j {
                    subsumes[i][j] = true;
                    continue;
                }
                let mut query =
                    MinSubsumesQuery::new(Concept::atomic(sub.as_str()), Concept::atomic(sup.as_str()), family);
                let degree = query.solve(&terminology)?;
                subsumes[i][j] = degree.is_consistent_kb() && degree.value() >= 1.0 - TOLERANCE;
            }
        }

        // equivalence classes
        let mut class_of: Vec<usize> = vec![usize::MAX; n];
        let mut classes: Vec<usize> = Vec::new();
        for i in 0..n {
            if class_of[i] != usize::MAX {
                continue;
            }
            let id = graph.add_node([satisfiable[i].clone()]);
            class_of[i] = id;
            classes.push(i);
            for j in (i + 1)..n {
                if subsumes[i][j] && subsumes[j][i] {
                    class_of[j] = id;
                    graph.add_to_node(id, satisfiable[j].clone());
                }
            }
        }

        // direct subsumptions between representatives
        for &c in &classes {
            let mut has_parent = false;
            for &p in &classes {
                if c == p || !subsumes[c][p] {
                    continue;
                }
                let indirect = classes
                    .iter()
                    .any(|&k| k != c && k != p && subsumes[c][k] && subsumes[k][p]);
                if !indirect {
                    graph.add_edge(class_of[p], class_of[c]);
                    has_parent = true;
                }
            }
            if !has_parent {
                graph.add_edge(graph.top, class_of[c]);
            }
        }
        let leaves: Vec<usize> = classes
            .iter()
            .map(|&c| class_of[c])
            .filter(|id| graph.children.get(id).map_or(true, |c| c.is_empty()))
            .collect();
        for id in leaves {
            graph.add_edge(id, graph.bottom);
        }
        if classes.is_empty() {
            graph.add_edge(graph.top, graph.bottom);
        }
        debug!("classification graph with {} nodes", graph.nodes.len());
        Ok(graph)
    }

    pub fn nodes(&self) -> &[ClassificationNode] {
        &self.nodes
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn bottom(&self) -> usize {
        self.bottom
    }

    /// Node holding `name`
    pub fn node_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Direct subsumers of the node
    pub fn parents(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.parents.get(&node).into_iter().flatten().copied()
    }

    /// Direct subsumees of the node
    pub fn children(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.children.get(&node).into_iter().flatten().copied()
    }

    /// Names equivalent to `name`, itself included
    pub fn equivalents(&self, name: &str) -> BTreeSet<String> {
        self.node_of(name)
            .map(|id| self.nodes[id].names.clone())
            .unwrap_or_default()
    }

    /// Whether `sub ⊑ sup` follows from the hierarchy
    pub fn subsumes(&self, sup: &str, sub: &str) -> bool {
        let (Some(sup), Some(sub)) = (self.node_of(sup), self.node_of(sub)) else {
            return false;
        };
        if sup == sub || sup == self.top || sub == self.bottom {
            return true;
        }
        let mut stack = vec![sup];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == sub {
                return true;
            }
            if seen.insert(current) {
                stack.extend(self.children(current));
            }
        }
        false
    }

    fn label(&self, node: usize) -> String {
        self.nodes[node].names.iter().join(" = ")
    }
}

impl fmt::Display for ClassificationGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (parent, children) in &self.children {
            for child in children {
                writeln!(f, "{} => {}", self.label(*child), self.label(*parent))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axiom::Axiom;

    fn atom(name: &str) -> Concept {
        Concept::atomic(name)
    }

    fn hierarchy() -> KnowledgeBase {
        let mut kb = KnowledgeBase::default();
        kb.add_axiom(Axiom::gci(atom("Dog"), atom("Mammal"), 1.0)).unwrap();
        kb.add_axiom(Axiom::gci(atom("Mammal"), atom("Animal"), 1.0)).unwrap();
        kb.add_axiom(Axiom::gci(atom("Hound"), atom("Dog"), 1.0)).unwrap();
        kb.add_axiom(Axiom::gci(atom("Dog"), atom("Hound"), 1.0)).unwrap();
        kb.add_axiom(Axiom::gci(atom("Unicorn"), Concept::bottom(), 1.0)).unwrap();
        kb
    }

    #[test]
    fn test_hierarchy_is_transitively_reduced() {
        let graph = ClassificationGraph::compute(&hierarchy()).unwrap();
        let dog = graph.node_of("Dog").unwrap();
        let mammal = graph.node_of("Mammal").unwrap();
        let animal = graph.node_of("Animal").unwrap();
        assert_eq!(graph.parents(dog).collect::<Vec<_>>(), vec![mammal]);
        assert_eq!(graph.parents(mammal).collect::<Vec<_>>(), vec![animal]);
        assert_eq!(graph.parents(animal).collect::<Vec<_>>(), vec![graph.top()]);
        assert!(graph.subsumes("Animal", "Dog"));
        assert!(!graph.subsumes("Dog", "Animal"));
    }

    #[test]
    fn test_equivalent_and_unsatisfiable_names() {
        let graph = ClassificationGraph::compute(&hierarchy()).unwrap();
        assert_eq!(graph.node_of("Dog"), graph.node_of("Hound"));
        assert_eq!(graph.node_of("Unicorn"), Some(graph.bottom()));
        assert!(graph.subsumes("Dog", "Unicorn"));
        assert_eq!(graph.nodes().len(), 5);
    }
}
