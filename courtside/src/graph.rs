//! The dependency graphs that wire a tournament together.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ids::NodeId;
use crate::matches::Match;
use crate::ranking::{Ranking, RankingNode};

/// A directed acyclic graph of id-keyed payloads.
///
/// Vertex and edge insertion order is preserved so that traversal
/// order is deterministic. The graphs are immutable once a tournament
/// is built; the only operations afterwards are lookups and
/// breadth-first iteration.
pub struct DependencyGraph<T: Clone> {
    vertices: RefCell<IndexMap<NodeId, T>>,
    out_edges: RefCell<IndexMap<NodeId, Vec<NodeId>>>,
}

impl<T: Clone> DependencyGraph<T> {
    pub fn new() -> Self {
        Self {
            vertices: RefCell::new(IndexMap::new()),
            out_edges: RefCell::new(IndexMap::new()),
        }
    }

    /// Adds a vertex, keeping the existing payload if the id is
    /// already present.
    pub fn add_vertex(&self, id: NodeId, payload: T) {
        self.vertices.borrow_mut().entry(id).or_insert(payload);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.vertices.borrow().contains_key(&id)
    }

    /// Adds the directed edge `from -> to`. Duplicate edges are
    /// ignored.
    ///
    /// Both vertices must already be present; an edge to a missing
    /// vertex is a wiring mistake in a builder.
    pub fn add_edge(&self, from: NodeId, to: NodeId) {
        debug_assert!(self.contains(from) && self.contains(to));
        let mut edges = self.out_edges.borrow_mut();
        let targets = edges.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    /// Breadth-first iteration from `start`, yielding each reachable
    /// vertex once together with its depth. A vertex reachable at
    /// several depths is visited at the earliest one.
    pub fn breadth_search(&self, start: NodeId) -> Vec<(T, usize)> {
        let vertices = self.vertices.borrow();
        let edges = self.out_edges.borrow();

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut order = Vec::new();

        if !vertices.contains_key(&start) {
            return order;
        }
        queue.push_back((start, 0));
        visited.insert(start);

        while let Some((id, depth)) = queue.pop_front() {
            if let Some(payload) = vertices.get(&id) {
                order.push((payload.clone(), depth));
            }
            if let Some(targets) = edges.get(&id) {
                for &next in targets {
                    if visited.insert(next) {
                        queue.push_back((next, depth + 1));
                    }
                }
            }
        }

        order
    }

    /// Returns the payloads on the outgoing edges of `id` (its
    /// dependants).
    pub fn dependants_of(&self, id: NodeId) -> Vec<T> {
        let vertices = self.vertices.borrow();
        let edges = self.out_edges.borrow();
        edges
            .get(&id)
            .map(|targets| {
                targets
                    .iter()
                    .filter_map(|t| vertices.get(t).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<T: Clone> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The graph of all rankings of a tournament.
///
/// A directed edge `A -> B` means B resolves slots from a placement in
/// A: if A changes, B must recompute before its own readers. The graph
/// is acyclic and its breadth-first order from the entries ranking is
/// a valid update order for the whole tournament.
pub struct RankingGraph {
    graph: DependencyGraph<Rc<RankingNode>>,
}

impl RankingGraph {
    pub fn new(root: &Rc<RankingNode>) -> Rc<RankingGraph> {
        let graph = RankingGraph {
            graph: DependencyGraph::new(),
        };
        graph.add_vertex(root);
        Rc::new(graph)
    }

    pub fn add_vertex(&self, ranking: &Rc<RankingNode>) {
        self.graph.add_vertex(ranking.id(), ranking.clone());
    }

    pub fn add_edge(&self, from: &Rc<RankingNode>, to: &Rc<RankingNode>) {
        self.add_vertex(from);
        self.add_vertex(to);
        self.graph.add_edge(from.id(), to.id());
    }

    pub fn breadth_search(&self, start: &Rc<RankingNode>) -> Vec<(Rc<RankingNode>, usize)> {
        self.graph.breadth_search(start.id())
    }

    pub fn dependants(&self, ranking: &RankingNode) -> Vec<Rc<RankingNode>> {
        self.graph.dependants_of(ranking.id())
    }
}

/// The graph of all matches of an elimination tournament.
///
/// Edges model the paths that players take towards the final, like a
/// conventional tournament tree: the winner (and in double elimination
/// or consolation settings, the loser) of a match proceeds along its
/// outgoing edges.
pub struct EliminationGraph {
    graph: DependencyGraph<Rc<Match>>,
}

impl EliminationGraph {
    pub fn new() -> Rc<EliminationGraph> {
        Rc::new(EliminationGraph {
            graph: DependencyGraph::new(),
        })
    }

    pub fn add_vertex(&self, m: &Rc<Match>) {
        self.graph.add_vertex(m.id(), m.clone());
    }

    pub fn add_edge(&self, from: &Rc<Match>, to: &Rc<Match>) {
        self.graph.add_edge(from.id(), to.id());
    }

    pub fn dependants(&self, m: &Match) -> Vec<Rc<Match>> {
        self.graph.dependants_of(m.id())
    }

    /// The next matches that would actually be affected by an edit of
    /// the given match's result.
    ///
    /// Matches that are byes or walkovers cannot be played; they are
    /// skipped through to the first playable successors.
    pub fn next_playable_matches(&self, m: &Match) -> Vec<Rc<Match>> {
        let next = self.dependants(m);

        let (skipped, playable): (Vec<_>, Vec<_>) = next
            .into_iter()
            .partition(|m| m.has_bye() || m.is_walkover());

        let mut result = playable;
        for m in &skipped {
            result.extend(self.next_playable_matches(m));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> DependencyGraph<&'static str> {
        // a -> b, a -> c, b -> d, c -> d
        let g = DependencyGraph::new();
        g.add_vertex(0, "a");
        g.add_vertex(1, "b");
        g.add_vertex(2, "c");
        g.add_vertex(3, "d");
        g.add_edge(0, 1);
        g.add_edge(0, 2);
        g.add_edge(1, 3);
        g.add_edge(2, 3);
        g
    }

    #[test]
    fn test_bfs_visits_each_vertex_once_at_earliest_depth() {
        let g = diamond();
        let order = g.breadth_search(0);
        assert_eq!(
            order,
            vec![("a", 0), ("b", 1), ("c", 1), ("d", 2)]
        );
    }

    #[test]
    fn test_bfs_is_deterministic() {
        let g = diamond();
        assert_eq!(g.breadth_search(0), g.breadth_search(0));
    }

    #[test]
    fn test_duplicate_vertices_and_edges_are_ignored() {
        let g = diamond();
        g.add_vertex(0, "other");
        g.add_edge(0, 1);
        let order = g.breadth_search(0);
        assert_eq!(order[0].0, "a");
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_dependants() {
        let g = diamond();
        assert_eq!(g.dependants_of(0), vec!["b", "c"]);
        assert_eq!(g.dependants_of(3), Vec::<&str>::new());
    }
}
