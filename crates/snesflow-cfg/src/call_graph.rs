//! Interprocedural call graph and structural analysis.
//!
//! Forward adjacency is keyed by routine start: every call made from inside
//! a routine, plus its tail-call jumps, is an edge out of that routine. The
//! reverse map keeps every reference (calls, jumps, branches) by target.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use snesflow_rom::Address;

/// Kind of control transfer a reference records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefKind {
    Call,
    Jump,
    Branch,
}

impl RefKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Jump => "jump",
            Self::Branch => "branch",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A control transfer from one instruction to a target address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CrossRef {
    pub from: Address,
    pub to: Address,
    pub kind: RefKind,
    /// Start of the routine containing `from`.
    pub routine: Address,
    /// Jump that leaves the routine into another routine's entry.
    pub tail_call: bool,
}

impl CrossRef {
    pub const fn from_bank(&self) -> u8 {
        self.from.bank()
    }

    pub const fn to_bank(&self) -> u8 {
        self.to.bank()
    }

    /// Call or jump whose source and destination banks differ.
    pub const fn crosses_bank(&self) -> bool {
        matches!(self.kind, RefKind::Call | RefKind::Jump) && self.from.crosses_bank(self.to)
    }

    /// Edge between routines: a call, or a jump used as a tail call.
    pub const fn is_routine_edge(&self) -> bool {
        match self.kind {
            RefKind::Call => true,
            RefKind::Jump => self.tail_call,
            RefKind::Branch => false,
        }
    }
}

/// Summary counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallGraphStats {
    pub total_refs: usize,
    pub unique_callers: usize,
    pub unique_targets: usize,
    pub entry_points: usize,
    pub leaf_routines: usize,
}

/// Nodes and edges reachable from a set of roots within a depth bound.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subgraph {
    pub nodes: BTreeSet<Address>,
    pub edges: Vec<CrossRef>,
}

/// Call graph populated from cross references.
#[derive(Clone, Debug, Default)]
pub struct CallGraph {
    forward: FxHashMap<Address, Vec<CrossRef>>,
    reverse: FxHashMap<Address, Vec<CrossRef>>,
    entry_points: FxHashSet<Address>,
    leaf_routines: BTreeSet<Address>,
    total_refs: usize,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one cross reference.
    pub fn add_reference(&mut self, xref: CrossRef) {
        self.total_refs += 1;
        if xref.is_routine_edge() {
            self.forward.entry(xref.routine).or_default().push(xref);
        }
        self.reverse.entry(xref.to).or_default().push(xref);
    }

    /// Mark an address as a declared entry point.
    pub fn add_entry_point(&mut self, addr: Address) {
        self.entry_points.insert(addr);
    }

    pub fn is_entry_point(&self, addr: Address) -> bool {
        self.entry_points.contains(&addr)
    }

    /// Entry points in address order.
    pub fn entry_points(&self) -> BTreeSet<Address> {
        self.entry_points.iter().copied().collect()
    }

    /// Check if any call targets `addr`.
    pub fn is_call_target(&self, addr: Address) -> bool {
        self.reverse
            .get(&addr)
            .is_some_and(|refs| refs.iter().any(|r| r.kind == RefKind::Call))
    }

    /// Every reference into `addr`.
    pub fn callers(&self, addr: Address) -> &[CrossRef] {
        self.reverse.get(&addr).map_or(&[], Vec::as_slice)
    }

    /// Calls and tail calls made by the routine starting at `routine`.
    pub fn callees(&self, routine: Address) -> &[CrossRef] {
        self.forward.get(&routine).map_or(&[], Vec::as_slice)
    }

    /// Recompute derived sets once tracing is done.
    pub fn finalize(&mut self) {
        self.leaf_routines = self
            .routine_targets()
            .filter(|target| !self.forward.contains_key(target))
            .collect();
    }

    /// Routines entered by a call or tail call that make no calls themselves.
    pub fn leaf_routines(&self) -> &BTreeSet<Address> {
        &self.leaf_routines
    }

    fn routine_targets(&self) -> impl Iterator<Item = Address> + '_ {
        self.forward.values().flatten().map(|r| r.to)
    }

    /// Every routine node: edge sources and edge targets.
    pub fn nodes(&self) -> BTreeSet<Address> {
        self.forward
            .keys()
            .copied()
            .chain(self.routine_targets())
            .collect()
    }

    /// Sorted, deduplicated successors of each routine.
    pub fn adjacency(&self) -> BTreeMap<Address, Vec<Address>> {
        self.forward
            .iter()
            .map(|(&routine, refs)| {
                let targets: BTreeSet<Address> = refs.iter().map(|r| r.to).collect();
                (routine, targets.into_iter().collect())
            })
            .collect()
    }

    /// Every routine edge, ordered by routine then call site.
    pub fn edges(&self) -> Vec<CrossRef> {
        let mut edges: Vec<CrossRef> = self.forward.values().flatten().copied().collect();
        edges.sort_by_key(|r| (r.routine, r.from, r.to));
        edges
    }

    /// Strongly connected components with more than one routine.
    ///
    /// Iterative Tarjan; components and their members are sorted.
    pub fn find_cycles(&self) -> Vec<Vec<Address>> {
        let nodes: Vec<Address> = self.nodes().into_iter().collect();
        let index_of: FxHashMap<Address, usize> =
            nodes.iter().enumerate().map(|(i, &a)| (a, i)).collect();
        let succs: Vec<Vec<usize>> = nodes
            .iter()
            .map(|node| {
                self.callees(*node)
                    .iter()
                    .filter_map(|r| index_of.get(&r.to).copied())
                    .collect()
            })
            .collect();

        let n = nodes.len();
        let mut index = vec![usize::MAX; n];
        let mut lowlink = vec![0; n];
        let mut on_stack = vec![false; n];
        let mut stack = Vec::new();
        let mut next_index = 0;
        let mut components = Vec::new();

        for root in 0..n {
            if index[root] != usize::MAX {
                continue;
            }
            // (node, next successor position)
            let mut call_stack = vec![(root, 0)];
            index[root] = next_index;
            lowlink[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;

            while let Some(frame) = call_stack.last_mut() {
                let v = frame.0;
                if let Some(&w) = succs[v].get(frame.1) {
                    frame.1 += 1;
                    if index[w] == usize::MAX {
                        index[w] = next_index;
                        lowlink[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        call_stack.push((w, 0));
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(index[w]);
                    }
                    continue;
                }

                call_stack.pop();
                if let Some(&(parent, _)) = call_stack.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
                if lowlink[v] == index[v] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component.push(nodes[w]);
                        if w == v {
                            break;
                        }
                    }
                    if component.len() > 1 {
                        component.sort_unstable();
                        components.push(component);
                    }
                }
            }
        }

        components.sort();
        components
    }

    /// Calls and jumps whose source and destination banks differ.
    pub fn cross_bank_refs(&self) -> Vec<CrossRef> {
        let mut refs: Vec<CrossRef> = self
            .reverse
            .values()
            .flatten()
            .filter(|r| r.crosses_bank())
            .copied()
            .collect();
        refs.sort_by_key(|r| (r.from, r.to));
        refs
    }

    /// Routines reachable from the entry points through routine edges.
    pub fn reachable(&self) -> BTreeSet<Address> {
        let mut seen: FxHashSet<Address> = FxHashSet::default();
        let mut queue: VecDeque<Address> = self.entry_points.iter().copied().collect();
        while let Some(addr) = queue.pop_front() {
            if !seen.insert(addr) {
                continue;
            }
            queue.extend(
                self.callees(addr)
                    .iter()
                    .map(|r| r.to)
                    .filter(|to| !seen.contains(to)),
            );
        }
        seen.into_iter().collect()
    }

    /// Routine nodes not reachable from any entry point.
    ///
    /// Empty when no entry points are declared.
    pub fn orphans(&self) -> BTreeSet<Address> {
        if self.entry_points.is_empty() {
            return BTreeSet::new();
        }
        let reachable = self.reachable();
        self.nodes()
            .into_iter()
            .filter(|addr| !reachable.contains(addr))
            .collect()
    }

    /// Routines within `depth` edges of any root, and the edges between them.
    pub fn subgraph(&self, roots: &[Address], depth: usize) -> Subgraph {
        let mut sub = Subgraph::default();
        let mut queue: VecDeque<(Address, usize)> = roots.iter().map(|&r| (r, 0)).collect();
        while let Some((addr, level)) = queue.pop_front() {
            if level > depth || !sub.nodes.insert(addr) {
                continue;
            }
            for xref in self.callees(addr) {
                sub.edges.push(*xref);
                queue.push_back((xref.to, level + 1));
            }
        }
        sub.edges
            .retain(|r| sub.nodes.contains(&r.routine) && sub.nodes.contains(&r.to));
        sub.edges.sort_by_key(|r| (r.routine, r.from, r.to));
        sub.edges.dedup();
        sub
    }

    pub fn stats(&self) -> CallGraphStats {
        CallGraphStats {
            total_refs: self.total_refs,
            unique_callers: self.forward.len(),
            unique_targets: self.reverse.len(),
            entry_points: self.entry_points.len(),
            leaf_routines: self.leaf_routines.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(raw: u32) -> Address {
        Address::new(raw)
    }

    fn call(routine: u32, from: u32, to: u32) -> CrossRef {
        CrossRef {
            from: addr(from),
            to: addr(to),
            kind: RefKind::Call,
            routine: addr(routine),
            tail_call: false,
        }
    }

    #[test]
    fn test_mutual_recursion() {
        let mut graph = CallGraph::new();
        // A calls B from its middle, B calls A.
        graph.add_reference(call(0x00_8000, 0x00_8010, 0x00_9000));
        graph.add_reference(call(0x00_9000, 0x00_9004, 0x00_8000));
        graph.add_reference(call(0x00_9000, 0x00_9008, 0x00_A000));
        graph.finalize();

        assert_eq!(graph.find_cycles(), vec![vec![addr(0x00_8000), addr(0x00_9000)]]);
        assert_eq!(
            graph.leaf_routines().iter().copied().collect::<Vec<_>>(),
            vec![addr(0x00_A000)]
        );
    }

    #[test]
    fn test_self_recursion_not_reported() {
        let mut graph = CallGraph::new();
        graph.add_reference(call(0x00_8000, 0x00_8004, 0x00_8000));
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn test_long_chain_cycle() {
        let mut graph = CallGraph::new();
        let n = 5_000u32;
        for i in 0..n {
            let from = 0x01_0000 + i * 8;
            let to = 0x01_0000 + ((i + 1) % n) * 8;
            graph.add_reference(call(from, from + 2, to));
        }
        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), n as usize);
    }

    #[test]
    fn test_cross_bank() {
        let mut graph = CallGraph::new();
        graph.add_reference(call(0x00_8000, 0x00_8002, 0x02_8000));
        graph.add_reference(call(0x00_8000, 0x00_8006, 0x00_9000));
        graph.add_reference(CrossRef {
            kind: RefKind::Branch,
            ..call(0x00_8000, 0x00_FFFE, 0x01_0002)
        });

        let crossing = graph.cross_bank_refs();
        assert_eq!(crossing.len(), 1);
        assert_eq!(crossing[0].from, addr(0x00_8002));
        assert_eq!(crossing[0].to_bank(), 0x02);
    }

    #[test]
    fn test_tail_call_edges() {
        let mut graph = CallGraph::new();
        let jump = CrossRef {
            kind: RefKind::Jump,
            ..call(0x00_8000, 0x00_8003, 0x00_9000)
        };
        graph.add_reference(jump);
        assert!(graph.callees(addr(0x00_8000)).is_empty());
        graph.add_reference(CrossRef {
            tail_call: true,
            ..jump
        });
        assert_eq!(graph.callees(addr(0x00_8000)).len(), 1);
        assert_eq!(graph.callers(addr(0x00_9000)).len(), 2);
        assert!(!graph.is_call_target(addr(0x00_9000)));
    }

    #[test]
    fn test_orphans_and_subgraph() {
        let mut graph = CallGraph::new();
        graph.add_entry_point(addr(0x00_8000));
        graph.add_reference(call(0x00_8000, 0x00_8001, 0x00_9000));
        graph.add_reference(call(0x00_9000, 0x00_9001, 0x00_A000));
        graph.add_reference(call(0x00_B000, 0x00_B001, 0x00_C000));
        graph.finalize();

        assert_eq!(
            graph.orphans().into_iter().collect::<Vec<_>>(),
            vec![addr(0x00_B000), addr(0x00_C000)]
        );

        let sub = graph.subgraph(&[addr(0x00_8000)], 1);
        assert_eq!(
            sub.nodes.into_iter().collect::<Vec<_>>(),
            vec![addr(0x00_8000), addr(0x00_9000)]
        );
        assert_eq!(sub.edges.len(), 1);

        let adjacency = graph.adjacency();
        assert_eq!(adjacency[&addr(0x00_9000)], vec![addr(0x00_A000)]);
        assert_eq!(graph.edges().len(), 3);

        let stats = graph.stats();
        assert_eq!(stats.total_refs, 3);
        assert_eq!(stats.unique_callers, 3);
        assert_eq!(stats.entry_points, 1);
        assert_eq!(stats.leaf_routines, 2);
    }

    #[test]
    fn test_no_entry_points_no_orphans() {
        let mut graph = CallGraph::new();
        graph.add_reference(call(0x00_8000, 0x00_8001, 0x00_9000));
        assert!(graph.orphans().is_empty());
    }
}
