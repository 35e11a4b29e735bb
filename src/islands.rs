//! Island decomposition: connected components of the `(body, constraint)` graph
//! (spec §4.F, §9 "Polymorphism"/Glossary "Island"). Recomputed from scratch each step
//! via union-find rather than maintained incrementally like rapier's active-set
//! bookkeeping — a deliberate simplification; see DESIGN.md.

use rustc_hash::FxHashMap;

use crate::body::RigidBodyHandle;

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// One island: the set of dynamic bodies constrained together this step.
#[derive(Debug, Default, Clone)]
pub struct Island {
    pub bodies: Vec<RigidBodyHandle>,
}

/// Groups dynamic bodies into islands given the edges the solver's constraints form
/// between them. Static/kinematic bodies never merge two islands together (an edge
/// touching one is dropped rather than unioned), matching the spec's "a body belongs
/// to at most one island per step" for dynamic bodies only.
pub fn build_islands(
    dynamic_bodies: impl Iterator<Item = RigidBodyHandle>,
    edges: impl Iterator<Item = (RigidBodyHandle, RigidBodyHandle)>,
) -> Vec<Island> {
    let mut index_of: FxHashMap<RigidBodyHandle, usize> = FxHashMap::default();
    let mut handles = Vec::new();
    for handle in dynamic_bodies {
        index_of.entry(handle).or_insert_with(|| {
            handles.push(handle);
            handles.len() - 1
        });
    }

    let mut uf = UnionFind::new(handles.len());
    for (a, b) in edges {
        if let (Some(&ia), Some(&ib)) = (index_of.get(&a), index_of.get(&b)) {
            uf.union(ia, ib);
        }
    }

    let mut groups: FxHashMap<usize, Vec<RigidBodyHandle>> = FxHashMap::default();
    for (i, &handle) in handles.iter().enumerate() {
        let root = uf.find(i);
        groups.entry(root).or_default().push(handle);
    }

    groups.into_values().map(|bodies| Island { bodies }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn disjoint_pairs_form_separate_islands() {
        let mut sm: SlotMap<RigidBodyHandle, ()> = SlotMap::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        let c = sm.insert(());
        let d = sm.insert(());

        let islands = build_islands([a, b, c, d].into_iter(), [(a, b), (c, d)].into_iter());
        assert_eq!(islands.len(), 2);
        for island in &islands {
            assert_eq!(island.bodies.len(), 2);
        }
    }

    #[test]
    fn chained_edges_merge_into_one_island() {
        let mut sm: SlotMap<RigidBodyHandle, ()> = SlotMap::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        let c = sm.insert(());

        let islands = build_islands([a, b, c].into_iter(), [(a, b), (b, c)].into_iter());
        assert_eq!(islands.len(), 1);
        assert_eq!(islands[0].bodies.len(), 3);
    }
}
