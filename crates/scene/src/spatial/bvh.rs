use foundation::bounds::Aabb3;
use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

/// Median-split bounding volume hierarchy over instance slots.
///
/// Building is deterministic for a given item set regardless of input
/// order. Ray queries return candidates nearest-entry first, ties by slot.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bounds: Aabb3,
        items: Vec<Item>,
    },
    Branch {
        bounds: Aabb3,
        children: [usize; 2],
    },
}

impl Node {
    fn bounds(&self) -> &Aabb3 {
        match self {
            Node::Leaf { bounds, .. } | Node::Branch { bounds, .. } => bounds,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Item {
    pub slot: usize,
    pub bounds: Aabb3,
}

/// A slot whose box the ray enters at distance `t`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Candidate {
    pub slot: usize,
    pub t: f64,
}

const LEAF_MAX: usize = 8;

impl Bvh {
    pub fn build(mut items: Vec<Item>) -> Self {
        let mut nodes = Vec::with_capacity(items.len().div_ceil(LEAF_MAX) * 2);
        if !items.is_empty() {
            split(&mut nodes, &mut items);
        }
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Items whose boxes the ray segment `origin + dir * [0, max_t]` touches.
    pub fn query_ray(&self, origin: Vec3, dir: Vec3, max_t: f64) -> Vec<Candidate> {
        let mut out = Vec::new();
        if self.nodes.is_empty() {
            return out;
        }

        let mut pending = vec![0usize];
        while let Some(idx) = pending.pop() {
            let node = &self.nodes[idx];
            if node.bounds().ray_entry(origin, dir, 0.0, max_t).is_none() {
                continue;
            }
            match node {
                Node::Leaf { items, .. } => {
                    out.extend(items.iter().filter_map(|item| {
                        item.bounds
                            .ray_entry(origin, dir, 0.0, max_t)
                            .map(|t| Candidate { slot: item.slot, t })
                    }));
                }
                Node::Branch { children, .. } => pending.extend(children),
            }
        }

        out.sort_by(|a, b| stable_total_cmp_f64(a.t, b.t).then(a.slot.cmp(&b.slot)));
        out
    }
}

/// Appends the subtree for `items` and returns its root index.
fn split(nodes: &mut Vec<Node>, items: &mut [Item]) -> usize {
    let bounds = items[1..]
        .iter()
        .fold(items[0].bounds, |acc, item| acc.union(&item.bounds));
    let idx = nodes.len();
    if items.len() <= LEAF_MAX {
        nodes.push(Node::Leaf {
            bounds,
            items: items.to_vec(),
        });
        return idx;
    }

    // Longest axis; ties prefer X, then Y.
    let axis = (0..3)
        .rev()
        .max_by(|&a, &b| stable_total_cmp_f64(bounds.extent_axis(a), bounds.extent_axis(b)))
        .unwrap_or(0);
    items.sort_by(|a, b| {
        stable_total_cmp_f64(a.bounds.centroid_axis(axis), b.bounds.centroid_axis(axis))
            .then(a.slot.cmp(&b.slot))
    });

    nodes.push(Node::Branch {
        bounds,
        children: [0, 0],
    });
    let (lo, hi) = items.split_at_mut(items.len() / 2);
    let left = split(nodes, lo);
    let right = split(nodes, hi);
    if let Node::Branch { children, .. } = &mut nodes[idx] {
        *children = [left, right];
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::{Bvh, Item};
    use foundation::bounds::Aabb3;
    use foundation::math::Vec3;

    fn sphere(slot: usize, x: f64) -> Item {
        Item {
            slot,
            bounds: Aabb3::around_sphere(Vec3::new(x, 0.0, 0.0), 0.5),
        }
    }

    fn slots(bvh: &Bvh, origin: Vec3, dir: Vec3, max_t: f64) -> Vec<usize> {
        bvh.query_ray(origin, dir, max_t)
            .into_iter()
            .map(|c| c.slot)
            .collect()
    }

    #[test]
    fn candidates_come_nearest_first() {
        let items = (0..40).map(|i| sphere(i, i as f64 * 2.0)).collect();
        let bvh = Bvh::build(items);

        let from_left = slots(&bvh, Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1.0e30);
        assert_eq!(from_left, (0..40).collect::<Vec<_>>());
        let from_right = slots(&bvh, Vec3::new(100.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 1.0e30);
        assert_eq!(from_right, (0..40).rev().collect::<Vec<_>>());

        let vertical = bvh.query_ray(Vec3::new(20.0, -5.0, 0.0), Vec3::new(0.0, 1.0, 0.0), 1.0e30);
        assert_eq!(vertical.len(), 1);
        assert_eq!(vertical[0].slot, 10);
        assert!((vertical[0].t - 4.5).abs() < 1e-12);
    }

    #[test]
    fn segment_length_is_respected() {
        let bvh = Bvh::build(vec![sphere(0, 2.0), sphere(1, 10.0)]);
        let x = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(slots(&bvh, Vec3::ZERO, x, 5.0), vec![0]);
        assert!(slots(&bvh, Vec3::ZERO, -x, 1.0e30).is_empty());
    }

    #[test]
    fn overlapping_boxes_tie_by_slot() {
        let forward = vec![sphere(3, 0.0), sphere(1, 0.0), sphere(2, 4.0)];
        let mut backward = forward.clone();
        backward.reverse();

        let origin = Vec3::new(-1.0, 0.0, 0.0);
        let x = Vec3::new(1.0, 0.0, 0.0);
        let a = slots(&Bvh::build(forward), origin, x, 3.0);
        let b = slots(&Bvh::build(backward), origin, x, 3.0);
        assert_eq!(a, b);
        assert_eq!(a, vec![1, 3]);
    }

    #[test]
    fn empty_tree_reports_nothing() {
        let bvh = Bvh::build(Vec::new());
        assert!(bvh.is_empty());
        assert!(bvh.query_ray(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 1.0).is_empty());
    }
}
