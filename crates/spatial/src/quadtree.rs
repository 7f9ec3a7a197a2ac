use foundation::bounds::Aabb2;
use foundation::precision::stable_total_cmp_f64;

/// A deterministic region quadtree over 2D points.
///
/// Built once per loaded feature set and never mutated incrementally; the
/// owner rebuilds it whenever the underlying feature array changes.
///
/// Ordering contract:
/// - `find_nearest` returns hits ascending by exact Euclidean distance;
///   equidistant hits are ordered by ascending store index.
#[derive(Debug, Clone)]
pub struct Quadtree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bounds: Aabb2,
        items: Vec<Item>,
    },
    Internal {
        bounds: Aabb2,
        children: [usize; 4],
    },
}

/// A point plus the store index it belongs to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Item {
    pub index: usize,
    pub pos: [f64; 2],
}

/// One nearest-neighbor candidate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NeighborHit {
    pub index: usize,
    pub distance: f64,
}

const LEAF_MAX: usize = 16;

// Duplicate coordinates can never be separated by splitting; cap the depth
// so such clusters terminate in an oversized leaf.
const MAX_DEPTH: usize = 16;

impl Quadtree {
    pub fn build(items: Vec<Item>) -> Self {
        let mut nodes = Vec::new();
        if !items.is_empty() {
            let _root = build_node(&mut nodes, items, 0);
        }
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds up to `k` points nearest to `query`, searching only inside the
    /// square window `[qx - r, qx + r] x [qy - r, qy + r]`.
    ///
    /// The window is fixed, not expanding: callers must choose `r` large
    /// enough for the expected point density, and may receive fewer than `k`
    /// hits (or none) in sparse regions. An empty index returns an empty
    /// vector, never an error.
    pub fn find_nearest(&self, query: [f64; 2], k: usize, search_radius: f64) -> Vec<NeighborHit> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        let window = Aabb2::new(
            [query[0] - search_radius, query[1] - search_radius],
            [query[0] + search_radius, query[1] + search_radius],
        );

        let mut candidates: Vec<NeighborHit> = Vec::new();
        let mut stack: Vec<usize> = vec![0];

        while let Some(idx) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { bounds, items } => {
                    if !bounds.intersects(&window) {
                        continue;
                    }
                    for item in items {
                        if !window.contains(item.pos) {
                            continue;
                        }
                        let dx = item.pos[0] - query[0];
                        let dy = item.pos[1] - query[1];
                        candidates.push(NeighborHit {
                            index: item.index,
                            distance: (dx * dx + dy * dy).sqrt(),
                        });
                    }
                }
                Node::Internal { bounds, children } => {
                    if !bounds.intersects(&window) {
                        continue;
                    }
                    // Stack order doesn't matter because we sort output, but keep it stable.
                    for child in children.iter().rev() {
                        stack.push(*child);
                    }
                }
            }
        }

        candidates.sort_by(|a, b| {
            stable_total_cmp_f64(a.distance, b.distance).then_with(|| a.index.cmp(&b.index))
        });
        candidates.truncate(k);
        candidates
    }
}

fn build_node(nodes: &mut Vec<Node>, items: Vec<Item>, depth: usize) -> usize {
    let bounds = bounds_for_items(&items);

    if items.len() <= LEAF_MAX || depth >= MAX_DEPTH {
        let idx = nodes.len();
        nodes.push(Node::Leaf { bounds, items });
        return idx;
    }

    let center = bounds.center();
    let total = items.len();
    let mut quads: [Vec<Item>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
    for item in items {
        quads[quadrant_of(item.pos, center)].push(item);
    }

    // A degenerate split (all points in one quadrant) cannot make progress.
    if quads.iter().any(|q| q.len() == total) {
        let items: Vec<Item> = quads.into_iter().flatten().collect();
        let idx = nodes.len();
        nodes.push(Node::Leaf { bounds, items });
        return idx;
    }

    let idx = nodes.len();
    // Placeholder; will patch after children are built.
    nodes.push(Node::Leaf {
        bounds,
        items: Vec::new(),
    });

    let mut children = [0usize; 4];
    for (i, quad) in quads.into_iter().enumerate() {
        children[i] = build_node(nodes, quad, depth + 1);
    }

    nodes[idx] = Node::Internal { bounds, children };
    idx
}

/// Quadrant order: SW, SE, NW, NE. Points on a split line go east/north.
fn quadrant_of(pos: [f64; 2], center: [f64; 2]) -> usize {
    let east = pos[0] >= center[0];
    let north = pos[1] >= center[1];
    match (north, east) {
        (false, false) => 0,
        (false, true) => 1,
        (true, false) => 2,
        (true, true) => 3,
    }
}

fn bounds_for_items(items: &[Item]) -> Aabb2 {
    let mut b = match items.first() {
        Some(item) => Aabb2::point(item.pos),
        None => Aabb2::new([0.0, 0.0], [0.0, 0.0]),
    };
    for item in &items[1.min(items.len())..] {
        b.expand_to(item.pos);
    }
    b
}
