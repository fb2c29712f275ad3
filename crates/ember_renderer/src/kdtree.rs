//! Scene KD-tree for closest-hit queries.
//!
//! Nodes live in a flat arena and reference their children by index.
//! Build splits at the median of the primitives' representative
//! coordinates (triangle vertices, sphere and plane centres) along the
//! longest axis of the node box. Primitives straddling the split are
//! referenced from both children; planes always are.
//!
//! Queries return exactly the hit a linear scan over all primitives would
//! return; the tree only changes how many primitives get tested.

use std::sync::atomic::{AtomicU64, Ordering};

use ember_core::Scene;
use ember_math::{Aabb, Axis, Interval, Ray};
use serde::{Deserialize, Serialize};

use crate::bounds::{plane_bounds, sphere_bounds, triangle_bounds};
use crate::intersect::{intersect_plane, intersect_sphere, intersect_triangle};
use crate::HitRecord;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub u32);

/// A node of the scene KD-tree.
#[derive(Debug, Clone)]
pub enum KdNode {
    /// Primitive indices into the scene buffers.
    Leaf {
        bounds: Aabb,
        triangles: Vec<u32>,
        spheres: Vec<u32>,
        planes: Vec<u32>,
    },
    /// Split node. A child is `None` when no primitive falls on its side.
    Interior {
        bounds: Aabb,
        axis: Axis,
        split: f32,
        left: Option<NodeId>,
        right: Option<NodeId>,
    },
}

impl KdNode {
    pub fn bounds(&self) -> &Aabb {
        match self {
            KdNode::Leaf { bounds, .. } | KdNode::Interior { bounds, .. } => bounds,
        }
    }
}

/// Build limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdTreeConfig {
    pub max_depth: u32,
    /// Nodes with this many primitives or fewer become leaves.
    pub leaf_threshold: usize,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 20,
            leaf_threshold: 5,
        }
    }
}

/// Shape of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KdTreeStats {
    pub nodes: usize,
    pub leaves: usize,
    /// Deepest leaf (root is depth 0)
    pub depth: u32,
    /// Primitives in the scene
    pub primitives: usize,
    /// Primitive references summed over all leaves
    pub primitive_refs: usize,
}

/// Work done by closest-hit queries since the tree was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KdQueryStats {
    pub rays: u64,
    pub nodes_visited: u64,
    pub aabb_tests: u64,
    /// Rays rejected before any node was entered
    pub early_outs: u64,
    pub triangle_tests: u64,
    pub sphere_tests: u64,
    pub plane_tests: u64,
}

impl KdQueryStats {
    pub fn primitive_tests(&self) -> u64 {
        self.triangle_tests + self.sphere_tests + self.plane_tests
    }
}

/// Relaxed counters shared by the render threads.
#[derive(Default)]
struct QueryCounters {
    rays: AtomicU64,
    nodes_visited: AtomicU64,
    aabb_tests: AtomicU64,
    early_outs: AtomicU64,
    triangle_tests: AtomicU64,
    sphere_tests: AtomicU64,
    plane_tests: AtomicU64,
}

impl QueryCounters {
    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> KdQueryStats {
        KdQueryStats {
            rays: self.rays.load(Ordering::Relaxed),
            nodes_visited: self.nodes_visited.load(Ordering::Relaxed),
            aabb_tests: self.aabb_tests.load(Ordering::Relaxed),
            early_outs: self.early_outs.load(Ordering::Relaxed),
            triangle_tests: self.triangle_tests.load(Ordering::Relaxed),
            sphere_tests: self.sphere_tests.load(Ordering::Relaxed),
            plane_tests: self.plane_tests.load(Ordering::Relaxed),
        }
    }
}

/// Primitive index lists handled by one node during build.
#[derive(Default)]
struct PrimitiveSet {
    triangles: Vec<u32>,
    spheres: Vec<u32>,
    planes: Vec<u32>,
}

impl PrimitiveSet {
    fn len(&self) -> usize {
        self.triangles.len() + self.spheres.len() + self.planes.len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// KD-tree over the spheres, triangles and planes of a scene.
pub struct KdTree<'a> {
    scene: &'a Scene,
    nodes: Vec<KdNode>,
    root: Option<NodeId>,
    config: KdTreeConfig,
    stats: KdTreeStats,
    counters: QueryCounters,
}

impl<'a> KdTree<'a> {
    /// Build a tree over the current scene geometry.
    pub fn build(scene: &'a Scene, config: KdTreeConfig) -> Self {
        let mut tree = Self {
            scene,
            nodes: Vec::new(),
            root: None,
            config,
            stats: KdTreeStats::default(),
            counters: QueryCounters::default(),
        };

        let all = PrimitiveSet {
            triangles: (0..scene.triangles.len() as u32).collect(),
            spheres: (0..scene.spheres.len() as u32).collect(),
            planes: (0..scene.planes.len() as u32).collect(),
        };
        tree.stats.primitives = all.len();

        if !all.is_empty() {
            let bounds = tree.set_bounds(&all);
            tree.root = Some(tree.build_recursive(bounds, all, 0));
        }

        log::info!(
            "KD-tree built: {} primitives, {} nodes, {} leaves, depth {}, {} leaf references",
            tree.stats.primitives,
            tree.stats.nodes,
            tree.stats.leaves,
            tree.stats.depth,
            tree.stats.primitive_refs
        );
        tree
    }

    pub fn stats(&self) -> KdTreeStats {
        self.stats
    }

    /// Query counters accumulated so far.
    pub fn query_stats(&self) -> KdQueryStats {
        self.counters.snapshot()
    }

    pub fn config(&self) -> KdTreeConfig {
        self.config
    }

    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &KdNode {
        &self.nodes[id.0 as usize]
    }

    /// Bounds of the whole tree, empty for an empty scene.
    pub fn bounds(&self) -> Aabb {
        self.root.map_or(Aabb::EMPTY, |id| *self.node(id).bounds())
    }

    fn set_bounds(&self, set: &PrimitiveSet) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for &i in &set.triangles {
            bounds.expand_box(&triangle_bounds(&self.scene.triangles[i as usize]));
        }
        for &i in &set.spheres {
            bounds.expand_box(&sphere_bounds(&self.scene.spheres[i as usize]));
        }
        for &i in &set.planes {
            bounds.expand_box(&plane_bounds(&self.scene.planes[i as usize]));
        }
        bounds
    }

    fn push(&mut self, node: KdNode) -> NodeId {
        self.nodes.push(node);
        self.stats.nodes += 1;
        NodeId((self.nodes.len() - 1) as u32)
    }

    fn make_leaf(&mut self, bounds: Aabb, set: PrimitiveSet, depth: u32) -> NodeId {
        self.stats.leaves += 1;
        self.stats.depth = self.stats.depth.max(depth);
        self.stats.primitive_refs += set.len();
        self.push(KdNode::Leaf {
            bounds,
            triangles: set.triangles,
            spheres: set.spheres,
            planes: set.planes,
        })
    }

    fn build_recursive(&mut self, bounds: Aabb, set: PrimitiveSet, depth: u32) -> NodeId {
        let total = set.len();
        if depth >= self.config.max_depth || total <= self.config.leaf_threshold {
            return self.make_leaf(bounds, set, depth);
        }

        let axis = bounds.longest_axis();
        let split = self.median_split(axis, &set);
        let (left_set, right_set) = self.classify(axis, split, &set);

        // Degenerate split: one side would receive every primitive.
        if left_set.len() == total || right_set.len() == total {
            return self.make_leaf(bounds, set, depth);
        }

        let mut left_bounds = bounds;
        let mut right_bounds = bounds;
        left_bounds.max[axis] = split;
        right_bounds.min[axis] = split;

        let left = (!left_set.is_empty()).then(|| self.build_recursive(left_bounds, left_set, depth + 1));
        let right =
            (!right_set.is_empty()).then(|| self.build_recursive(right_bounds, right_set, depth + 1));

        self.push(KdNode::Interior {
            bounds,
            axis,
            split,
            left,
            right,
        })
    }

    /// Median of the representative coordinates along `axis`.
    fn median_split(&self, axis: Axis, set: &PrimitiveSet) -> f32 {
        let scene = self.scene;
        let mut positions: Vec<f32> = Vec::with_capacity(set.triangles.len() * 3 + set.spheres.len() + set.planes.len());
        for &i in &set.triangles {
            positions.extend(scene.triangles[i as usize].v.iter().map(|v| v[axis]));
        }
        positions.extend(set.spheres.iter().map(|&i| scene.spheres[i as usize].position[axis]));
        positions.extend(set.planes.iter().map(|&i| scene.planes[i as usize].position[axis]));

        if positions.is_empty() {
            return 0.0;
        }
        let mid = positions.len() / 2;
        let (_, median, _) = positions.select_nth_unstable_by(mid, f32::total_cmp);
        *median
    }

    fn classify(&self, axis: Axis, split: f32, set: &PrimitiveSet) -> (PrimitiveSet, PrimitiveSet) {
        let mut left = PrimitiveSet::default();
        let mut right = PrimitiveSet::default();

        let side = |b: Aabb| -> (bool, bool) {
            if b.max[axis] <= split {
                (true, false)
            } else if b.min[axis] >= split {
                (false, true)
            } else {
                (true, true)
            }
        };

        for &i in &set.triangles {
            let (l, r) = side(triangle_bounds(&self.scene.triangles[i as usize]));
            if l {
                left.triangles.push(i);
            }
            if r {
                right.triangles.push(i);
            }
        }
        for &i in &set.spheres {
            let (l, r) = side(sphere_bounds(&self.scene.spheres[i as usize]));
            if l {
                left.spheres.push(i);
            }
            if r {
                right.spheres.push(i);
            }
        }
        left.planes = set.planes.clone();
        right.planes = set.planes.clone();

        (left, right)
    }

    /// Closest hit with `ray_t.min < t < ray_t.max`.
    pub fn closest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let root = self.root?;
        QueryCounters::bump(&self.counters.rays);
        if ray.is_degenerate() {
            QueryCounters::bump(&self.counters.early_outs);
            return None;
        }
        QueryCounters::bump(&self.counters.aabb_tests);
        if !self.node(root).bounds().hit(ray, ray_t) {
            QueryCounters::bump(&self.counters.early_outs);
            return None;
        }
        let mut closest = None;
        let mut range = ray_t;
        self.query(root, ray, &mut range, &mut closest);
        closest
    }

    /// True when anything blocks the ray inside `ray_t`.
    pub fn occluded(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.closest_hit(ray, ray_t).is_some()
    }

    fn query(&self, id: NodeId, ray: &Ray, range: &mut Interval, closest: &mut Option<HitRecord>) {
        let node = self.node(id);
        QueryCounters::bump(&self.counters.nodes_visited);
        QueryCounters::bump(&self.counters.aabb_tests);
        if !node.bounds().hit(ray, *range) {
            return;
        }

        match node {
            KdNode::Leaf {
                triangles,
                spheres,
                planes,
                ..
            } => {
                let scene = self.scene;
                let hits = triangles
                    .iter()
                    .map(|&i| (Kind::Triangle, i))
                    .chain(spheres.iter().map(|&i| (Kind::Sphere, i)))
                    .chain(planes.iter().map(|&i| (Kind::Plane, i)));
                for (kind, i) in hits {
                    let i = i as usize;
                    let hit = match kind {
                        Kind::Triangle => {
                            QueryCounters::bump(&self.counters.triangle_tests);
                            intersect_triangle(ray, &scene.triangles[i], *range)
                        }
                        Kind::Sphere => {
                            QueryCounters::bump(&self.counters.sphere_tests);
                            intersect_sphere(ray, &scene.spheres[i], *range)
                        }
                        Kind::Plane => {
                            QueryCounters::bump(&self.counters.plane_tests);
                            intersect_plane(ray, &scene.planes[i], *range)
                        }
                    };
                    if let Some(rec) = hit {
                        *range = range.with_max(rec.t);
                        *closest = Some(rec);
                    }
                }
            }
            KdNode::Interior {
                axis, left, right, ..
            } => {
                let (first, second) = if ray.direction[*axis] >= 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };
                if let Some(child) = first {
                    self.query(*child, ray, range, closest);
                }
                if let Some(child) = second {
                    self.query(*child, ray, range, closest);
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Kind {
    Triangle,
    Sphere,
    Plane,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersect::closest_hit_brute_force;
    use ember_core::{Color, Material, MaterialHandle, Plane, Sphere, Triangle};
    use ember_math::Vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_scene(seed: u64, spheres: usize, triangles: usize) -> Scene {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scene = Scene::new("random");
        let mats: Vec<MaterialHandle> = (0..4)
            .map(|i| scene.add_material(Material::lambertian(format!("m{i}"), Color::ONE)))
            .collect();

        for i in 0..spheres {
            let c = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
            scene.add_sphere(Sphere::new(c, rng.gen_range(0.1..1.5), mats[i % 4]), None);
        }
        for i in 0..triangles {
            let base = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
            let mut jitter = || Vec3::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
            let (a, b) = (jitter(), jitter());
            scene.add_triangle(Triangle::new(base, base + a, base + b, mats[i % 4]), None);
        }
        scene
    }

    #[test]
    fn test_empty_scene() {
        let scene = Scene::new("empty");
        let tree = KdTree::build(&scene, KdTreeConfig::default());
        assert!(tree.root().is_none());
        assert_eq!(tree.stats().nodes, 0);
        assert!(tree.bounds().is_empty());

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(tree.closest_hit(&ray, Interval::from_min(0.01)).is_none());
    }

    #[test]
    fn test_small_scene_is_single_leaf() {
        let scene = random_scene(1, 3, 2);
        let tree = KdTree::build(&scene, KdTreeConfig::default());
        assert_eq!(tree.stats().nodes, 1);
        assert_eq!(tree.stats().leaves, 1);
        assert!(matches!(tree.node(tree.root().unwrap()), KdNode::Leaf { .. }));
    }

    #[test]
    fn test_tree_matches_brute_force() {
        let scene = random_scene(42, 60, 120);
        let tree = KdTree::build(&scene, KdTreeConfig::default());
        assert!(tree.stats().leaves > 1);
        assert!(tree.stats().primitive_refs >= tree.stats().primitives);

        let mut rng = StdRng::seed_from_u64(7);
        let range = Interval::from_min(0.01);
        let mut hits = 0;
        for _ in 0..2000 {
            let origin = Vec3::new(rng.gen_range(-15.0..15.0), rng.gen_range(-15.0..15.0), rng.gen_range(-15.0..15.0));
            let dir = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
            let ray = Ray::new(origin, dir);

            let expected = closest_hit_brute_force(&scene, &ray, range);
            let actual = tree.closest_hit(&ray, range);
            match (expected, actual) {
                (None, None) => {}
                (Some(e), Some(a)) => {
                    hits += 1;
                    assert!((e.t - a.t).abs() < 1e-4, "t mismatch: {} vs {}", e.t, a.t);
                    assert_eq!(e.material, a.material);
                }
                (e, a) => panic!("hit mismatch: brute force {:?}, tree {:?}", e, a),
            }
        }
        assert!(hits > 100, "too few hits to be meaningful: {}", hits);
    }

    #[test]
    fn test_depth_limit_is_respected() {
        let scene = random_scene(3, 200, 0);
        let config = KdTreeConfig {
            max_depth: 3,
            leaf_threshold: 1,
        };
        let tree = KdTree::build(&scene, config);
        assert!(tree.stats().depth <= 3);
        assert_eq!(tree.stats().nodes, tree.nodes().len());
    }

    #[test]
    fn test_planes_reach_every_leaf() {
        let mut scene = random_scene(5, 40, 0);
        let floor = scene.add_material(Material::lambertian("floor", Color::splat(0.5)));
        scene.add_plane(
            Plane::new(Vec3::new(-20.0, -12.0, -20.0), Vec3::Z * 40.0, Vec3::X * 40.0, floor),
            None,
        );
        let tree = KdTree::build(&scene, KdTreeConfig::default());
        for node in tree.nodes() {
            if let KdNode::Leaf { planes, .. } = node {
                assert_eq!(planes.as_slice(), &[0]);
            }
        }

        let down = Ray::new(Vec3::new(0.5, 30.0, 0.5), Vec3::NEG_Y);
        let range = Interval::from_min(0.01);
        let expected = closest_hit_brute_force(&scene, &down, range).map(|r| r.material);
        assert_eq!(tree.closest_hit(&down, range).map(|r| r.material), expected);
    }

    #[test]
    fn test_coincident_primitives_stop_splitting() {
        // Identical spheres can never be separated by a split.
        let mut scene = Scene::new("stack");
        let m = scene.add_material(Material::lambertian("m", Color::ONE));
        for _ in 0..20 {
            scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, m), None);
        }
        let tree = KdTree::build(&scene, KdTreeConfig::default());
        assert_eq!(tree.stats().leaves, 1);
        assert_eq!(tree.stats().primitive_refs, 20);
    }

    #[test]
    fn test_query_counters() {
        let mut scene = Scene::new("one");
        let m = scene.add_material(Material::lambertian("m", Color::ONE));
        scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, m), None);
        let tree = KdTree::build(&scene, KdTreeConfig::default());
        assert_eq!(tree.query_stats(), KdQueryStats::default());

        let ray_t = Interval::from_min(0.001);
        let hit = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(tree.closest_hit(&hit, ray_t).is_some());
        let stats = tree.query_stats();
        assert_eq!(stats.rays, 1);
        assert_eq!(stats.nodes_visited, 1);
        assert_eq!(stats.sphere_tests, 1);
        assert_eq!(stats.primitive_tests(), 1);
        assert_eq!(stats.early_outs, 0);
        assert!(stats.aabb_tests >= stats.nodes_visited);

        let miss = Ray::new(Vec3::new(10.0, 10.0, -5.0), Vec3::Z);
        assert!(tree.closest_hit(&miss, ray_t).is_none());
        let stats = tree.query_stats();
        assert_eq!(stats.rays, 2);
        assert_eq!(stats.early_outs, 1);
        assert_eq!(stats.nodes_visited, 1);
        assert_eq!(stats.primitive_tests(), 1);
    }

    #[test]
    fn test_tree_tests_fewer_primitives_than_a_scan() {
        let scene = random_scene(7, 80, 160);
        let tree = KdTree::build(&scene, KdTreeConfig::default());
        let mut rng = StdRng::seed_from_u64(11);
        let rays = 200;
        for _ in 0..rays {
            let origin = Vec3::new(rng.gen_range(-12.0..12.0), rng.gen_range(-12.0..12.0), -20.0);
            let target = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), 0.0);
            tree.closest_hit(&Ray::new(origin, (target - origin).normalize()), Interval::from_min(0.001));
        }
        let stats = tree.query_stats();
        assert_eq!(stats.rays, rays);
        assert!(stats.nodes_visited > rays);
        assert!(stats.primitive_tests() < rays * tree.stats().primitives as u64);
    }
}
