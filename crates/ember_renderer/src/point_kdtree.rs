//! Point k-d tree used to index photons.
//!
//! The tree is implicit: `build` reorders the items in place so that for
//! every sub-slice the middle element is the median along axis
//! `depth % 3`, with smaller coordinates before it and larger after.
//! Before `build` (or after a `push`) queries fall back to a linear scan.

use ember_math::{Aabb, Vec3};

/// Anything with a position in space.
pub trait Positioned {
    fn position(&self) -> Vec3;
}

impl Positioned for Vec3 {
    fn position(&self) -> Vec3 {
        *self
    }
}

/// Static k-d tree over positioned items.
#[derive(Debug, Clone)]
pub struct PointKdTree<T> {
    items: Vec<T>,
    built: bool,
    bounds: Aabb,
}

impl<T> Default for PointKdTree<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            built: false,
            bounds: Aabb::EMPTY,
        }
    }
}

impl<T: Positioned> PointKdTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap items without building the index.
    pub fn from_items(items: Vec<T>) -> Self {
        let bounds = Aabb::from_iter_points(items.iter().map(Positioned::position));
        Self {
            items,
            built: false,
            bounds,
        }
    }

    /// Add an item. Invalidates the index until the next `build`.
    pub fn push(&mut self, item: T) {
        self.bounds.expand(item.position());
        self.items.push(item);
        self.built = false;
    }

    pub fn build(&mut self) {
        build_range(&mut self.items, 0);
        self.built = true;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in index order (arbitrary before `build`).
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.built = false;
        self.bounds = Aabb::EMPTY;
    }

    /// All items within `radius` of `center` (inclusive), in no
    /// particular order.
    pub fn within_radius(&self, center: Vec3, radius: f32) -> Vec<&T> {
        let mut out = Vec::new();
        if radius < 0.0 {
            return out;
        }
        let r2 = radius * radius;
        if self.built {
            range_query(&self.items, 0, center, radius, r2, &mut out);
        } else {
            out.extend(
                self.items
                    .iter()
                    .filter(|item| item.position().distance_squared(center) <= r2),
            );
        }
        out
    }

    /// The `k` items closest to `center`, nearest first, with their
    /// distances.
    ///
    /// Repeats the range search with a doubling radius until it returns at
    /// least `k` items or covers the whole set.
    pub fn nearest(&self, center: Vec3, k: usize) -> Vec<(f32, &T)> {
        if k == 0 || self.items.is_empty() {
            return Vec::new();
        }

        let found = if self.built {
            let reach = farthest_corner_distance(&self.bounds, center);
            let fraction = (k as f32 / self.items.len() as f32).min(1.0);
            let mut radius = (self.bounds.diagonal().length() * fraction.cbrt()).max(1e-4);
            loop {
                let found = self.within_radius(center, radius);
                if found.len() >= k || radius >= reach {
                    break found;
                }
                radius *= 2.0;
            }
        } else {
            self.items.iter().collect()
        };

        let mut with_dist: Vec<(f32, &T)> = found
            .into_iter()
            .map(|item| (item.position().distance(center), item))
            .collect();
        with_dist.sort_by(|a, b| a.0.total_cmp(&b.0));
        with_dist.truncate(k);
        with_dist
    }
}

fn build_range<T: Positioned>(items: &mut [T], depth: usize) {
    if items.len() <= 1 {
        return;
    }
    let axis = depth % 3;
    let mid = items.len() / 2;
    items.select_nth_unstable_by(mid, |a, b| a.position()[axis].total_cmp(&b.position()[axis]));

    let (left, rest) = items.split_at_mut(mid);
    build_range(left, depth + 1);
    build_range(&mut rest[1..], depth + 1);
}

fn range_query<'a, T: Positioned>(
    items: &'a [T],
    depth: usize,
    center: Vec3,
    radius: f32,
    r2: f32,
    out: &mut Vec<&'a T>,
) {
    if items.is_empty() {
        return;
    }
    let axis = depth % 3;
    let mid = items.len() / 2;
    let item = &items[mid];
    let p = item.position();
    if p.distance_squared(center) <= r2 {
        out.push(item);
    }

    let delta = center[axis] - p[axis];
    let (near, far) = if delta <= 0.0 {
        (&items[..mid], &items[mid + 1..])
    } else {
        (&items[mid + 1..], &items[..mid])
    };
    range_query(near, depth + 1, center, radius, r2, out);
    if delta.abs() <= radius {
        range_query(far, depth + 1, center, radius, r2, out);
    }
}

fn farthest_corner_distance(bounds: &Aabb, p: Vec3) -> f32 {
    let far = (bounds.min - p).abs().max((bounds.max - p).abs());
    far.length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(seed: u64, n: usize) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Vec3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)))
            .collect()
    }

    fn sorted(mut v: Vec<Vec3>) -> Vec<Vec3> {
        v.sort_by(|a, b| {
            a.x.total_cmp(&b.x)
                .then(a.y.total_cmp(&b.y))
                .then(a.z.total_cmp(&b.z))
        });
        v
    }

    #[test]
    fn test_build_places_median_in_middle() {
        let mut tree = PointKdTree::from_items(random_points(1, 101));
        tree.build();
        let items = tree.items();
        let mid = items[50];
        assert!(items[..50].iter().all(|p| p.x <= mid.x));
        assert!(items[51..].iter().all(|p| p.x >= mid.x));
    }

    #[test]
    fn test_range_matches_linear_scan() {
        let points = random_points(2, 500);
        let linear = PointKdTree::from_items(points.clone());
        let mut indexed = PointKdTree::from_items(points);
        indexed.build();
        assert!(indexed.is_built() && !linear.is_built());

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let c = Vec3::new(rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0));
            let r = rng.gen_range(0.1..4.0);
            let a = sorted(linear.within_radius(c, r).into_iter().copied().collect());
            let b = sorted(indexed.within_radius(c, r).into_iter().copied().collect());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_nearest_matches_sorted_distances() {
        let points = random_points(4, 300);
        let mut tree = PointKdTree::from_items(points.clone());
        tree.build();

        let center = Vec3::new(0.3, -1.0, 2.0);
        let k = 10;
        let nearest = tree.nearest(center, k);
        assert_eq!(nearest.len(), k);

        let mut expected: Vec<f32> = points.iter().map(|p| p.distance(center)).collect();
        expected.sort_by(f32::total_cmp);
        for (i, (d, _)) in nearest.iter().enumerate() {
            assert!((d - expected[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_nearest_with_fewer_items_than_k() {
        let mut tree = PointKdTree::from_items(vec![Vec3::ZERO, Vec3::X, Vec3::splat(100.0)]);
        tree.build();
        let found = tree.nearest(Vec3::ZERO, 50);
        assert_eq!(found.len(), 3);
        assert_eq!(*found[0].1, Vec3::ZERO);
        assert_eq!(*found[2].1, Vec3::splat(100.0));
    }

    #[test]
    fn test_unbuilt_and_empty() {
        let empty: PointKdTree<Vec3> = PointKdTree::new();
        assert!(empty.within_radius(Vec3::ZERO, 10.0).is_empty());
        assert!(empty.nearest(Vec3::ZERO, 5).is_empty());

        let mut tree = PointKdTree::new();
        tree.push(Vec3::ONE);
        tree.push(Vec3::splat(3.0));
        assert_eq!(tree.within_radius(Vec3::ZERO, 2.0).len(), 1);
        assert_eq!(tree.nearest(Vec3::splat(3.0), 1)[0].0, 0.0);

        tree.build();
        tree.push(Vec3::ZERO);
        assert!(!tree.is_built());
        assert_eq!(tree.within_radius(Vec3::ZERO, 2.0).len(), 2);
    }
}
