//! Static nearest-neighbour index over lamp positions.
//!
//! Lamp layouts are small and never move, so a flat array with a bounded
//! radius scan is enough; results are identical to a k-d tree queried for all
//! lamps and filtered by range.

#[derive(Clone, Debug)]
pub struct LampIndex {
    points: Vec<[f64; 2]>,
}

impl LampIndex {
    pub fn build(points: impl IntoIterator<Item = [f64; 2]>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, idx: usize) -> Option<[f64; 2]> {
        self.points.get(idx).copied()
    }

    /// All lamps within `radius` (inclusive) of `query` as `(index, distance)`,
    /// nearest first. A non-finite query matches nothing.
    pub fn within_radius(&self, query: [f64; 2], radius: f64) -> Vec<(usize, f64)> {
        if !query[0].is_finite() || !query[1].is_finite() || !(radius >= 0.0) {
            return Vec::new();
        }
        let mut hits: Vec<(usize, f64)> = self
            .points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let d = (p[0] - query[0]).hypot(p[1] - query[1]);
                (d <= radius).then_some((i, d))
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits
    }

    /// Nearest lamp to `query`, if any.
    pub fn nearest(&self, query: [f64; 2]) -> Option<(usize, f64)> {
        self.within_radius(query, f64::INFINITY).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LampIndex {
        LampIndex::build([[0.0, 0.0], [0.0, 10.0], [0.0, 30.0], [5.0, 0.0]])
    }

    #[test]
    fn radius_query_is_inclusive_and_sorted() {
        let hits = index().within_radius([0.0, 0.0], 10.0);
        let ids: Vec<usize> = hits.iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![0, 3, 1]);
        assert_eq!(hits[2].1, 10.0);
    }

    #[test]
    fn nearest_picks_closest() {
        assert_eq!(index().nearest([0.0, 27.0]).map(|h| h.0), Some(2));
    }

    #[test]
    fn nan_query_matches_nothing() {
        assert!(index().within_radius([f64::NAN, 0.0], 100.0).is_empty());
        assert!(index().within_radius([0.0, 0.0], f64::NAN).is_empty());
    }
}
