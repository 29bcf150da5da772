use std::ops::Index;
use std::time::{Duration, Instant};

use crate::engine::observer::distance;
use crate::engine::SatellitePosition;

/// Something that can be ranked by distance to the viewer.
pub trait Proximity {
    fn position_km(&self) -> [f64; 3];
    fn is_special(&self) -> bool;
}

impl Proximity for SatellitePosition {
    fn position_km(&self) -> [f64; 3] {
        self.position
    }

    fn is_special(&self) -> bool {
        self.special
    }
}

/// Lazily re-sorted permutation of objects by distance to the viewer.
///
/// Special objects rank as distance zero; ties keep their original order.
#[derive(Debug)]
pub struct ProximitySorter {
    order: Vec<usize>,
    max_visible: usize,
    sorted_max: Option<usize>,
    origin: Option<[f64; 3]>,
    last_sort: Option<Instant>,
    resort_interval: Duration,
    count: usize,
}

impl ProximitySorter {
    pub fn new(max_visible: usize, resort_interval: Duration) -> Self {
        Self {
            order: Vec::new(),
            max_visible,
            sorted_max: None,
            origin: None,
            last_sort: None,
            resort_interval,
            count: 0,
        }
    }

    pub fn set_max_visible(&mut self, max_visible: usize) {
        self.max_visible = max_visible;
    }

    /// Re-rank `items` around `origin` if anything relevant changed. Returns
    /// whether a sort happened.
    pub fn sort<T: Proximity>(&mut self, origin: [f64; 3], items: &[T], now: Instant) -> bool {
        if self.order.len() != items.len() {
            self.last_sort = None;
        }
        if self.sorted_max != Some(self.max_visible) {
            self.sorted_max = Some(self.max_visible);
            self.last_sort = None;
        }

        let fresh = self
            .last_sort
            .is_some_and(|at| now.saturating_duration_since(at) < self.resort_interval);
        if fresh && self.origin == Some(origin) {
            return false;
        }

        self.last_sort = Some(now);
        self.origin = Some(origin);
        let rank = |i: usize| {
            let item = &items[i];
            if item.is_special() {
                0.0
            } else {
                distance(item.position_km(), origin)
            }
        };
        // Start from catalog order so the stable sort breaks ties by index.
        self.order = (0..items.len()).collect();
        self.order.sort_by(|&a, &b| rank(a).total_cmp(&rank(b)));
        self.count = self.max_visible.min(items.len());
        true
    }

    /// Number of ranked objects to use, `min(max_visible, len)` as of the
    /// last sort.
    pub fn count(&self) -> usize {
        self.count
    }
}

/// `sorter[i]` is the index of the i-th closest object.
impl Index<usize> for ProximitySorter {
    type Output = usize;

    fn index(&self, i: usize) -> &usize {
        &self.order[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        special: bool,
        x: f64,
    }

    impl Proximity for Item {
        fn position_km(&self) -> [f64; 3] {
            [self.x, 0.0, 0.0]
        }

        fn is_special(&self) -> bool {
            self.special
        }
    }

    fn item(special: bool, x: f64) -> Item {
        Item { special, x }
    }

    const ORIGIN: [f64; 3] = [0.0; 3];

    fn closest(sorter: &ProximitySorter) -> Vec<usize> {
        (0..sorter.count()).map(|i| sorter[i]).collect()
    }

    #[test]
    fn special_objects_rank_first() {
        let items = [item(false, 5.0), item(true, 50.0), item(false, 1.0)];
        let mut sorter = ProximitySorter::new(10, Duration::from_secs(5));
        assert!(sorter.sort(ORIGIN, &items, Instant::now()));
        assert_eq!(closest(&sorter), vec![1, 2, 0]);
        assert_eq!(sorter.count(), 3);
        assert_eq!(sorter[0], 1);
    }

    #[test]
    fn ties_keep_catalog_order() {
        let items = [item(false, 3.0), item(true, 9.0), item(false, 3.0), item(true, 1.0)];
        let mut sorter = ProximitySorter::new(10, Duration::from_secs(5));
        sorter.sort(ORIGIN, &items, Instant::now());
        assert_eq!(closest(&sorter), vec![1, 3, 0, 2]);
    }

    #[test]
    fn count_is_capped_by_max_visible() {
        let items = [item(false, 3.0), item(false, 2.0), item(false, 1.0)];
        let mut sorter = ProximitySorter::new(2, Duration::from_secs(5));
        let now = Instant::now();
        sorter.sort(ORIGIN, &items, now);
        assert_eq!(closest(&sorter), vec![2, 1]);

        sorter.set_max_visible(5);
        assert!(sorter.sort(ORIGIN, &items, now));
        assert_eq!(sorter.count(), 3);
    }

    #[test]
    fn resorts_only_when_needed() {
        let near_first = [item(false, 1.0), item(false, 10.0)];
        let mut sorter = ProximitySorter::new(10, Duration::from_secs(5));
        let start = Instant::now();
        assert!(sorter.sort(ORIGIN, &near_first, start));

        // Same origin, within the interval: order is kept even if objects moved.
        let moved = [item(false, 10.0), item(false, 1.0)];
        assert!(!sorter.sort(ORIGIN, &moved, start + Duration::from_secs(1)));
        assert_eq!(sorter[0], 0);

        // Interval elapsed.
        assert!(sorter.sort(ORIGIN, &moved, start + Duration::from_secs(6)));
        assert_eq!(sorter[0], 1);

        // Viewer moved.
        assert!(sorter.sort([20.0, 0.0, 0.0], &moved, start + Duration::from_secs(7)));
        assert_eq!(sorter[0], 0);
    }

    #[test]
    fn ties_after_resort_fall_back_to_catalog_order() {
        let mut sorter = ProximitySorter::new(10, Duration::from_secs(5));
        let start = Instant::now();
        sorter.sort(ORIGIN, &[item(false, 3.0), item(false, 1.0)], start);
        assert_eq!(closest(&sorter), vec![1, 0]);

        let tied = [item(false, 2.0), item(false, 2.0)];
        assert!(sorter.sort(ORIGIN, &tied, start + Duration::from_secs(6)));
        assert_eq!(closest(&sorter), vec![0, 1]);
    }

    #[test]
    fn catalog_size_change_rebuilds_order() {
        let mut sorter = ProximitySorter::new(10, Duration::from_secs(5));
        let now = Instant::now();
        sorter.sort(ORIGIN, &[item(false, 2.0), item(false, 1.0)], now);
        assert!(sorter.sort(ORIGIN, &[item(false, 1.0)], now));
        assert_eq!(closest(&sorter), vec![0]);
    }
}
