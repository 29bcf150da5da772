use std::collections::VecDeque;

/// One predicted sample of an object's Earth-fixed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub position: [f64; 3],
    pub minutes_from_epoch: f64,
    pub above_threshold: bool,
}

/// Rolling window of predicted samples for one catalog entry.
///
/// Points are strictly increasing in time and `above_threshold_count`
/// always equals the number of points flagged above threshold.
#[derive(Debug, Clone, Default)]
pub struct SatellitePath {
    pub name: String,
    pub special: bool,
    points: VecDeque<PathPoint>,
    above_threshold_count: usize,
}

impl SatellitePath {
    pub fn new(name: impl Into<String>, special: bool) -> Self {
        Self {
            name: name.into(),
            special,
            ..Default::default()
        }
    }

    pub fn points(&self) -> &VecDeque<PathPoint> {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PathPoint> {
        self.points.front()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.points.back()
    }

    pub fn above_threshold_count(&self) -> usize {
        self.above_threshold_count
    }

    /// Append a point. Points not strictly after the last one are rejected.
    pub fn push(&mut self, point: PathPoint) -> bool {
        if let Some(last) = self.points.back() {
            if point.minutes_from_epoch <= last.minutes_from_epoch {
                return false;
            }
        }
        if point.above_threshold {
            self.above_threshold_count += 1;
        }
        self.points.push_back(point);
        true
    }

    pub fn pop_front(&mut self) -> Option<PathPoint> {
        let point = self.points.pop_front()?;
        if point.above_threshold {
            self.above_threshold_count -= 1;
        }
        Some(point)
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.above_threshold_count = 0;
    }
}
