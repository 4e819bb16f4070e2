//! Point-in-time copy of every series.

use std::collections::BTreeMap;

use crate::metric::family::MetricFamily;
use crate::metric::labels::LabelSet;

/// A series is uniquely identified by (family, labels).
pub type SeriesKey = (MetricFamily, LabelSet);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    series: BTreeMap<SeriesKey, f64>,
}

impl Snapshot {
    pub fn new(series: BTreeMap<SeriesKey, f64>) -> Self {
        Self { series }
    }

    pub fn get(&self, family: MetricFamily, labels: &LabelSet) -> Option<f64> {
        // BTreeMap lookups need an owned tuple key.
        self.series.get(&(family, labels.clone())).copied()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series in exposition order: by family, then by labels.
    pub fn iter(&self) -> impl Iterator<Item = (MetricFamily, &LabelSet, f64)> {
        self.series.iter().map(|((f, l), v)| (*f, l, *v))
    }

    pub fn family(&self, family: MetricFamily) -> impl Iterator<Item = (&LabelSet, f64)> {
        self.iter()
            .filter(move |(f, _, _)| *f == family)
            .map(|(_, l, v)| (l, v))
    }
}
