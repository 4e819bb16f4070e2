//! Durable in-process store for every DORA series.
//!
//! One mutex guards all series, so multi-series updates and snapshots are
//! consistent. No I/O happens while the lock is held; callers resolve teams
//! and lead times first.
//!
//! Lifecycle: `Uninitialized -> Reconciling -> Serving -> Flushing -> Stopped`.
//! Only `Serving` accepts updates. Persisting is allowed in `Serving` and
//! `Flushing`.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dora_core::error::{DoraError, Result};
use dora_core::metric::{LabelSet, MetricFamily, MetricKind, SeriesKey, Snapshot};
use dora_core::protocol::{self, ParsedFamily};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Reconciling,
    Serving,
    Flushing,
    Stopped,
}

impl Lifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Reconciling => "reconciling",
            Lifecycle::Serving => "serving",
            Lifecycle::Flushing => "flushing",
            Lifecycle::Stopped => "stopped",
        }
    }
}

/// A single update, applied together with its siblings under one lock.
#[derive(Debug, Clone)]
pub enum Observation {
    Increment(MetricFamily, LabelSet),
    Set(MetricFamily, LabelSet, f64),
    Add(MetricFamily, LabelSet, f64),
}

impl Observation {
    fn family(&self) -> MetricFamily {
        match self {
            Observation::Increment(f, _) | Observation::Set(f, _, _) | Observation::Add(f, _, _) => *f,
        }
    }

    fn labels(&self) -> &LabelSet {
        match self {
            Observation::Increment(_, l) | Observation::Set(_, l, _) | Observation::Add(_, l, _) => l,
        }
    }

    fn expected_kind(&self) -> MetricKind {
        match self {
            Observation::Increment(..) => MetricKind::Counter,
            Observation::Set(..) | Observation::Add(..) => MetricKind::Gauge,
        }
    }
}

/// What reconciliation did with a snapshot file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub restored: usize,
    pub skipped: usize,
    pub unknown_families: usize,
}

struct State {
    lifecycle: Lifecycle,
    series: BTreeMap<SeriesKey, f64>,
}

pub struct MetricsAccumulator {
    state: Mutex<State>,
    // Serializes snapshot writes so the newest state is always the one renamed last.
    persist_gate: Mutex<()>,
}

impl Default for MetricsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                lifecycle: Lifecycle::Uninitialized,
                series: BTreeMap::new(),
            }),
            persist_gate: Mutex::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state().lifecycle
    }

    pub fn is_serving(&self) -> bool {
        self.lifecycle() == Lifecycle::Serving
    }

    // --------------------
    // Recording
    // --------------------

    /// Apply all observations atomically: either every one is applied or none.
    pub fn record(&self, observations: &[Observation]) -> Result<()> {
        for obs in observations {
            let family = obs.family();
            obs.labels().conforms_to(family)?;
            if family.kind() != obs.expected_kind() {
                return Err(DoraError::KindMismatch {
                    family: family.name(),
                    expected: obs.expected_kind().as_str(),
                    actual: family.kind().as_str(),
                });
            }
        }

        let mut st = self.state();
        if st.lifecycle != Lifecycle::Serving {
            return Err(DoraError::InvalidState {
                op: "record",
                state: st.lifecycle.as_str(),
            });
        }
        for obs in observations {
            let key = (obs.family(), obs.labels().clone());
            match obs {
                Observation::Increment(..) => *st.series.entry(key).or_insert(0.0) += 1.0,
                Observation::Set(_, _, v) => {
                    st.series.insert(key, *v);
                }
                Observation::Add(_, _, d) => *st.series.entry(key).or_insert(0.0) += *d,
            }
        }
        Ok(())
    }

    /// Increase a counter series by one, creating it at 1 if absent.
    pub fn increment_counter(&self, family: MetricFamily, labels: &LabelSet) -> Result<()> {
        self.record(&[Observation::Increment(family, labels.clone())])
    }

    /// Overwrite a gauge series.
    pub fn set_gauge(&self, family: MetricFamily, labels: &LabelSet, value: f64) -> Result<()> {
        self.record(&[Observation::Set(family, labels.clone(), value)])
    }

    /// Add to a running-sum gauge, creating it at `delta` if absent.
    pub fn add_to_gauge(&self, family: MetricFamily, labels: &LabelSet, delta: f64) -> Result<()> {
        self.record(&[Observation::Add(family, labels.clone(), delta)])
    }

    // --------------------
    // Reading / persistence
    // --------------------

    /// Consistent point-in-time copy of every series.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.state().series.clone())
    }

    /// Current state in text exposition format.
    pub fn render(&self) -> String {
        protocol::render(&self.snapshot())
    }

    /// Overwrite `path` with the current snapshot.
    pub fn persist_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let lifecycle = self.lifecycle();
        if !matches!(lifecycle, Lifecycle::Serving | Lifecycle::Flushing) {
            return Err(DoraError::InvalidState {
                op: "persist",
                state: lifecycle.as_str(),
            });
        }
        self.write_snapshot(path.as_ref())
    }

    fn write_snapshot(&self, path: &Path) -> Result<()> {
        let _gate = self.persist_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let text = self.render();

        let tmp = tmp_path(path);
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(text.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        tracing::debug!(file = %path.display(), bytes = text.len(), "metrics exported");
        Ok(())
    }

    // --------------------
    // Startup / shutdown
    // --------------------

    /// Restore state from a previous snapshot, then start serving.
    ///
    /// Returns `Ok(true)` when a snapshot was restored and `Ok(false)` on a
    /// cold start (file absent or unparsable), in which case an empty snapshot
    /// is written. Either way the accumulator ends up `Serving`. An error means
    /// the file could not be read (e.g. permissions) or the empty snapshot
    /// could not be written; the existing file is left untouched.
    pub fn load_and_reconcile(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        {
            let mut st = self.state();
            if st.lifecycle != Lifecycle::Uninitialized {
                return Err(DoraError::InvalidState {
                    op: "reconcile",
                    state: st.lifecycle.as_str(),
                });
            }
            st.lifecycle = Lifecycle::Reconciling;
        }

        let loaded = read_snapshot(path).map(|families| self.reconcile(&families));
        let result = match loaded {
            Ok(report) => {
                tracing::info!(
                    file = %path.display(),
                    restored = report.restored,
                    skipped = report.skipped,
                    unknown_families = report.unknown_families,
                    "metrics imported"
                );
                Ok(true)
            }
            Err(e) if e.is_cold_start() => {
                tracing::info!(file = %path.display(), reason = %e, "no prior metrics, creating new file");
                self.write_snapshot(path).map(|()| false)
            }
            Err(e) => Err(e),
        };

        self.state().lifecycle = Lifecycle::Serving;
        result
    }

    /// Replace in-memory series with decoded ones.
    ///
    /// Counters are replaced, never incremented: the stored value already is
    /// the cumulative total from before the restart.
    fn reconcile(&self, families: &[ParsedFamily]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut st = self.state();

        for parsed in families {
            let Some(family) = MetricFamily::from_name(&parsed.name) else {
                tracing::debug!(family = %parsed.name, "ignoring unknown family");
                report.unknown_families += 1;
                continue;
            };

            if let Some(declared) = parsed.declared_type.as_kind() {
                if declared != family.kind() {
                    tracing::warn!(%family, declared = declared.as_str(), "type mismatch, family skipped");
                    report.skipped += parsed.samples.len();
                    continue;
                }
            } else if parsed.declared_type != protocol::DeclaredType::Untyped {
                tracing::warn!(%family, "unsupported declared type, family skipped");
                report.skipped += parsed.samples.len();
                continue;
            }

            for sample in &parsed.samples {
                if sample.name != parsed.name {
                    report.skipped += 1;
                    continue;
                }
                if let Err(e) = sample.labels.conforms_to(family) {
                    tracing::warn!(error = %e, "series skipped");
                    report.skipped += 1;
                    continue;
                }
                let valid = match family.kind() {
                    MetricKind::Counter => sample.value.is_finite() && sample.value >= 0.0,
                    MetricKind::Gauge => !sample.value.is_nan(),
                };
                if !valid {
                    tracing::warn!(%family, value = sample.value, "invalid value, series skipped");
                    report.skipped += 1;
                    continue;
                }

                tracing::debug!(%family, kind = family.kind().as_str(), value = sample.value, "import");
                st.series
                    .insert((family, sample.labels.clone()), sample.value);
                report.restored += 1;
            }
        }
        report
    }

    /// Stop accepting updates; persisting is still allowed.
    pub fn begin_flush(&self) {
        let mut st = self.state();
        if st.lifecycle == Lifecycle::Serving {
            st.lifecycle = Lifecycle::Flushing;
        }
    }

    pub fn stop(&self) {
        self.state().lifecycle = Lifecycle::Stopped;
    }
}

fn read_snapshot(path: &Path) -> Result<Vec<ParsedFamily>> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DoraError::SnapshotAbsent(path.display().to_string()))
        }
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            return Err(DoraError::SnapshotUnparsable {
                line: 0,
                reason: e.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    protocol::parse(&text)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
