//! Progress reporting for install runs

use std::sync::Arc;

/// Progress callback invoked for every [`ProgressEvent`]
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// States of one install run's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    ResolvingDependencies,
    DownloadingAndVerifying,
    ExtractingBundle,
    ResolvingManifestFiles,
    DownloadingManifestFiles,
    Completed,
    Failed,
}

impl std::fmt::Display for InstallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InstallState::Idle => "idle",
            InstallState::ResolvingDependencies => "resolving dependencies",
            InstallState::DownloadingAndVerifying => "downloading and verifying",
            InstallState::ExtractingBundle => "extracting bundle",
            InstallState::ResolvingManifestFiles => "resolving manifest files",
            InstallState::DownloadingManifestFiles => "downloading manifest files",
            InstallState::Completed => "completed",
            InstallState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Events emitted upward so a caller can render live status without
/// polling internal state
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    StateChanged {
        state: InstallState,
    },
    /// A download unit entered flight
    UnitStarted {
        mod_name: String,
        file_name: String,
    },
    /// A unit resolved; `percent` is monotonically non-decreasing
    UnitFinished {
        file_name: String,
        percent: f64,
    },
    Warning {
        message: String,
    },
    Completed {
        verified_files: usize,
    },
    Failed {
        error: String,
    },
}

/// Per-run progress accounting
///
/// Emits a `completed / total` percent after each unit resolves. Bundle
/// manifest expansion grows the total mid-run, which would make the raw
/// fraction dip; the tracker clamps emitted percents non-decreasing.
pub struct ProgressTracker {
    callback: Option<ProgressCallback>,
    total: usize,
    completed: usize,
    last_percent: f64,
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            total: 0,
            completed: 0,
            last_percent: 0.0,
        }
    }

    pub fn add_units(&mut self, count: usize) {
        self.total += count;
    }

    pub fn state_changed(&self, state: InstallState) {
        self.emit(ProgressEvent::StateChanged { state });
    }

    pub fn unit_started(&self, mod_name: &str, file_name: &str) {
        self.emit(ProgressEvent::UnitStarted {
            mod_name: mod_name.to_string(),
            file_name: file_name.to_string(),
        });
    }

    pub fn unit_finished(&mut self, file_name: &str) {
        self.completed += 1;
        let raw = if self.total == 0 {
            100.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        };
        let percent = raw.max(self.last_percent);
        self.last_percent = percent;
        self.emit(ProgressEvent::UnitFinished {
            file_name: file_name.to_string(),
            percent,
        });
    }

    pub fn warning(&self, message: String) {
        self.emit(ProgressEvent::Warning { message });
    }

    pub fn completed(&self, verified_files: usize) {
        self.emit(ProgressEvent::Completed { verified_files });
    }

    pub fn failed(&self, error: &crate::error::InstallError) {
        self.emit(ProgressEvent::Failed {
            error: error.to_string(),
        });
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref callback) = self.callback {
            callback(event);
        }
    }
}
