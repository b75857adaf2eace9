//! Progress tracking for downloads

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Snapshot handed to observers
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Expected length, 0 when the server did not announce one
    pub total_bytes: u64,
    pub downloaded_bytes: u64,
    pub speed: f64, // bytes per second
    pub eta: Option<Duration>,
    pub status: DownloadStatus,
}

impl DownloadProgress {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            downloaded_bytes: 0,
            speed: 0.0,
            eta: None,
            status: DownloadStatus::Initializing,
        }
    }

    /// Update progress with new data
    pub fn update(&mut self, downloaded_bytes: u64, speed: f64) {
        self.downloaded_bytes = downloaded_bytes;
        self.speed = speed;

        if self.is_indeterminate() {
            self.eta = None;
        } else if speed > 0.0 && self.downloaded_bytes < self.total_bytes {
            let remaining = self.total_bytes - self.downloaded_bytes;
            self.eta = Some(Duration::from_secs_f64((remaining as f64) / speed));
        } else if self.downloaded_bytes >= self.total_bytes {
            self.eta = Some(Duration::from_secs(0));
        } else {
            self.eta = None;
        }
    }

    /// Mark as completed. An unknown total becomes the byte count seen.
    pub fn complete(&mut self) {
        self.status = DownloadStatus::Completed;
        if self.is_indeterminate() {
            self.total_bytes = self.downloaded_bytes;
        }
        self.eta = Some(Duration::from_secs(0));
    }

    pub fn failed(&mut self, error: String) {
        self.status = DownloadStatus::Failed(error);
    }

    /// True when no total is known, so a bar has no determinate end
    pub fn is_indeterminate(&self) -> bool {
        self.total_bytes == 0
    }

    /// Get progress percentage (0.0 to 1.0), 0.0 when the total is unknown
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.downloaded_bytes as f64 / self.total_bytes as f64
    }
}

/// Download status
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DownloadStatus {
    #[default]
    Initializing,
    Downloading,
    Completed,
    Failed(String),
}

/// Receives progress snapshots while bytes are copied
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &DownloadProgress);
}

impl ProgressObserver for mpsc::UnboundedSender<DownloadProgress> {
    fn on_progress(&self, progress: &DownloadProgress) {
        // A dropped receiver only means nobody is watching anymore.
        let _ = self.send(progress.clone());
    }
}

impl<F> ProgressObserver for F
where
    F: Fn(&DownloadProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &DownloadProgress) {
        self(progress)
    }
}

/// Passive byte accumulator for one in-flight download
pub struct ProgressTracker {
    progress: DownloadProgress,
    observer: Option<Arc<dyn ProgressObserver>>,
    started: Instant,
    last_notified: Option<Instant>,
    interval: Duration,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            progress: DownloadProgress::new(total_bytes),
            observer: None,
            started: Instant::now(),
            last_notified: None,
            interval: Duration::from_millis(500),
        }
    }

    pub fn with_observer(mut self, observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        self.observer = observer;
        self
    }

    /// Minimum delay between two notifications; zero notifies on every write
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn progress(&self) -> &DownloadProgress {
        &self.progress
    }

    pub fn written(&self) -> u64 {
        self.progress.downloaded_bytes
    }

    /// Account for `bytes` more bytes written
    pub fn record(&mut self, bytes: usize) {
        if self.progress.status == DownloadStatus::Initializing {
            self.progress.status = DownloadStatus::Downloading;
        }

        let downloaded = self.progress.downloaded_bytes + bytes as u64;
        let speed = self.current_speed(downloaded);
        self.progress.update(downloaded, speed);

        let now = Instant::now();
        let due = match self.last_notified {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        };
        if due {
            self.last_notified = Some(now);
            self.notify();
        }
    }

    pub fn finish(&mut self) {
        let speed = self.current_speed(self.progress.downloaded_bytes);
        self.progress.speed = speed;
        self.progress.complete();
        self.notify();
    }

    pub fn fail(&mut self, error: &str) {
        self.progress.failed(error.to_string());
        self.notify();
    }

    fn current_speed(&self, downloaded: u64) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            downloaded as f64 / elapsed
        } else {
            0.0
        }
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer.on_progress(&self.progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_download_progress_new() {
        let progress = DownloadProgress::new(1000);

        assert_eq!(progress.total_bytes, 1000);
        assert_eq!(progress.downloaded_bytes, 0);
        assert_eq!(progress.speed, 0.0);
        assert_eq!(progress.eta, None);
        assert!(matches!(progress.status, DownloadStatus::Initializing));
    }

    #[test]
    fn test_progress_update_basic() {
        let mut progress = DownloadProgress::new(1000);
        progress.update(500, 100.0);

        assert_eq!(progress.downloaded_bytes, 500);
        assert_eq!(
            progress.eta.unwrap().as_secs(),
            5,
            "ETA should be 5 seconds (500 bytes remaining at 100 B/s)"
        );
    }

    #[test]
    fn test_progress_update_zero_speed() {
        let mut progress = DownloadProgress::new(1000);
        progress.update(100, 0.0);
        assert_eq!(progress.eta, None, "ETA should be None with zero speed");
    }

    #[test]
    fn test_unknown_total_is_indeterminate() {
        let mut progress = DownloadProgress::new(0);
        progress.update(4096, 100.0);

        assert!(progress.is_indeterminate());
        assert_eq!(progress.percentage(), 0.0, "Should not divide by zero");
        assert_eq!(progress.eta, None);

        progress.complete();
        assert_eq!(progress.total_bytes, 4096);
        assert_eq!(progress.percentage(), 1.0);
    }

    #[test]
    fn test_percentage_precision() {
        let mut progress = DownloadProgress::new(12345);
        progress.update(3333, 100.0);

        let expected = 3333.0 / 12345.0;
        assert!((progress.percentage() - expected).abs() < 0.00001);
    }

    #[test]
    fn test_failed_status_keeps_bytes() {
        let mut progress = DownloadProgress::new(10_000);
        progress.update(2500, 1000.0);
        progress.failed("Connection lost".to_string());

        assert_eq!(
            progress.status,
            DownloadStatus::Failed("Connection lost".to_string())
        );
        assert_eq!(progress.downloaded_bytes, 2500);
    }

    #[test]
    fn test_tracker_accumulates() {
        let mut tracker = ProgressTracker::new(300);
        tracker.record(100);
        tracker.record(100);
        tracker.record(100);

        assert_eq!(tracker.written(), 300);
        assert_eq!(tracker.progress().status, DownloadStatus::Downloading);

        tracker.finish();
        assert_eq!(tracker.progress().status, DownloadStatus::Completed);
        assert_eq!(tracker.progress().percentage(), 1.0);
    }

    #[test]
    fn test_tracker_notifies_observer() {
        let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: Arc<dyn ProgressObserver> = Arc::new(move |p: &DownloadProgress| {
            sink.lock().unwrap().push(p.downloaded_bytes);
        });

        let mut tracker = ProgressTracker::new(0)
            .with_observer(Some(observer))
            .with_interval(Duration::ZERO);
        tracker.record(10);
        tracker.record(20);
        tracker.finish();

        assert_eq!(seen.lock().unwrap().as_slice(), &[10, 30, 30]);
    }

    #[test]
    fn test_tracker_throttles_but_always_sends_final() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tracker = ProgressTracker::new(1000)
            .with_observer(Some(Arc::new(tx)))
            .with_interval(Duration::from_secs(3600));

        for _ in 0..10 {
            tracker.record(100);
        }
        tracker.finish();

        let mut updates = Vec::new();
        while let Ok(p) = rx.try_recv() {
            updates.push(p);
        }
        assert_eq!(updates.len(), 2, "first write plus the final update");
        assert_eq!(updates[1].status, DownloadStatus::Completed);
        assert_eq!(updates[1].downloaded_bytes, 1000);
    }
}
