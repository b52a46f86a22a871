// Jitter of periodic tasks: min/max/avg of the time between consecutive
// marks, over a window the reporter resets.

use std::fmt;
use std::time::Instant;

use parking_lot::Mutex;

// called at the top of every iteration
pub trait TimingMarker: Send + Sync {
    fn mark(&self);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntervalSummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub count: u32,
}

impl fmt::Display for IntervalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}, {:.3}] avg {:.3}/{}",
            self.min_ms, self.max_ms, self.avg_ms, self.count
        )
    }
}

#[derive(Default)]
struct Window {
    last: Option<Instant>,
    min_ms: f64,
    max_ms: f64,
    sum_ms: f64,
    count: u32,
}

#[derive(Default)]
pub struct IntervalTimer {
    window: Mutex<Window>,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_at(&self, now: Instant) {
        let mut w = self.window.lock();
        if let Some(last) = w.last {
            let ms = now.saturating_duration_since(last).as_secs_f64() * 1000.0;
            if w.count == 0 || ms < w.min_ms {
                w.min_ms = ms;
            }
            if ms > w.max_ms {
                w.max_ms = ms;
            }
            w.sum_ms += ms;
            w.count += 1;
        }
        w.last = Some(now);
    }

    pub fn summary(&self) -> Option<IntervalSummary> {
        let w = self.window.lock();
        (w.count > 0).then(|| IntervalSummary {
            min_ms: w.min_ms,
            max_ms: w.max_ms,
            avg_ms: w.sum_ms / w.count as f64,
            count: w.count,
        })
    }

    // keeps the last mark so the interval spanning the reset still counts
    pub fn reset(&self) {
        let mut w = self.window.lock();
        *w = Window { last: w.last, ..Window::default() };
    }

    pub fn take_summary(&self) -> Option<IntervalSummary> {
        let summary = self.summary();
        self.reset();
        summary
    }
}

impl TimingMarker for IntervalTimer {
    fn mark(&self) {
        self.mark_at(Instant::now());
    }
}

pub fn format_summary(label: &str, summary: Option<IntervalSummary>) -> String {
    match summary {
        Some(s) => format!("{label} {s}"),
        None => format!("{label} [N/A, N/A] avg N/A/0"),
    }
}
