//! Clock source abstraction for real and simulated wall-clock time.
//!
//! All time-driven components read "now" through this module. The real source is the
//! local wall clock; the simulated source lets a whole sunrise play out in seconds,
//! either accelerated by a multiplier or jumping straight through every sleep.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::{Duration as StdDuration, Instant};

/// Process-wide clock. Falls back to the wall clock when nothing was installed.
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Where "now" comes from, and how waiting advances it.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Block for `duration` of this clock's time.
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool;

    /// A simulated clock that reached its end time. Real time never ends.
    fn is_ended(&self) -> bool {
        false
    }
}

/// The local wall clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Bookkeeping for the simulated clock.
struct SimulatedClock {
    /// Simulated time that has fully elapsed through completed sleeps
    elapsed: StdDuration,
    /// Sleep currently in progress: real start instant and simulated length
    in_progress: Option<(Instant, StdDuration)>,
}

/// Simulated time source for time-accelerated runs.
///
/// A multiplier of `0.0` selects fast-forward: every sleep advances the clock
/// instantly. Any positive multiplier scales real time (60.0 = one simulated minute
/// per real second). The clock never runs past `end_time`.
pub struct SimulatedTimeSource {
    start_time: DateTime<Local>,
    end_time: DateTime<Local>,
    multiplier: f64,
    clock: Mutex<SimulatedClock>,
}

impl SimulatedTimeSource {
    /// Create a new simulated time source.
    ///
    /// Negative multipliers fall back to 60x.
    pub fn new(start_time: DateTime<Local>, end_time: DateTime<Local>, multiplier: f64) -> Self {
        let multiplier = if multiplier < 0.0 { 60.0 } else { multiplier };
        Self {
            start_time,
            end_time,
            multiplier,
            clock: Mutex::new(SimulatedClock {
                elapsed: StdDuration::ZERO,
                in_progress: None,
            }),
        }
    }

    fn is_fast_forward(&self) -> bool {
        self.multiplier == 0.0
    }

    fn current_time(&self) -> DateTime<Local> {
        let clock = self.clock.lock().unwrap();
        let mut total = clock.elapsed;

        // Accelerated mode: count the portion of an ongoing sleep that has passed
        if !self.is_fast_forward()
            && let Some((started, length)) = clock.in_progress
        {
            let simulated = started.elapsed().mul_f64(self.multiplier);
            total += simulated.min(length);
        }

        let simulated = self.start_time
            + ChronoDuration::from_std(total).unwrap_or_else(|_| ChronoDuration::zero());
        simulated.min(self.end_time)
    }

    fn remaining(&self) -> StdDuration {
        (self.end_time - self.current_time())
            .to_std()
            .unwrap_or(StdDuration::ZERO)
    }

    /// The clock is pinned at `end_time`.
    pub fn is_ended(&self) -> bool {
        self.current_time() >= self.end_time
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Local> {
        self.current_time()
    }

    fn sleep(&self, duration: StdDuration) {
        let step = duration.min(self.remaining());
        if step.is_zero() {
            return;
        }

        if self.is_fast_forward() {
            self.clock.lock().unwrap().elapsed += step;
            // Let other threads run and logs flush
            std::thread::sleep(StdDuration::from_millis(1));
            return;
        }

        self.clock.lock().unwrap().in_progress = Some((Instant::now(), step));
        std::thread::sleep(step.div_f64(self.multiplier));

        let mut clock = self.clock.lock().unwrap();
        clock.in_progress = None;
        clock.elapsed += step;
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.is_ended()
    }
}

/// Install the process clock. Later calls are ignored.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Whether a clock was installed, without installing the default one.
pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

fn source() -> &'static Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource))
}

pub fn now() -> DateTime<Local> {
    source().now()
}

pub fn sleep(duration: StdDuration) {
    source().sleep(duration)
}

pub fn is_simulated() -> bool {
    source().is_simulated()
}

/// True once a simulated run has reached its end time.
pub fn simulation_ended() -> bool {
    source().is_ended()
}

/// Parse `YYYY-MM-DD HH:MM:SS` as a local time. Times in a DST gap or overlap are rejected.
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;
    Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| format!("{s} is ambiguous or skipped in local time"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 15, h, m, s).single().unwrap()
    }

    #[test]
    fn test_fast_forward_advances_by_sleep() {
        let source = SimulatedTimeSource::new(at(7, 0, 0), at(8, 0, 0), 0.0);
        assert_eq!(source.now(), at(7, 0, 0));

        source.sleep(StdDuration::from_secs(90));
        assert_eq!(source.now(), at(7, 1, 30));
        assert!(!source.is_ended());
    }

    #[test]
    fn test_fast_forward_caps_at_end_time() {
        let source = SimulatedTimeSource::new(at(7, 0, 0), at(7, 0, 30), 0.0);
        source.sleep(StdDuration::from_secs(120));
        assert_eq!(source.now(), at(7, 0, 30));
        assert!(source.is_ended());
    }

    #[test]
    fn test_accelerated_sleep_scales_real_time() {
        // 1000x: ten simulated seconds take ten real milliseconds
        let source = SimulatedTimeSource::new(at(7, 0, 0), at(8, 0, 0), 1000.0);
        let started = Instant::now();
        source.sleep(StdDuration::from_secs(10));
        assert!(started.elapsed() < StdDuration::from_secs(1));
        assert_eq!(source.now(), at(7, 0, 10));
    }

    #[test]
    fn test_parse_datetime() {
        assert_eq!(parse_datetime("2025-01-15 07:00:00").unwrap(), at(7, 0, 0));
        assert!(parse_datetime("2025-01-15 7am").is_err());
    }
}
