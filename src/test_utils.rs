//! Test utilities for unit tests.
//!
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Time domain fixtures driven by a [`VirtualClock`] and a
//!   [`RecordingScheduler`]

use crate::lab::{RecordingScheduler, SchedulerLog};
use crate::runtime::{DelayedTaskQueue, TimeDomain, TimeDomainConfig};
use crate::time::{TimeSource, VirtualClock};
use std::sync::{Arc, Once};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Domain type used by most unit tests.
pub type TestDomain = TimeDomain<DelayedTaskQueue<&'static str>>;

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level. The first call wins.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// A registered domain on a virtual clock at zero.
#[must_use]
pub fn test_domain(name: &str) -> (TestDomain, Arc<VirtualClock>, SchedulerLog) {
    init_test_logging();
    let clock = Arc::new(VirtualClock::new());
    let source: Arc<dyn TimeSource> = clock.clone();
    let mut domain = TimeDomain::new(&TimeDomainConfig::named(name), source);
    let (scheduler, log) = RecordingScheduler::new();
    domain.on_register(scheduler);
    (domain, clock, log)
}

/// Log a test phase with visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
}

/// Assert with structured logging of expected and actual values.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}
