// Harness types; suites register via #[link_section = ".test_registry"] in
// define_test_suite!.

use core::ffi::c_char;
use core::ptr;

/// Result of executing a single test suite.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct TestSuiteResult {
    pub name: *const c_char,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub elapsed_ms: u32,
}

impl Default for TestSuiteResult {
    fn default() -> Self {
        Self {
            name: ptr::null(),
            total: 0,
            passed: 0,
            failed: 0,
            elapsed_ms: 0,
        }
    }
}

impl TestSuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

pub type SuiteRunnerFn = fn(*mut TestSuiteResult) -> i32;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct TestSuiteDesc {
    pub name: *const c_char,
    pub run: Option<SuiteRunnerFn>,
}

// SAFETY: descs hold only pointers to static data and function pointers,
// read-only after registration.
unsafe impl Sync for TestSuiteDesc {}

/// Aggregated results across all suites.
#[derive(Clone, Copy, Default)]
pub struct TestRunSummary {
    pub suite_count: usize,
    pub total_tests: u32,
    pub passed: u32,
    pub failed: u32,
}

impl TestRunSummary {
    pub fn add_suite_result(&mut self, result: &TestSuiteResult) {
        self.suite_count += 1;
        self.total_tests = self.total_tests.saturating_add(result.total);
        self.passed = self.passed.saturating_add(result.passed);
        self.failed = self.failed.saturating_add(result.failed);
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Pre-calibration cycle estimate (3 GHz); suite timing is diagnostic only.
const DEFAULT_CYCLES_PER_MS: u64 = 3_000_000;

/// Elapsed milliseconds between two TSC readings.
#[inline]
pub fn measure_elapsed_ms(start: u64, end: u64) -> u32 {
    let ms = end.wrapping_sub(start) / DEFAULT_CYCLES_PER_MS;
    if ms > u32::MAX as u64 { u32::MAX } else { ms as u32 }
}
