//! Heap allocation tracking for dispatch benchmarks, backed by dhat.
//!
//! Fires on a bus with only strong handlers should not allocate at all; the
//! interesting numbers are the copy-on-write cost of registering while a fire
//! holds a snapshot, and the per-registration footprint.
//!
//! ```bash
//! cargo bench -p herald_bench --features memory_profiling
//! ```
//!
//! View the resulting `dhat-heap.json` at
//! <https://nnethercote.github.io/dh_view/dh_view.html>.

use std::fmt;

/// Allocation counts captured over one measured closure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AllocStats {
    pub bytes: u64,
    pub blocks: u64,
    pub peak_bytes: u64,
}

impl AllocStats {
    /// Bytes allocated per operation over `ops` operations.
    pub fn bytes_per_op(&self, ops: usize) -> f64 {
        per(self.bytes, ops)
    }

    /// Allocations per operation over `ops` operations.
    pub fn blocks_per_op(&self, ops: usize) -> f64 {
        per(self.blocks, ops)
    }
}

fn per(total: u64, ops: usize) -> f64 {
    if ops == 0 { 0.0 } else { total as f64 / ops as f64 }
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes in {} blocks (peak {} bytes)",
            self.bytes, self.blocks, self.peak_bytes
        )
    }
}

/// Run `f` and report what it allocated.
///
/// Without the `memory_profiling` feature this only runs `f` and reports zeros.
/// With it, only one measurement may be active at a time.
#[cfg(feature = "memory_profiling")]
pub fn measure<R>(f: impl FnOnce() -> R) -> (R, AllocStats) {
    let _profiler = dhat::Profiler::new_heap();
    let before = dhat::HeapStats::get();
    let result = f();
    let after = dhat::HeapStats::get();
    let stats = AllocStats {
        bytes: after.total_bytes - before.total_bytes,
        blocks: after.total_blocks - before.total_blocks,
        peak_bytes: after.max_bytes as u64,
    };
    (result, stats)
}

#[cfg(not(feature = "memory_profiling"))]
pub fn measure<R>(f: impl FnOnce() -> R) -> (R, AllocStats) {
    (f(), AllocStats::default())
}
