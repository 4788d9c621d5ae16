//! Benchmark utilities for herald.
//!
//! This crate provides benchmarking infrastructure for the event bus:
//!
//! - **Microbenchmarks**: Individual bus operations (fire, register, unregister)
//! - **Scenario benchmarks**: Realistic IDE workloads (editor session, subscription churn)
//! - **Memory tracking**: Heap allocation profiling via dhat
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p herald_bench
//!
//! # Run specific benchmark group
//! cargo bench -p herald_bench -- fire
//!
//! # Run with memory profiling (slower)
//! cargo bench -p herald_bench --features memory_profiling
//! ```
//!
//! # Benchmark Results
//!
//! Results are written to `target/criterion/` with HTML reports for visualization.
//! Memory profiling results are written to `dhat-heap.json` for viewing with
//! DHAT's viewer.

pub mod events;
pub mod memory;
pub mod scenarios;
