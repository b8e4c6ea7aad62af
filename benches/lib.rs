//! Tenbind Benchmarks
//!
//! Performance benchmarks for the import and export paths of the casters.
//! Run with: cargo bench -p tenbind-benchmarks

// This file exists only to satisfy Cargo's requirement for a lib target.
// The actual benchmarks are in import_benchmarks.rs and export_benchmarks.rs
