// src/core/mod.rs

// Root of the `core` module, exposing the engine's sub-modules to the crate.

/// Data structures shared across the engine: `ScanReport`, `Severity`,
/// port/header/TLS models, and the persistence payload.
pub mod models;

/// Static catalog of every finding the rule engine can raise, with
/// human-readable descriptions and remediation steps.
pub mod knowledge_base;

/// The pure vulnerability rule engine and the risk scorer.
pub mod rules;

/// The probing stages (resolver, ports, HTTP headers, TLS) and the pipeline
/// that composes them.
pub mod scanner;

/// Scan admission, concurrency control, and the deadline-bounded `scan`
/// entry point.
pub mod controller;
