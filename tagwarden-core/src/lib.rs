// tagwarden-core/src/lib.rs

// 1. Mandatory documentation for production code
#![allow(missing_docs)] // Not enforced yet

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// The capability contracts (MetadataStore, TagState, PolicyStore).
pub mod ports;

// 2. Domain (Core logic)
// Classification rules, the policy planner, data-type lattice.
// Depends on NOTHING else (no infra, no app).
pub mod domain;

// 3. Infrastructure (Adapters)
// Config loaders, result export, the DuckDB warehouse adapter.
// Depends on the Domain and the Ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Orchestration (scan run, policy application).
// Depends on the Domain, the Infra and the Ports.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// Lets callers import the main error easily: use tagwarden_core::TagwardenError;
pub use error::TagwardenError;
