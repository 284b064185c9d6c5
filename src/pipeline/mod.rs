//! Pipeline stages for the page acquisition run.
//!
//! Each submodule implements exactly one step. Keeping stages separate
//! makes each independently testable and lets us swap implementations
//! (e.g. a different page renderer) without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ convert ──▶ registry ──▶ assemble
//! (HTTP)    (SVG→PDF)   (shared)     (ordered merge)
//!               ▲
//!            worker  — one task per page, gated fetch, isolates failure
//!            monitor — polls the registry, reports progress
//! ```
//!
//! 1. [`fetch`]    — retrieve one page's SVG markup over the session; the
//!    only stage with network I/O
//! 2. [`convert`]  — render the markup into a single-page PDF artifact;
//!    runs in `spawn_blocking` because rendering is CPU-bound
//! 3. [`worker`]   — compose fetch + convert under the gate and register
//!    the result; a failed page never crosses this boundary
//! 4. [`monitor`]  — periodic progress over the shared registry
//! 5. [`assemble`] — merge the artifacts into one PDF in page order

pub mod assemble;
pub mod convert;
pub mod fetch;
pub mod monitor;
pub mod worker;
