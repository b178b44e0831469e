//! State module for tracking a crawl run
//!
//! # Components
//!
//! - `RunState` / `RunGuard`: the "a run is active" flag and its scoped release
//! - `KnownIndex`: every known post id plus the posts first seen in this run
//! - `RunContext`: per-run owner of the lock-guarded index

mod context;
mod index;
mod run_state;

pub use context::RunContext;
pub use index::{Admission, KnownIndex};
pub use run_state::{RunGuard, RunState};
