//! Test infrastructure for jsonwalk
//!
//! Provides a generic tree walker over element cursors and instrumented
//! byte sources.

mod source;
mod walk;

#[allow(unused_imports)]
pub use source::Tracked;
#[allow(unused_imports)]
pub use walk::{walk, walk_str, V};

/// Route `log` output through the test harness. Set `RUST_LOG=trace` to see
/// classification decisions.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
