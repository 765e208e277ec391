//! Helpers shared by the integration tests of the workspace.

pub mod fixtures;

/// Send `tracing` events to the test output. Set `RUST_LOG` to see them.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
