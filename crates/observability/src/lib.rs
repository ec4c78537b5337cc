//! Tracing/logging setup shared by binaries and tests.

/// Initialize process-wide tracing.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filters, formatting).
pub mod tracing;
