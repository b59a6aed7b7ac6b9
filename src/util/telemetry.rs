//! Tracing bootstrap for embedding applications and tests.

/// Install a default `tracing` subscriber unless the host already set one.
///
/// The subscriber formats to stderr, filters via `RUST_LOG`, and prints
/// thread names so the per-task waiter threads show up in the output.
/// Calling this more than once is harmless, so tests can invoke it
/// unconditionally; an application that wants its own subscriber simply
/// installs it first.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_names(true)
        .try_init();
}
