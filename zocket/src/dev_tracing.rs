/// Development helper: initialize tracing subscriber when `RUST_LOG` is set.
///
/// Benches and tests can call `zocket::dev_tracing::init_tracing()` to enable
/// the `[SOCKET]`, `[CONTEXT]`, `[INPROC]` and `[LIBZMQ]` logs. This is a
/// no-op when `RUST_LOG` is not set or when a global subscriber is already
/// installed.
pub fn init_tracing() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        // Best-effort: a subscriber may already be installed by another test
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
