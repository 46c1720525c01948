//! Logging bootstrap for the binary. Library code only emits `tracing`
//! events; installing a subscriber is left to whoever owns `main`.

/// Install a compact `fmt` subscriber. Safe to call more than once.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .try_init();
}
