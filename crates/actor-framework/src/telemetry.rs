//! # Observability & Tracing
//!
//! The [`setup_tracing`] function installs the process-wide `tracing` subscriber shared by
//! every binary built on this framework.
//!
//! ## Configuration
//!
//! Compact format without the crate/module prefix (`with_target(false)`); entity logs carry an
//! `entity_type` field instead. Verbosity comes from `RUST_LOG`:
//!
//! ```bash
//! # Lifecycle only: region start/stop, initialization, passivation, member up/unreachable
//! RUST_LOG=info cargo run
//!
//! # Every delivery with its payload, buffering, socket pushes
//! RUST_LOG=debug cargo run
//!
//! # Framework internals only
//! RUST_LOG=info,actor_framework=debug cargo run
//! ```
//!
//! ## What Gets Traced
//!
//! - **Region**: start, stop, buffering during passivation, full mailboxes
//! - **Entity actors**: start, idle passivation request, stop
//! - **Client calls**: one span per `ask`/`passivate` with the target id
//!
//! With `RUST_LOG=info` an idle entity looks like:
//!
//! ```text
//! INFO Idle, requesting passivation entity_type="TrackedEntity" id=entity-7 window=60s
//! INFO Passivating entity_type="TrackedEntity" id=entity-7
//! ```

/// Installs a global compact subscriber filtered by `RUST_LOG`.
///
/// Call once at process start. A second call panics, as with any global subscriber.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type identifies the source instead of the module path
        .compact()
        .init();
}
