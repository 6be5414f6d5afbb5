//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_signal resolves
//!
//! Shutdown (shutdown.rs):
//!     supervise: signal → trigger → server stops accepting → in-flight relays finish → exit
//!                server error → exit with that error
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
