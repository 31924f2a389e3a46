//! Replay constants.

use std::time::Duration;

/// Name of the simulator executable looked up in the working directory, the build output
/// directory and `PATH`.
pub const SIMULATOR_BINARY_NAME: &str = "replay-sim";

/// Environment variable that overrides the simulator location.
pub const SIMULATOR_PATH_ENV: &str = "REPLAY_SIMULATOR_PATH";

/// Build output directory of the simulator, relative to the working directory.
pub const SIMULATOR_BUILD_DIR: &str = "simulator/target/release";

/// Maximum number of bytes retained per simulator output stream.
///
/// Anything past this is read and discarded so a runaway simulator cannot grow the memory of a
/// long-lived process.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Default interval between two polls of a job while waiting for it.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default time to wait for a job before giving up.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Contract identifier emitted by the simulator when it cannot attribute an event.
pub const UNKNOWN_CONTRACT: &str = "unknown";

/// Lowercase markers of standard asset contracts. Contracts whose identifier contains any of these
/// are exempt from the authorization-before-write rule.
pub const ASSET_CONTRACT_MARKERS: &[&str] = &["stellar_asset", "sac", "token"];
