//! Constants used by the deployment engine

use std::time::Duration;

/// The extension of a kind's interface descriptor in the artifacts directory
pub const ABI_EXTENSION: &str = "abi";

/// The extension of a kind's deployable image in the artifacts directory
pub const BIN_EXTENSION: &str = "bin";

/// The extension of a ledger partition file
pub const LEDGER_EXTENSION: &str = "json";

/// The extension used for the temporary file a partition is staged in
/// before being renamed into place
pub const LEDGER_STAGING_EXTENSION: &str = "json.tmp";

/// The number of times a ledger write is attempted after a resource has
/// been created on the network
pub const LEDGER_WRITE_ATTEMPTS: usize = 3;

/// The delay between two ledger write attempts
pub const LEDGER_WRITE_BACKOFF: Duration = Duration::from_millis(250);

/// The market every network supports
pub const DEFAULT_MARKET: &str = "core";

/// The market for the isolated-lending deployment
pub const FUSE_MARKET: &str = "fuse";
