pub const APP_NAME: &str = "koch";

/// Default name of the persisted fingerprint store.
pub const FINGERPRINTS_FILENAME: &str = "koch.dat";

/// Default name of the build file read by the `koch` binary.
pub const BUILD_FILENAME: &str = "koch.toml";

/// Environment variable overriding the fingerprint store path.
pub const FINGERPRINTS_ENV: &str = "KOCH_FINGERPRINTS";

/// Sigil marking a prerequisite as a reference to another target.
pub const TARGET_SIGIL: char = '#';

/// Format version written into the fingerprint store.
pub const FINGERPRINTS_VERSION: u32 = 1;
