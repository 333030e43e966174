/// Core system constants used throughout the flat dictionary
///
/// This module centralizes all sizing defaults so that the limits injected through
/// configuration and the limits used in tests have a single point of truth.
/// Identifier capacity constants
pub mod limits {
    /// Default identifier ceiling; every numeric attribute array holds exactly this many slots
    pub const MAX_ARRAY_SIZE: usize = 500_000;

    /// Default number of reference slots a string attribute starts with
    pub const INITIAL_ARRAY_SIZE: usize = 128;
}

/// String arena sizing constants
pub mod arena {
    /// Size of the first chunk allocated by a string arena (4KB)
    pub const INITIAL_CHUNK_SIZE: usize = 4096;

    /// Chunks double in size until they reach this size (128MB), then grow linearly
    pub const LINEAR_GROWTH_THRESHOLD: usize = 128 * 1024 * 1024;
}

/// Environment variables consulted by configuration overrides
pub mod env {
    /// Overrides the identifier ceiling
    pub const MAX_ARRAY_SIZE: &str = "FLATDICT_MAX_ARRAY_SIZE";

    /// Overrides the initial string reference array length
    pub const INITIAL_ARRAY_SIZE: &str = "FLATDICT_INITIAL_ARRAY_SIZE";
}
