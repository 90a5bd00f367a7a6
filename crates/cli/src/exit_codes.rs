//! CLI Exit Code Registry
//!
//! Single source of truth for `rankmerge` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | CLI usage error (bad args)                               |
//! | 3    | Schema error: required column missing (`--strict` only)  |
//! | 4    | Invalid config or priority file                          |
//! | 5    | I/O or CSV error reading inputs / writing outputs        |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// A key or value column is missing from target or source.
/// Without `--strict` this is a warning and the target is written unchanged.
pub const EXIT_RECON_SCHEMA: u8 = 3;

/// Config or priority file failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 4;

/// Input could not be read/decoded, or output could not be written.
pub const EXIT_RECON_IO: u8 = 5;
