//! CLI exit code registry.
//!
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Success, no discrepancies                       |
//! | 1    | Run completed, discrepancies found              |
//! | 2    | CLI usage error (owned by clap)                 |
//! | 3    | Invalid config or schema validation failure     |
//! | 4    | Runtime failure (unreadable file, bad CSV, IO)  |

/// Success - run completed and every comparison row matched.
pub const EXIT_SUCCESS: u8 = 0;

/// Run completed but at least one row is not a match.
pub const EXIT_DISCREPANCIES: u8 = 1;

/// Config parse/validation failure, or a schema error from the engine.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// IO failure: unreadable config or source file, unwritable output.
pub const EXIT_RUNTIME: u8 = 4;
