//! Process exit codes. Part of the CLI contract.

pub const SUCCESS: i32 = 0;
pub const NO_RESULT: i32 = 1; // Blank script or no criteria selected
pub const CONFIG_ERROR: i32 = 2; // Missing credential, missing input file, bad config
