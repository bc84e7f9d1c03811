//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that:
//!   1. Load and validate CLI input (files, flags)
//!   2. Call the verification services or stores
//!   3. Format output for the terminal
//!
//! Handlers should NOT:
//! - Open database connections
//! - Contain probing or scoring logic

pub mod history;
pub mod import;
pub mod scores;
pub mod verify;
