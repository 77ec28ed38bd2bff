//! Shared types for the Acorn compiler.
//!
//! Everything the individual pipeline crates need to agree on lives here:
//! byte spans and source locations, the token vocabulary, and the
//! diagnostic/reporter machinery used by every pass.

pub mod diagnostics;
pub mod span;
pub mod token;
