//! Asset Patcher: fixes the known syntax errors in the generated
//! storefront bundle.
//!
//! # Architecture
//!
//! Everything compiles down to one primitive: an ordered list of
//! [`Rule`]s applied globally to an in-memory text buffer. The buffer is
//! loaded from `assets/app.js`, rewritten rule by rule, and written back
//! to the same path.
//!
//! # Safety
//!
//! - Atomic file writes (tempfile + fsync + rename)
//! - UTF-8 validation on load
//! - No write is issued when no rule matched
//!
//! # Example
//!
//! ```no_run
//! use asset_patcher::{patch_in_place, syntax_fixes};
//!
//! let fixes = syntax_fixes().expect("built-in rules compile");
//!
//! match patch_in_place("assets/app.js", &fixes) {
//!     Ok(outcome) => println!("patch outcome: {:?}", outcome),
//!     Err(e) => eprintln!("patch failed: {}", e),
//! }
//! ```

pub mod patcher;
pub mod rules;

// Re-exports
pub use patcher::{load, patch_in_place, save, PatchError, PatchOutcome};
pub use rules::{
    apply_rules, image_path_fixes, syntax_fixes, Pattern, Rule, RuleError, RuleSet,
};
