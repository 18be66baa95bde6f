//! # mg-rewrite
//!
//! Ordered text rewriting over opaque blobs. A [`RuleSet`] is an ordered list
//! of [`Rule`] values; the engine applies them one after another, so a rule
//! always sees the text produced by the rules before it.
//!
//! ## Example
//!
//! ```rust
//! use mg_rewrite::{Pattern, Rule, RuleSet};
//!
//! let rules = RuleSet::from(vec![
//!     Rule::replace("rename target", Pattern::literal("Potassium"), "Magnesium %")
//!         .required()
//!         .when_absent(Pattern::literal("Magnesium %")),
//! ]);
//!
//! let result = rules.apply(r#"target_column: str = "Potassium""#).unwrap();
//! assert_eq!(result.output(), r#"target_column: str = "Magnesium %""#);
//! assert_eq!(result.rules_applied(), 1);
//! ```

mod engine;
mod error;
mod rule;

pub use engine::{RuleOutcome, TransformResult, apply};
pub use error::RewriteError;
pub use rule::{Action, Flags, Guard, Pattern, Placement, Replacement, Rule, RuleSet};

pub type Result<T> = std::result::Result<T, RewriteError>;
