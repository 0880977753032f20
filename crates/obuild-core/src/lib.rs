//! Build engine for `obuild`.
//!
//! This crate turns a table of registered rules into a dependency-ordered
//! build: it resolves concrete target names against literal and `%`-pattern
//! rules, decides staleness from filesystem mtimes, and runs rule bodies
//! while their shell commands execute on a bounded task pool.
//!
//! # Key Types
//!
//! - [`Build`]: the engine state: rule table, resolution cache, wait-scope
//!   stack, and task pool
//! - [`BuildContext`]: trait the script host implements so the driver can
//!   evaluate rule bodies
//! - [`Rule`] / [`BodyId`]: a registered rule and its opaque body handle
//!
//! The driver entry point is [`driver::exec_main`]. Rule bodies call back
//! into the engine (through the host) to enqueue shell commands with
//! [`Build::enqueue_shell`], which attaches them to the innermost wait
//! scope; the scope is drained before the enclosing target's own body runs.

mod error;
mod glob;
mod paths;
mod pattern;
mod pool;
mod rule;
mod scope;
mod stale;

pub mod driver;

pub use driver::{Build, BuildContext, BodyBindings};
pub use error::{Error, Result};
pub use glob::{expand_glob_list, expand_globs};
pub use paths::{replace_ext, replace_ext_list};
pub use pattern::{expand_stem, match_stem};
pub use pool::TaskPool;
pub use rule::{BodyId, Rule, RuleSet, SubRule};
pub use scope::WaitScope;
pub use stale::needs_run;
