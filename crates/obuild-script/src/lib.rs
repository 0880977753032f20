//! The embedded build-file language.
//!
//! A deliberately small command language: statements of whitespace-separated
//! words, where a word is bare text, a `"quoted string"`, a `[deferred
//! block]`, or a `(substituted statement)`. The engine treats rule bodies as
//! opaque block text and evaluates them back through this crate when a rule
//! fires.
//!
//! The evaluator itself is host-agnostic: every command and every variable
//! lookup is dispatched through the [`Host`] trait, so the same machinery
//! runs configuration files, `-e` snippets, and rule bodies.

mod error;
mod eval;
mod lexer;

pub use error::{Error, Result};
pub use eval::{Host, run};
pub use lexer::{Statement, Word, statements};
