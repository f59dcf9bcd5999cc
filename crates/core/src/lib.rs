//! magic-core
//!
//! Identifies file formats by evaluating magic-number rules against a
//! random-access byte stream.
//!
//! The crate holds the whole engine so it can be tested in isolation and
//! driven from any frontend:
//! - `source`: the positional byte-stream abstraction.
//! - `endian`: little/big/native/middle byte orders.
//! - `tester`: offsets, comparators and typed testers.
//! - `message`: the printf-like message renderer.
//! - `compiler`: magic rule text to compiled rules.
//! - `rules`: rule tree, registry and the probe walk.
//! - `config`: JSON probe configuration.

pub mod compiler;
pub mod config;
pub mod endian;
pub mod message;
pub mod rules;
pub mod source;
pub mod tester;

pub use compiler::{compile, compile_str, CompileError, ParseFailure};
pub use endian::ByteOrder;
pub use rules::{Detection, MagicDatabase, Rule, RuleRegistry};
pub use source::ByteSource;
pub use tester::{Operator, Outcome, TestError, Tester};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
