//! Imperative element commands.

mod clear;
mod type_text;

pub use clear::{Clear, ScriptClear};
pub use type_text::{Type, TypeOptions};
