//! In-crate test suite.
//!
//! `factory` stands in for the external parser: it appends tokens in
//! source order and builds arena nodes the way the parser contract
//! describes. Everything else exercises the pipeline through
//! [`crate::compiler::compile`].

mod factory;

mod semantic_initializers;
mod semantic_scope;
