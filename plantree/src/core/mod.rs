//! Deterministic, pure logic for turning plan output into a tree.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data (or a caller-supplied `BufRead`) and are tested in isolation.

pub mod builder;
pub mod classifier;
pub mod dialog;
pub mod markup;
pub mod tree;
