//! # Tree Mirror Testkit
//!
//! Testing utilities for Tree Mirror.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Exact wire JSON for known mutation batches
//! - **Generators**: Proptest strategies for random trees and mutations
//! - **Fixtures**: A sample document with named handles, plus tracing setup
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the wire format byte for byte:
//!
//! ```rust
//! use treemirror_testkit::vectors::{all_vectors, run_vector};
//!
//! for vector in all_vectors() {
//!     assert_eq!(run_vector(&vector).unwrap(), vector.expected);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use treemirror_testkit::generators::{apply_mutation, build, document_spec, mutation};
//!
//! proptest! {
//!     #[test]
//!     fn mutations_apply(specs in document_spec(), m in mutation()) {
//!         let mut tree = treemirror_core::Tree::new();
//!         let root = tree.root();
//!         build(&mut tree, root, &specs).unwrap();
//!         apply_mutation(&mut tree, root, &m).unwrap();
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use treemirror_testkit::fixtures::SampleDocument;
//!
//! let mut doc = SampleDocument::new().unwrap();
//! doc.push_item("three").unwrap();
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{init_tracing, SampleDocument};
pub use generators::{apply_mutation, batches, build, document_spec, mutation, Mutation, NodeSpec};
pub use vectors::{all_vectors, run_vector, verify_all_vectors, GoldenVector, VectorError};
