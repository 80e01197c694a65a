//! Swagger from source - Swagger 2.0 documents from annotated Rust crates.
//!
//! Operations are described in doc comments (`@Router`, `@Param`,
//! `@Success`, ...). Every type those annotations name is resolved through
//! the Cargo dependency graph, across crate boundaries, and turned into a
//! schema definition.
//!
//! # Architecture
//!
//! 1. [`oracle`] - Declaration view of a compilation unit, backed by
//!    [`manifest`], [`scanner`] and [`parser`]
//! 2. [`unit_graph`] - Closure of units reachable from the root package
//! 3. [`type_resolver`] - Finds the declaration a type reference names
//! 4. [`classifier`] and [`enum_extractor`] - Build definitions and members
//! 5. [`flattener`] - Merges embedded types and resolves member targets
//!    into the [`store`]
//! 6. [`schema_generator`] - Derives schemas from the finished store
//! 7. [`extractor`] and [`openapi_builder`] - Annotation grammar and
//!    document assembly
//! 8. [`serializer`] - JSON or YAML output
//!
//! [`pipeline::generate`] runs all of the above for one root package.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::path::Path;
//! use swagger_from_source::{
//!     definition::NamingScheme,
//!     oracle::cargo::CargoOracle,
//!     pipeline::{generate, GeneratorConfig},
//!     serializer::serialize_json,
//! };
//!
//! let oracle = CargoOracle::new(Path::new("./workspace")).unwrap();
//! let config = GeneratorConfig {
//!     root: "services/api".to_string(),
//!     naming: NamingScheme::Partial,
//!     ignore: vec!["vendor".to_string()],
//! };
//! let document = generate(&config, &oracle).unwrap();
//! println!("{}", serialize_json(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod classifier;
pub mod cli;
pub mod definition;
pub mod enum_extractor;
pub mod error;
pub mod extractor;
pub mod flattener;
pub mod manifest;
pub mod openapi_builder;
pub mod oracle;
pub mod parser;
pub mod pipeline;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod store;
pub mod type_ref;
pub mod type_resolver;
pub mod unit_graph;
pub mod validation;
