//! Semstore query descriptions
//!
//! Backend-agnostic representation of semantic queries:
//!
//! ```text
//! query text ──parser──► Description ──prune──► Description ──compile──► SPARQL / SQL
//!                         (this crate)           (this crate)            (semstore-compiler)
//! ```
//!
//! ## Contents
//!
//! - **Data model**: entity and property references, data items, comparators
//! - **Descriptions**: the closed description algebra with sizes, depths,
//!   feature sets, fingerprints and canonical query text
//! - **Pruning**: size/depth budget enforcement with an error log
//! - **Store contract**: [`QueryStore`], the only view compilers get of storage
//! - **Configuration**: [`QueryConfig`], passed explicitly everywhere

pub mod config;
pub mod data;
pub mod description;
pub mod digest;
pub mod error;
pub mod features;
pub mod print_request;
pub mod store;

pub use config::{QueryConfig, SparqlConfig};
pub use data::{Comparator, DataItem, EntityRef, PropertyRef, SortDirection, ValueKind};
pub use description::{
    ClassDescription, ConceptDescription, Conjunction, Description, Disjunction,
    NamespaceDescription, PruneOutcome, SomeProperty, ThingDescription, ValueDescription,
};
pub use error::DescriptionError;
pub use features::QueryFeatures;
pub use print_request::{PrintKind, PrintRequest};
pub use store::{MemoryStore, QueryStore};
