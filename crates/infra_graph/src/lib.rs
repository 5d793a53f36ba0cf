//! # infra_graph
//!
//! Canonical infrastructure model and resource graph builder for infragen.
//!
//! The analysis step upstream produces a loosely structured document
//! (provider tag, resource list, optional network and security blocks). This
//! crate treats that document as untrusted input and turns it into a
//! [`ResourceGraph`]: unique names, resolved dependencies, no cycles, and
//! property bags restricted to [`PropertyValue`].
//!
//! ## Example
//!
//! ```rust
//! use infra_graph::{CloudProvider, DocumentReader, GraphBuilder};
//!
//! let doc = DocumentReader::from_json_str(r#"{
//!     "provider": "aws",
//!     "resources": [
//!         {"type": "security-group", "name": "web-sg", "properties": {}},
//!         {"type": "instance", "name": "web-instance", "properties": {}, "dependencies": ["web-sg"]}
//!     ]
//! }"#).unwrap();
//!
//! let graph = GraphBuilder::new(CloudProvider::Aws).build(&doc).unwrap();
//! let order: Vec<_> = graph.ordered_resources().iter().map(|r| r.name.as_str()).collect();
//! assert_eq!(order, ["web-sg", "web-instance"]);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod models;
pub mod network;
pub mod provider;
pub mod reader;
pub mod value;

pub use builder::{BuilderOptions, GraphBuilder};
pub use error::{GraphError, GraphResult};
pub use graph::ResourceGraph;
pub use models::*;
pub use provider::CloudProvider;
pub use reader::DocumentReader;
pub use value::{PropertyMap, PropertyValue};
