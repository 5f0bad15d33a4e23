//! Test fixture documents from declarative templates
//!
//! A [`Template`] describes a JSON document in which any position may hold a
//! deferred computation instead of fixed data. Wrapping a template produces a
//! tree of lazily resolved nodes: reading a position runs its computation once,
//! caches the result in place, and hands the computation the node it lives in,
//! from which the document root is reachable via `head()`.
//!
//! ```
//! use octofhir_fixtures::{Template, dependent, sequence, wrap};
//! use serde_json::json;
//!
//! let template = Template::object([
//!     ("id", sequence(|n| format!("obs-{n}"))),
//!     ("status", Template::from("final")),
//!     (
//!         "subject",
//!         Template::object([(
//!             "display",
//!             dependent(|this| {
//!                 let id = this.head()?.get("id")?;
//!                 Ok(format!("subject of {}", id.as_str().unwrap_or_default()))
//!             }),
//!         )]),
//!     ),
//! ]);
//!
//! let doc = wrap(template).unwrap();
//! assert_eq!(
//!     doc.resolve().unwrap(),
//!     json!({
//!         "id": "obs-1",
//!         "status": "final",
//!         "subject": {"display": "subject of obs-1"}
//!     })
//! );
//! ```

pub mod config;
pub mod dynamic;
pub mod error;
pub mod factory;
pub mod node;
mod resolve;
pub mod template;

pub use config::ResolverConfig;
pub use dynamic::{Sequence, dependent, sequence, sequence_from};
pub use error::{FixtureError, Result};
pub use factory::Factory;
pub use node::{
    CompositeNode, DynamicValue, Node, NodeId, Position, SequenceNode, wrap, wrap_with_config,
};
pub use template::{Deferred, DeferredFn, Template};
