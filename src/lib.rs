#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(
    missing_debug_implementations,
    clippy::print_stderr,
    clippy::print_stdout
)]

//! # SeaORM Drift
//!
//! Finds drift between the declarative mapping annotations of an entity model
//! and the live schema of a MySQL or MariaDB database.
//!
//! A pass has three parts:
//!
//! 1. [`AnnotationParser`] reads the raw expression of every annotation in an
//!    [`EntityCatalog`] into structured [`Parameter`]s.
//! 2. [`ConsistencyChecker`] cross-references each entity against the tables,
//!    columns and foreign-key constraints a [`SchemaIntrospector`] reports.
//! 3. Everything discovered along the way lands in a [`DriftReporter`] as
//!    [`Finding`]s, tagged by [`Severity`] and [`FindingKind`].
//!
//! ```
//! # async fn run() -> Result<(), sea_orm_drift::DriftErr> {
//! use sea_orm_drift::{
//!     AnnotationParser, CheckerConfig, ConsistencyChecker, DriftReporter, EntityCatalog,
//!     MockIntrospector,
//! };
//!
//! let config = CheckerConfig::default();
//! let mut catalog = EntityCatalog::from_json("[]")?;
//! let mut reporter = DriftReporter::new();
//!
//! AnnotationParser::new(config.length_classes.clone()).enrich(&mut catalog, &mut reporter);
//! let checker = ConsistencyChecker::new(MockIntrospector::new(), config);
//! checker.run(&catalog, &mut reporter).await?;
//!
//! assert!(reporter.findings().is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! Drift never fails a pass. Only a lost connection does, as a fatal
//! [`DriftErr`].

pub mod checker;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod schema;
#[doc(hidden)]
pub mod tests_cfg;

pub use checker::{ConsistencyChecker, FrozenVisited};
pub use config::{CheckerConfig, LengthCatalog, RetryPolicy, TypeTable};
pub use error::*;
pub use model::{
    AnnotationKind, AnnotationModel, EntityCatalog, EntityModel, ParamValue, Parameter,
    PropertyModel,
};
pub use parser::AnnotationParser;
pub use report::{DriftReporter, Finding, FindingKind, Severity, Summary};
pub use schema::{Column, Constraint, MockIntrospector, SchemaIntrospector, SchemaSnapshot};
#[cfg(feature = "sqlx-mysql")]
pub use schema::MySqlIntrospector;

pub use sea_query;
