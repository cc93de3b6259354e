//! # Refdata Identifiers
//!
//! Versioned security identifiers for the reference data services.
//!
//! This crate provides:
//!
//! - **History**: append-only identifier versions with point-in-time lookup,
//!   diffs, timelines and additive rollback
//! - **Workflow**: change requests with format validation, impact analysis
//!   and a `Pending -> Applied | Rejected` review cycle
//! - **Operations**: denormalized snapshots, search, bulk loads, statistics
//!   and integrity checks
//! - **Storage**: an in-memory store and a `redb` store behind one trait,
//!   committing each change atomically under optimistic guards
//!
//! The managers are generic over the identifier enum ([`IdentifierKind`])
//! and the entity model that owns the identifiers.
//!
//! ## Example
//!
//! ```rust
//! use refdata_identifiers::prelude::*;
//!
//! use std::sync::Arc;
//!
//! let store: Arc<dyn IdentifierStore<IdentifierType>> = Arc::new(InMemoryStore::new());
//! let versions = VersionManager::new(
//!     store,
//!     Arc::new(SystemClock),
//!     VersioningConfig::default(),
//! );
//! let row = versions
//!     .create_new_version(NewVersion::new(
//!         7,
//!         IdentifierType::Isin,
//!         "us0378331005",
//!         ChangeReason::InitialAssignment,
//!         "loader",
//!     ))
//!     .unwrap();
//! assert_eq!(row.version, 1);
//! assert_eq!(row.identifier_value, "US0378331005");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::too_many_arguments)]

pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod manager;
pub mod managers;
pub mod records;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod validation;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{ConfigError, VersioningConfig};
    pub use crate::entity::{EntityIdAccessor, EntityRepository, InMemoryEntityRepository};
    pub use crate::error::{IdentifierError, IdentifierResult};
    pub use crate::manager::IdentifierManager;
    pub use crate::managers::{BulkApproval, OperationsManager, VersionManager, WorkflowManager};
    pub use crate::records::{
        ChangeRequest, IdentifierAttributes, IdentifierHistory, IdentifierSnapshot, NewVersion,
    };
    pub use crate::store::{IdentifierStore, InMemoryStore, RedbStore};
    pub use crate::types::{
        ChangeReason, EntityId, IdentifierKind, IdentifierStatus, IdentifierType, RequestStatus,
        RiskLevel,
    };
}

pub use error::{IdentifierError, IdentifierResult};
pub use manager::IdentifierManager;
pub use types::{IdentifierKind, IdentifierType};
