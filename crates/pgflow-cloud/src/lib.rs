//! pgflow declarative resource host
//!
//! This crate defines what a provider must implement for pgflow to manage its
//! resources declaratively, and the state file that records them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   pgflow CLI                     │
//! │          (plan / apply / refresh / destroy)      │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 pgflow-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait CloudProvider / Resource /         │   │
//! │  │        DataSource                         │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │    Schema    │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼────────┐
//!           │ pgflow-provider│
//!           │ (Prisma        │
//!           │  Postgres)     │
//!           └────────────────┘
//! ```

pub mod action;
pub mod error;
pub mod provider;
pub mod schema;
pub mod state;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use error::{CloudError, Result};
pub use provider::{
    AuthStatus, CloudProvider, DataSource, Resource, ResourceConfig, ResourceRef, ResourceSet,
    resource_key,
};
pub use schema::{
    Attribute, AttributeChange, AttributeType, Attributes, ChangeSet, Diagnostic, REDACTED,
    Schema,
};
pub use state::{
    GlobalState, ProviderState, ResourceState, ResourceStatus, StateLock, StateManager,
};
