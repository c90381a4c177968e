//! Estimate Workflow Engine for QuoteDesk
//!
//! Drives one customer estimate from "quote requested" to "paid in full"
//! through guarded transitions. The engine coordinates, the caller renders:
//! nothing here touches a network, a database, or a screen.
//!
//! # Key Concepts
//!
//! - **Status Resolver**: Priority-ordered rules deriving the one
//!   human-facing status from the raw record.
//! - **Permission Computer**: Derived capability and visibility flags,
//!   always re-validated by the processor at dispatch time.
//! - **ActionProcessor**: A registry of guarded handlers. Guards check the
//!   current record; transitions run on a scratch copy; invariants are
//!   verified before anything commits. All-or-nothing.
//! - **State Differ**: Bounded-depth structural diff producing the delta
//!   attached to every audit trail entry.
//! - **Journals**: Bounded append-only rings for the event log and the
//!   simulated API trace. Oldest entries evicted first.
//! - **WorkflowService**: The command interface. Owns the record, owns the
//!   version counter, sanitizes every parameter that crosses the boundary.
//!
//! # Design Principles
//!
//! 1. Guards never trust a permission flag. State may have changed since
//!    the flag was computed; every dispatch re-validates.
//! 2. Rejections are results, not exceptions. A failed guard is an
//!    ordinary no-op, traced quietly.
//! 3. The record changes as one delta or not at all.
//! 4. Evaluation order of the display rules is a contract, not an
//!    implementation detail.

#![deny(unsafe_code)]

mod differ;
mod handlers;
mod journal;
mod permissions;
mod pricing;
mod processor;
mod resolver;
mod service;

pub use differ::*;
pub use handlers::*;
pub use journal::*;
pub use permissions::*;
pub use pricing::*;
pub use processor::*;
pub use resolver::*;
pub use service::*;
