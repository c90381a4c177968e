//! Estimate Workflow Domain Types for QuoteDesk
//!
//! A customer estimate is not a form submission. It is a **guarded
//! lifecycle**: a single aggregate that moves from "requested" through
//! review, optional photo approval, acceptance, invoicing, and payment,
//! with every mutation funnelled through precondition checks.
//!
//! # Key Concepts
//!
//! - **WorkflowRecord**: The aggregate root for one estimate's lifecycle.
//!   Owned by exactly one service instance, mutated only through the
//!   action processor in the engine crate.
//! - **Status enums**: Each status field (`workflow`, `quote`, `invoice`,
//!   photo submission, account) is a closed enum. No string matching, no
//!   silent fallthrough for new states.
//! - **DisplayStatus**: The single human-facing status derived from the
//!   raw record by priority-ordered rules.
//! - **ActionKind / ActionParams**: The canonical command vocabulary and
//!   the flat, allow-listed parameter record that crosses the boundary.
//! - **StateDelta**: Leaf-level structural diff between two record
//!   snapshots, keyed by dotted path.
//! - **AuditRecord**: An immutable receipt describing who did what and
//!   which fields changed.
//!
//! # Design Principles
//!
//! 1. Guards decide, transitions execute. A rejected action mutates
//!    nothing.
//! 2. Money is integer minor units. No floats anywhere near a balance.
//! 3. Derived values (balance, current step) are projections, never
//!    independently stored truths that can drift.
//! 4. Every identifier crossing the boundary has a validated shape.

#![deny(unsafe_code)]

mod action;
mod audit;
mod delta;
mod errors;
mod ids;
mod record;
mod status;

pub use action::*;
pub use audit::*;
pub use delta::*;
pub use errors::*;
pub use ids::*;
pub use record::*;
pub use status::*;
