//! Pass infrastructure for module transformations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Pass Pipeline                         │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  PassManager              Ordered, run-once execution    │
//! │    └─ ModulePass          Interface for all passes       │
//! │         ├─ name()                                        │
//! │         ├─ description()                                 │
//! │         └─ run_on_module()                               │
//! │                                                          │
//! │  EventLog                 Per-run decision record        │
//! │                                                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod events;
mod manager;
mod pass;

pub use events::{Event, EventBuilder, EventKind, EventLog};
pub use manager::PassManager;
pub use pass::ModulePass;
