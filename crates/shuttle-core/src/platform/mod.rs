//! Platform abstraction layer.
//!
//! All `#[cfg]` blocks for OS-specific behavior live here:
//! - `permissions` - write/search access checks and permission display
//! - `ownership` - ownership reset for the managed install

pub mod ownership;
pub mod permissions;

pub use ownership::{
    ownership_policy_for, NoopOwnership, OwnershipPolicy, ServiceAccountOwnership,
};
pub use permissions::{can_remove, describe_access, AccessSummary};
