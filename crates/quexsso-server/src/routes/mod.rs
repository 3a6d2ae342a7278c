//! API routes.
//!
//! Organized by resource:
//! - `users` - user listing, lookup, deletion and provisioning
//! - `authenticators` - primary authenticators of one user
//! - `profile` - profile of one user
//! - `audit` - audit trail of one user

pub mod audit;
pub mod authenticators;
pub mod profile;
pub mod users;
