//! Service objects over the storage traits.
//!
//! Each service is cheap to clone (it only holds `Arc`s) and maps storage
//! outcomes onto [`crate::AuthError`] variants. Authorization is not checked
//! here; routes call [`crate::guard::AccessGuard`] first.

pub mod audit;
pub mod authenticators;
pub mod directory;
pub mod profile;

pub use audit::AuditSink;
pub use authenticators::AuthenticatorStore;
pub use directory::UserDirectory;
pub use profile::ProfileService;
