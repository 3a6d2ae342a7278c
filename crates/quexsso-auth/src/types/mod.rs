//! Domain types shared by storage backends, services and HTTP handlers.

pub mod audit;
pub mod authenticator;
pub mod user;

pub use audit::{AuditEvent, AuditOrigin, event_types};
pub use authenticator::{Authenticator, AuthenticatorKey};
pub use user::{Authentication, Profile, ProfilePatch, User, UserView};
