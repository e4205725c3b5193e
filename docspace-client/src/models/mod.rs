pub mod document;
pub mod identity;
pub mod notification;
pub mod profile;

pub use document::{Document, DocumentUpdate, NewDocument, Priority};
pub use identity::{AuthEvent, Identity, IdentityMetadata, Session, SignOutScope};
pub use notification::{Notification, NotificationKind, NotificationPriority, Recipient};
pub use profile::{Profile, ProfileUpdate};
