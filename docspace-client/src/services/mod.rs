pub mod documents;
pub mod notifications;
pub mod profile;
pub mod session;
pub mod sharing;
pub mod visibility;

pub use documents::DocumentService;
pub use notifications::NotificationService;
pub use profile::ProfileService;
pub use session::{AuthSnapshot, AuthState, SessionManager};
pub use sharing::{ShareActor, ShareOutcome, SharingService};
pub use visibility::{visible, DocumentFilter, ScopeFilter, SortKey, Viewer};
