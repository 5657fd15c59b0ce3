// Session and action client for batch account maintenance.
//
// The traits in `session` are the seam the batch engine drives; `http`
// holds the concrete service client. Everything in between is the shared
// model: credentials, action requests, receipts, and the error taxonomy.

pub mod action;
pub mod credential;
pub mod error;
pub mod http;
pub mod session;

pub use action::{ActionReceipt, ActionRequest, ActionResult, AvatarAsset, ProfileFields};
pub use credential::Credential;
pub use error::{ActionError, AuthError};
pub use http::{HttpBackend, HttpSession, ServiceConfig};
pub use session::{AccountBackend, AccountSession, SessionState};
