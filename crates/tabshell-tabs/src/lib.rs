//! tabshell Session Records
//!
//! A session is one shell process plus the metadata shown on its tab: title,
//! color tag and last known directory. The [`SessionStore`] keeps records and
//! their terminals index-aligned in tab order.

mod color;
mod error;
mod events;
mod record;
mod state;
mod store;
mod title;

pub use color::TabColor;
pub use error::TabError;
pub use events::SessionEvent;
pub use record::{SessionId, SessionRecord, SessionSnapshot};
pub use state::SessionState;
pub use store::{RestoredSession, SessionStore};
pub use title::TitlePolicy;

pub type Result<T> = std::result::Result<T, TabError>;
