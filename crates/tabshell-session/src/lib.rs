//! tabshell Session Management
//!
//! - The open tabs are saved as one JSON document and replayed on start
//! - Each saved tab is restored on its own; one bad entry never stops the rest
//! - A save failure is reported but never touches the live sessions

mod codec;
mod error;
mod manager;
mod warning;

pub use codec::{decode, decode_slice, encode, encode_to_vec, Decoded, TABS_KEY};
pub use error::SessionError;
pub use manager::{LoadReport, SessionManager};
pub use warning::RestoreWarning;

pub type Result<T> = std::result::Result<T, SessionError>;
