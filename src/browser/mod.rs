//! Repository browsing.
//!
//! - `session`: session state, default-file choice, filtering, selection tokens
//! - `controller`: sequences storage and API calls into session transitions
//! - `render`: plain-text view of a session snapshot

pub mod controller;
pub mod render;
pub mod session;

pub use controller::BrowserController;
pub use session::Phase;
