//! The Mafia session engine.
//!
//! One [`Session`] runs one game: it collects players in a lobby, deals
//! roles once enough have joined, then alternates Day and Night rounds
//! until either side wins.
//!
//! # Key types
//!
//! - [`Session`]: the handle the transport layer calls into
//! - [`GameConfig`]: thresholds and delays
//! - [`SessionState`]: lifecycle state machine
//! - [`ActionOutcome`] / [`EngineError`]: what an operation reports
//! - [`quota`] / [`assign_roles`]: role dealing
//!
//! # Concurrency
//!
//! All shared state sits behind one `tokio::sync::Mutex`, held only for
//! the length of a single mutation. Decision tasks wait on per-player
//! mailboxes outside the lock and are joined as a barrier before each
//! round is resolved.

mod bus;
mod config;
mod error;
mod roles;
mod round;
mod rules;
mod session;
mod table;

pub use config::{GameConfig, SessionState};
pub use error::{ActionOutcome, EngineError};
pub use mafia_player::NotificationStream;
pub use roles::{assign_roles, quota};
pub use session::{Session, SessionInfo};
