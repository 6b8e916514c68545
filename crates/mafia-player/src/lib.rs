//! Player state for the Mafia server.
//!
//! Everything the engine keeps per participant lives here:
//!
//! 1. **Record** ([`Player`]): name, role, activity flag, exposed target.
//! 2. **Decision mailboxes** ([`Mailbox`]): single-slot, last write wins.
//! 3. **Notifications** ([`NotificationQueue`]): a bounded FIFO drained by
//!    exactly one [`NotificationStream`].
//! 4. **Registry** ([`Registry`]): who is connected, by id and by name.
//!
//! # How it fits in the stack
//!
//! ```text
//! Engine (above)   ← rounds read mailboxes, the bus pushes notifications
//!     ↕
//! Player (this crate)
//!     ↕
//! Protocol (below) ← PlayerId, Role, Notification
//! ```

mod error;
mod mailbox;
mod player;
mod queue;
mod registry;

pub use error::PlayerError;
pub use mailbox::Mailbox;
pub use player::{Player, PlayerChannels};
pub use queue::{NotificationQueue, NotificationStream};
pub use registry::Registry;
