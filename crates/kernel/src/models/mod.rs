//! Database models.

pub mod conference;
pub mod key;
pub mod profile;
pub mod session;
pub mod speaker;

pub use conference::{Conference, CreateConference, UpdateConference};
pub use key::{EntityKey, EntityKind, KeyError};
pub use profile::{Profile, ProfileConflict, TeeShirtSize};
pub use session::{CreateSession, Session};
pub use speaker::{CreateSpeaker, Speaker};
