#![doc = "Session core for the Berlin clock: internal clock, resync scheduling, connectivity supervision."]

pub mod clock;
pub mod realtime;
pub mod resync;
pub mod session;
pub mod supervisor;

pub use clock::*;
pub use realtime::*;
pub use resync::*;
pub use session::*;
pub use supervisor::*;
