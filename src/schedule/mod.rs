//! Timezone-aware day boundaries and the due-date windows built on them.

pub mod clock;
pub mod window;

pub use clock::*;
pub use window::*;
