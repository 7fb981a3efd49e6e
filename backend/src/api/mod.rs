pub mod analysis;
pub mod channel;
pub mod export;

pub use analysis::*;
pub use channel::*;
pub use export::*;
