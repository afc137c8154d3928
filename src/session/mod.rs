pub mod error;
pub mod finalize;
pub mod input;
pub mod machine;
pub mod selection;

pub use machine::{Session, SessionState};
