pub mod daemon;
pub mod host;
pub mod sync;
