pub mod judge;
pub mod runner;

pub use judge::*;
pub use runner::*;
