pub mod constants;
pub mod jwt;
pub mod storage;

pub use constants::*;
pub use storage::*;
