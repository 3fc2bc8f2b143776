pub mod book;
pub mod challenge;
pub mod review;

pub use book::*;
pub use challenge::*;
pub use review::*;
