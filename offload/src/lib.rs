mod common;
mod device;
mod image;
mod ops;
mod run;

pub mod prelude;

pub use prelude::*;
