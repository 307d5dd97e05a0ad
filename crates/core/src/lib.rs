pub mod entry;
pub mod paths;
pub mod scan;
pub mod validate;

pub use entry::*;
