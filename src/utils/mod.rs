pub mod encoding;
pub mod humanize;

pub use encoding::*;
pub use humanize::*;
