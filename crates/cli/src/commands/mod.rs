pub mod probe;
pub mod util;

pub use probe::*;
pub use util::*;
