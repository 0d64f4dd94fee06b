mod error;
mod generation;
mod policy;
mod status;

pub use error::*;
pub use generation::*;
pub use policy::*;
pub use status::*;
