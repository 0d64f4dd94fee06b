mod manager;
mod request;
mod worker;

pub use manager::*;
pub use request::*;
pub use worker::*;
