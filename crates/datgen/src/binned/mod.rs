mod bin;
mod key;
mod policy;
mod store;
#[cfg(test)]
mod tests;

pub use key::*;
pub use policy::*;
pub use store::*;
