#![cfg_attr(docsrs, feature(doc_cfg))]
//! Building blocks for binned scenario datasets.
//!
//! A corpus is filled by rejection sampling: a [`GenerationTask`] turns a
//! seed into a candidate scenario through a [`ScenarioGenerator`], measures
//! it with a [`ScenarioMetrics`] engine and accepts it only if it lands in a
//! registered (dynamism, urgency, scale) bin. Accepted [`Outcome`]s are
//! filed into a [`BinnedStore`], which keeps every bin ordered and can be
//! shared between worker threads.

mod binned;
mod error;
mod interface;
mod order;
mod settings;
mod sync;
mod task;

pub use crate::binned::*;
pub use crate::error::*;
pub use crate::interface::*;
pub use crate::order::*;
pub use crate::settings::*;
pub use crate::task::*;
