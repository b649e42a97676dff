//! In-process query/mutation facade over `trainhub_core`.
//!
//! Every operation opens its own connection, runs one use-case and returns
//! an [`ApiResponse`] envelope instead of propagating errors.

pub mod api;
pub mod input;

pub use api::{ApiError, ApiResponse, SearchItem, TrainHubApi};
pub use input::{TrainInput, TrainUpdateInput};
