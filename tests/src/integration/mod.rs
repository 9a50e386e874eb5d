//! Cross-module flows through `ExceptionService`.

pub mod jurisdiction;
pub mod multi_client;
pub mod poll_cycle;
pub mod restart;
