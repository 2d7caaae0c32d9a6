//! Admin console endpoints under `/api/admin`.

pub mod devices;
pub mod logs;
pub mod payments;
pub mod revenue;
pub mod subscribers;
