//! Pieces shared by the `chatrelayd` daemon and the `chatrelay` terminal client.

pub mod history;
pub mod signal;
