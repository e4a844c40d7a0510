//! Shared utility functions.
//!
//! - `net`: local/private address classification and reachability checks

mod net;

pub use net::{check_url, check_url_with, is_local_address, is_local_ip};
