pub mod config;
pub mod db;
pub mod error;
pub mod provision;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod utils;

pub use error::StatvaultError;
pub use provision::{Outcome, ProvisionReport, Provisioner, provision};
