mod backoff;
mod base;
mod executor;

pub use backoff::*;
pub use base::*;
pub use executor::*;
