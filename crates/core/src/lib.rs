pub mod config;
pub mod domain;
pub mod error;
pub mod record;

pub use config::Config;
pub use domain::Domain;
pub use error::*;
pub use record::*;
