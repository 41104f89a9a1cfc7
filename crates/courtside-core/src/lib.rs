// Library root: domain model, errors, configuration and persistence shared
// by the rotation engine and the CLI.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod store;

pub use error::RotationError;
