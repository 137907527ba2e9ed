pub mod depth;
pub mod errors;
pub mod types;

pub use errors::ConnectorError;
