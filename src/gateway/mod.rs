// ============================================================================
// Gateways - ports to the relational store and the out-of-process writer
// ============================================================================

mod mysql;
mod read;
mod write;

pub use mysql::MySqlReadGateway;
pub use read::{HeaderQuery, ReadError, ReadGateway};
pub use write::{WriteAck, WriteFailure, WriteFunction, WriteGateway, WriteRequest};
