//! Infrastructure Layer
//!
//! Session store implementations.

pub mod memory;
pub mod postgres;

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;
