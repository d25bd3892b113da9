//! Domain model: payment orders, their capture outbox, and the ports the
//! application layer drives.

pub mod money;
pub mod order;
pub mod outbox;
pub mod ports;
pub mod signature;
pub mod subject;
