pub mod bus;
pub mod entities;
pub mod storage;

pub use bus::{AuditBus, AuditBusConfig, AuditBusSink};
pub use storage::{AuditError, AuditStorage, AuditStore};
