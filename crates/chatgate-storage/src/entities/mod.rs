pub mod audit_records;

pub use audit_records::Entity as AuditRecords;
