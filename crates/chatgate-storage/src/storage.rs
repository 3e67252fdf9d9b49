use async_trait::async_trait;
use chatgate_provider_core::AuditRecord;
use sea_orm::{ActiveValue, Database, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::entities;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("db error: {0}")]
    Db(#[from] DbErr),
}

/// Single "insert row" operation the audit bus writes through.
#[async_trait]
pub trait AuditStore: Send + Sync + 'static {
    async fn insert(&self, record: AuditRecord) -> Result<(), AuditError>;
}

#[derive(Clone)]
pub struct AuditStorage {
    db: DatabaseConnection,
}

impl AuditStorage {
    pub async fn connect(database_url: &str) -> Result<Self, AuditError> {
        let db = Database::connect(database_url).await?;
        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Entity-first schema sync.
    pub async fn sync(&self) -> Result<(), AuditError> {
        Schema::new(self.db.get_database_backend())
            .builder()
            .register(entities::AuditRecords)
            .sync(&self.db)
            .await?;
        Ok(())
    }

    pub async fn insert_record(&self, record: AuditRecord) -> Result<(), AuditError> {
        let active = entities::audit_records::ActiveModel {
            id: ActiveValue::NotSet,
            created_at: ActiveValue::Set(record.timestamp),
            user_id: ActiveValue::Set(record.user_id),
            model: ActiveValue::Set(record.model),
            request: ActiveValue::Set(record.request_json),
            response: ActiveValue::Set(record.response_json),
        };
        entities::AuditRecords::insert(active).exec(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for AuditStorage {
    async fn insert(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.insert_record(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::QueryOrder;
    use time::OffsetDateTime;

    fn record(model: &str) -> AuditRecord {
        AuditRecord {
            timestamp: OffsetDateTime::now_utc(),
            user_id: "alice".to_string(),
            model: model.to_string(),
            request_json: "{\n  \"model\": \"x\"\n}".to_string(),
            response_json: String::new(),
        }
    }

    #[tokio::test]
    async fn inserts_into_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        let dsn = format!("sqlite://{}?mode=rwc", path.display());

        let storage = AuditStorage::connect(&dsn).await.unwrap();
        storage.sync().await.unwrap();
        storage.insert_record(record("gpt-4.1")).await.unwrap();
        storage.insert(record("gemini-2.0-flash")).await.unwrap();

        let rows = entities::AuditRecords::find()
            .order_by_asc(entities::audit_records::Column::Id)
            .all(storage.connection())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "alice");
        assert_eq!(rows[0].model, "gpt-4.1");
        assert_eq!(rows[1].response, "");
        assert!(rows[0].request.contains("\"model\""));
    }

    #[tokio::test]
    async fn sync_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let dsn = format!("sqlite://{}?mode=rwc", dir.path().join("a.db").display());
        let storage = AuditStorage::connect(&dsn).await.unwrap();
        storage.sync().await.unwrap();
        storage.sync().await.unwrap();
    }
}
