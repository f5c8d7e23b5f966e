use async_trait::async_trait;
use carcare_core::repository::ServiceRepository;
use carcare_core::{CoreResult, Service, ServiceSummary};
use sqlx::PgPool;
use uuid::Uuid;

use crate::document::{db_error, DocumentRow};

pub struct PgServiceRepository {
    pool: PgPool,
}

impl PgServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for PgServiceRepository {
    async fn list_services(&self) -> CoreResult<Vec<Service>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, doc FROM car_services ORDER BY doc->>'service_id'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(DocumentRow::into_model).collect()
    }

    async fn get_service_summary(&self, id: Uuid) -> CoreResult<Option<ServiceSummary>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id,
                   jsonb_build_object(
                       'title', doc->'title',
                       'price', doc->'price',
                       'service_id', doc->'service_id'
                   ) AS doc
            FROM car_services
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(DocumentRow::into_model).transpose()
    }
}
