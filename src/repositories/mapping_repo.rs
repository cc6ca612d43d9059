use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{ControlMappingEdge, ControlSummary, SubcategoryRef},
};
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Insert an edge, or overwrite the titles of the edge with the same key.
    async fn upsert_edge(&self, edge: &ControlMappingEdge) -> Result<(), ApiError>;
    /// Upsert a batch in one transaction; any failure leaves the store untouched.
    async fn upsert_edges(&self, edges: &[ControlMappingEdge]) -> Result<usize, ApiError>;
    async fn list_distinct_controls(&self) -> Result<Vec<ControlSummary>, ApiError>;
    async fn list_edges_for_control(&self, iso_control: &str) -> Result<Vec<SubcategoryRef>, ApiError>;
}

pub struct SqlxMappingRepository {
    pool: DatabasePool,
}

impl SqlxMappingRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn validate_edge(edge: &ControlMappingEdge) -> Result<(), ApiError> {
    if edge.iso_control.is_empty() || edge.nist_csf.is_empty() {
        return Err(ApiError::validation(
            "iso_control and nist_csf are required for a control mapping",
        ));
    }
    Ok(())
}

async fn upsert_in(
    tx: &mut Transaction<'_, Sqlite>,
    edge: &ControlMappingEdge,
) -> Result<(), ApiError> {
    validate_edge(edge)?;

    sqlx::query(
        r#"
        INSERT INTO iso_to_csf (iso_control, nist_csf, iso_title, nist_desc)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (iso_control, nist_csf) DO UPDATE SET
            iso_title = excluded.iso_title,
            nist_desc = excluded.nist_desc
        "#,
    )
    .bind(&edge.iso_control)
    .bind(&edge.nist_csf)
    .bind(&edge.iso_title)
    .bind(&edge.nist_desc)
    .execute(&mut **tx)
    .await
    .map_err(ApiError::from_store)?;

    Ok(())
}

#[async_trait]
impl MappingRepository for SqlxMappingRepository {
    async fn upsert_edge(&self, edge: &ControlMappingEdge) -> Result<(), ApiError> {
        self.upsert_edges(std::slice::from_ref(edge)).await.map(|_| ())
    }

    async fn upsert_edges(&self, edges: &[ControlMappingEdge]) -> Result<usize, ApiError> {
        let mut tx = self.pool.begin().await?;

        for edge in edges {
            // Returning early drops `tx`, which rolls back every earlier upsert
            upsert_in(&mut tx, edge).await?;
        }

        tx.commit().await?;
        Ok(edges.len())
    }

    async fn list_distinct_controls(&self) -> Result<Vec<ControlSummary>, ApiError> {
        let rows = sqlx::query_as::<_, ControlSummary>(
            r#"
            SELECT iso_control,
                   COALESCE(MIN(NULLIF(iso_title, '')), '') AS iso_title
            FROM iso_to_csf
            GROUP BY iso_control
            ORDER BY iso_control ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_edges_for_control(&self, iso_control: &str) -> Result<Vec<SubcategoryRef>, ApiError> {
        let rows = sqlx::query_as::<_, SubcategoryRef>(
            r#"
            SELECT nist_csf, nist_desc
            FROM iso_to_csf
            WHERE iso_control = $1
            ORDER BY nist_csf ASC
            "#,
        )
        .bind(iso_control)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
