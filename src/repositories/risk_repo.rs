use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{Risk, RiskInsert, RiskWithMapping, RiskWithMappingRow},
};
use async_trait::async_trait;

#[async_trait]
pub trait RiskRepository: Send + Sync {
    async fn insert(&self, risk: &RiskInsert) -> Result<Risk, ApiError>;
    async fn get_with_mapping(&self, id: i64) -> Result<Option<RiskWithMapping>, ApiError>;
    /// Every risk, most severe first; equal ratings list the newest first.
    async fn list_all_with_mapping(&self) -> Result<Vec<RiskWithMapping>, ApiError>;
    async fn count(&self) -> Result<i64, ApiError>;
}

pub struct SqlxRiskRepository {
    pool: DatabasePool,
}

impl SqlxRiskRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const VIEW_COLUMNS: &str = "id, asset, threat, vulnerability, likelihood, impact, risk_rating, \
     treatment, owner, status, iso_control, due_date, created_at, updated_at, \
     iso_title, nist_mappings";

#[async_trait]
impl RiskRepository for SqlxRiskRepository {
    async fn insert(&self, risk: &RiskInsert) -> Result<Risk, ApiError> {
        let row = sqlx::query_as::<_, Risk>(
            r#"
            INSERT INTO risks
                (asset, threat, vulnerability, likelihood, impact, treatment, owner, status, iso_control, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, asset, threat, vulnerability, likelihood, impact, risk_rating,
                      treatment, owner, status, iso_control, due_date, created_at, updated_at
            "#,
        )
        .bind(&risk.asset)
        .bind(&risk.threat)
        .bind(&risk.vulnerability)
        .bind(risk.likelihood)
        .bind(risk.impact)
        .bind(&risk.treatment)
        .bind(&risk.owner)
        .bind(&risk.status)
        .bind(&risk.iso_control)
        .bind(&risk.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::from_store)?;

        Ok(row)
    }

    async fn get_with_mapping(&self, id: i64) -> Result<Option<RiskWithMapping>, ApiError> {
        let result = sqlx::query_as::<_, RiskWithMappingRow>(&format!(
            "SELECT {} FROM risk_with_nist WHERE id = $1",
            VIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(RiskWithMapping::from);

        Ok(result)
    }

    async fn list_all_with_mapping(&self) -> Result<Vec<RiskWithMapping>, ApiError> {
        let rows = sqlx::query_as::<_, RiskWithMappingRow>(&format!(
            "SELECT {} FROM risk_with_nist ORDER BY risk_rating DESC, id DESC",
            VIEW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RiskWithMapping::from).collect())
    }

    async fn count(&self) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM risks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
