use std::sync::Arc;
use serde_json::Value;
use crate::{
    error::ApiError,
    models::{RiskCreate, RiskInsert, RiskStatus, RiskWithMapping, Treatment},
    repositories::RiskRepository,
};

const REQUIRED_TEXT_MESSAGE: &str = "asset, threat, and vulnerability are required";
const LIKELIHOOD_MESSAGE: &str = "likelihood must be 1–5";
const IMPACT_MESSAGE: &str = "impact must be 1–5";

const CSV_HEADERS: [&str; 17] = [
    "id", "asset", "threat", "vulnerability", "likelihood", "impact", "risk_rating",
    "risk_band", "treatment", "owner", "status", "iso_control", "iso_title",
    "nist_mappings", "due_date", "created_at", "updated_at",
];

pub struct RiskService {
    risk_repo: Arc<dyn RiskRepository + Send + Sync>,
}

impl RiskService {
    pub fn new(risk_repo: Arc<dyn RiskRepository + Send + Sync>) -> Self {
        Self { risk_repo }
    }

    /// Validate and store a new risk, then return it as read back through
    /// the mapping view. The insert result itself is never returned, so the
    /// denormalized fields come from a single place.
    pub async fn create_risk(&self, input: RiskCreate) -> Result<RiskWithMapping, ApiError> {
        let insert = validate_risk(input).map_err(|e| {
            tracing::warn!(error = %e, "rejected risk submission");
            e
        })?;

        let created = self.risk_repo.insert(&insert).await?;

        let risk = self
            .risk_repo
            .get_with_mapping(created.id)
            .await?
            .ok_or_else(|| ApiError::internal(format!("Risk {} missing after insert", created.id)))?;

        tracing::info!(
            risk_id = risk.risk.id,
            risk_rating = risk.risk.risk_rating,
            iso_control = ?risk.risk.iso_control,
            "risk created"
        );

        Ok(risk)
    }

    pub async fn get_risk(&self, id: i64) -> Result<Option<RiskWithMapping>, ApiError> {
        self.risk_repo.get_with_mapping(id).await
    }

    pub async fn list_risks(&self) -> Result<Vec<RiskWithMapping>, ApiError> {
        self.risk_repo.list_all_with_mapping().await
    }

    /// Render every risk, in listing order, as CSV with a header row.
    pub async fn export_csv(&self) -> Result<String, ApiError> {
        let risks = self.list_risks().await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADERS)?;

        for r in &risks {
            let risk = &r.risk;
            writer.write_record([
                risk.id.to_string(),
                risk.asset.clone(),
                risk.threat.clone(),
                risk.vulnerability.clone(),
                risk.likelihood.to_string(),
                risk.impact.to_string(),
                risk.risk_rating.to_string(),
                r.risk_band.to_string(),
                risk.treatment.to_string(),
                risk.owner.clone().unwrap_or_default(),
                risk.status.to_string(),
                risk.iso_control.clone().unwrap_or_default(),
                r.iso_title.clone().unwrap_or_default(),
                r.nist_mappings.clone().unwrap_or_default(),
                risk.due_date.clone().unwrap_or_default(),
                risk.created_at.to_rfc3339(),
                risk.updated_at.to_rfc3339(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ApiError::internal(format!("Failed to flush CSV export: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| ApiError::internal(format!("CSV export is not UTF-8: {}", e)))
    }
}

/// Check a submission in rule order and stop at the first failure.
fn validate_risk(input: RiskCreate) -> Result<RiskInsert, ApiError> {
    let asset = required_text(input.asset);
    let threat = required_text(input.threat);
    let vulnerability = required_text(input.vulnerability);
    let (asset, threat, vulnerability) = match (asset, threat, vulnerability) {
        (Some(a), Some(t), Some(v)) => (a, t, v),
        _ => return Err(ApiError::validation(REQUIRED_TEXT_MESSAGE)),
    };

    let likelihood = parse_score(input.likelihood.as_ref())
        .ok_or_else(|| ApiError::validation(LIKELIHOOD_MESSAGE))?;
    let impact = parse_score(input.impact.as_ref())
        .ok_or_else(|| ApiError::validation(IMPACT_MESSAGE))?;

    Ok(RiskInsert {
        asset,
        threat,
        vulnerability,
        likelihood,
        impact,
        treatment: optional_text(input.treatment).unwrap_or_else(|| Treatment::default().to_string()),
        owner: optional_text(input.owner),
        status: optional_text(input.status).unwrap_or_else(|| RiskStatus::default().to_string()),
        iso_control: optional_text(input.iso_control),
        due_date: optional_text(input.due_date),
    })
}

fn required_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Blank optional fields are treated as absent and stored as NULL.
fn optional_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accept integers, integral floats and numeric strings in 1–5.
fn parse_score(value: Option<&Value>) -> Option<i64> {
    let score = match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (1..=5).contains(&score).then_some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_connection_pool, DatabasePool};
    use crate::models::{ControlMappingEdge, Risk};
    use crate::repositories::{MappingRepository, SqlxMappingRepository, SqlxRiskRepository};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Mutex;

    async fn setup() -> (DatabasePool, RiskService, Arc<SqlxRiskRepository>) {
        let pool = create_connection_pool("sqlite::memory:", 1).await.unwrap();
        let repo = Arc::new(SqlxRiskRepository::new(pool.clone()));
        (pool, RiskService::new(repo.clone()), repo)
    }

    fn valid_input() -> RiskCreate {
        RiskCreate {
            asset: Some("Customer Database".to_string()),
            threat: Some("Data Breach".to_string()),
            vulnerability: Some("Unpatched SQL server".to_string()),
            likelihood: Some(json!(4)),
            impact: Some(json!(4)),
            ..Default::default()
        }
    }

    fn validation_message(result: Result<RiskWithMapping, ApiError>) -> String {
        match result {
            Err(ApiError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_sample_risk_with_mappings() {
        let (pool, service, _) = setup().await;
        SqlxMappingRepository::new(pool)
            .upsert_edges(&[
                ControlMappingEdge::new(
                    "A.9.2.3",
                    "PR.AC-1",
                    "User password management",
                    "Identities and credentials are managed",
                ),
                ControlMappingEdge::new(
                    "A.9.2.3",
                    "PR.AC-7",
                    "User password management",
                    "Users are authenticated commensurate with risk",
                ),
            ])
            .await
            .unwrap();

        let input = RiskCreate {
            treatment: Some("mitigate".to_string()),
            owner: Some("IT Security".to_string()),
            status: Some("open".to_string()),
            iso_control: Some("A.9.2.3".to_string()),
            due_date: Some("2025-11-01".to_string()),
            ..valid_input()
        };

        let risk = service.create_risk(input).await.unwrap();
        assert_eq!(risk.risk.risk_rating, 16);
        assert_eq!(risk.risk.owner.as_deref(), Some("IT Security"));
        assert_eq!(risk.risk.due_date.as_deref(), Some("2025-11-01"));
        assert_eq!(risk.iso_title.as_deref(), Some("User password management"));
        assert_eq!(
            risk.nist_mappings.as_deref(),
            Some("PR.AC-1 — Identities and credentials are managed; PR.AC-7 — Users are authenticated commensurate with risk")
        );
    }

    #[tokio::test]
    async fn test_blank_required_text_rejected() {
        let (_, service, repo) = setup().await;

        let input = RiskCreate {
            asset: Some("".to_string()),
            threat: Some("x".to_string()),
            vulnerability: Some("y".to_string()),
            likelihood: Some(json!(3)),
            impact: Some(json!(3)),
            ..Default::default()
        };
        assert_eq!(
            validation_message(service.create_risk(input).await),
            "asset, threat, and vulnerability are required"
        );

        let whitespace = RiskCreate {
            vulnerability: Some("   ".to_string()),
            ..valid_input()
        };
        assert_eq!(
            validation_message(service.create_risk(whitespace).await),
            REQUIRED_TEXT_MESSAGE
        );

        let missing = RiskCreate { threat: None, ..valid_input() };
        assert_eq!(validation_message(service.create_risk(missing).await), REQUIRED_TEXT_MESSAGE);

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_scores_rejected_without_writing() {
        let (_, service, repo) = setup().await;

        let zero_likelihood = RiskCreate { likelihood: Some(json!(0)), ..valid_input() };
        assert_eq!(
            validation_message(service.create_risk(zero_likelihood).await),
            "likelihood must be 1–5"
        );

        let large_impact = RiskCreate { impact: Some(json!(6)), ..valid_input() };
        assert_eq!(
            validation_message(service.create_risk(large_impact).await),
            "impact must be 1–5"
        );

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_first_failing_rule_wins() {
        let (_, service, _) = setup().await;

        let everything_wrong = RiskCreate {
            asset: None,
            likelihood: Some(json!(9)),
            impact: Some(json!(9)),
            ..valid_input()
        };
        assert_eq!(
            validation_message(service.create_risk(everything_wrong).await),
            REQUIRED_TEXT_MESSAGE
        );

        let both_scores_wrong = RiskCreate {
            likelihood: Some(json!("high")),
            impact: None,
            ..valid_input()
        };
        assert_eq!(
            validation_message(service.create_risk(both_scores_wrong).await),
            LIKELIHOOD_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_defaults_and_trimming() {
        let (_, service, _) = setup().await;

        let input = RiskCreate {
            asset: Some("  Payroll system ".to_string()),
            threat: Some("\tInsider misuse".to_string()),
            vulnerability: Some("Shared admin account\n".to_string()),
            likelihood: Some(json!("2")),
            impact: Some(json!(5.0)),
            owner: Some("".to_string()),
            ..Default::default()
        };

        let risk = service.create_risk(input).await.unwrap().risk;
        assert_eq!(risk.asset, "Payroll system");
        assert_eq!(risk.threat, "Insider misuse");
        assert_eq!(risk.vulnerability, "Shared admin account");
        assert_eq!(risk.risk_rating, 10);
        assert_eq!(risk.treatment, Treatment::Mitigate);
        assert_eq!(risk.status, RiskStatus::Open);
        assert_eq!(risk.owner, None);
        assert_eq!(risk.iso_control, None);
        assert_eq!(risk.due_date, None);
    }

    #[tokio::test]
    async fn test_unknown_treatment_reaches_store_constraint() {
        let (_, service, repo) = setup().await;

        let input = RiskCreate {
            treatment: Some("ignore".to_string()),
            ..valid_input()
        };
        let result = service.create_risk(input).await;
        assert!(matches!(result, Err(ApiError::ConstraintViolation(_))));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_due_date_is_stored_verbatim() {
        let (_, service, _) = setup().await;

        let input = RiskCreate {
            due_date: Some("2025-02-30".to_string()),
            ..valid_input()
        };
        let risk = service.create_risk(input).await.unwrap();
        assert_eq!(risk.risk.due_date.as_deref(), Some("2025-02-30"));
    }

    #[tokio::test]
    async fn test_export_csv_follows_listing_order() {
        let (_, service, _) = setup().await;

        service
            .create_risk(RiskCreate { likelihood: Some(json!(1)), impact: Some(json!(1)), ..valid_input() })
            .await
            .unwrap();
        service
            .create_risk(RiskCreate {
                asset: Some("Web, \"public\" site".to_string()),
                likelihood: Some(json!(5)),
                impact: Some(json!(5)),
                ..valid_input()
            })
            .await
            .unwrap();

        let csv = service.export_csv().await.unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), CSV_HEADERS.len());
        assert_eq!(&headers[6], "risk_rating");

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "Web, \"public\" site");
        assert_eq!(&records[0][6], "25");
        assert_eq!(&records[1][6], "1");
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score(Some(&json!(1))), Some(1));
        assert_eq!(parse_score(Some(&json!(" 5 "))), Some(5));
        assert_eq!(parse_score(Some(&json!(3.0))), Some(3));
        assert_eq!(parse_score(Some(&json!(2.5))), None);
        assert_eq!(parse_score(Some(&json!(6))), None);
        assert_eq!(parse_score(Some(&json!(true))), None);
        assert_eq!(parse_score(Some(&Value::Null)), None);
        assert_eq!(parse_score(None), None);
    }

    /// Repository whose view deliberately differs from what insert returns
    struct RecordingRiskRepository {
        calls: Mutex<Vec<&'static str>>,
    }

    fn stored_risk(id: i64) -> Risk {
        Risk {
            id,
            asset: "a".to_string(),
            threat: "t".to_string(),
            vulnerability: "v".to_string(),
            likelihood: 2,
            impact: 2,
            risk_rating: 4,
            treatment: Treatment::Mitigate,
            owner: None,
            status: RiskStatus::Open,
            iso_control: Some("A.9.2.3".to_string()),
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[async_trait]
    impl RiskRepository for RecordingRiskRepository {
        async fn insert(&self, _risk: &RiskInsert) -> Result<Risk, ApiError> {
            self.calls.lock().unwrap().push("insert");
            Ok(stored_risk(7))
        }

        async fn get_with_mapping(&self, id: i64) -> Result<Option<RiskWithMapping>, ApiError> {
            self.calls.lock().unwrap().push("get_with_mapping");
            Ok(Some(RiskWithMapping {
                risk: stored_risk(id),
                risk_band: "Low",
                iso_title: Some("from view".to_string()),
                nist_mappings: Some("PR.AC-1 — from view".to_string()),
            }))
        }

        async fn list_all_with_mapping(&self) -> Result<Vec<RiskWithMapping>, ApiError> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<i64, ApiError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_create_rereads_through_view() {
        let repo = Arc::new(RecordingRiskRepository { calls: Mutex::new(Vec::new()) });
        let service = RiskService::new(repo.clone());

        let risk = service.create_risk(valid_input()).await.unwrap();

        assert_eq!(risk.risk.id, 7);
        assert_eq!(risk.iso_title.as_deref(), Some("from view"));
        assert_eq!(*repo.calls.lock().unwrap(), vec!["insert", "get_with_mapping"]);
    }
}
