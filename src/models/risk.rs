use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// How the organisation intends to respond to a risk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum Treatment {
    Accept,
    #[default]
    Mitigate,
    Transfer,
    Avoid,
}

impl std::fmt::Display for Treatment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Treatment::Accept => write!(f, "accept"),
            Treatment::Mitigate => write!(f, "mitigate"),
            Treatment::Transfer => write!(f, "transfer"),
            Treatment::Avoid => write!(f, "avoid"),
        }
    }
}

/// Lifecycle state of a risk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum RiskStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskStatus::Open => write!(f, "open"),
            RiskStatus::InProgress => write!(f, "in-progress"),
            RiskStatus::Closed => write!(f, "closed"),
        }
    }
}

/// A stored risk. `risk_rating` is generated by the store as
/// `likelihood * impact` and has no write path.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Risk {
    pub id: i64,
    pub asset: String,
    pub threat: String,
    pub vulnerability: String,
    pub likelihood: i64,
    pub impact: i64,
    pub risk_rating: i64,
    pub treatment: Treatment,
    pub owner: Option<String>,
    pub status: RiskStatus,
    pub iso_control: Option<String>,
    pub due_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row of the `risk_with_nist` view
#[derive(Debug, Clone, FromRow)]
pub struct RiskWithMappingRow {
    #[sqlx(flatten)]
    pub risk: Risk,
    pub iso_title: Option<String>,
    pub nist_mappings: Option<String>,
}

/// A risk as callers see it: raw fields plus the denormalized control mapping.
#[derive(Debug, Clone, Serialize)]
pub struct RiskWithMapping {
    #[serde(flatten)]
    pub risk: Risk,
    pub risk_band: &'static str,
    pub iso_title: Option<String>,
    pub nist_mappings: Option<String>,
}

impl From<RiskWithMappingRow> for RiskWithMapping {
    fn from(row: RiskWithMappingRow) -> Self {
        Self {
            risk_band: severity_band(row.risk.risk_rating),
            risk: row.risk,
            iso_title: row.iso_title,
            nist_mappings: row.nist_mappings,
        }
    }
}

/// Request payload for creating a risk.
///
/// Scores are kept as raw JSON so that numeric strings from HTML forms are
/// accepted and anything else is reported with the field's own message.
/// Text fields holding a non-string value read as absent, so a wrong type
/// fails the same rule as a missing field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskCreate {
    #[serde(default, deserialize_with = "text_or_absent")]
    pub asset: Option<String>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub threat: Option<String>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub vulnerability: Option<String>,
    pub likelihood: Option<serde_json::Value>,
    pub impact: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub treatment: Option<String>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub iso_control: Option<String>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub due_date: Option<String>,
}

fn text_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(text)) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// Validated values handed to the risk store.
///
/// `treatment` and `status` stay free text: the store's CHECK constraints
/// are the only place their vocabulary is enforced.
#[derive(Debug, Clone)]
pub struct RiskInsert {
    pub asset: String,
    pub threat: String,
    pub vulnerability: String,
    pub likelihood: i64,
    pub impact: i64,
    pub treatment: String,
    pub owner: Option<String>,
    pub status: String,
    pub iso_control: Option<String>,
    pub due_date: Option<String>,
}

/// One step of a 1–5 scoring scale
#[derive(Debug, Clone, Serialize)]
pub struct ScoreLevel {
    pub score: i64,
    pub label: &'static str,
    pub desc: &'static str,
}

/// Inclusive rating range sharing a label
#[derive(Debug, Clone, Serialize)]
pub struct SeverityBand {
    pub min: i64,
    pub max: i64,
    pub label: &'static str,
}

/// Labels shown next to likelihood and impact choices
#[derive(Debug, Clone, Serialize)]
pub struct ScoringScale {
    pub likelihood: Vec<ScoreLevel>,
    pub impact: Vec<ScoreLevel>,
    pub bands: Vec<SeverityBand>,
}

const SEVERITY_BANDS: [(i64, i64, &str); 4] = [
    (1, 5, "Low"),
    (6, 10, "Moderate"),
    (11, 15, "High"),
    (16, 25, "Critical"),
];

impl ScoringScale {
    pub fn standard() -> Self {
        let level = |score, label, desc| ScoreLevel { score, label, desc };
        Self {
            likelihood: vec![
                level(1, "Rare", "≤ once in 5 years; strong deterrents; no history"),
                level(2, "Unlikely", "Once every 2–5 years; needs specific conditions"),
                level(3, "Possible", "Once per 1–2 years; observed in industry; partial controls"),
                level(4, "Likely", "Quarterly–annually; active campaigns; high exposure"),
                level(5, "Very likely", "Monthly+; widespread exploits; known weakness"),
            ],
            impact: vec![
                level(1, "Negligible", "No material harm; <1h minor blip; trivial cost"),
                level(2, "Low", "Small subset; <4h localized outage; <$10k"),
                level(3, "Moderate", "Noticeable; 4–24h partial outage; $10k–$100k"),
                level(4, "High", "Major segment; 1–3 days loss or data compromise; $100k–$1M"),
                level(5, "Severe", "Enterprise-level; >3 days outage or widespread breach; >$1M; regulatory"),
            ],
            bands: SEVERITY_BANDS
                .iter()
                .map(|&(min, max, label)| SeverityBand { min, max, label })
                .collect(),
        }
    }
}

/// Band label for a rating; ratings outside 1–25 have no band.
pub fn severity_band(rating: i64) -> &'static str {
    SEVERITY_BANDS
        .iter()
        .find(|(min, max, _)| (*min..=*max).contains(&rating))
        .map(|(_, _, label)| *label)
        .unwrap_or("Unrated")
}
