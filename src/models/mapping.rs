use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One documented correspondence between an ISO control and a NIST CSF
/// subcategory. `(iso_control, nist_csf)` identifies the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ControlMappingEdge {
    pub iso_control: String,
    pub nist_csf: String,
    pub iso_title: String,
    pub nist_desc: String,
}

impl ControlMappingEdge {
    pub fn new(
        iso_control: impl Into<String>,
        nist_csf: impl Into<String>,
        iso_title: impl Into<String>,
        nist_desc: impl Into<String>,
    ) -> Self {
        Self {
            iso_control: iso_control.into(),
            nist_csf: nist_csf.into(),
            iso_title: iso_title.into(),
            nist_desc: nist_desc.into(),
        }
    }
}

/// Distinct ISO control with its representative title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ControlSummary {
    pub iso_control: String,
    pub iso_title: String,
}

/// NIST CSF side of a mapping edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct SubcategoryRef {
    pub nist_csf: String,
    pub nist_desc: String,
}

/// Control with all of its subcategories, as consumed by selection lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingSelection {
    pub iso_control: String,
    pub iso_title: String,
    pub nist: Vec<SubcategoryRef>,
}
