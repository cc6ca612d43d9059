use std::sync::Arc;
use crate::{
    error::ApiError,
    models::{ControlMappingEdge, MappingSelection},
    repositories::MappingRepository,
};

/// Edges shipped with the service and applied at startup.
pub fn builtin_catalogue() -> Vec<ControlMappingEdge> {
    vec![
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
        ControlMappingEdge::new(
            "A.12.3.1",
            "DE.CM-7",
            "Event logging / monitoring",
            "Monitoring for unauthorized personnel, connections, devices, and software",
        ),
        ControlMappingEdge::new(
            "A.17.1.1",
            "RC.BC-1",
            "Business continuity planning",
            "Recovery plans are in place and managed",
        ),
    ]
}

pub struct MappingService {
    mapping_repo: Arc<dyn MappingRepository + Send + Sync>,
}

impl MappingService {
    pub fn new(mapping_repo: Arc<dyn MappingRepository + Send + Sync>) -> Self {
        Self { mapping_repo }
    }

    /// Each distinct control, ascending, with its subcategories nested in
    /// ascending order.
    pub async fn list_mappings_for_selection(&self) -> Result<Vec<MappingSelection>, ApiError> {
        let controls = self.mapping_repo.list_distinct_controls().await?;

        let mut selections = Vec::with_capacity(controls.len());
        for control in controls {
            let nist = self
                .mapping_repo
                .list_edges_for_control(&control.iso_control)
                .await?;
            selections.push(MappingSelection {
                iso_control: control.iso_control,
                iso_title: control.iso_title,
                nist,
            });
        }

        Ok(selections)
    }

    /// Apply a batch of edges atomically.
    pub async fn load_catalogue(&self, edges: &[ControlMappingEdge]) -> Result<usize, ApiError> {
        let applied = self.mapping_repo.upsert_edges(edges).await?;
        tracing::info!(edges = applied, "control mapping catalogue applied");
        Ok(applied)
    }
}
