//! Importer for externally supplied relation/layout JSON
//!
//! The document must be an object with a `relations` key, a `nodes` key, or
//! both. Each recognized part replaces the corresponding file; both parts are
//! parsed before anything is written.

use super::layout::{Layout, LayoutStore};
use super::store::{parse_records, RelationStore, StoreError};

/// What an import wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Relation records written, if the document had `relations`
    pub relations: Option<usize>,
    /// Layout nodes written, if the document had `nodes`
    pub nodes: Option<usize>,
}

pub fn import_document(
    json: &str,
    relations: &RelationStore,
    layout: &LayoutStore,
) -> Result<ImportReport, StoreError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Object(mut object) = value else {
        return Err(StoreError::Shape(
            "import document must be a JSON object".to_string(),
        ));
    };

    let records = object.remove("relations").map(parse_records).transpose()?;
    // The layout reader expects the nodes under their own key
    let nodes = object
        .remove("nodes")
        .map(|nodes| Layout::from_value(serde_json::json!({ "nodes": nodes })))
        .transpose()?;

    if records.is_none() && nodes.is_none() {
        return Err(StoreError::Shape(
            "import document has neither relations nor nodes".to_string(),
        ));
    }

    let mut report = ImportReport::default();
    if let Some(records) = records {
        relations.save(&records)?;
        report.relations = Some(records.len());
    }
    if let Some(nodes) = nodes {
        layout.save(&nodes)?;
        report.nodes = Some(nodes.len());
    }
    tracing::info!(relations = ?report.relations, nodes = ?report.nodes, "imported");
    Ok(report)
}
