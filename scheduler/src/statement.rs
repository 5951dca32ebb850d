use db::dtos::{
    ColumnRef, FieldMapping, NodeMapping, PropertyMappings, PropertyType, RelationshipMapping,
};

use crate::coerce::coerce;
use crate::value::{Row, Value};

/// Builds the insert statement for one extracted row.
///
/// Returns `None` when the row has no usable vertex id, or no usable source or
/// destination id for an edge.
pub fn build_statement(row: &Row, mapping: &FieldMapping, label: &str) -> Option<String> {
    match mapping {
        FieldMapping::Node(node) => insert_vertex(row, node, label),
        FieldMapping::Relationship(edge) => insert_edge(row, edge, label),
    }
}

fn insert_vertex(row: &Row, mapping: &NodeMapping, tag: &str) -> Option<String> {
    let vid = vertex_id(row, &mapping.vertex_id_column)?;
    let (names, values) = properties(row, &mapping.properties);

    Some(format!(
        "INSERT VERTEX `{tag}` ({names}) VALUES {vid}:({values});"
    ))
}

fn insert_edge(row: &Row, mapping: &RelationshipMapping, edge_type: &str) -> Option<String> {
    let src = vertex_id(row, &mapping.source_vid_column)?;
    let dst = vertex_id(row, &mapping.destination_vid_column)?;

    let rank = mapping
        .rank_column
        .as_ref()
        .and_then(|column| row.get(column.name()))
        .and_then(|value| coerce(value, Some(PropertyType::Int64)))
        .map(|rank| format!("@{rank}"))
        .unwrap_or_default();

    let (names, values) = properties(row, &mapping.properties);

    Some(format!(
        "INSERT EDGE `{edge_type}` ({names}) VALUES {src} -> {dst}{rank}:({values});"
    ))
}

fn vertex_id(row: &Row, column: &ColumnRef) -> Option<String> {
    let value = row.get(column.name()).filter(|value| !value.is_null())?;
    coerce(value, Some(column.vid_type().into()))
}

/// Comma-joined property names and literals. Absent columns and values that
/// coerce to NULL are left out of both lists.
fn properties(row: &Row, mappings: &PropertyMappings) -> (String, String) {
    let (names, values): (Vec<_>, Vec<_>) = mappings
        .iter()
        .filter_map(|(column, mapping)| {
            let value: &Value = row.get(column)?;
            let literal = coerce(value, mapping.target_type)?;
            Some((format!("`{}`", mapping.target_property), literal))
        })
        .unzip();

    (names.join(", "), values.join(", "))
}
