//! Reads the AgentMap CSV schema (spec.md §6 "CSV schema") into the
//! [`NodeSpec`] list the Graph Assembly Engine consumes.
//!
//! CSV parsing itself is out of scope for the core crate (spec.md §1): the
//! core only ever sees a parsed node list. This module is the thin,
//! `csv`-crate-backed reader that makes the CLI runnable against an actual
//! `.csv` file.

use agentmap::graph::edges::EdgeMap;
use agentmap::{parse_context, parse_input_fields, parse_output_fields, AgentMapError, NodeSpec};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "GraphName")]
    graph_name: String,
    #[serde(rename = "Node")]
    node: String,
    #[serde(rename = "AgentType")]
    agent_type: String,
    #[serde(rename = "Input_Fields", default)]
    input_fields: String,
    #[serde(rename = "Output_Field", default)]
    output_field: String,
    #[serde(rename = "Edge", default)]
    edge: String,
    #[serde(rename = "Success_Next", default)]
    success_next: String,
    #[serde(rename = "Failure_Next", default)]
    failure_next: String,
    #[serde(rename = "Prompt", default)]
    prompt: String,
    #[serde(rename = "Description", default)]
    #[allow(dead_code)]
    description: String,
    #[serde(rename = "Context", default)]
    context: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    #[error("read csv: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse csv row {0}: {1}")]
    Row(usize, csv::Error),
    #[error("row {0} ({1}/{2}): {3}")]
    Spec(usize, String, String, AgentMapError),
}

fn row_edges(row: &CsvRow) -> Result<EdgeMap, AgentMapError> {
    let mut entries = Vec::new();
    if !row.edge.trim().is_empty() {
        entries.push(("default".to_string(), row.edge.trim().to_string()));
    }
    if !row.success_next.trim().is_empty() {
        entries.push(("success".to_string(), row.success_next.trim().to_string()));
    }
    if !row.failure_next.trim().is_empty() {
        entries.push(("failure".to_string(), row.failure_next.trim().to_string()));
    }
    EdgeMap::from_labeled(entries)
}

fn row_to_spec(row: CsvRow) -> Result<NodeSpec, AgentMapError> {
    Ok(NodeSpec {
        name: row.node.clone(),
        agent_type: row.agent_type.clone(),
        prompt: row.prompt.clone(),
        context: parse_context(&row.context)?,
        input_fields: parse_input_fields(&row.input_fields)?,
        output_fields: parse_output_fields(&row.output_field),
        edges: row_edges(&row)?,
    })
}

/// Reads `path` and groups its rows by `GraphName`, preserving each graph's
/// row order (the Graph Assembly Engine's entry-point rule is "first node
/// in source order", spec.md §4.3).
pub fn load_csv(path: &Path) -> Result<BTreeMap<String, Vec<NodeSpec>>, CsvLoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut graphs: BTreeMap<String, Vec<NodeSpec>> = BTreeMap::new();

    for (idx, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(|e| CsvLoadError::Row(idx + 2, e))?;
        let graph_name = row.graph_name.clone();
        let node_name = row.node.clone();
        let spec = row_to_spec(row).map_err(|e| CsvLoadError::Spec(idx + 2, graph_name.clone(), node_name, e))?;
        graphs.entry(graph_name).or_default().push(spec);
    }

    Ok(graphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const HEADER: &str = "GraphName,Node,AgentType,Input_Fields,Output_Field,Edge,Success_Next,Failure_Next,Prompt,Description,Context\n";

    #[test]
    fn groups_rows_by_graph_name_preserving_order() {
        let csv = format!(
            "{HEADER}flow,A,Echo,msg,msg,B,,,,,{{}}\nflow,B,Default,msg,out,,,,,,{{}}\n"
        );
        let f = write_csv(&csv);
        let graphs = load_csv(f.path()).unwrap();
        assert_eq!(graphs.len(), 1);
        let nodes = &graphs["flow"];
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "A");
        assert_eq!(nodes[1].name, "B");
    }

    #[test]
    fn success_failure_columns_become_edge_labels() {
        let csv = format!("{HEADER}flow,A,Failure,,,,B,C,,,\nflow,B,Default,,,,,,,,\nflow,C,Default,,,,,,,,\n");
        let f = write_csv(&csv);
        let graphs = load_csv(f.path()).unwrap();
        let a = &graphs["flow"][0];
        assert!(a.edges.success.is_some());
        assert!(a.edges.failure.is_some());
    }

    #[test]
    fn malformed_context_json_surfaces_as_spec_error() {
        let csv = format!("{HEADER}flow,A,Echo,,,,,,,,{{not json\n");
        let f = write_csv(&csv);
        let result = load_csv(f.path());
        assert!(matches!(result, Err(CsvLoadError::Spec(_, _, _, _))));
    }

    #[test]
    fn multiple_graph_names_are_kept_separate() {
        let csv = format!("{HEADER}a,X,Echo,,,,,,,,\nb,Y,Echo,,,,,,,,\n");
        let f = write_csv(&csv);
        let graphs = load_csv(f.path()).unwrap();
        assert_eq!(graphs.len(), 2);
        assert!(graphs.contains_key("a"));
        assert!(graphs.contains_key("b"));
    }
}
