//! nbformat 4 document layer.
//!
//! Reads `.ipynb` JSON into cells and writes cells back out. Only the fields
//! the snapshot model carries are read; everything else in a cell is dropped.

use crate::cell::CellEntry;
use nbtrace_core::{CellId, CellType, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// nbformat major version written when a document does not record one
pub const DEFAULT_NBFORMAT: u32 = 4;

const fn default_nbformat() -> u32 {
    DEFAULT_NBFORMAT
}

/// Document-level fields carried through a reconstruction unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentWrapper {
    /// Notebook metadata (kernel spec, language info, ...)
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// nbformat major version
    #[serde(default = "default_nbformat")]
    pub nbformat: u32,
    /// nbformat minor version
    #[serde(default)]
    pub nbformat_minor: u32,
}

impl Default for DocumentWrapper {
    fn default() -> Self {
        Self {
            metadata: Map::new(),
            nbformat: DEFAULT_NBFORMAT,
            nbformat_minor: 0,
        }
    }
}

#[derive(Deserialize)]
struct RawNotebook {
    cells: Vec<RawCell>,
    #[serde(flatten)]
    wrapper: DocumentWrapper,
}

#[derive(Deserialize)]
struct RawCell {
    cell_type: String,
    source: RawSource,
    #[serde(default)]
    execution_count: Option<u64>,
    #[serde(default)]
    outputs: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
}

/// nbformat allows source as either a list of lines or one string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSource {
    Lines(Vec<String>),
    Text(String),
}

impl RawSource {
    fn into_lines(self) -> Vec<String> {
        match self {
            Self::Lines(lines) => lines,
            Self::Text(text) => text.split_inclusive('\n').map(str::to_string).collect(),
        }
    }
}

/// Parse a notebook document into its wrapper and cells.
///
/// # Errors
///
/// Returns `ParseError` for malformed JSON or a document without `cells`
pub fn read_document(json: &str) -> CoreResult<(DocumentWrapper, Vec<CellEntry>)> {
    let raw: RawNotebook = serde_json::from_str(json)?;
    let cells = raw
        .cells
        .into_iter()
        .enumerate()
        .map(|(position, cell)| CellEntry {
            cell_type: CellType::parse(&cell.cell_type),
            cell_id: CellId::new(position),
            source: cell.source.into_lines(),
            execution_count: cell.execution_count,
            outputs: cell.outputs,
            metadata: cell.metadata,
            document_id: cell.id,
        })
        .collect();
    Ok((raw.wrapper, cells))
}

/// Build the JSON document for a set of cells.
///
/// Code cells lose their outputs and metadata, markdown and raw cells lose
/// their metadata.
///
/// # Errors
///
/// Returns `Validation` if a cell has a type nbformat does not define
pub fn write_document(wrapper: &DocumentWrapper, cells: &[CellEntry]) -> CoreResult<Value> {
    let cells = cells.iter().map(emit_cell).collect::<CoreResult<Vec<_>>>()?;

    let mut doc = Map::new();
    doc.insert("cells".to_string(), Value::Array(cells));
    doc.insert("metadata".to_string(), Value::Object(wrapper.metadata.clone()));
    doc.insert("nbformat".to_string(), Value::from(wrapper.nbformat));
    doc.insert("nbformat_minor".to_string(), Value::from(wrapper.nbformat_minor));
    Ok(Value::Object(doc))
}

fn emit_cell(cell: &CellEntry) -> CoreResult<Value> {
    if let CellType::Other(kind) = &cell.cell_type {
        return Err(CoreError::Validation {
            field: "cell_type".to_string(),
            reason: format!("cannot write {} with unsupported type {kind:?}", cell.cell_id),
        });
    }

    let mut out = Map::new();
    out.insert("cell_type".to_string(), Value::from(cell.cell_type.as_str()));
    if let Some(id) = &cell.document_id {
        out.insert("id".to_string(), id.clone());
    }
    out.insert("metadata".to_string(), Value::Object(Map::new()));
    out.insert("source".to_string(), Value::from(emit_source(&cell.source)));
    if cell.cell_type.is_code() {
        out.insert(
            "execution_count".to_string(),
            cell.execution_count.map_or(Value::Null, Value::from),
        );
        out.insert("outputs".to_string(), Value::Array(Vec::new()));
    }
    Ok(Value::Object(out))
}

/// Every line but the last is terminated by a newline
fn emit_source(lines: &[String]) -> Vec<String> {
    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i < last && !line.ends_with('\n') {
                format!("{line}\n")
            } else {
                line.clone()
            }
        })
        .collect()
}
