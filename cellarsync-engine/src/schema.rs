//! Per-collection destination layouts.
//!
//! A [`CollectionSchema`] is a declarative description of one destination
//! tab: the ordered columns, where each column's value comes from, and which
//! rows hold headers versus data. The built-in catalog covers the collections
//! the cellar currently logs; a JSON catalog with the same shape can replace it.

use crate::error::{SyncError, SyncResult};
use crate::metrics::DerivedMetric;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// How a source value is rendered into its cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Text,
    Number,
    Date,
}

/// Where a column's value comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSource {
    /// The document identifier. Exactly one column per schema.
    RecordId,
    /// A source field; the first present alias wins.
    Field {
        keys: Vec<String>,
        #[serde(default)]
        transform: Transform,
    },
    /// A computed fermentation metric.
    Metric { metric: DerivedMetric },
    /// Left empty for operators.
    Blank,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub header: String,
    pub source: ColumnSource,
}

impl ColumnSpec {
    pub fn id(header: &str) -> Self {
        Self {
            header: header.to_string(),
            source: ColumnSource::RecordId,
        }
    }

    pub fn field(header: &str, keys: &[&str], transform: Transform) -> Self {
        Self {
            header: header.to_string(),
            source: ColumnSource::Field {
                keys: keys.iter().map(|k| k.to_string()).collect(),
                transform,
            },
        }
    }

    pub fn text(header: &str, keys: &[&str]) -> Self {
        Self::field(header, keys, Transform::Text)
    }

    pub fn number(header: &str, keys: &[&str]) -> Self {
        Self::field(header, keys, Transform::Number)
    }

    pub fn date(header: &str, keys: &[&str]) -> Self {
        Self::field(header, keys, Transform::Date)
    }

    pub fn metric(header: &str, metric: DerivedMetric) -> Self {
        Self {
            header: header.to_string(),
            source: ColumnSource::Metric { metric },
        }
    }

    pub fn blank(header: &str) -> Self {
        Self {
            header: header.to_string(),
            source: ColumnSource::Blank,
        }
    }
}

/// Source fields feeding the derived-metric calculator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricInputs {
    pub original_extract: Vec<String>,
    pub apparent_extract: Vec<String>,
}

/// Layout of one collection's destination tab.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Source collection name in the document store.
    pub collection: String,
    /// Destination tab title.
    pub tab: String,
    pub columns: Vec<ColumnSpec>,
    /// 1-based row where data starts. Rows above it are never scanned.
    pub data_start_row: usize,
    /// 1-based row holding the column labels, if the tab has one.
    #[serde(default)]
    pub header_row: Option<usize>,
    #[serde(default)]
    pub metric_inputs: Option<MetricInputs>,
}

impl CollectionSchema {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// 0-based index of the identifier column.
    pub fn id_column(&self) -> SyncResult<usize> {
        let mut ids = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.source == ColumnSource::RecordId)
            .map(|(i, _)| i);
        match (ids.next(), ids.next()) {
            (Some(i), None) => Ok(i),
            (None, _) => Err(SyncError::SchemaMismatch(format!(
                "{}: no identifier column",
                self.collection
            ))),
            (Some(_), Some(_)) => Err(SyncError::SchemaMismatch(format!(
                "{}: more than one identifier column",
                self.collection
            ))),
        }
    }

    pub fn needs_metrics(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.source, ColumnSource::Metric { .. }))
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.clone()).collect()
    }

    pub fn validate(&self) -> SyncResult<()> {
        self.id_column()?;
        if self.data_start_row == 0 {
            return Err(SyncError::SchemaMismatch(format!(
                "{}: data_start_row is 1-based",
                self.collection
            )));
        }
        if let Some(header_row) = self.header_row {
            if header_row == 0 || header_row >= self.data_start_row {
                return Err(SyncError::SchemaMismatch(format!(
                    "{}: header row {header_row} must precede data row {}",
                    self.collection, self.data_start_row
                )));
            }
        }
        if self.needs_metrics() && self.metric_inputs.is_none() {
            return Err(SyncError::SchemaMismatch(format!(
                "{}: metric columns without metric inputs",
                self.collection
            )));
        }
        Ok(())
    }
}

/// Validates a whole catalog, including collection name uniqueness.
pub fn validate_catalog(schemas: &[CollectionSchema]) -> SyncResult<()> {
    let mut seen = HashSet::new();
    for schema in schemas {
        schema.validate()?;
        if !seen.insert(schema.collection.as_str()) {
            return Err(SyncError::SchemaMismatch(format!(
                "duplicate collection {}",
                schema.collection
            )));
        }
    }
    Ok(())
}

/// Loads and validates a JSON catalog.
pub fn load_catalog(path: &Path) -> SyncResult<Vec<CollectionSchema>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SyncError::SchemaMismatch(format!("cannot read {}: {e}", path.display()))
    })?;
    let schemas: Vec<CollectionSchema> = serde_json::from_str(&raw)?;
    validate_catalog(&schemas)?;
    Ok(schemas)
}

/// The collections synced by default.
pub fn builtin_catalog() -> Vec<CollectionSchema> {
    vec![products(), fermentation_logs(), packaging_runs()]
}

fn products() -> CollectionSchema {
    CollectionSchema {
        collection: "productos".into(),
        tab: "Productos".into(),
        columns: vec![
            ColumnSpec::id("ID"),
            ColumnSpec::text("Nombre", &["nombre"]),
            ColumnSpec::number("Precio", &["precio"]),
            ColumnSpec::number("Stock", &["stock"]),
            ColumnSpec::text("Categoría", &["categoria", "categoría"]),
        ],
        data_start_row: 2,
        header_row: Some(1),
        metric_inputs: None,
    }
}

fn fermentation_logs() -> CollectionSchema {
    CollectionSchema {
        collection: "fermentaciones".into(),
        tab: "Fermentaciones".into(),
        columns: vec![
            ColumnSpec::date("Fecha", &["fecha", "Fecha"]),
            ColumnSpec::text("Lote", &["lote", "Lote"]),
            ColumnSpec::text("Tanque", &["tanque", "Tanque"]),
            ColumnSpec::text("Estilo", &["estilo", "Estilo"]),
            ColumnSpec::number("Extracto original", &["extracto_original", "Extracto original"]),
            ColumnSpec::number("Extracto aparente", &["extracto_aparente", "Extracto aparente"]),
            ColumnSpec::number("Temperatura", &["temperatura", "Temperatura"]),
            ColumnSpec::number("pH", &["ph", "pH"]),
            ColumnSpec::metric("Peso específico", DerivedMetric::SpecificWeight),
            ColumnSpec::metric("Atenuación real %", DerivedMetric::RealAttenuation),
            ColumnSpec::metric("Alcohol p/p", DerivedMetric::AlcoholByWeight),
            ColumnSpec::metric("Alcohol v/v", DerivedMetric::AlcoholByVolume),
            ColumnSpec::metric("Extracto real", DerivedMetric::RealExtract),
            ColumnSpec::id(""),
        ],
        data_start_row: 6,
        header_row: Some(5),
        metric_inputs: Some(MetricInputs {
            original_extract: vec!["extracto_original".into(), "Extracto original".into()],
            apparent_extract: vec!["extracto_aparente".into(), "Extracto aparente".into()],
        }),
    }
}

fn packaging_runs() -> CollectionSchema {
    CollectionSchema {
        collection: "envasados".into(),
        tab: "Envasado".into(),
        columns: vec![
            ColumnSpec::date("Fecha", &["fecha", "Fecha"]),
            ColumnSpec::text("Lote", &["lote", "Lote"]),
            ColumnSpec::text("Formato", &["formato", "Formato"]),
            ColumnSpec::number("Unidades", &["unidades", "Unidades"]),
            ColumnSpec::text("Responsable", &["responsable", "Responsable"]),
            ColumnSpec::text("Observaciones", &["observaciones", "Observaciones"]),
            ColumnSpec::id(""),
        ],
        data_start_row: 3,
        header_row: Some(2),
        metric_inputs: None,
    }
}
