//! Projects source records into fixed-width positional rows.

use crate::metrics::{DerivedMetrics, FermentationInputs};
use crate::schema::{CollectionSchema, ColumnSource, MetricInputs, Transform};
use crate::types::{format_number, FieldValue, SourceRecord};
use chrono::NaiveDate;

/// Reads the metric inputs a schema declares from a record.
pub fn fermentation_inputs(record: &SourceRecord, inputs: &MetricInputs) -> FermentationInputs {
    FermentationInputs {
        original_extract: record
            .first_of(&inputs.original_extract)
            .and_then(FieldValue::as_f64),
        apparent_extract: record
            .first_of(&inputs.apparent_extract)
            .and_then(FieldValue::as_f64),
    }
}

/// Projects one record into a row of exactly `schema.width()` cells.
///
/// Metrics are computed only when the schema declares metric inputs.
pub fn project_record(record: &SourceRecord, schema: &CollectionSchema) -> Vec<String> {
    let metrics = schema
        .metric_inputs
        .as_ref()
        .map(|inputs| DerivedMetrics::compute(fermentation_inputs(record, inputs)))
        .unwrap_or_default();

    schema
        .columns
        .iter()
        .map(|column| match &column.source {
            ColumnSource::RecordId => record.id.clone(),
            ColumnSource::Field { keys, transform } => record
                .first_of(keys)
                .map(|value| apply_transform(value, *transform))
                .unwrap_or_default(),
            ColumnSource::Metric { metric } => metrics.render(*metric),
            ColumnSource::Blank => String::new(),
        })
        .collect()
}

fn apply_transform(value: &FieldValue, transform: Transform) -> String {
    match transform {
        Transform::Text => value.to_cell(),
        Transform::Number => value
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| value.to_cell()),
        Transform::Date => render_date(value),
    }
}

const DATE_INPUT_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

fn render_date(value: &FieldValue) -> String {
    match value {
        FieldValue::Timestamp(ts) => ts.date_naive().format("%Y-%m-%d").to_string(),
        FieldValue::Text(raw) => {
            let trimmed = raw.trim();
            if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(trimmed) {
                return ts.date_naive().format("%Y-%m-%d").to_string();
            }
            DATE_INPUT_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| raw.clone())
        }
        other => other.to_cell(),
    }
}

