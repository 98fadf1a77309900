//! Decodes fetched rows into typed Arrow arrays and assembles the final
//! table.

use std::collections::BTreeSet;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanBuilder, Date32Builder, Float64Builder, Int64Builder, StringBuilder,
    StringDictionaryBuilder, TimestampNanosecondBuilder,
};
use arrow::compute::{concat, concat_batches};
use arrow::datatypes::Int32Type;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use chrono::NaiveDate;
use sqf_common::{Column, LogicalType, Result, SqfError};

use crate::driver::{Cell, Row};

/// The typed in-memory result of one read (or one worker's slice of it).
///
/// Column order matches the projected output order. Every array has the same
/// length; the index array, when present, matches that length. Arrays are
/// materialized in nullable representation regardless of the declared source
/// nullability, so backend NULLs always decode losslessly.
#[derive(Debug, Clone)]
pub struct TableMaterialization {
    pub columns: RecordBatch,
    pub index: Option<ArrayRef>,
}

impl TableMaterialization {
    pub fn num_rows(&self) -> usize {
        self.columns.num_rows()
    }

    /// Concatenates per-worker slices, in rank order, into one table.
    ///
    /// Cross-process transport of the slices is the caller's concern; this
    /// only performs the in-memory assembly.
    pub fn concat(parts: &[TableMaterialization]) -> Result<TableMaterialization> {
        let first = parts.first().ok_or_else(|| {
            SqfError::Execution("cannot assemble a table from zero partitions".to_string())
        })?;
        let schema = first.columns.schema();

        let columns = if schema.fields().is_empty() {
            let rows = parts.iter().map(|p| p.columns.num_rows()).sum();
            empty_batch(schema, rows)?
        } else {
            let batches: Vec<RecordBatch> = parts.iter().map(|p| p.columns.clone()).collect();
            concat_batches(&schema, &batches)
                .map_err(|e| SqfError::Execution(format!("partition concat failed: {e}")))?
        };

        let index = match &first.index {
            Some(_) => {
                let arrays = parts
                    .iter()
                    .map(|p| {
                        p.index.as_deref().ok_or_else(|| {
                            SqfError::Execution(
                                "index array missing from one partition slice".to_string(),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let merged = concat(&arrays)
                    .map_err(|e| SqfError::Execution(format!("index concat failed: {e}")))?;
                if merged.len() != columns.num_rows() {
                    return Err(SqfError::Execution(format!(
                        "index length {} does not match table length {}",
                        merged.len(),
                        columns.num_rows()
                    )));
                }
                Some(merged)
            }
            None => None,
        };

        Ok(TableMaterialization { columns, index })
    }
}

/// Decodes `rows` into arrays declared by `output_columns`, splitting the
/// index column (when named) out of the data columns.
///
/// `keep_index_in_columns` retains the index column as a data column as well,
/// for the case where the caller requested it in the output alongside using
/// it as the index.
pub fn materialize(
    rows: &[Row],
    output_columns: &[Column],
    dictionary_candidates: &BTreeSet<String>,
    index_column: Option<&str>,
    keep_index_in_columns: bool,
) -> Result<TableMaterialization> {
    let mut builders: Vec<CellBuilder> = output_columns
        .iter()
        .map(|c| CellBuilder::for_column(c, dictionary_candidates))
        .collect::<Result<Vec<_>>>()?;

    for row in rows {
        if row.len() != output_columns.len() {
            return Err(SqfError::Execution(format!(
                "backend returned {} values per row, expected {}",
                row.len(),
                output_columns.len()
            )));
        }
        for (builder, (cell, column)) in builders
            .iter_mut()
            .zip(row.iter().zip(output_columns.iter()))
        {
            builder.append(cell.as_ref(), column)?;
        }
    }

    let mut index = None;
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for (builder, column) in builders.into_iter().zip(output_columns.iter()) {
        let data_type = builder.data_type();
        let array = builder.finish();
        let is_index = index_column == Some(column.name.as_str());
        if is_index {
            index = Some(array.clone());
        }
        if !is_index || keep_index_in_columns {
            fields.push(Field::new(column.name.clone(), data_type, true));
            arrays.push(array);
        }
    }

    let schema = Arc::new(Schema::new(fields));
    let columns = if arrays.is_empty() {
        empty_batch(schema, rows.len())?
    } else {
        RecordBatch::try_new(schema, arrays)
            .map_err(|e| SqfError::Execution(format!("table assembly failed: {e}")))?
    };
    Ok(TableMaterialization { columns, index })
}

fn empty_batch(schema: Arc<Schema>, rows: usize) -> Result<RecordBatch> {
    RecordBatch::try_new_with_options(
        schema,
        vec![],
        &RecordBatchOptions::new().with_row_count(Some(rows)),
    )
    .map_err(|e| SqfError::Execution(format!("table assembly failed: {e}")))
}

enum CellBuilder {
    Int64(Int64Builder),
    Float64(Float64Builder),
    Boolean(BooleanBuilder),
    Utf8(StringBuilder),
    DictUtf8(StringDictionaryBuilder<Int32Type>),
    Date(Date32Builder),
    Timestamp(TimestampNanosecondBuilder),
}

impl CellBuilder {
    fn for_column(column: &Column, dictionary_candidates: &BTreeSet<String>) -> Result<Self> {
        Ok(match column.logical_type {
            LogicalType::Int64 => CellBuilder::Int64(Int64Builder::new()),
            LogicalType::Float64 => CellBuilder::Float64(Float64Builder::new()),
            LogicalType::Boolean => CellBuilder::Boolean(BooleanBuilder::new()),
            LogicalType::Utf8 => {
                if dictionary_candidates.contains(&column.name) {
                    CellBuilder::DictUtf8(StringDictionaryBuilder::new())
                } else {
                    CellBuilder::Utf8(StringBuilder::new())
                }
            }
            LogicalType::DictionaryUtf8 => CellBuilder::DictUtf8(StringDictionaryBuilder::new()),
            LogicalType::Date => CellBuilder::Date(Date32Builder::new()),
            LogicalType::Timestamp => CellBuilder::Timestamp(TimestampNanosecondBuilder::new()),
            other => {
                return Err(SqfError::Execution(format!(
                    "column '{}' with type {} reached materialization",
                    column.name,
                    other.type_name()
                )))
            }
        })
    }

    fn data_type(&self) -> DataType {
        match self {
            CellBuilder::Int64(_) => DataType::Int64,
            CellBuilder::Float64(_) => DataType::Float64,
            CellBuilder::Boolean(_) => DataType::Boolean,
            CellBuilder::Utf8(_) => DataType::Utf8,
            CellBuilder::DictUtf8(_) => {
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
            }
            CellBuilder::Date(_) => DataType::Date32,
            CellBuilder::Timestamp(_) => DataType::Timestamp(TimeUnit::Nanosecond, None),
        }
    }

    fn append(&mut self, cell: Option<&Cell>, column: &Column) -> Result<()> {
        let Some(cell) = cell else {
            // Backend NULL, coerced into the nullable representation.
            match self {
                CellBuilder::Int64(b) => b.append_null(),
                CellBuilder::Float64(b) => b.append_null(),
                CellBuilder::Boolean(b) => b.append_null(),
                CellBuilder::Utf8(b) => b.append_null(),
                CellBuilder::DictUtf8(b) => b.append_null(),
                CellBuilder::Date(b) => b.append_null(),
                CellBuilder::Timestamp(b) => b.append_null(),
            }
            return Ok(());
        };
        match (self, cell) {
            (CellBuilder::Int64(b), Cell::Int(v)) => b.append_value(*v),
            (CellBuilder::Float64(b), Cell::Float(v)) => b.append_value(*v),
            // Integer-valued cells widen into a declared Float64 column.
            (CellBuilder::Float64(b), Cell::Int(v)) => b.append_value(*v as f64),
            (CellBuilder::Boolean(b), Cell::Bool(v)) => b.append_value(*v),
            (CellBuilder::Utf8(b), Cell::Str(v)) => b.append_value(v),
            (CellBuilder::DictUtf8(b), Cell::Str(v)) => {
                b.append(v).map_err(|e| {
                    SqfError::Execution(format!(
                        "dictionary append failed for column '{}': {e}",
                        column.name
                    ))
                })?;
            }
            (CellBuilder::Date(b), Cell::Date(v)) => {
                let days = v.signed_duration_since(NaiveDate::default()).num_days();
                let days = i32::try_from(days).map_err(|_| {
                    SqfError::Execution(format!(
                        "date out of range in column '{}': {v}",
                        column.name
                    ))
                })?;
                b.append_value(days);
            }
            (CellBuilder::Timestamp(b), Cell::Timestamp(v)) => {
                let nanos = v.and_utc().timestamp_nanos_opt().ok_or_else(|| {
                    SqfError::Execution(format!(
                        "timestamp out of range in column '{}': {v}",
                        column.name
                    ))
                })?;
                b.append_value(nanos);
            }
            (builder, other) => {
                return Err(SqfError::Execution(format!(
                    "column '{}' declared {:?} but backend returned a {} value",
                    column.name,
                    builder.data_type(),
                    cell_kind(other)
                )));
            }
        }
        Ok(())
    }

    fn finish(self) -> ArrayRef {
        match self {
            CellBuilder::Int64(mut b) => Arc::new(b.finish()),
            CellBuilder::Float64(mut b) => Arc::new(b.finish()),
            CellBuilder::Boolean(mut b) => Arc::new(b.finish()),
            CellBuilder::Utf8(mut b) => Arc::new(b.finish()),
            CellBuilder::DictUtf8(mut b) => Arc::new(b.finish()),
            CellBuilder::Date(mut b) => Arc::new(b.finish()),
            CellBuilder::Timestamp(mut b) => Arc::new(b.finish()),
        }
    }
}

fn cell_kind(cell: &Cell) -> &'static str {
    match cell {
        Cell::Int(_) => "integer",
        Cell::Float(_) => "float",
        Cell::Bool(_) => "boolean",
        Cell::Str(_) => "string",
        Cell::Date(_) => "date",
        Cell::Timestamp(_) => "timestamp",
    }
}
