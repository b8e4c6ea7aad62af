//! Record batches and tables.
//!
//! A minimal columnar model: a [`Schema`] of named, typed fields, a
//! [`RecordBatch`] of equal-length columns matching a schema, and a
//! [`Table`] of batches sharing one schema. The host side sees both as
//! opaque objects wrapping an `Arc` handle.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use smol_str::SmolStr;
use tenbind_runtime::{HostObject, HostValue};

use crate::error::ColumnarError;

use super::{Columnar, PassThroughHooks};

/// Host type name and display tag of record batches
pub const RECORD_BATCH_TAG: &str = "pyarrow.RecordBatch";
/// Host type name and display tag of tables
pub const TABLE_TAG: &str = "pyarrow.Table";

/// Logical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int64,
    Float64,
    Boolean,
    Utf8,
}

impl DataType {
    /// Get the type name
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int64 => "int64",
            DataType::Float64 => "double",
            DataType::Boolean => "bool",
            DataType::Utf8 => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named, typed column slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: SmolStr,
    data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<SmolStr>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// Ordered fields of a batch or table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Position of the field called `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Values of one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnArray {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Boolean(Vec<bool>),
    Utf8(Vec<SmolStr>),
}

impl ColumnArray {
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnArray::Int64(_) => DataType::Int64,
            ColumnArray::Float64(_) => DataType::Float64,
            ColumnArray::Boolean(_) => DataType::Boolean,
            ColumnArray::Utf8(_) => DataType::Utf8,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnArray::Int64(values) => values.len(),
            ColumnArray::Float64(values) => values.len(),
            ColumnArray::Boolean(values) => values.len(),
            ColumnArray::Utf8(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Equal-length columns matching a schema
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    schema: Arc<Schema>,
    columns: Vec<ColumnArray>,
    num_rows: usize,
}

impl RecordBatch {
    /// Create a batch, checking the columns against `schema`
    pub fn try_new(schema: Arc<Schema>, columns: Vec<ColumnArray>) -> Result<Self, ColumnarError> {
        if columns.len() != schema.len() {
            return Err(ColumnarError::ColumnCount {
                expected: schema.len(),
                actual: columns.len(),
            });
        }

        let num_rows = columns.first().map_or(0, ColumnArray::len);
        for (field, column) in schema.fields().iter().zip(&columns) {
            if column.data_type() != field.data_type() {
                return Err(ColumnarError::ColumnType {
                    name: field.name.clone(),
                    expected: field.data_type().name(),
                    actual: column.data_type().name(),
                });
            }
            if column.len() != num_rows {
                return Err(ColumnarError::ColumnLength {
                    name: field.name.clone(),
                    expected: num_rows,
                    actual: column.len(),
                });
            }
        }

        Ok(Self {
            schema,
            columns,
            num_rows,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnArray] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&ColumnArray> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ColumnArray> {
        self.schema.index_of(name).and_then(|index| self.column(index))
    }
}

/// Batches sharing one schema
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Arc<Schema>,
    batches: Vec<Arc<RecordBatch>>,
}

impl Table {
    /// Create a table, checking every batch against `schema`
    pub fn try_new(
        schema: Arc<Schema>,
        batches: Vec<Arc<RecordBatch>>,
    ) -> Result<Self, ColumnarError> {
        if let Some(index) = batches.iter().position(|batch| batch.schema() != &schema) {
            return Err(ColumnarError::SchemaMismatch { index });
        }
        Ok(Self { schema, batches })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn batches(&self) -> &[Arc<RecordBatch>] {
        &self.batches
    }

    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|batch| batch.num_rows()).sum()
    }
}

// ============================================================================
// Host-side hooks
// ============================================================================

fn wrap<T: 'static>(tag: &str, handle: Arc<T>, rows: usize) -> HostValue {
    let object = HostObject::with_payload(tag, Rc::new(handle));
    object.set_attr("num_rows", HostValue::Int(rows as i64));
    HostValue::Object(object)
}

fn unwrap<T: 'static>(tag: &str, value: &HostValue) -> Option<Arc<T>> {
    value
        .as_object()
        .filter(|object| object.type_name() == tag)
        .and_then(|object| object.payload::<Arc<T>>())
        .cloned()
}

/// Check if `value` is a host record batch
pub fn is_record_batch(value: &HostValue) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.type_name() == RECORD_BATCH_TAG && object.has_payload::<Arc<RecordBatch>>())
}

/// Hand a record batch to the host
pub fn wrap_record_batch(batch: Arc<RecordBatch>) -> HostValue {
    let rows = batch.num_rows();
    let columns = batch.num_columns();
    let value = wrap(RECORD_BATCH_TAG, batch, rows);
    if let Some(object) = value.as_object() {
        object.set_attr("num_columns", HostValue::Int(columns as i64));
    }
    value
}

/// Take the record batch out of a host object
pub fn unwrap_record_batch(value: &HostValue) -> Option<Arc<RecordBatch>> {
    unwrap(RECORD_BATCH_TAG, value)
}

/// Check if `value` is a host table
pub fn is_table(value: &HostValue) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.type_name() == TABLE_TAG && object.has_payload::<Arc<Table>>())
}

/// Hand a table to the host
pub fn wrap_table(table: Arc<Table>) -> HostValue {
    let rows = table.num_rows();
    wrap(TABLE_TAG, table, rows)
}

/// Take the table out of a host object
pub fn unwrap_table(value: &HostValue) -> Option<Arc<Table>> {
    unwrap(TABLE_TAG, value)
}

impl Columnar for RecordBatch {
    const TAG: &'static str = RECORD_BATCH_TAG;

    fn hooks() -> PassThroughHooks<Self> {
        PassThroughHooks {
            check: is_record_batch,
            wrap: wrap_record_batch,
            unwrap: unwrap_record_batch,
        }
    }
}

impl Columnar for Table {
    const TAG: &'static str = TABLE_TAG;

    fn hooks() -> PassThroughHooks<Self> {
        PassThroughHooks {
            check: is_table,
            wrap: wrap_table,
            unwrap: unwrap_table,
        }
    }
}
