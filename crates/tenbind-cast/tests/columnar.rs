//! Integration tests for columnar pass-through

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tenbind_cast::columnar::batch::{is_table, RECORD_BATCH_TAG, TABLE_TAG};
use tenbind_cast::columnar::{ColumnArray, DataType, Field, Schema};
use tenbind_cast::*;
use tenbind_runtime::{HostValue, NdArray};
use tenbind_tensor::Rejection;

fn trades() -> Arc<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("symbol", DataType::Utf8),
        Field::new("qty", DataType::Int64),
        Field::new("px", DataType::Float64),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            ColumnArray::Utf8(vec!["ABC".into(), "XYZ".into()]),
            ColumnArray::Int64(vec![100, -40]),
            ColumnArray::Float64(vec![10.5, 99.25]),
        ],
    )
    .unwrap();
    Arc::new(batch)
}

#[test]
fn test_batch_crosses_as_one_handle() {
    let registry = ColumnarRegistry::with_defaults();
    let converter = Converter::new(CastConfig::new());
    let batch = trades();

    let caster = PassThroughCaster::<RecordBatch>::new(&registry).unwrap();
    let host = converter.export_columnar(&caster, Arc::clone(&batch));
    assert_eq!(host.type_name(), RECORD_BATCH_TAG);
    assert_eq!(Arc::strong_count(&batch), 2);

    let back: Arc<RecordBatch> = converter.load_columnar(&registry, &host).unwrap();
    assert!(Arc::ptr_eq(&back, &batch));
    assert_eq!(back.column_by_name("qty"), Some(&ColumnArray::Int64(vec![100, -40])));

    drop(host);
    assert_eq!(Arc::strong_count(&batch), 2);
}

#[test]
fn test_table_pass_through() {
    let registry = ColumnarRegistry::with_defaults();
    let batch = trades();
    let table = Arc::new(Table::try_new(Arc::clone(batch.schema()), vec![batch; 3]).unwrap());

    let caster = PassThroughCaster::<Table>::new(&registry).unwrap();
    assert_eq!(caster.name(), TABLE_TAG);

    let host = caster.to_host(&table);
    assert!(is_table(&host));

    let mut caster = PassThroughCaster::<Table>::new(&registry).unwrap();
    caster.load(&host).unwrap();
    let back = caster.into_value().unwrap();
    assert_eq!(back.num_rows(), 6);
    assert!(Arc::ptr_eq(&back, &table));
}

#[test]
fn test_wrong_host_values_are_rejected() {
    let registry = ColumnarRegistry::with_defaults();
    let converter = Converter::new(CastConfig::new());

    let tables = PassThroughCaster::<Table>::new(&registry).unwrap();
    let table_host = converter.export_columnar(
        &tables,
        Arc::new(Table::try_new(Arc::new(Schema::default()), Vec::new()).unwrap()),
    );
    let array_host = HostValue::Array(NdArray::from_vec(vec![1i64, 2], &[2]).unwrap());

    for (value, actual) in [(table_host, "pyarrow.Table"), (array_host, "numpy.ndarray")] {
        let err = converter
            .load_columnar::<RecordBatch>(&registry, &value)
            .unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&Rejection::NotColumnar {
                expected: RECORD_BATCH_TAG.into(),
                actual: actual.into(),
            })
        );
    }
}

#[test]
fn test_unregistered_record_type() {
    let registry = ColumnarRegistry::new();
    let converter = Converter::default();

    let err = PassThroughCaster::<RecordBatch>::new(&registry).unwrap_err();
    assert!(matches!(err, ColumnarError::Unregistered { .. }));

    let host = PassThroughCaster::<RecordBatch>::new(&ColumnarRegistry::with_defaults())
        .unwrap()
        .into_host(trades());
    let err = converter
        .load_columnar::<RecordBatch>(&registry, &host)
        .unwrap_err();
    assert!(matches!(
        err,
        CastError::Columnar(ColumnarError::Unregistered { .. })
    ));
}
