//! End-to-End tests for the schema inference engine
//!
//! Tests the full lifecycle: coerce row -> propose columns -> update schema -> bump version
//! Every test drives the public `Schema` API only.

use std::str::FromStr;

use loam_protocol::coerce::parse_iso_timestamp;
use loam_schema::{
    ColumnSchema, DataType, Detection, Row, Schema, SchemaError, SchemaSettings, TableSchema,
    Value, VariantResolution, VariantSource, VariantValue, Wei, WriteDisposition,
};
use rust_decimal::Decimal;
use serde_json::json;

fn schema_with_preferred_types() -> Schema {
    let settings = SchemaSettings::default()
        .with_preferred_type("timestamp", DataType::Timestamp)
        .with_preferred_type("re:confidence", DataType::Double)
        .with_preferred_type("value", DataType::Wei)
        .with_preferred_type("re:^number$", DataType::Decimal);
    Schema::with_settings("event", settings).unwrap()
}

const UINT256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

fn row(fields: Vec<(&str, Value)>) -> Row {
    fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn new_columns(partial: &TableSchema) -> Vec<(&str, DataType)> {
    partial
        .columns
        .values()
        .map(|c| (c.name.as_str(), c.data_type))
        .collect()
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Double(f) => *f,
        other => panic!("expected a double, got {:?}", other),
    }
}

/// Reports a bigint but asks to be stored elsewhere when it carries a non-integer.
#[derive(Debug)]
struct PureVariant {
    base: i64,
    actual: Value,
}

impl VariantSource for PureVariant {
    fn base_value(&self) -> Value {
        Value::Bigint(self.base)
    }

    fn resolve(&self) -> VariantResolution {
        match self.actual {
            Value::Bigint(_) => VariantResolution::Identity,
            _ => VariantResolution::typed("text", self.actual.clone()),
        }
    }
}

/// Keeps halving itself into a nested variant until it reaches 1.
#[derive(Debug)]
struct RecursiveVariant(i64);

impl VariantSource for RecursiveVariant {
    fn base_value(&self) -> Value {
        Value::Bigint(self.0)
    }

    fn resolve(&self) -> VariantResolution {
        if self.0 == 1 {
            VariantResolution::Identity
        } else {
            VariantResolution::typed("div2", VariantValue::new(RecursiveVariant(self.0 / 2)))
        }
    }
}

/// A decimal that always wants to live in the `up` variant as wei.
#[derive(Debug)]
struct AlwaysWei(Decimal);

impl VariantSource for AlwaysWei {
    fn base_value(&self) -> Value {
        Value::Decimal(self.0)
    }

    fn resolve(&self) -> VariantResolution {
        match Wei::from_decimal(&self.0) {
            Some(wei) => VariantResolution::typed("up", wei),
            None => VariantResolution::Identity,
        }
    }
}

// =============================================================================
// PREFERRED TYPES AND COERCION
// =============================================================================

#[test]
fn test_get_preferred_type() {
    let schema = schema_with_preferred_types();
    assert_eq!(schema.get_preferred_type("timestamp"), Some(DataType::Timestamp));
    assert_eq!(schema.get_preferred_type("value"), Some(DataType::Wei));
    assert_eq!(schema.get_preferred_type("timestamp_confidence_entity"), Some(DataType::Double));
    assert_eq!(schema.get_preferred_type("number"), Some(DataType::Decimal));
    assert_eq!(schema.get_preferred_type("_timestamp"), None);
    assert_eq!(schema.get_preferred_type("numbers"), None);
}

#[test]
fn test_coerce_row_with_preferred_types_and_variants() {
    let mut schema = schema_with_preferred_types();
    let expected_ts = Value::Timestamp(parse_iso_timestamp("1970-01-01T21:42:52.128000+00:00").unwrap());

    // new columns follow preferred types, in row order
    let (coerced, partial) = schema
        .coerce_row(
            "event_user",
            None,
            row(vec![
                ("timestamp", Value::Double(78172.128)),
                ("confidence", Value::from("0.1")),
                ("value", Value::from("0xFF")),
                ("number", Value::Decimal(Decimal::from_str("128.67").unwrap())),
            ]),
        )
        .unwrap();
    let partial = partial.unwrap();
    assert_eq!(
        new_columns(&partial),
        vec![
            ("timestamp", DataType::Timestamp),
            ("confidence", DataType::Double),
            ("value", DataType::Wei),
            ("number", DataType::Decimal),
        ]
    );
    assert_eq!(coerced["timestamp"], expected_ts);
    assert_eq!(coerced["confidence"], Value::Double(0.1));
    assert_eq!(coerced["value"], Value::Wei(Wei::from_i64(255)));
    assert_eq!(coerced["number"], Value::Decimal(Decimal::from_str("128.67").unwrap()));
    schema.update_schema(&partial).unwrap();

    // values coerce into committed columns
    let (coerced, partial) = schema
        .coerce_row(
            "event_user",
            None,
            row(vec![("timestamp", Value::from("78172.128")), ("confidence", Value::Bigint(1))]),
        )
        .unwrap();
    assert!(partial.is_none());
    assert_eq!(coerced["timestamp"], expected_ts);
    assert_eq!(coerced["confidence"], Value::Double(1.0));

    // variant column is not checked against the preferred type of its name
    let str_row = row(vec![("timestamp", Value::from("78172.128")), ("confidence", Value::from("STR"))]);
    let (coerced, partial) = schema.coerce_row("event_user", None, str_row.clone()).unwrap();
    let partial = partial.unwrap();
    assert_eq!(new_columns(&partial), vec![("confidence__v_text", DataType::Text)]);
    assert!(partial.columns["confidence__v_text"].variant);
    assert_eq!(coerced.keys().collect::<Vec<_>>(), vec!["timestamp", "confidence__v_text"]);
    assert_eq!(coerced["confidence__v_text"], Value::from("STR"));
    schema.update_schema(&partial).unwrap();

    // same row again lands in the now committed variant
    let (coerced, partial) = schema.coerce_row("event_user", None, str_row).unwrap();
    assert!(partial.is_none());
    assert_eq!(coerced["confidence__v_text"], Value::from("STR"));

    // another variant of the same column
    let (coerced, partial) = schema
        .coerce_row("event_user", None, row(vec![("confidence", Value::Bool(false))]))
        .unwrap();
    assert_eq!(new_columns(&partial.unwrap()), vec![("confidence__v_bool", DataType::Bool)]);
    assert_eq!(coerced["confidence__v_bool"], Value::Bool(false));
}

#[test]
fn test_variant_clashes_with_occupied_sibling() {
    let mut schema = schema_with_preferred_types();
    let (_, partial) = schema
        .coerce_row(
            "event_user",
            None,
            row(vec![
                ("new_colbool", Value::Bool(false)),
                ("new_colbool__v_timestamp", Value::Binary(b"not fit".to_vec())),
            ]),
        )
        .unwrap();
    schema.update_schema(&partial.unwrap()).unwrap();

    let now = Value::Timestamp(chrono::Utc::now());
    let err = schema
        .coerce_row("event_user", None, row(vec![("new_colbool", now.clone())]))
        .unwrap_err();
    match err {
        SchemaError::CannotCoerceColumn {
            table,
            column,
            from_type,
            to_type,
            value,
        } => {
            assert_eq!(table, "event_user");
            assert_eq!(column, "new_colbool__v_timestamp");
            assert_eq!(from_type, DataType::Timestamp);
            assert_eq!(to_type, DataType::Binary);
            assert_eq!(value, Some(now));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_coerce_row_iso_timestamp() {
    let mut schema = schema_with_preferred_types();
    let (_, partial) = schema
        .coerce_row(
            "event_user",
            None,
            row(vec![("timestamp", Value::from("2022-05-10T00:17:15.300000+00:00"))]),
        )
        .unwrap();
    let partial = partial.unwrap();
    assert_eq!(new_columns(&partial), vec![("timestamp", DataType::Timestamp)]);
    schema.update_schema(&partial).unwrap();

    let (_, partial) = schema
        .coerce_row("event_user", None, row(vec![("timestamp", Value::Double(78172.128))]))
        .unwrap();
    assert!(partial.is_none());

    let (coerced, partial) = schema
        .coerce_row("event_user", None, row(vec![("timestamp", Value::from("übermorgen"))]))
        .unwrap();
    assert_eq!(
        new_columns(&partial.unwrap()),
        vec![("timestamp__v_text", DataType::Text)]
    );
    assert_eq!(coerced["timestamp__v_text"], Value::from("übermorgen"));
}

#[test]
fn test_coerce_complex_variant() {
    let mut schema = Schema::new("event").unwrap();
    let plain = row(vec![
        ("floatX", Value::Double(78172.128)),
        ("confidenceX", Value::Double(1.2)),
        ("strX", Value::from("STR")),
    ]);
    let (coerced, partial) = schema.coerce_row("event_user", None, plain.clone()).unwrap();
    assert_eq!(coerced, plain);
    schema.update_schema(&partial.unwrap()).unwrap();

    let v_list = json!([1, 2, "3", {"complex": true}]);
    let v_dict = json!({"list": [1, 2], "str": "complex"});
    let complex = row(vec![
        ("c_list", Value::from(v_list.clone())),
        ("c_dict", Value::from(v_dict.clone())),
    ]);
    let (coerced, partial) = schema.coerce_row("event_user", None, complex.clone()).unwrap();
    let partial = partial.unwrap();
    assert_eq!(
        new_columns(&partial),
        vec![("c_list", DataType::Complex), ("c_dict", DataType::Complex)]
    );
    assert_eq!(coerced["c_list"], Value::from(v_list.clone()));
    schema.update_schema(&partial).unwrap();

    let (coerced, partial) = schema.coerce_row("event_user", None, complex).unwrap();
    assert!(partial.is_none());
    assert_eq!(coerced["c_dict"], Value::from(v_dict.clone()));

    // complex into double columns forks variants, into text columns serializes
    let clashing = row(vec![
        ("floatX", Value::from(v_list.clone())),
        ("confidenceX", Value::from(v_dict.clone())),
        ("strX", Value::from(v_dict.clone())),
    ]);
    let (coerced, partial) = schema.coerce_row("event_user", None, clashing.clone()).unwrap();
    let partial = partial.unwrap();
    assert_eq!(
        new_columns(&partial),
        vec![
            ("floatX__v_complex", DataType::Complex),
            ("confidenceX__v_complex", DataType::Complex),
        ]
    );
    assert_eq!(coerced["floatX__v_complex"], Value::from(v_list.clone()));
    assert_eq!(coerced["confidenceX__v_complex"], Value::from(v_dict.clone()));
    assert_eq!(coerced["strX"], Value::Text(serde_json::to_string(&v_dict).unwrap()));
    schema.update_schema(&partial).unwrap();

    let (coerced, partial) = schema.coerce_row("event_user", None, clashing).unwrap();
    assert!(partial.is_none());
    assert_eq!(coerced["floatX__v_complex"], Value::from(v_list));
}

#[test]
fn test_scalars_coerce_into_text_column() {
    let mut schema = Schema::new("event").unwrap();
    schema
        .update_schema(&TableSchema::new("address").with_columns(vec![
            ColumnSchema::new("zip", DataType::Text),
            ColumnSchema::new("note", DataType::Text),
        ]))
        .unwrap();

    let (coerced, partial) = schema
        .coerce_row(
            "address",
            None,
            row(vec![("zip", Value::Bigint(2134)), ("note", Value::Double(21.37))]),
        )
        .unwrap();
    assert!(partial.is_none());
    assert_eq!(coerced["zip"], Value::from("2134"));
    assert_eq!(coerced["note"], Value::from("21.37"));

    // bool is the one scalar a text column does not take
    let (coerced, partial) = schema
        .coerce_row("address", None, row(vec![("zip", Value::Bool(true))]))
        .unwrap();
    assert_eq!(new_columns(&partial.unwrap()), vec![("zip__v_bool", DataType::Bool)]);
    assert_eq!(coerced["zip__v_bool"], Value::Bool(true));
}

// =============================================================================
// VARIANT CAPABLE VALUES
// =============================================================================

#[test]
fn test_wei_overflow_variant() {
    let mut schema = Schema::new("eth").unwrap();
    let evm = Wei::from_int256(
        Wei::parse("21370000000000000000").unwrap().mantissa().unwrap(),
        18,
    )
    .unwrap();
    assert_eq!(evm, Wei::parse("21.37").unwrap());

    let (coerced, partial) = schema.coerce_row("eth", None, row(vec![("evm", Value::Wei(evm))])).unwrap();
    assert_eq!(coerced["evm"], Value::Wei(evm));
    let partial = partial.unwrap();
    assert_eq!(new_columns(&partial), vec![("evm", DataType::Wei)]);
    schema.update_schema(&partial).unwrap();

    let max = UINT256_MAX;
    let (coerced, partial) = schema
        .coerce_row("eth", None, row(vec![("evm", Value::Wei(Wei::parse(max).unwrap()))]))
        .unwrap();
    assert_eq!(coerced["evm__v_str"], Value::from(max));
    assert_eq!(new_columns(&partial.unwrap()), vec![("evm__v_str", DataType::Text)]);
}

#[test]
fn test_uint256_max_under_preferred_wei() {
    let mut schema = schema_with_preferred_types();

    // text parses into the preferred type and keeps every digit
    let (coerced, partial) = schema
        .coerce_row("event_user", None, row(vec![("value", Value::from(UINT256_MAX))]))
        .unwrap();
    let partial = partial.unwrap();
    assert_eq!(new_columns(&partial), vec![("value", DataType::Wei)]);
    assert_eq!(coerced["value"].to_json(), json!(UINT256_MAX));

    // a wei that large asks for the text variant, before and after commit
    let max = Wei::parse(UINT256_MAX).unwrap();
    let fresh = Schema::with_settings("event", schema.settings().clone()).unwrap();
    let (coerced, fresh_partial) = fresh
        .coerce_row("event_user", None, row(vec![("value", Value::Wei(max))]))
        .unwrap();
    assert_eq!(new_columns(&fresh_partial.unwrap()), vec![("value__v_str", DataType::Text)]);
    assert_eq!(coerced["value__v_str"], Value::from(UINT256_MAX));

    schema.update_schema(&partial).unwrap();
    let (coerced, partial) = schema
        .coerce_row("event_user", None, row(vec![("value", Value::Wei(max))]))
        .unwrap();
    assert_eq!(new_columns(&partial.unwrap()), vec![("value__v_str", DataType::Text)]);
    assert_eq!(coerced["value__v_str"], Value::from(UINT256_MAX));
}

#[test]
fn test_recursive_variant() {
    let schema = Schema::new("event").unwrap();
    let (coerced, partial) = schema
        .coerce_row(
            "rec_variant",
            None,
            row(vec![("rv", Value::Variant(VariantValue::new(RecursiveVariant(8))))]),
        )
        .unwrap();
    let col_name = format!("rv{}", "__v_div2".repeat(3));
    assert_eq!(coerced[col_name.as_str()], Value::Bigint(1));
    assert_eq!(new_columns(&partial.unwrap()), vec![(col_name.as_str(), DataType::Bigint)]);
}

#[test]
fn test_variant_and_auto_variant_conflict() {
    let mut schema = Schema::new("event").unwrap();
    let int_row = row(vec![(
        "pv",
        Value::Variant(VariantValue::new(PureVariant {
            base: 3377,
            actual: Value::Bigint(3377),
        })),
    )]);
    let (coerced, partial) = schema.coerce_row("pure_variant", None, int_row).unwrap();
    assert_eq!(coerced["pv"], Value::Bigint(3377));
    let partial = partial.unwrap();
    assert_eq!(new_columns(&partial), vec![("pv", DataType::Bigint)]);
    schema.update_schema(&partial).unwrap();

    // the producer claims "text" but hands over a double
    let float_row = row(vec![(
        "pv",
        Value::Variant(VariantValue::new(PureVariant {
            base: 21,
            actual: Value::Double(21.37),
        })),
    )]);
    let (_, partial) = schema.coerce_row("pure_variant", None, float_row).unwrap();
    let partial = partial.unwrap();
    assert_eq!(new_columns(&partial), vec![("pv__v_text", DataType::Double)]);
    schema.update_schema(&partial).unwrap();

    // a real text now auto-variants into the occupied double sibling
    let err = schema
        .coerce_row("pure_variant", None, row(vec![("pv", Value::from("no double"))]))
        .unwrap_err();
    match err {
        SchemaError::CannotCoerceColumn {
            column,
            from_type,
            to_type,
            value,
            ..
        } => {
            assert_eq!(column, "pv__v_text");
            assert_eq!(from_type, DataType::Text);
            assert_eq!(to_type, DataType::Double);
            assert_eq!(value, Some(Value::from("no double")));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// =============================================================================
// NULLS AND DETECTION
// =============================================================================

#[test]
fn test_null_values() {
    let mut schema = Schema::new("event").unwrap();
    let (coerced, partial) = schema
        .coerce_row("event_user", None, row(vec![("timestamp", Value::Null)]))
        .unwrap();
    assert!(coerced.is_empty());
    assert!(partial.is_none());

    let table = TableSchema::new("event_user").with_columns(vec![
        ColumnSchema::new("nullable", DataType::Text),
        ColumnSchema::required("_loam_id", DataType::Text),
    ]);
    schema.update_schema(&table).unwrap();

    let (coerced, partial) = schema
        .coerce_row("event_user", None, row(vec![("nullable", Value::Null)]))
        .unwrap();
    assert!(coerced.is_empty());
    assert!(partial.is_none());

    let err = schema
        .coerce_row("event_user", None, row(vec![("_loam_id", Value::Null)]))
        .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::CannotCoerceNull { ref table, ref column }
            if table == "event_user" && column == "_loam_id"
    ));
}

#[test]
fn test_infer_with_autodetection() {
    let schema = Schema::new("event").unwrap();
    let now = chrono::Utc::now().timestamp() as f64;
    let (coerced, partial) = schema
        .coerce_row("event_user", None, row(vec![("ts", Value::Double(now))]))
        .unwrap();
    assert_eq!(new_columns(&partial.unwrap()), vec![("ts", DataType::Timestamp)]);
    assert!(matches!(coerced["ts"], Value::Timestamp(_)));

    let mut schema = Schema::new("event").unwrap();
    schema.set_detections(vec![]).unwrap();
    let (_, partial) = schema
        .coerce_row("event_user", None, row(vec![("ts", Value::Double(now))]))
        .unwrap();
    assert_eq!(new_columns(&partial.unwrap()), vec![("ts", DataType::Double)]);
}

#[test]
fn test_autodetect_convert_type() {
    let mut schema = Schema::new("eth").unwrap();
    let mut detections = schema.settings().detections.clone();
    detections.push(Detection::WeiToDouble);
    schema.set_detections(detections).unwrap();

    let (coerced, partial) = schema
        .coerce_row("eth", None, row(vec![("evm", Value::Wei(Wei::from_i64(1)))]))
        .unwrap();
    assert_eq!(coerced["evm"], Value::Double(1.0));
    let partial = partial.unwrap();
    assert_eq!(new_columns(&partial), vec![("evm", DataType::Double)]);
    schema.update_schema(&partial).unwrap();

    let (coerced, partial) = schema
        .coerce_row("eth", None, row(vec![("evm", Value::Wei(Wei::parse("21.37").unwrap()))]))
        .unwrap();
    assert!(partial.is_none());
    assert!((as_f64(&coerced["evm"]) - 21.37).abs() < 1e-9);

    // wei goes to the double column before any variant is considered
    let max = UINT256_MAX;
    let (coerced, partial) = schema
        .coerce_row("eth", None, row(vec![("evm", Value::Wei(Wei::parse(max).unwrap()))]))
        .unwrap();
    assert!(partial.is_none());
    assert!(as_f64(&coerced["evm"]) > 1.15e77);

    // variants resolve into the detected type too
    let always = |d: &str| {
        Value::Variant(VariantValue::new(AlwaysWei(Decimal::from_str(d).unwrap())))
    };
    let (coerced, partial) = schema
        .coerce_row("eth", None, row(vec![("evm2", always("22"))]))
        .unwrap();
    assert_eq!(coerced["evm2__v_up"], Value::Double(22.0));
    let partial = partial.unwrap();
    assert_eq!(new_columns(&partial), vec![("evm2__v_up", DataType::Double)]);
    schema.update_schema(&partial).unwrap();

    let (coerced, partial) = schema
        .coerce_row("eth", None, row(vec![("evm2", always("22.2"))]))
        .unwrap();
    assert!(partial.is_none());
    assert!((as_f64(&coerced["evm2__v_up"]) - 22.2).abs() < 1e-9);

    // once the base column exists with another type, the value just coerces into it
    let (_, partial) = schema
        .coerce_row("eth", None, row(vec![("evm2", Value::Double(22.1))]))
        .unwrap();
    let partial = partial.unwrap();
    assert_eq!(new_columns(&partial), vec![("evm2", DataType::Double)]);
    schema.update_schema(&partial).unwrap();

    let (coerced, partial) = schema
        .coerce_row("eth", None, row(vec![("evm2", always("22.2"))]))
        .unwrap();
    assert!(partial.is_none());
    assert!((as_f64(&coerced["evm2"]) - 22.2).abs() < 1e-9);
}

// =============================================================================
// SCHEMA UPDATES
// =============================================================================

#[test]
fn test_update_schema_parent_missing() {
    let mut schema = Schema::new("event").unwrap();
    let tab1 = TableSchema::new("tab1").with_parent("tab_parent");
    let err = schema.update_schema(&tab1).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::ParentTableNotFound { ref table, ref parent }
            if table == "tab1" && parent == "tab_parent"
    ));
    assert!(schema.tables().is_empty());

    schema.update_schema(&TableSchema::new("tab_parent")).unwrap();
    schema.update_schema(&tab1).unwrap();
    assert_eq!(
        schema.get_table("tab1").unwrap().parent.as_deref(),
        Some("tab_parent")
    );
}

#[test]
fn test_update_schema_table_prop_conflict() {
    let mut schema = Schema::new("event").unwrap();
    schema.update_schema(&TableSchema::new("tab_parent")).unwrap();
    schema.update_schema(&TableSchema::new("tab_other")).unwrap();
    schema
        .update_schema(
            &TableSchema::new("tab1")
                .with_parent("tab_parent")
                .with_write_disposition(WriteDisposition::Append),
        )
        .unwrap();

    let err = schema
        .update_schema(&TableSchema::new("tab1").with_parent("tab_other"))
        .unwrap_err();
    match err {
        SchemaError::TablePropertiesConflict { table, prop_name, val1, val2 } => {
            assert_eq!(table, "tab1");
            assert_eq!(prop_name, "parent");
            assert_eq!(val1.as_deref(), Some("tab_parent"));
            assert_eq!(val2.as_deref(), Some("tab_other"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = schema
        .update_schema(&TableSchema::new("tab1").with_write_disposition(WriteDisposition::Replace))
        .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::TablePropertiesConflict { ref prop_name, .. } if prop_name == "write_disposition"
    ));
}

#[test]
fn test_update_schema_column_conflict() {
    let mut schema = Schema::new("event").unwrap();
    schema
        .update_schema(
            &TableSchema::new("tab1").with_columns(vec![ColumnSchema::new("col1", DataType::Text)]),
        )
        .unwrap();

    let err = schema
        .update_schema(
            &TableSchema::new("tab1").with_columns(vec![ColumnSchema::new("col1", DataType::Bool)]),
        )
        .unwrap_err();
    match err {
        SchemaError::CannotCoerceColumn { table, column, from_type, to_type, value } => {
            assert_eq!(table, "tab1");
            assert_eq!(column, "col1");
            assert_eq!(from_type, DataType::Bool);
            assert_eq!(to_type, DataType::Text);
            assert!(value.is_none());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        schema.get_table_columns("tab1").unwrap()["col1"].data_type,
        DataType::Text
    );
}

// =============================================================================
// FULL LIFECYCLE
// =============================================================================

#[test]
fn test_lifecycle_versions_and_storage() {
    let mut schema = schema_with_preferred_types();
    assert_eq!(schema.version(), 0);

    let (_, partial) = schema
        .coerce_row(
            "event",
            None,
            row(vec![
                ("_loam_id", Value::from("a1")),
                ("_loam_root_id", Value::from("a1")),
                ("value", Value::from("1000")),
            ]),
        )
        .unwrap();
    let partial = partial.unwrap();
    let id = &partial.columns["_loam_id"];
    assert!(!id.nullable);
    assert!(id.unique);
    assert!(partial.columns["_loam_root_id"].root_key);

    let diff = schema.update_schema(&partial).unwrap();
    assert_eq!(diff.keys().collect::<Vec<_>>(), vec!["event"]);
    let (version, hash) = schema.bump_version().unwrap();
    assert_eq!(version, 1);

    // replaying the same partial changes nothing
    assert!(schema.update_schema(&partial).unwrap().is_empty());
    assert_eq!(schema.bump_version().unwrap(), (1, hash.clone()));

    // a child table referencing its parent
    let (_, child) = schema
        .coerce_row(
            "event__items",
            Some("event"),
            row(vec![("_loam_parent_id", Value::from("a1")), ("qty", Value::Bigint(2))]),
        )
        .unwrap();
    let child = child.unwrap();
    assert_eq!(child.parent.as_deref(), Some("event"));
    schema.update_schema(&child).unwrap();
    let (version, _) = schema.bump_version().unwrap();
    assert_eq!(version, 2);

    let restored = Schema::from_json(&schema.to_json().unwrap()).unwrap();
    assert_eq!(restored.version(), 2);
    assert_eq!(restored.to_stored(), schema.to_stored());
    assert_eq!(restored.get_preferred_type("value"), Some(DataType::Wei));
    let (coerced, partial) = restored
        .coerce_row("event", None, row(vec![("value", Value::from("0x10"))]))
        .unwrap();
    assert!(partial.is_none());
    assert_eq!(coerced["value"], Value::Wei(Wei::from_i64(16)));
}
