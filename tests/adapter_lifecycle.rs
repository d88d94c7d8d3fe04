//! End-to-end adapter tests
//!
//! Exercises the public API of `ndb_adapter` the way a caller would: build
//! table metadata, construct operations, prepare them in a native
//! transaction, execute the batch and read back the results.
//!
//! ## Running These Tests
//!
//! ```bash
//! cargo test --test adapter_lifecycle
//! ```

use ndb_adapter::testing::MemoryEngine;
use ndb_adapter::{
    default_for_type, AdapterConfig, CodecError, ColumnMetadata, EncoderRegistry, LockMode,
    NativeTypeId, Operation, OperationFactory, Row, TableMetadata, TransactionId, TypeEncoder,
    Value,
};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn accounts() -> TableMetadata {
    TableMetadata::new(
        "accounts",
        vec![
            ColumnMetadata::new("id", NativeTypeId::Bigunsigned, 0).not_null(),
            ColumnMetadata::new("owner", NativeTypeId::Varchar, 32),
            ColumnMetadata::new("balance", NativeTypeId::Double, 0),
            ColumnMetadata::new("flags", NativeTypeId::Tinyunsigned, 0),
        ],
    )
}

fn account(id: u64, owner: &str, balance: f64) -> Row {
    Row::new()
        .with("id", id)
        .with("owner", owner)
        .with("balance", balance)
}

fn key(id: u64) -> Row {
    Row::new().with("id", id)
}

/// Varchar encoder that stores text upper-cased
struct UpperVarchar {
    inner: Box<dyn TypeEncoder>,
}

impl TypeEncoder for UpperVarchar {
    fn read(
        &self,
        column: &ColumnMetadata,
        buffer: &[u8],
        offset: usize,
    ) -> Result<Value, CodecError> {
        self.inner.read(column, buffer, offset)
    }

    fn write(
        &self,
        column: &ColumnMetadata,
        value: &Value,
        buffer: &mut [u8],
        offset: usize,
    ) -> Result<(), CodecError> {
        let value = match value {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other.clone(),
        };
        self.inner.write(column, &value, buffer, offset)
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn insert_then_read_in_separate_batches() {
    let registry = EncoderRegistry::with_defaults();
    let table = accounts();
    let primary = table.index("PRIMARY", &["id"]).unwrap();
    let factory = OperationFactory::new(&registry);
    let mut engine = MemoryEngine::new(&registry, &table, &["id"]).unwrap();

    let mut inserts = vec![
        factory
            .new_insert_operation(TransactionId(1), &table, account(10, "ann", 12.5))
            .unwrap(),
        factory
            .new_insert_operation(TransactionId(1), &table, account(11, "bob", 0.0))
            .unwrap(),
    ];
    let mut tx = engine.begin();
    for op in inserts.iter_mut() {
        op.prepare(&mut tx).unwrap();
    }
    engine.execute(tx, &mut inserts).unwrap();
    let summary = factory.complete_executed_ops(&mut inserts).unwrap();
    assert_eq!(summary.succeeded, 2);

    let mut reads = vec![
        factory
            .new_read_operation(TransactionId(2), &primary, key(11), LockMode::Shared)
            .unwrap(),
        factory
            .new_read_operation(TransactionId(2), &primary, key(10), LockMode::Shared)
            .unwrap(),
    ];
    let mut tx = engine.begin();
    for op in reads.iter_mut() {
        op.prepare(&mut tx).unwrap();
    }
    engine.execute(tx, &mut reads).unwrap();
    factory.complete_executed_ops(&mut reads).unwrap();

    let bob = reads[0].result().value.as_ref().unwrap();
    assert_eq!(bob.get("owner"), Some(&Value::String("bob".into())));
    // zero is a value, not a null
    assert_eq!(bob.get("balance"), Some(&Value::Double(0.0)));
    assert_eq!(bob.get("flags"), Some(&Value::Null));

    let ann = reads[1].result().value.as_ref().unwrap();
    assert_eq!(ann.get("id"), Some(&Value::UInt(10)));
    assert_eq!(ann.get("balance"), Some(&Value::Double(12.5)));
}

#[test]
fn injected_encoder_is_used_for_its_type() {
    let mut registry = EncoderRegistry::with_defaults();
    registry.register(
        NativeTypeId::Varchar,
        Arc::new(UpperVarchar {
            inner: default_for_type(NativeTypeId::Varchar),
        }),
    );
    let table = accounts();
    let primary = table.index("PRIMARY", &["id"]).unwrap();
    let factory = OperationFactory::new(&registry);
    let mut engine = MemoryEngine::new(&registry, &table, &["id"]).unwrap();

    let mut ops = vec![factory
        .new_insert_operation(TransactionId(1), &table, account(1, "carol", 3.0))
        .unwrap()];
    let mut tx = engine.begin();
    ops[0].prepare(&mut tx).unwrap();
    engine.execute(tx, &mut ops).unwrap();
    factory.complete_executed_ops(&mut ops).unwrap();

    let mut ops = vec![factory
        .new_read_operation(TransactionId(2), &primary, key(1), LockMode::Committed)
        .unwrap()];
    let mut tx = engine.begin();
    ops[0].prepare(&mut tx).unwrap();
    engine.execute(tx, &mut ops).unwrap();
    factory.complete_executed_ops(&mut ops).unwrap();

    let row = ops[0].result().value.as_ref().unwrap();
    assert_eq!(row.get("owner"), Some(&Value::String("CAROL".into())));
}

#[test]
fn config_controls_reconcile_strictness() {
    let registry = EncoderRegistry::with_defaults();
    let table = accounts();
    let config = AdapterConfig::from_toml_str("strict_reconcile = true").unwrap();
    let factory = OperationFactory::with_config(&registry, config);

    let mut ops = vec![factory
        .new_insert_operation(TransactionId(1), &table, account(1, "dan", 1.0))
        .unwrap()];
    assert!(factory.complete_executed_ops(&mut ops).is_err());
    assert!(!ops[0].is_completed());
}

// ============================================================================
// Properties
// ============================================================================

fn accounts_strategy() -> impl Strategy<Value = BTreeMap<u64, (String, f64)>> {
    prop::collection::btree_map(
        any::<u64>(),
        ("[a-z]{0,32}", -1.0e9f64..1.0e9f64),
        0..16,
    )
}

proptest! {
    /// Property: every row inserted in one batch is read back unchanged in the next.
    #[test]
    fn inserted_rows_read_back(rows in accounts_strategy()) {
        let registry = EncoderRegistry::with_defaults();
        let table = accounts();
        let primary = table.index("PRIMARY", &["id"]).unwrap();
        let factory = OperationFactory::new(&registry);
        let mut engine = MemoryEngine::new(&registry, &table, &["id"]).unwrap();

        let mut inserts: Vec<Operation<'_>> = rows
            .iter()
            .map(|(id, (owner, balance))| {
                factory
                    .new_insert_operation(TransactionId(1), &table, account(*id, owner, *balance))
                    .unwrap()
            })
            .collect();
        let mut tx = engine.begin();
        for op in inserts.iter_mut() {
            op.prepare(&mut tx).unwrap();
        }
        engine.execute(tx, &mut inserts).unwrap();
        let summary = factory.complete_executed_ops(&mut inserts).unwrap();
        prop_assert_eq!(summary.succeeded, rows.len());
        prop_assert_eq!(engine.len(), rows.len());

        let mut reads: Vec<Operation<'_>> = rows
            .keys()
            .rev()
            .map(|id| {
                factory
                    .new_read_operation(TransactionId(2), &primary, key(*id), LockMode::Shared)
                    .unwrap()
            })
            .collect();
        let mut tx = engine.begin();
        for op in reads.iter_mut() {
            op.prepare(&mut tx).unwrap();
        }
        engine.execute(tx, &mut reads).unwrap();
        factory.complete_executed_ops(&mut reads).unwrap();

        for (op, (id, (owner, balance))) in reads.iter().zip(rows.iter().rev()) {
            let expected = account(*id, owner, *balance).with("flags", Value::Null);
            prop_assert_eq!(op.result().value.as_ref(), Some(&expected));
        }
    }
}
