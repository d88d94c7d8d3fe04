//! In-memory native engine
//!
//! Rows are stored as encoded table records, keyed by their encoded primary
//! key. Operations are executed in the order they were defined. Read results
//! are copied into the row buffer of the corresponding operation, the same
//! way the real engine writes into caller-owned memory.

use crate::native::{NativeError, NativeOperation, NativeStatus, NativeTransaction, TupleSpec};
use crate::operation::Operation;
use ndb_adapter_codec::{BufferCodec, EncoderRegistry, IndexMetadata, TableMetadata};
use ndb_adapter_core::{AdapterError, LockMode, OpCode, OperationState, Result, Row};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::{debug, warn};

/// NDB 626: the addressed row does not exist
pub fn tuple_not_found() -> NativeError {
    NativeError::new(626, 120, "Tuple did not exist", NativeStatus::PermanentError)
}

/// NDB 630: insert of a row whose key already exists
pub fn duplicate_key() -> NativeError {
    NativeError::new(
        630,
        121,
        "Tuple already existed when attempting to insert",
        NativeStatus::PermanentError,
    )
}

/// NDB 4010: the whole transaction was aborted
pub fn batch_abort() -> NativeError {
    NativeError::new(
        4010,
        157,
        "Node failure caused abort of transaction",
        NativeStatus::TemporaryError,
    )
}

type Slot = Rc<RefCell<NativeError>>;

/// Handle returned for each defined operation
///
/// Reports success until the batch has executed.
struct MemoryHandle {
    slot: Slot,
}

impl NativeOperation for MemoryHandle {
    fn ndb_error(&self) -> NativeError {
        self.slot.borrow().clone()
    }
}

/// One operation as the engine received it
#[derive(Debug)]
struct Defined {
    opcode: OpCode,
    key: Option<Vec<u8>>,
    row: Option<Vec<u8>>,
    lock_mode: Option<LockMode>,
    slot: Slot,
}

/// Native transaction of a [`MemoryEngine`]
#[derive(Debug, Default)]
pub struct MemoryTransaction {
    defined: Vec<Defined>,
    injected: HashMap<usize, NativeError>,
    abort: bool,
}

impl MemoryTransaction {
    /// Number of operations defined so far
    pub fn defined_count(&self) -> usize {
        self.defined.len()
    }

    /// Opcodes in definition order
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.defined.iter().map(|d| d.opcode).collect()
    }

    /// Lock mode of the operation defined at `position`
    pub fn lock_mode(&self, position: usize) -> Option<LockMode> {
        self.defined.get(position).and_then(|d| d.lock_mode)
    }

    /// Whether the operation defined at `position` received a key and a row buffer
    pub fn buffers_received(&self, position: usize) -> Option<(bool, bool)> {
        self.defined
            .get(position)
            .map(|d| (d.key.is_some(), d.row.is_some()))
    }

    /// Make the operation defined at `position` fail with `error`
    ///
    /// The failing operation has no effect on the stored rows.
    pub fn inject_error(&mut self, position: usize, error: NativeError) {
        self.injected.insert(position, error);
    }

    /// Abort the whole batch on execution
    pub fn abort_batch(&mut self) {
        self.abort = true;
    }

    fn define(&mut self, spec: &TupleSpec<'_>) -> Result<Box<dyn NativeOperation>> {
        let slot: Slot = Rc::new(RefCell::new(NativeError::ok()));
        self.defined.push(Defined {
            opcode: spec.opcode,
            key: spec.key_buffer.map(<[u8]>::to_vec),
            row: spec.row_buffer.map(<[u8]>::to_vec),
            lock_mode: spec.lock_mode,
            slot: Rc::clone(&slot),
        });
        Ok(Box::new(MemoryHandle { slot }))
    }
}

impl NativeTransaction for MemoryTransaction {
    fn insert_tuple(&mut self, spec: &TupleSpec<'_>) -> Result<Box<dyn NativeOperation>> {
        if spec.row_buffer.is_none() {
            return Err(AdapterError::Native("insert without row buffer".into()));
        }
        self.define(spec)
    }

    fn delete_tuple(&mut self, spec: &TupleSpec<'_>) -> Result<Box<dyn NativeOperation>> {
        if spec.key_buffer.is_none() {
            return Err(AdapterError::Native("delete without key buffer".into()));
        }
        self.define(spec)
    }

    fn read_tuple(&mut self, spec: &TupleSpec<'_>) -> Result<Box<dyn NativeOperation>> {
        if spec.key_buffer.is_none() || spec.row_buffer.is_none() {
            return Err(AdapterError::Native("read without key and row buffers".into()));
        }
        self.define(spec)
    }

    fn update_tuple(&mut self, spec: &TupleSpec<'_>) -> Result<Box<dyn NativeOperation>> {
        if spec.key_buffer.is_none() || spec.row_buffer.is_none() {
            return Err(AdapterError::Native("update without key and row buffers".into()));
        }
        self.define(spec)
    }
}

/// In-memory engine holding the rows of one table
pub struct MemoryEngine<'m> {
    codec: BufferCodec<'m>,
    table: &'m TableMetadata,
    primary: IndexMetadata<'m>,
    rows: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<'m> MemoryEngine<'m> {
    /// Empty engine for `table`, keyed by `primary_key`
    pub fn new(
        registry: &'m EncoderRegistry,
        table: &'m TableMetadata,
        primary_key: &[&str],
    ) -> Result<Self> {
        Ok(Self {
            codec: BufferCodec::new(registry),
            table,
            primary: table.index("PRIMARY", primary_key)?,
            rows: BTreeMap::new(),
        })
    }

    /// Primary index of the table
    pub fn primary(&self) -> &IndexMetadata<'m> {
        &self.primary
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are stored
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Store a row directly, replacing any row with the same key
    pub fn load(&mut self, row: &Row) -> Result<()> {
        let key = self.codec.encode(&self.primary, row)?;
        let record = self.codec.encode(self.table, row)?;
        self.rows.insert(key.to_vec(), record.to_vec());
        Ok(())
    }

    /// Look up a stored row by its primary key columns
    pub fn fetch(&self, key: &Row) -> Result<Option<Row>> {
        let key = self.codec.encode(&self.primary, key)?;
        self.rows
            .get(key.as_bytes())
            .map(|record| self.codec.decode(self.table, record))
            .transpose()
    }

    /// Start a transaction
    pub fn begin(&self) -> MemoryTransaction {
        MemoryTransaction::default()
    }

    /// Execute every operation defined in `tx`
    ///
    /// `ops` must hold the prepared operations in the order they were
    /// defined; operations in any other state are passed over. Changes are
    /// staged and only stored once every definition has run. A batch that
    /// is aborted, or that fails part way, changes nothing, marks every
    /// operation with [`batch_abort`] and returns the error.
    pub fn execute(&mut self, tx: MemoryTransaction, ops: &mut [Operation<'_>]) -> Result<()> {
        debug!(defined = tx.defined.len(), "execute");
        let MemoryTransaction {
            defined,
            injected,
            abort,
        } = tx;

        let staged = if abort {
            Err(AdapterError::Native(batch_abort().to_string()))
        } else {
            self.run(&defined, &injected, ops)
        };

        match staged {
            Ok((rows, outcomes)) => {
                self.rows = rows;
                for (d, outcome) in defined.iter().zip(outcomes) {
                    *d.slot.borrow_mut() = outcome;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "execute: batch aborted");
                for d in &defined {
                    *d.slot.borrow_mut() = batch_abort();
                }
                Err(e)
            }
        }
    }

    /// Run the definitions against a copy of the stored rows
    fn run(
        &self,
        defined: &[Defined],
        injected: &HashMap<usize, NativeError>,
        ops: &mut [Operation<'_>],
    ) -> Result<(BTreeMap<Vec<u8>, Vec<u8>>, Vec<NativeError>)> {
        let mut rows = self.rows.clone();
        let mut outcomes = Vec::with_capacity(defined.len());
        let mut prepared = ops
            .iter_mut()
            .filter(|op| op.state() == OperationState::Prepared);

        for (position, d) in defined.iter().enumerate() {
            let op = prepared.next().ok_or_else(|| {
                AdapterError::Native(format!("no prepared operation for definition {}", position))
            })?;
            if op.opcode() != d.opcode {
                return Err(AdapterError::Native(format!(
                    "definition {} is a {}, operation is a {}",
                    position,
                    d.opcode,
                    op.opcode()
                )));
            }

            let outcome = match injected.get(&position) {
                Some(error) => error.clone(),
                None => self.apply(&mut rows, d, op)?,
            };
            debug!(position, opcode = %d.opcode, code = outcome.code, "executed");
            outcomes.push(outcome);
        }
        Ok((rows, outcomes))
    }

    fn apply(
        &self,
        rows: &mut BTreeMap<Vec<u8>, Vec<u8>>,
        d: &Defined,
        op: &mut Operation<'_>,
    ) -> Result<NativeError> {
        let key = self.primary_key(d, op)?;
        let outcome = match d.opcode {
            OpCode::Insert => {
                if rows.contains_key(&key) {
                    duplicate_key()
                } else {
                    rows.insert(key, d.row.clone().unwrap_or_default());
                    NativeError::ok()
                }
            }
            OpCode::Update => match rows.get_mut(&key) {
                Some(stored) => {
                    *stored = d.row.clone().unwrap_or_default();
                    NativeError::ok()
                }
                None => tuple_not_found(),
            },
            OpCode::Delete => match rows.remove(&key) {
                Some(_) => NativeError::ok(),
                None => tuple_not_found(),
            },
            OpCode::Read => match (rows.get(&key), op.row_buffer_mut()) {
                (Some(stored), Some(buffer)) => {
                    buffer.fill_from(stored)?;
                    NativeError::ok()
                }
                (Some(_), None) => {
                    return Err(AdapterError::Native("read has no row buffer".into()))
                }
                (None, _) => tuple_not_found(),
            },
        };
        Ok(outcome)
    }

    /// Normalize the addressed key to an encoded primary key
    fn primary_key(&self, d: &Defined, op: &Operation<'_>) -> Result<Vec<u8>> {
        let logical = match (d.opcode, op.index(), d.key.as_deref(), d.row.as_deref()) {
            (OpCode::Insert, _, _, Some(row)) => self.codec.decode(self.table, row)?,
            (_, Some(index), Some(key), _) => self.codec.decode(index, key)?,
            _ => {
                return Err(AdapterError::Native(format!(
                    "{} has nothing to address a row by",
                    d.opcode
                )))
            }
        };
        Ok(self.codec.encode(&self.primary, &logical)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndb_adapter_core::{ColumnMetadata, NativeTypeId, Value};

    fn people() -> TableMetadata {
        TableMetadata::new(
            "people",
            vec![
                ColumnMetadata::new("id", NativeTypeId::Int, 0).not_null(),
                ColumnMetadata::new("name", NativeTypeId::Varchar, 14),
            ],
        )
    }

    #[test]
    fn test_load_and_fetch() {
        let registry = EncoderRegistry::with_defaults();
        let table = people();
        let mut engine = MemoryEngine::new(&registry, &table, &["id"]).unwrap();
        assert!(engine.is_empty());

        engine
            .load(&Row::new().with("id", 1).with("name", "ann"))
            .unwrap();
        assert_eq!(engine.len(), 1);

        let row = engine.fetch(&Row::new().with("id", 1)).unwrap().unwrap();
        assert_eq!(row.get("name"), Some(&Value::String("ann".into())));
        assert!(engine.fetch(&Row::new().with("id", 2)).unwrap().is_none());
    }

    #[test]
    fn test_handles_report_success_before_execution() {
        let slot: Slot = Rc::new(RefCell::new(NativeError::ok()));
        let handle = MemoryHandle {
            slot: Rc::clone(&slot),
        };
        assert!(handle.ndb_error().is_ok());
        *slot.borrow_mut() = tuple_not_found();
        assert_eq!(handle.ndb_error().code, 626);
    }

    #[test]
    fn test_error_constructors() {
        assert_eq!(tuple_not_found().mysql_code, 120);
        assert_eq!(duplicate_key().mysql_code, 121);
        assert!(batch_abort().status.is_temporary());
    }
}
