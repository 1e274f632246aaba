#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use spectrace_core::{Canonical, ErrorInfo, Root, TraceError, Value};
use spectrace_record::{BoundArgs, OperationSpec, ParamSpec, Subject};
use thiserror::Error;

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, TraceError> {
    bincode::serialize(value)
        .map_err(|err| TraceError::Serde(ErrorInfo::new("bincode-encode", err.to_string())))
}

fn root_of<T: Serialize>(value: &T) -> Root {
    Root::digest(&bincode::serialize(value).expect("ledger values encode"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ledger {
    pub slot: u64,
    pub entries: Vec<u64>,
}

impl Canonical for Ledger {
    fn kind(&self) -> &str {
        "BeaconState"
    }

    fn content_root(&self) -> Root {
        root_of(self)
    }

    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        encode(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub slot: u64,
}

impl Canonical for Block {
    fn kind(&self) -> &str {
        "BeaconBlock"
    }

    fn content_root(&self) -> Root {
        root_of(self)
    }

    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        encode(self)
    }
}

/// Block that cannot be encoded until it is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftBlock {
    pub slot: u64,
}

impl Canonical for DraftBlock {
    fn kind(&self) -> &str {
        "BeaconBlock"
    }

    fn content_root(&self) -> Root {
        root_of(self)
    }

    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        Err(TraceError::Serde(ErrorInfo::new("draft-block", "unsigned block")))
    }
}

#[derive(Debug)]
pub struct Store {
    pub head: u64,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Assertion(String),
    #[error("bad argument `{0}`")]
    Argument(&'static str),
}

pub struct LedgerSpec;

fn ledger_mut<'b>(args: &'b mut BoundArgs<'_>) -> Result<&'b mut Ledger, LedgerError> {
    args.get_mut("state")
        .and_then(|value| value.downcast_mut::<Ledger>())
        .ok_or(LedgerError::Argument("state"))
}

impl Subject for LedgerSpec {
    type Error = LedgerError;

    fn operations(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new(
                "tick",
                [ParamSpec::required("state"), ParamSpec::optional("slots", 1u64)],
            ),
            OperationSpec::with_params("process_block", &["state", "block"]),
            OperationSpec::with_params("get_slot", &["state"]),
            OperationSpec::with_params("propose_block", &["state"]),
            OperationSpec::with_params("get_head", &["store"]),
            OperationSpec::with_params("fail_op", &[]),
        ]
    }

    fn invoke(&self, operation: &str, args: &mut BoundArgs<'_>) -> Result<Value<'static>, LedgerError> {
        match operation {
            "tick" => {
                let slots = args
                    .get("slots")
                    .and_then(Value::as_u64)
                    .ok_or(LedgerError::Argument("slots"))?;
                ledger_mut(args)?.slot += slots;
                Ok(Value::Null)
            }
            "process_block" => {
                let slot = args
                    .get("block")
                    .and_then(|value| value.downcast_ref::<Block>())
                    .map(|block| block.slot)
                    .ok_or(LedgerError::Argument("block"))?;
                let ledger = ledger_mut(args)?;
                if slot <= ledger.slot {
                    return Err(LedgerError::Assertion("stale block".to_string()));
                }
                ledger.slot = slot;
                ledger.entries.push(slot);
                Ok(Value::Null)
            }
            "propose_block" => {
                let ledger = ledger_mut(args)?;
                ledger.slot += 1;
                Ok(Value::owned(DraftBlock { slot: ledger.slot }))
            }
            "get_slot" => {
                let ledger = args
                    .get("state")
                    .and_then(|value| value.downcast_ref::<Ledger>())
                    .ok_or(LedgerError::Argument("state"))?;
                Ok(Value::Uint(ledger.slot))
            }
            "get_head" => {
                let store = args
                    .get("store")
                    .and_then(|value| value.opaque_ref::<Store>())
                    .ok_or(LedgerError::Argument("store"))?;
                Ok(Value::Uint(store.head))
            }
            "fail_op" => Err(LedgerError::Assertion("boom".to_string())),
            _ => Err(LedgerError::Argument("operation")),
        }
    }

    fn error_kind(error: &LedgerError) -> String {
        match error {
            LedgerError::Assertion(_) => "AssertionError".to_string(),
            LedgerError::Argument(_) => "TypeError".to_string(),
        }
    }
}
