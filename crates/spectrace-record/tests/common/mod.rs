#![allow(dead_code)]

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use spectrace_core::{Canonical, ErrorInfo, Root, RunMetadata, TraceError, Value};
use spectrace_record::{BoundArgs, OperationSpec, ParamSpec, RecordingProxy, Subject, TracerConfig};
use thiserror::Error;

fn encode_bincode<T: Serialize>(kind: &str, value: &T) -> Result<Vec<u8>, TraceError> {
    bincode::serialize(value).map_err(|err| {
        TraceError::Serde(ErrorInfo::new("bincode-encode", err.to_string()).with_context("kind", kind))
    })
}

fn root_of<T: Serialize>(value: &T) -> Root {
    let bytes = bincode::serialize(value).expect("mock values always encode");
    Root::from_bytes(Sha256::digest(&bytes).into())
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> T {
    bincode::deserialize(bytes).expect("artifact decodes")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MockState {
    pub slot: u64,
    pub balances: Vec<u64>,
    pub latest_block: [u8; 32],
}

impl MockState {
    pub fn genesis() -> Self {
        Self {
            slot: 0,
            balances: vec![32, 32, 32, 32],
            latest_block: [0; 32],
        }
    }
}

impl Canonical for MockState {
    fn kind(&self) -> &str {
        "BeaconState"
    }

    fn content_root(&self) -> Root {
        root_of(self)
    }

    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        encode_bincode(self.kind(), self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockBlock {
    pub slot: u64,
    pub proposer: u64,
}

impl Canonical for MockBlock {
    fn kind(&self) -> &str {
        "BeaconBlock"
    }

    fn content_root(&self) -> Root {
        root_of(self)
    }

    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        encode_bincode(self.kind(), self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockAttestation {
    pub slot: u64,
    pub index: u64,
}

impl Canonical for MockAttestation {
    fn kind(&self) -> &str {
        "Attestation"
    }

    fn content_root(&self) -> Root {
        root_of(self)
    }

    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        encode_bincode(self.kind(), self)
    }
}

/// Block whose canonical bytes cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsealedBlock {
    pub slot: u64,
}

impl Canonical for UnsealedBlock {
    fn kind(&self) -> &str {
        "BeaconBlock"
    }

    fn content_root(&self) -> Root {
        root_of(self)
    }

    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        Err(TraceError::Serde(
            ErrorInfo::new("block-unsealed", "block has no signature yet").with_context("kind", self.kind()),
        ))
    }
}

/// Complex value whose kind has no collection in the default config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockCheckpoint {
    pub epoch: u64,
}

impl Canonical for MockCheckpoint {
    fn kind(&self) -> &str {
        "Checkpoint"
    }

    fn content_root(&self) -> Root {
        root_of(self)
    }

    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        encode_bincode(self.kind(), self)
    }
}

/// Fork-choice store; not canonical, so it only ever appears as a placeholder.
#[derive(Debug, Clone)]
pub struct MockStore {
    pub head: [u8; 32],
}

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("{0}")]
    Assertion(String),
    #[error("missing or mistyped argument `{0}`")]
    Argument(&'static str),
}

/// Small beacon-like subject used across the recorder tests.
#[derive(Debug, Clone)]
pub struct MockSpec {
    pub preset: String,
    pub slots_per_epoch: u64,
}

impl Default for MockSpec {
    fn default() -> Self {
        Self {
            preset: "minimal".to_string(),
            slots_per_epoch: 8,
        }
    }
}

fn state_mut<'b>(args: &'b mut BoundArgs<'_>) -> Result<&'b mut MockState, SpecError> {
    args.get_mut("state")
        .and_then(|value| value.downcast_mut::<MockState>())
        .ok_or(SpecError::Argument("state"))
}

fn state_ref<'b>(args: &'b BoundArgs<'_>) -> Result<&'b MockState, SpecError> {
    args.get("state")
        .and_then(|value| value.downcast_ref::<MockState>())
        .ok_or(SpecError::Argument("state"))
}

fn uint(args: &BoundArgs<'_>, name: &'static str) -> Result<u64, SpecError> {
    args.get(name)
        .and_then(Value::as_u64)
        .ok_or(SpecError::Argument(name))
}

fn bytes32(args: &BoundArgs<'_>, name: &'static str) -> Result<[u8; 32], SpecError> {
    args.get(name)
        .and_then(Value::as_bytes)
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .ok_or(SpecError::Argument(name))
}

pub fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

impl Subject for MockSpec {
    type Error = SpecError;

    fn operations(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new(
                "tick",
                [ParamSpec::required("state"), ParamSpec::optional("slots", 1u64)],
            ),
            OperationSpec::with_params("process_block", &["state", "block"]),
            OperationSpec::with_params("process_attestation", &["state", "attestation"]),
            OperationSpec::with_params("no_op", &["state"]),
            OperationSpec::with_params("propose_block", &["state"]),
            OperationSpec::with_params("fail_op", &[]),
            OperationSpec::with_params("get_current_epoch", &["state"]),
            OperationSpec::with_params("get_checkpoint", &["state"]),
            OperationSpec::with_params(
                "is_valid_merkle_branch",
                &["leaf", "branch", "depth", "index", "root"],
            ),
            OperationSpec::with_params("get_head", &["store"]),
            OperationSpec::new(
                "BeaconBlock",
                [ParamSpec::required("slot"), ParamSpec::optional("proposer", 0u64)],
            ),
            OperationSpec::with_params("Attestation", &["slot", "index"]),
            OperationSpec::with_params("_process_slot", &["state"]),
        ]
    }

    fn invoke(&self, operation: &str, args: &mut BoundArgs<'_>) -> Result<Value<'static>, SpecError> {
        match operation {
            "tick" => {
                let slots = uint(args, "slots")?;
                state_mut(args)?.slot += slots;
                Ok(Value::Null)
            }
            "process_block" => {
                let block = args
                    .get("block")
                    .and_then(|value| value.downcast_ref::<MockBlock>())
                    .cloned()
                    .ok_or(SpecError::Argument("block"))?;
                let state = state_mut(args)?;
                if block.slot <= state.slot {
                    return Err(SpecError::Assertion(format!(
                        "block slot {} not after state slot {}",
                        block.slot, state.slot
                    )));
                }
                state.slot = block.slot;
                state.latest_block = *block.content_root().as_bytes();
                Ok(Value::Null)
            }
            "process_attestation" => {
                let attestation = args
                    .get("attestation")
                    .and_then(|value| value.downcast_ref::<MockAttestation>())
                    .cloned()
                    .ok_or(SpecError::Argument("attestation"))?;
                let state = state_mut(args)?;
                state.balances.push(attestation.index);
                if attestation.slot > state.slot {
                    return Err(SpecError::Assertion("attestation from the future".to_string()));
                }
                Ok(Value::Null)
            }
            "no_op" => {
                state_ref(args)?;
                Ok(Value::Null)
            }
            "propose_block" => {
                let state = state_mut(args)?;
                state.slot += 1;
                Ok(Value::owned(UnsealedBlock { slot: state.slot }))
            }
            "fail_op" => Err(SpecError::Assertion("boom".to_string())),
            "get_current_epoch" => Ok(Value::Uint(state_ref(args)?.slot / self.slots_per_epoch)),
            "get_checkpoint" => {
                let epoch = state_ref(args)?.slot / self.slots_per_epoch;
                Ok(Value::owned(MockCheckpoint { epoch }))
            }
            "is_valid_merkle_branch" => {
                let leaf = bytes32(args, "leaf")?;
                let root = bytes32(args, "root")?;
                let depth = uint(args, "depth")?;
                let index = uint(args, "index")?;
                let branch = args
                    .get("branch")
                    .and_then(Value::as_list)
                    .ok_or(SpecError::Argument("branch"))?;
                let mut node = leaf;
                for (height, sibling) in branch.iter().take(depth as usize).enumerate() {
                    let sibling = sibling
                        .as_bytes()
                        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
                        .ok_or(SpecError::Argument("branch"))?;
                    node = if (index >> height) & 1 == 1 {
                        hash_pair(&sibling, &node)
                    } else {
                        hash_pair(&node, &sibling)
                    };
                }
                Ok(Value::Bool(branch.len() as u64 >= depth && node == root))
            }
            "get_head" => {
                let store = args
                    .get("store")
                    .and_then(|value| value.opaque_ref::<MockStore>())
                    .ok_or(SpecError::Argument("store"))?;
                Ok(Value::from(store.head.to_vec()))
            }
            "BeaconBlock" => Ok(Value::owned(MockBlock {
                slot: uint(args, "slot")?,
                proposer: uint(args, "proposer")?,
            })),
            "Attestation" => Ok(Value::owned(MockAttestation {
                slot: uint(args, "slot")?,
                index: uint(args, "index")?,
            })),
            "_process_slot" => {
                state_mut(args)?.slot += 1;
                Ok(Value::Null)
            }
            _ => Err(SpecError::Argument("operation")),
        }
    }

    fn error_kind(error: &SpecError) -> String {
        match error {
            SpecError::Assertion(_) => "AssertionError".to_string(),
            SpecError::Argument(_) => "TypeError".to_string(),
        }
    }
}

pub fn metadata() -> RunMetadata {
    RunMetadata::new("phase0", "minimal")
}

pub fn recorder() -> RecordingProxy<MockSpec> {
    RecordingProxy::new(MockSpec::default(), TracerConfig::default(), metadata())
}
