//! Programmable transaction model.
//!
//! A [`Transaction`] is an ordered list of inputs and an ordered list of
//! commands. Commands refer to inputs and to earlier command results through
//! [`Argument`]; the ledger executes them in order, atomically.

mod builder;
pub mod codec;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

pub use builder::{TransactionBuilder, UpgradeReceipt, UpgradeTicket, build_publish, build_upgrade};

use crate::types::{Identity, ObjectId, ObjectRef};

// Variant order is the wire tag: never reorder or remove variants.

/// Reference to a value available while the transaction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallArg {
    /// Serialized plain value.
    Pure(Vec<u8>),
    Object(ObjectArg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectArg {
    ImmOrOwned(ObjectRef),
}

/// Move type argument of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

impl MoveCall {
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package.to_short_literal(), self.module, self.function)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Command {
    MoveCall(MoveCall),
    TransferObjects {
        objects: Vec<Argument>,
        recipient: Argument,
    },
    SplitCoins {
        coin: Argument,
        amounts: Vec<Argument>,
    },
    MergeCoins {
        target: Argument,
        sources: Vec<Argument>,
    },
    Publish {
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
    },
    MakeMoveVec {
        element_type: Option<TypeTag>,
        elements: Vec<Argument>,
    },
    Upgrade {
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
        package: ObjectId,
        ticket: Argument,
    },
}

impl Command {
    /// Short label for logs and reports.
    pub fn label(&self) -> String {
        match self {
            Self::MoveCall(call) => format!("call {}", call.target()),
            Self::TransferObjects { objects, .. } => format!("transfer {} object(s)", objects.len()),
            Self::SplitCoins { amounts, .. } => format!("split coin {} way(s)", amounts.len()),
            Self::MergeCoins { sources, .. } => format!("merge {} coin(s)", sources.len()),
            Self::Publish { modules, .. } => format!("publish {} module(s)", modules.len()),
            Self::MakeMoveVec { elements, .. } => format!("vector of {} element(s)", elements.len()),
            Self::Upgrade { package, .. } => format!("upgrade {}", package.to_short_literal()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
}

impl Transaction {
    pub fn inputs(&self) -> &[CallArg] {
        &self.inputs
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// Gas payment attached to a transaction at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: Identity,
    pub price: u64,
    pub budget: u64,
}

/// Everything that gets signed: the transaction plus sender and gas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionData {
    pub transaction: Transaction,
    pub sender: Identity,
    pub gas: GasData,
}

#[derive(Serialize)]
enum VersionedData<'a> {
    V1(DataV1<'a>),
}

#[derive(Serialize)]
struct DataV1<'a> {
    kind: TransactionKind<'a>,
    sender: &'a Identity,
    gas_data: &'a GasData,
    expiration: TransactionExpiration,
}

#[derive(Serialize)]
enum TransactionKind<'a> {
    ProgrammableTransaction(&'a Transaction),
}

#[derive(Serialize)]
enum TransactionExpiration {
    None,
}

impl Serialize for TransactionData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        VersionedData::V1(DataV1 {
            kind: TransactionKind::ProgrammableTransaction(&self.transaction),
            sender: &self.sender,
            gas_data: &self.gas,
            expiration: TransactionExpiration::None,
        })
        .serialize(serializer)
    }
}

/// Compatibility rule an upgrade is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradePolicy {
    #[default]
    Compatible,
    Additive,
    DepOnly,
}

impl UpgradePolicy {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Compatible => 0,
            Self::Additive => 128,
            Self::DepOnly => 192,
        }
    }
}

impl FromStr for UpgradePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "compatible" => Ok(Self::Compatible),
            "additive" => Ok(Self::Additive),
            "dep_only" => Ok(Self::DepOnly),
            other => anyhow::bail!(
                "Unknown upgrade policy: {} (expected compatible, additive or dep-only)",
                other
            ),
        }
    }
}

impl fmt::Display for UpgradePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compatible => f.write_str("compatible"),
            Self::Additive => f.write_str("additive"),
            Self::DepOnly => f.write_str("dep-only"),
        }
    }
}
