/// Transaction wire types. Variant order matches the on-chain BCS layout.
use crate::crypto::{blake2b256, KeyPair, SERIALIZED_SIGNATURE_LENGTH};
use crate::error::Result;
use crate::types::{ObjectId, ObjectRef, SuiAddress, TransactionDigest, TypeTag};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// Domain separator hashed in front of the transaction bytes to form the digest.
const TRANSACTION_DATA_SALT: &[u8] = b"TransactionData::";

/// Reference to a value inside a programmable transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    Pure(#[serde(with = "serde_bytes")] Vec<u8>),
    Object(ObjectArg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    SharedObject {
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    },
}

impl ObjectArg {
    pub fn id(&self) -> ObjectId {
        match self {
            ObjectArg::ImmOrOwnedObject(object_ref) => object_ref.object_id,
            ObjectArg::SharedObject { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableMoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    MoveCall(Box<ProgrammableMoveCall>),
    TransferObjects(Vec<Argument>, Argument),
}

/// A sealed container: inputs plus the ordered command list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: SuiAddress,
    pub price: u64,
    pub budget: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionExpiration {
    None,
    Epoch(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDataV1 {
    pub kind: TransactionKind,
    pub sender: SuiAddress,
    pub gas_data: GasData,
    pub expiration: TransactionExpiration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionData {
    V1(TransactionDataV1),
}

impl TransactionData {
    pub fn new_programmable(
        sender: SuiAddress,
        payment: Vec<ObjectRef>,
        pt: ProgrammableTransaction,
        budget: u64,
        price: u64,
    ) -> Self {
        TransactionData::V1(TransactionDataV1 {
            kind: TransactionKind::ProgrammableTransaction(pt),
            sender,
            gas_data: GasData {
                payment,
                owner: sender,
                price,
                budget,
            },
            expiration: TransactionExpiration::None,
        })
    }

    pub fn sender(&self) -> SuiAddress {
        match self {
            TransactionData::V1(data) => data.sender,
        }
    }

    pub fn gas_data(&self) -> &GasData {
        match self {
            TransactionData::V1(data) => &data.gas_data,
        }
    }

    pub fn programmable(&self) -> &ProgrammableTransaction {
        match self {
            TransactionData::V1(data) => match &data.kind {
                TransactionKind::ProgrammableTransaction(pt) => pt,
            },
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn to_base64(&self) -> Result<String> {
        Ok(general_purpose::STANDARD.encode(self.to_bytes()?))
    }

    pub fn digest(&self) -> Result<TransactionDigest> {
        Ok(digest_of_bytes(&self.to_bytes()?))
    }

    /// Signs the sealed bytes; the bytes cannot change after this point.
    pub fn sign(&self, keypair: &KeyPair) -> Result<SignedTransaction> {
        let tx_bytes = self.to_bytes()?;
        let signature = keypair.sign_transaction(&tx_bytes);
        Ok(SignedTransaction {
            digest: digest_of_bytes(&tx_bytes),
            tx_bytes,
            signatures: vec![signature],
        })
    }
}

fn digest_of_bytes(tx_bytes: &[u8]) -> TransactionDigest {
    TransactionDigest::new(blake2b256(&[TRANSACTION_DATA_SALT, tx_bytes]))
}

/// Transaction bytes plus the signatures authorising them.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub tx_bytes: Vec<u8>,
    pub signatures: Vec<[u8; SERIALIZED_SIGNATURE_LENGTH]>,
    pub digest: TransactionDigest,
}

impl SignedTransaction {
    pub fn tx_bytes_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.tx_bytes)
    }

    pub fn signatures_base64(&self) -> Vec<String> {
        self.signatures
            .iter()
            .map(|sig| general_purpose::STANDARD.encode(sig))
            .collect()
    }
}
