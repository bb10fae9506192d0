//! On-chain identifiers and Move type tags

use crate::error::{Result, SweepError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of object ids, addresses and digests.
pub const ID_LENGTH: usize = 32;

/// A 32-byte object id. Sui addresses share the same representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; ID_LENGTH]);

/// Account address of a signer; same bytes as an object id.
pub type SuiAddress = ObjectId;

impl ObjectId {
    pub const ZERO: ObjectId = ObjectId([0u8; ID_LENGTH]);

    pub const fn new(bytes: [u8; ID_LENGTH]) -> Self {
        ObjectId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    /// Parses `0x`-prefixed hex. Short forms such as `0x2` are left-padded.
    pub fn from_hex_literal(literal: &str) -> Result<Self> {
        let trimmed = literal.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| {
                SweepError::InvalidIdentifier(format!("'{}' is missing the 0x prefix", literal))
            })?;

        if digits.is_empty() || digits.len() > ID_LENGTH * 2 {
            return Err(SweepError::InvalidIdentifier(format!(
                "'{}' must have between 1 and {} hex digits",
                literal,
                ID_LENGTH * 2
            )));
        }

        let padded = format!("{:0>width$}", digits, width = ID_LENGTH * 2);
        let mut bytes = [0u8; ID_LENGTH];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| SweepError::InvalidIdentifier(format!("'{}': {}", literal, e)))?;
        Ok(ObjectId(bytes))
    }

    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for ObjectId {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        ObjectId::from_hex_literal(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

/// A 32-byte digest, shown in base58 and encoded as length-prefixed bytes in BCS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; ID_LENGTH]);

pub type ObjectDigest = Digest;
pub type TransactionDigest = Digest;

impl Digest {
    pub const fn new(bytes: [u8; ID_LENGTH]) -> Self {
        Digest(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    pub fn from_base58(encoded: &str) -> Result<Self> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| SweepError::InvalidIdentifier(format!("digest '{}': {}", encoded, e)))?;
        let bytes: [u8; ID_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            SweepError::InvalidIdentifier(format!(
                "digest must be {} bytes, got {}",
                ID_LENGTH,
                b.len()
            ))
        })?;
        Ok(Digest(bytes))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let buf = serde_bytes::ByteBuf::deserialize(deserializer)?;
        let bytes: [u8; ID_LENGTH] = buf
            .into_vec()
            .try_into()
            .map_err(|_| serde::de::Error::custom("digest must be 32 bytes"))?;
        Ok(Digest(bytes))
    }
}

/// `(id, version, digest)` reference to an owned object, e.g. a gas coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: ObjectDigest,
}

/// Move type tag. Variant order is the on-chain BCS tag order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    U16,
    U32,
    U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructTag {
    pub address: ObjectId,
    pub module: String,
    pub name: String,
    pub type_params: Vec<TypeTag>,
}

impl FromStr for TypeTag {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "bool" => return Ok(TypeTag::Bool),
            "u8" => return Ok(TypeTag::U8),
            "u16" => return Ok(TypeTag::U16),
            "u32" => return Ok(TypeTag::U32),
            "u64" => return Ok(TypeTag::U64),
            "u128" => return Ok(TypeTag::U128),
            "u256" => return Ok(TypeTag::U256),
            "address" => return Ok(TypeTag::Address),
            "signer" => return Ok(TypeTag::Signer),
            _ => {}
        }

        if let Some(inner) = s.strip_prefix("vector<").and_then(|r| r.strip_suffix('>')) {
            return Ok(TypeTag::Vector(Box::new(inner.parse()?)));
        }

        Ok(TypeTag::Struct(Box::new(s.parse()?)))
    }
}

impl FromStr for StructTag {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        let (path, type_params) = match s.find('<') {
            Some(open) => {
                let params = s[open + 1..].strip_suffix('>').ok_or_else(|| {
                    SweepError::InvalidTypeTag(format!("unbalanced '<' in '{}'", s))
                })?;
                let tags = split_top_level(params)
                    .into_iter()
                    .map(TypeTag::from_str)
                    .collect::<Result<Vec<_>>>()?;
                (&s[..open], tags)
            }
            None => (s, Vec::new()),
        };

        let parts: Vec<&str> = path.split("::").collect();
        if parts.len() != 3 {
            return Err(SweepError::InvalidTypeTag(format!(
                "expected <address>::<module>::<name>, got '{}'",
                s
            )));
        }

        let address = ObjectId::from_hex_literal(parts[0])
            .map_err(|e| SweepError::InvalidTypeTag(e.to_string()))?;
        validate_identifier(parts[1]).map_err(SweepError::InvalidTypeTag)?;
        validate_identifier(parts[2]).map_err(SweepError::InvalidTypeTag)?;

        Ok(StructTag {
            address,
            module: parts[1].to_string(),
            name: parts[2].to_string(),
            type_params,
        })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::U8 => write!(f, "u8"),
            TypeTag::U16 => write!(f, "u16"),
            TypeTag::U32 => write!(f, "u32"),
            TypeTag::U64 => write!(f, "u64"),
            TypeTag::U128 => write!(f, "u128"),
            TypeTag::U256 => write!(f, "u256"),
            TypeTag::Address => write!(f, "address"),
            TypeTag::Signer => write!(f, "signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{}>", inner),
            TypeTag::Struct(tag) => write!(f, "{}", tag),
        }
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if !self.type_params.is_empty() {
            let params: Vec<String> = self.type_params.iter().map(|t| t.to_string()).collect();
            write!(f, "<{}>", params.join(", "))?;
        }
        Ok(())
    }
}

/// Splits `A, B<C, D>, E` on commas that are not nested inside angle brackets.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

fn validate_identifier(ident: &str) -> std::result::Result<(), String> {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return Err(format!("'{}' is not a valid Move identifier", ident)),
    }
    if ident == "_" || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("'{}' is not a valid Move identifier", ident));
    }
    Ok(())
}

/// Fully qualified Move function, `<package>::<module>::<function>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTarget {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
}

impl MoveTarget {
    pub fn new(package: ObjectId, module: &str, function: &str) -> Result<Self> {
        validate_identifier(module).map_err(SweepError::InvalidIdentifier)?;
        validate_identifier(function).map_err(SweepError::InvalidIdentifier)?;
        Ok(MoveTarget {
            package,
            module: module.to_string(),
            function: function.to_string(),
        })
    }
}

impl FromStr for MoveTarget {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split("::").collect();
        if parts.len() != 3 {
            return Err(SweepError::InvalidIdentifier(format!(
                "expected <package>::<module>::<function>, got '{}'",
                s
            )));
        }
        MoveTarget::new(ObjectId::from_hex_literal(parts[0])?, parts[1], parts[2])
    }
}

impl fmt::Display for MoveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.package, self.module, self.function)
    }
}
