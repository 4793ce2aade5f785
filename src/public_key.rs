use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::TryInto;
use std::fmt::{Display, Formatter};

pub const PUBLIC_KEY_BYTE_COUNT: usize = 32;

/// The identity of an output owner: the raw bytes of an Ed25519 verifying key.
///
/// Whether the bytes form a valid curve point is decided by the verifier, not here.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PublicKey([u8; PUBLIC_KEY_BYTE_COUNT]);

impl PublicKey {
    pub const fn new(bytes: [u8; PUBLIC_KEY_BYTE_COUNT]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_BYTE_COUNT] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, String> {
        let bytes = hex::decode(s).map_err(|e| e.to_string())?;
        let len = bytes.len();
        bytes.try_into().map(Self).map_err(|_| {
            format!(
                "Invalid public key length. Expected: {} but got: {} in: {}",
                PUBLIC_KEY_BYTE_COUNT, len, s
            )
        })
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            PublicKey::from_hex(&s).map_err(D::Error::custom)
        } else {
            <[u8; PUBLIC_KEY_BYTE_COUNT]>::deserialize(deserializer).map(PublicKey)
        }
    }
}
