use crate::domain::address::ScriptHash;
use crate::foundation::SyncError;
use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const GROUP_SIGN_DOMAIN_V1: &[u8] = b"registry:group-sign:v1:";

/// Compressed secp256k1 public key of a committee group member.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupPublicKey([u8; 33]);

impl GroupPublicKey {
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, SyncError> {
        // Validate the point before accepting it.
        PublicKey::from_slice(&bytes)?;
        Ok(Self(bytes))
    }

    pub fn from_hex(value: &str) -> Result<Self, SyncError> {
        let raw = hex::decode(value.trim())?;
        let bytes: [u8; 33] = raw
            .try_into()
            .map_err(|raw: Vec<u8>| SyncError::Encoding(format!("expected 33-byte compressed public key, got {}", raw.len())))?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    fn to_public_key(self) -> Result<PublicKey, SyncError> {
        Ok(PublicKey::from_slice(&self.0)?)
    }
}

impl fmt::Display for GroupPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for GroupPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupPublicKey({})", self)
    }
}

impl Serialize for GroupPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for GroupPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        GroupPublicKey::from_hex(&text).map_err(D::Error::custom)
    }
}

/// Compact ECDSA signature produced by a committee group key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GroupSignature([u8; 64]);

impl GroupSignature {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for GroupSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupSignature({})", hex::encode(self.0))
    }
}

impl Serialize for GroupSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for GroupSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let raw = hex::decode(text.trim()).map_err(D::Error::custom)?;
        let bytes: [u8; 64] = raw.try_into().map_err(|raw: Vec<u8>| D::Error::custom(format!("expected 64-byte signature, got {}", raw.len())))?;
        Ok(Self(bytes))
    }
}

/// Key pair authorizing committee-group membership inside contract manifests.
/// Created lazily on first need and kept in memory only; persistence belongs
/// to the key-management collaborator.
pub struct GroupKeypair {
    secret: SecretKey,
    public: GroupPublicKey,
}

impl GroupKeypair {
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut OsRng);
        Self { secret, public: GroupPublicKey(public.serialize()) }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(bytes)?;
        let public = secret.public_key(&secp);
        Ok(Self { secret, public: GroupPublicKey(public.serialize()) })
    }

    pub fn public_key(&self) -> GroupPublicKey {
        self.public
    }

    /// Signs the computed contract address. Deterministic (RFC 6979), so
    /// re-signing the same address yields the same signature.
    pub fn sign_address(&self, address: &ScriptHash) -> GroupSignature {
        let secp = Secp256k1::signing_only();
        let msg = Message::from_digest(address_digest(address));
        let sig = secp.sign_ecdsa(&msg, &self.secret);
        GroupSignature(sig.serialize_compact())
    }
}

impl fmt::Debug for GroupKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never expose the secret.
        write!(f, "GroupKeypair(public={})", self.public)
    }
}

pub fn verify_address_signature(key: &GroupPublicKey, address: &ScriptHash, signature: &GroupSignature) -> bool {
    let secp = Secp256k1::verification_only();
    let msg = Message::from_digest(address_digest(address));
    let Ok(public) = key.to_public_key() else {
        return false;
    };
    let Ok(sig) = Signature::from_compact(&signature.0) else {
        return false;
    };
    secp.verify_ecdsa(&msg, &sig, &public).is_ok()
}

fn address_digest(address: &ScriptHash) -> [u8; 32] {
    let mut buf = Vec::with_capacity(GROUP_SIGN_DOMAIN_V1.len() + 20);
    buf.extend_from_slice(GROUP_SIGN_DOMAIN_V1);
    buf.extend_from_slice(address.as_bytes());
    *blake3::hash(&buf).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_address() {
        let key = GroupKeypair::generate();
        let address = ScriptHash::new([9u8; 20]);
        let sig = key.sign_address(&address);
        assert!(verify_address_signature(&key.public_key(), &address, &sig));

        let other = ScriptHash::new([8u8; 20]);
        assert!(!verify_address_signature(&key.public_key(), &other, &sig));
    }

    #[test]
    fn signing_is_deterministic() {
        let key = GroupKeypair::generate();
        let address = ScriptHash::new([3u8; 20]);
        assert_eq!(key.sign_address(&address).as_bytes(), key.sign_address(&address).as_bytes());
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let key = GroupKeypair::generate();
        let text = key.public_key().to_string();
        assert_eq!(GroupPublicKey::from_hex(&text).unwrap(), key.public_key());
    }

    #[test]
    fn rejects_invalid_point() {
        assert!(GroupPublicKey::from_bytes([0u8; 33]).is_err());
    }

    #[test]
    fn keypair_from_secret_bytes_is_stable() {
        let a = GroupKeypair::from_secret_bytes(&[7u8; 32]).unwrap();
        let b = GroupKeypair::from_secret_bytes(&[7u8; 32]).unwrap();
        assert_eq!(a.public_key(), b.public_key());

        let address = ScriptHash::new([1u8; 20]);
        assert!(verify_address_signature(&b.public_key(), &address, &a.sign_address(&address)));

        assert!(GroupKeypair::from_secret_bytes(&[0u8; 32]).is_err());
    }
}
