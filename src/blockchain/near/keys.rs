// src/blockchain/near/keys.rs

use bip39::{Language, Mnemonic};
use ed25519_dalek::{Signer, SigningKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::{ActionError, ActionResult};

type HmacSha512 = Hmac<Sha512>;

const HARDENED: u32 = 0x8000_0000;

/// BIP44 path NEAR wallets derive their first key from: m/44'/397'/0'.
pub const NEAR_DERIVATION_PATH: [u32; 3] = [44, 397, 0];

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> ActionResult<Zeroizing<[u8; 64]>> {
    let mut mac = HmacSha512::new_from_slice(key).map_err(|e| ActionError::Signing(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// SLIP-10 ed25519 derivation. Every index is hardened.
pub fn derive_ed25519(seed: &[u8], path: &[u32]) -> ActionResult<Zeroizing<[u8; 32]>> {
    let node = hmac_sha512(b"ed25519 seed", &[seed])?;
    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&node[..32]);
    chain_code.copy_from_slice(&node[32..]);

    for index in path {
        let index_bytes = (index | HARDENED).to_be_bytes();
        let node = hmac_sha512(&chain_code[..], &[&[0u8][..], &key[..], &index_bytes[..]])?;
        key.copy_from_slice(&node[..32]);
        chain_code.copy_from_slice(&node[32..]);
    }
    Ok(key)
}

/// An ed25519 signing key for a NEAR account.
pub struct NearKeyPair {
    signing_key: SigningKey,
}

impl std::fmt::Debug for NearKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearKeyPair")
            .field("public_key", &self.public_key())
            .finish()
    }
}

impl NearKeyPair {
    /// Accepts either a BIP39 seed phrase or an `ed25519:<base58>` secret key.
    pub fn from_setting(value: &str) -> ActionResult<Self> {
        let value = value.trim();
        if value.starts_with("ed25519:") {
            Self::from_secret_key(value)
        } else {
            Self::from_seed_phrase(value)
        }
    }

    pub fn from_seed_phrase(phrase: &str) -> ActionResult<Self> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
            .map_err(|e| ActionError::Signing(format!("invalid seed phrase: {}", e)))?;
        let seed = Zeroizing::new(mnemonic.to_seed(""));
        let secret = derive_ed25519(&seed[..], &NEAR_DERIVATION_PATH)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    /// `ed25519:` followed by base58 of either the 32-byte seed or the
    /// 64-byte seed+public key form wallets export.
    pub fn from_secret_key(encoded: &str) -> ActionResult<Self> {
        let body = encoded
            .strip_prefix("ed25519:")
            .ok_or_else(|| ActionError::Signing("secret key must start with 'ed25519:'".into()))?;
        let bytes = Zeroizing::new(
            bs58::decode(body)
                .into_vec()
                .map_err(|e| ActionError::Signing(format!("invalid base58 secret key: {}", e)))?,
        );
        if bytes.len() != 32 && bytes.len() != 64 {
            return Err(ActionError::Signing(format!(
                "secret key must be 32 or 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&bytes[..32]);
        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// `ed25519:<base58>`, the form NEAR RPC expects.
    pub fn public_key(&self) -> String {
        format!("ed25519:{}", bs58::encode(self.public_key_bytes()).into_string())
    }

    /// The implicit account id: lowercase hex of the public key.
    pub fn implicit_account_id(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// Decides which account a deployment is signed by and owned by.
pub trait AccountIdentity: Send + Sync {
    fn resolve(&self, keys: &NearKeyPair) -> ActionResult<String>;
}

/// A named account configured by the operator.
#[derive(Debug, Clone)]
pub struct NamedAccount(pub String);

impl AccountIdentity for NamedAccount {
    fn resolve(&self, _keys: &NearKeyPair) -> ActionResult<String> {
        let id = self.0.trim().to_lowercase();
        if !is_valid_account_id(&id) {
            return Err(ActionError::invalid("account id", format!("'{}' is not a valid NEAR account id", self.0)));
        }
        Ok(id)
    }
}

/// The implicit account owned by the signing key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImplicitAccount;

impl AccountIdentity for ImplicitAccount {
    fn resolve(&self, keys: &NearKeyPair) -> ActionResult<String> {
        Ok(keys.implicit_account_id())
    }
}

/// NEAR account id rules: 2..=64 chars of `[a-z0-9_-]` parts joined by dots,
/// no leading, trailing or doubled separators.
pub fn is_valid_account_id(id: &str) -> bool {
    if id.len() < 2 || id.len() > 64 {
        return false;
    }
    id.split('.').all(|part| {
        !part.is_empty()
            && part
                .split(|c| c == '-' || c == '_')
                .all(|chunk| !chunk.is_empty() && chunk.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
    })
}
