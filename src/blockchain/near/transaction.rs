// NEAR transaction building and signing.
//
// Transactions are borsh-encoded by hand; only the handful of actions a token
// deployment needs are supported.
//
// Transaction:
//   [signer_id: string] [public_key: u8 tag + 32] [nonce: u64]
//   [receiver_id: string] [block_hash: 32] [actions: u32 len + action*]
// SignedTransaction:
//   [transaction] [signature: u8 tag + 64]
//
// The signature covers sha256(borsh(transaction)).

use sha2::{Digest, Sha256};

use super::keys::NearKeyPair;

const ED25519_KEY_TYPE: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NearAction {
    CreateAccount,
    DeployContract {
        code: Vec<u8>,
    },
    FunctionCall {
        method_name: String,
        args: Vec<u8>,
        gas: u64,
        deposit: u128,
    },
    Transfer {
        deposit: u128,
    },
}

impl NearAction {
    fn variant_index(&self) -> u8 {
        match self {
            NearAction::CreateAccount => 0,
            NearAction::DeployContract { .. } => 1,
            NearAction::FunctionCall { .. } => 2,
            NearAction::Transfer { .. } => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearTransaction {
    pub signer_id: String,
    pub public_key: [u8; 32],
    pub nonce: u64,
    pub receiver_id: String,
    pub block_hash: [u8; 32],
    pub actions: Vec<NearAction>,
}

fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_u32(out, bytes.len() as u32);
    out.extend_from_slice(bytes);
}

fn write_action(out: &mut Vec<u8>, action: &NearAction) {
    out.push(action.variant_index());
    match action {
        NearAction::CreateAccount => {}
        NearAction::DeployContract { code } => write_bytes(out, code),
        NearAction::FunctionCall {
            method_name,
            args,
            gas,
            deposit,
        } => {
            write_bytes(out, method_name.as_bytes());
            write_bytes(out, args);
            out.extend_from_slice(&gas.to_le_bytes());
            out.extend_from_slice(&deposit.to_le_bytes());
        }
        NearAction::Transfer { deposit } => out.extend_from_slice(&deposit.to_le_bytes()),
    }
}

impl NearTransaction {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_bytes(&mut out, self.signer_id.as_bytes());
        out.push(ED25519_KEY_TYPE);
        out.extend_from_slice(&self.public_key);
        out.extend_from_slice(&self.nonce.to_le_bytes());
        write_bytes(&mut out, self.receiver_id.as_bytes());
        out.extend_from_slice(&self.block_hash);
        write_u32(&mut out, self.actions.len() as u32);
        for action in &self.actions {
            write_action(&mut out, action);
        }
        out
    }

    pub fn hash(&self) -> [u8; 32] {
        Sha256::digest(self.encode()).into()
    }

    /// Signs the transaction, returning the borsh-encoded signed form and
    /// the transaction hash (base58, as explorers show it).
    pub fn sign(&self, keys: &NearKeyPair) -> (Vec<u8>, String) {
        let encoded = self.encode();
        let hash: [u8; 32] = Sha256::digest(&encoded).into();
        let signature = keys.sign(&hash);

        let mut signed = encoded;
        signed.push(ED25519_KEY_TYPE);
        signed.extend_from_slice(&signature);
        (signed, bs58::encode(hash).into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NearTransaction {
        NearTransaction {
            signer_id: "alice.testnet".into(),
            public_key: [7u8; 32],
            nonce: 5,
            receiver_id: "mtk-token.alice.testnet".into(),
            block_hash: [9u8; 32],
            actions: vec![
                NearAction::CreateAccount,
                NearAction::Transfer { deposit: 1 },
                NearAction::DeployContract { code: vec![0, 97, 115, 109] },
            ],
        }
    }

    #[test]
    fn borsh_layout_of_header_and_actions() {
        let bytes = sample().encode();
        assert_eq!(&bytes[0..4], &13u32.to_le_bytes());
        assert_eq!(&bytes[4..17], b"alice.testnet");
        assert_eq!(bytes[17], ED25519_KEY_TYPE);
        assert_eq!(&bytes[18..50], &[7u8; 32]);
        assert_eq!(&bytes[50..58], &5u64.to_le_bytes());

        // receiver (4 + 23) + block hash (32) + action count (4)
        let actions_at = 58 + 4 + 23 + 32 + 4;
        assert_eq!(&bytes[actions_at - 4..actions_at], &3u32.to_le_bytes());
        assert_eq!(bytes[actions_at], 0);
        assert_eq!(bytes[actions_at + 1], 3);
        assert_eq!(&bytes[actions_at + 2..actions_at + 18], &1u128.to_le_bytes());
        assert_eq!(bytes[actions_at + 18], 1);
        assert_eq!(&bytes[actions_at + 19..actions_at + 23], &4u32.to_le_bytes());
        assert_eq!(bytes.len(), actions_at + 23 + 4);
    }

    #[test]
    fn function_call_encoding() {
        let mut out = Vec::new();
        write_action(
            &mut out,
            &NearAction::FunctionCall {
                method_name: "new".into(),
                args: b"{}".to_vec(),
                gas: 300_000_000_000_000,
                deposit: 0,
            },
        );
        assert_eq!(out[0], 2);
        assert_eq!(&out[1..5], &3u32.to_le_bytes());
        assert_eq!(&out[5..8], b"new");
        assert_eq!(&out[8..12], &2u32.to_le_bytes());
        assert_eq!(&out[14..22], &300_000_000_000_000u64.to_le_bytes());
        assert_eq!(out.len(), 22 + 16);
    }

    #[test]
    fn signature_verifies_over_the_hash() {
        use ed25519_dalek::{Signature, Verifier, VerifyingKey};

        let keys = NearKeyPair::from_seed_phrase(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
        )
        .unwrap();
        let mut tx = sample();
        tx.public_key = keys.public_key_bytes();

        let (signed, hash_b58) = tx.sign(&keys);
        let unsigned_len = tx.encode().len();
        assert_eq!(signed.len(), unsigned_len + 65);
        assert_eq!(bs58::decode(&hash_b58).into_vec().unwrap(), tx.hash().to_vec());

        let mut sig = [0u8; 64];
        sig.copy_from_slice(&signed[unsigned_len + 1..]);
        let verifying = VerifyingKey::from_bytes(&keys.public_key_bytes()).unwrap();
        assert!(verifying
            .verify(&tx.hash(), &Signature::from_bytes(&sig))
            .is_ok());
    }
}
