//! ECDSA signature operations using secp256k1

use crate::{keccak256, CryptoError};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use std::cmp::Ordering;
use strata_primitives::{Address, H256};

/// Half of the secp256k1 curve order (n/2)
pub const SECP256K1_N_DIV_2: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D,
    0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Full secp256k1 curve order (n)
pub const SECP256K1_N: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B,
    0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Public key
pub type PublicKey = VerifyingKey;

/// Private key (32 bytes)
pub type PrivateKey = SigningKey;

/// Recoverable ECDSA signature. `v` is the raw recovery id (0 or 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
    /// recovery id (0 or 1)
    pub v: u8,
}

impl Signature {
    /// Create signature from r, s, v components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Signature { r, s, v }
    }

    /// `0 < r < n` and `0 < s < n`
    pub fn has_valid_scalars(&self) -> bool {
        let zero = [0u8; 32];
        self.r != zero
            && self.s != zero
            && self.r.cmp(&SECP256K1_N) == Ordering::Less
            && self.s.cmp(&SECP256K1_N) == Ordering::Less
    }

    /// Check if signature has low-s value (EIP-2)
    pub fn is_low_s(&self) -> bool {
        self.s.cmp(&SECP256K1_N_DIV_2) != Ordering::Greater
    }
}

/// n - s, used to move between the two s values of a signature
fn subtract_from_n(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: u16 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_N[i] as u16)
            .wrapping_sub(s[i] as u16)
            .wrapping_sub(borrow);
        result[i] = diff as u8;
        borrow = if diff > 255 { 1 } else { 0 };
    }

    result
}

/// Sign a message hash with a private key, producing a low-s signature
pub fn sign(message_hash: &H256, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (signature, mut recovery_id) = private_key
        .sign_prehash_recoverable(message_hash.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let r_bytes: [u8; 32] = signature.r().to_bytes().into();
    let mut s_bytes: [u8; 32] = signature.s().to_bytes().into();

    if s_bytes.cmp(&SECP256K1_N_DIV_2) == Ordering::Greater {
        s_bytes = subtract_from_n(&s_bytes);
        recovery_id = RecoveryId::try_from(recovery_id.to_byte() ^ 1)
            .map_err(|_| CryptoError::SigningFailed("recovery id out of range".to_string()))?;
    }

    Ok(Signature {
        r: r_bytes,
        s: s_bytes,
        v: recovery_id.to_byte(),
    })
}

/// Recover the public key from a signature and message hash.
///
/// Accepts high-s signatures (Frontier transactions and the ecrecover
/// precompile allow them): the signature is flipped to its low-s twin
/// together with the recovery parity, which recovers the same key.
pub fn recover_public_key(
    message_hash: &H256,
    signature: &Signature,
) -> Result<PublicKey, CryptoError> {
    if signature.v > 1 {
        return Err(CryptoError::InvalidRecoveryId(signature.v));
    }
    if !signature.has_valid_scalars() {
        return Err(CryptoError::InvalidSignature(
            "r or s out of range".to_string(),
        ));
    }

    let (s, v) = if signature.is_low_s() {
        (signature.s, signature.v)
    } else {
        (subtract_from_n(&signature.s), signature.v ^ 1)
    };

    let r: k256::FieldBytes = signature.r.into();
    let s: k256::FieldBytes = s.into();
    let k256_sig = K256Signature::from_scalars(r, s)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let recovery_id = RecoveryId::try_from(v).map_err(|_| CryptoError::InvalidRecoveryId(v))?;

    VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &k256_sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// Recover the signer address of `message_hash`
pub fn recover_address(message_hash: &H256, signature: &Signature) -> Result<Address, CryptoError> {
    recover_public_key(message_hash, signature).map(|key| public_key_to_address(&key))
}

/// Derive the account address from a public key
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    // Uncompressed point is 0x04 || x || y; the address hashes x || y
    let encoded = public_key.to_encoded_point(false);
    Address::from_hash(&keccak256(&encoded.as_bytes()[1..]))
}
