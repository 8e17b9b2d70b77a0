//! Big-integer modular exponentiation (EIP-198).

use num_bigint::BigUint;

/// `base ^ exponent mod modulus`, left-padded to `modulus.len()` bytes.
///
/// All operands are big-endian. A zero modulus yields all-zero output.
pub fn modexp(base: &[u8], exponent: &[u8], modulus: &[u8]) -> Vec<u8> {
    let out_len = modulus.len();
    let modulus = BigUint::from_bytes_be(modulus);
    if modulus == BigUint::from(0u8) {
        return vec![0u8; out_len];
    }

    let base = BigUint::from_bytes_be(base);
    let exponent = BigUint::from_bytes_be(exponent);
    let result = base.modpow(&exponent, &modulus).to_bytes_be();

    let mut out = vec![0u8; out_len];
    // result < modulus, so it always fits
    out[out_len - result.len()..].copy_from_slice(&result);
    out
}
