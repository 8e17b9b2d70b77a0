//! alt_bn128 point addition, scalar multiplication and pairing check
//! (EIP-196 / EIP-197), on top of `substrate-bn`.

use crate::CryptoError;
use bn::{AffineG1, AffineG2, Fq, Fq2, Fr, Group, Gt, G1, G2};

/// Bytes per pairing input pair: G1 (64) + G2 (128)
pub const PAIR_SIZE: usize = 192;

fn right_pad<const N: usize>(input: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    let len = input.len().min(N);
    buf[..len].copy_from_slice(&input[..len]);
    buf
}

fn read_fq(bytes: &[u8]) -> Result<Fq, CryptoError> {
    Fq::from_slice(bytes).map_err(|_| CryptoError::InvalidFieldElement)
}

/// Decode a G1 point from 64 bytes; `(0, 0)` is the point at infinity.
fn read_g1(bytes: &[u8]) -> Result<G1, CryptoError> {
    let x = read_fq(&bytes[0..32])?;
    let y = read_fq(&bytes[32..64])?;
    if x == Fq::zero() && y == Fq::zero() {
        return Ok(G1::zero());
    }
    AffineG1::new(x, y)
        .map(Into::into)
        .map_err(|_| CryptoError::InvalidCurvePoint)
}

/// Decode a G2 point from 128 bytes, each coordinate as `(imaginary, real)`.
fn read_g2(bytes: &[u8]) -> Result<G2, CryptoError> {
    let x_im = read_fq(&bytes[0..32])?;
    let x_re = read_fq(&bytes[32..64])?;
    let y_im = read_fq(&bytes[64..96])?;
    let y_re = read_fq(&bytes[96..128])?;
    let x = Fq2::new(x_re, x_im);
    let y = Fq2::new(y_re, y_im);
    if x == Fq2::zero() && y == Fq2::zero() {
        return Ok(G2::zero());
    }
    AffineG2::new(x, y)
        .map(Into::into)
        .map_err(|_| CryptoError::InvalidCurvePoint)
}

fn write_g1(point: G1) -> Result<[u8; 64], CryptoError> {
    let mut out = [0u8; 64];
    if let Some(affine) = AffineG1::from_jacobian(point) {
        affine
            .x()
            .to_big_endian(&mut out[0..32])
            .map_err(|_| CryptoError::InvalidFieldElement)?;
        affine
            .y()
            .to_big_endian(&mut out[32..64])
            .map_err(|_| CryptoError::InvalidFieldElement)?;
    }
    Ok(out)
}

/// ECADD: input is two G1 points, zero-padded to 128 bytes.
pub fn add(input: &[u8]) -> Result<[u8; 64], CryptoError> {
    let input = right_pad::<128>(input);
    let p1 = read_g1(&input[0..64])?;
    let p2 = read_g1(&input[64..128])?;
    write_g1(p1 + p2)
}

/// ECMUL: input is a G1 point and a scalar, zero-padded to 96 bytes.
pub fn mul(input: &[u8]) -> Result<[u8; 64], CryptoError> {
    let input = right_pad::<96>(input);
    let p = read_g1(&input[0..64])?;
    let scalar = Fr::from_slice(&input[64..96]).map_err(|_| CryptoError::InvalidFieldElement)?;
    write_g1(p * scalar)
}

/// ECPAIRING: true when the product of pairings over all pairs is one.
pub fn pairing(input: &[u8]) -> Result<bool, CryptoError> {
    if input.len() % PAIR_SIZE != 0 {
        return Err(CryptoError::InvalidInputLength(input.len()));
    }

    let mut pairs = Vec::with_capacity(input.len() / PAIR_SIZE);
    for chunk in input.chunks(PAIR_SIZE) {
        let g1 = read_g1(&chunk[0..64])?;
        let g2 = read_g2(&chunk[64..192])?;
        pairs.push((g1, g2));
    }

    if pairs.is_empty() {
        return Ok(true);
    }
    Ok(bn::pairing_batch(&pairs) == Gt::one())
}
