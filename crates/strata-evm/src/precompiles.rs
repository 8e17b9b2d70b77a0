//! Precompiled contracts at addresses 0x01..=0x09
//!
//! | Address | Contract | Since |
//! |---------|----------|-------|
//! | 0x01 | ecrecover | Frontier |
//! | 0x02 | sha256 | Frontier |
//! | 0x03 | ripemd160 | Frontier |
//! | 0x04 | identity | Frontier |
//! | 0x05 | modexp | Byzantium |
//! | 0x06 | bn256 add | Byzantium |
//! | 0x07 | bn256 scalar mul | Byzantium |
//! | 0x08 | bn256 pairing | Byzantium |
//! | 0x09 | blake2f | Istanbul |

use crate::error::ExceptionalHalt;
use crate::frame::Frame;
use crate::gas::{cost, words};
use crate::memory::buffer_read;
use crate::stack::to_usize;
use bytes::Bytes;
use strata_crypto::{blake2, bn128, ripemd160, sha256, CryptoError, Signature};
use strata_forks::ForkRules;
use strata_primitives::{H256, U256};

impl From<CryptoError> for ExceptionalHalt {
    fn from(err: CryptoError) -> Self {
        ExceptionalHalt::Precompile(err.to_string())
    }
}

/// Run precompile number `index` on the frame's call data
pub fn execute(index: u8, rules: &ForkRules, frame: &mut Frame) -> Result<(), ExceptionalHalt> {
    let input = frame.message.data.clone();
    let output = match index {
        1 => ecrecover(frame, &input)?,
        2 => {
            frame.charge(cost::SHA256 + cost::SHA256_WORD * words(input.len()))?;
            sha256(&input).to_vec()
        }
        3 => {
            frame.charge(cost::RIPEMD160 + cost::RIPEMD160_WORD * words(input.len()))?;
            let mut word = vec![0u8; 12];
            word.extend_from_slice(&ripemd160(&input));
            word
        }
        4 => {
            frame.charge(cost::IDENTITY + cost::IDENTITY_WORD * words(input.len()))?;
            input.to_vec()
        }
        5 => modexp(rules, frame, &input)?,
        6 => {
            frame.charge(rules.gas.bn_add)?;
            bn128::add(&input)?.to_vec()
        }
        7 => {
            frame.charge(rules.gas.bn_mul)?;
            bn128::mul(&input)?.to_vec()
        }
        8 => {
            let pairs = (input.len() / bn128::PAIR_SIZE) as u64;
            frame.charge(
                rules
                    .gas
                    .bn_pairing_base
                    .saturating_add(rules.gas.bn_pairing_per_pair.saturating_mul(pairs)),
            )?;
            let valid = bn128::pairing(&input)?;
            let mut word = [0u8; 32];
            word[31] = valid as u8;
            word.to_vec()
        }
        9 => {
            let rounds = blake2::rounds(&input)?;
            frame.charge(cost::BLAKE2_ROUND * rounds as u64)?;
            blake2::compress_input(&input)?.to_vec()
        }
        other => {
            return Err(ExceptionalHalt::Precompile(format!(
                "no precompile at 0x{:02x}",
                other
            )))
        }
    };
    frame.output = Bytes::from(output);
    frame.running = false;
    Ok(())
}

/// ecrecover: malformed signatures succeed with empty output
fn ecrecover(frame: &mut Frame, input: &[u8]) -> Result<Vec<u8>, ExceptionalHalt> {
    frame.charge(cost::ECRECOVER)?;
    let data = buffer_read(input, U256::zero(), 128);

    let v = U256::from_big_endian(&data[32..64]);
    if v != U256::from(27) && v != U256::from(28) {
        return Ok(Vec::new());
    }
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&data[64..96]);
    s.copy_from_slice(&data[96..128]);
    let signature = Signature::new(r, s, v.low_u32() as u8 - 27);
    if !signature.has_valid_scalars() {
        return Ok(Vec::new());
    }

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&data[0..32]);
    match strata_crypto::recover_address(&H256::from_bytes(hash), &signature) {
        Ok(address) => {
            let mut word = vec![0u8; 12];
            word.extend_from_slice(address.as_bytes());
            Ok(word)
        }
        Err(_) => Ok(Vec::new()),
    }
}

fn modexp(rules: &ForkRules, frame: &mut Frame, input: &[u8]) -> Result<Vec<u8>, ExceptionalHalt> {
    let base_len = U256::from_big_endian(&buffer_read(input, U256::zero(), 32));
    let exp_len = U256::from_big_endian(&buffer_read(input, U256::from(32), 32));
    let mod_len = U256::from_big_endian(&buffer_read(input, U256::from(64), 32));

    let exp_start = base_len.saturating_add(U256::from(96));
    let head_len = if exp_len < U256::from(32) {
        exp_len.low_u64() as usize
    } else {
        32
    };
    let exp_head = U256::from_big_endian(&buffer_read(input, exp_start, head_len));

    frame.charge(modexp_gas(rules, base_len, exp_len, mod_len, exp_head))?;
    if base_len.is_zero() && mod_len.is_zero() {
        return Ok(Vec::new());
    }

    let sizes = (to_usize(&base_len), to_usize(&exp_len), to_usize(&mod_len));
    let (Some(base_size), Some(exp_size), Some(mod_size)) = sizes else {
        return Err(ExceptionalHalt::OutOfGas);
    };
    let base = buffer_read(input, U256::from(96), base_size);
    let exponent = buffer_read(input, exp_start, exp_size);
    let modulus = buffer_read(input, exp_start.saturating_add(exp_len), mod_size);
    Ok(strata_crypto::modexp::modexp(&base, &exponent, &modulus))
}

/// EIP-198 pricing, or EIP-2565 once repriced
fn modexp_gas(
    rules: &ForkRules,
    base_len: U256,
    exp_len: U256,
    mod_len: U256,
    exp_head: U256,
) -> u64 {
    let max_len = base_len.max(mod_len);

    let head_bits = U256::from(exp_head.bits().saturating_sub(1));
    let iterations = if exp_len <= U256::from(32) {
        head_bits
    } else {
        U256::from(8)
            .saturating_mul(exp_len - U256::from(32))
            .saturating_add(head_bits)
    }
    .max(U256::one());

    let gas = if rules.modexp_repriced {
        let words = max_len.saturating_add(U256::from(7)) / 8;
        let complexity = words.saturating_mul(words);
        (complexity.saturating_mul(iterations) / 3).max(U256::from(200))
    } else {
        let x = max_len;
        let square = x.saturating_mul(x);
        let complexity = if x <= U256::from(64) {
            square
        } else if x <= U256::from(1024) {
            square / 4 + x * 96 - 3072
        } else {
            (square / 16)
                .saturating_add(x.saturating_mul(U256::from(480)))
                .saturating_sub(U256::from(199_680))
        };
        complexity.saturating_mul(iterations) / 20
    };

    if gas.bits() > 64 {
        u64::MAX
    } else {
        gas.low_u64()
    }
}
