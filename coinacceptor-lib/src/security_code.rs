//! Security code derivation.
//!
//! A security code is a small offset added to a fixed price so that several
//! payments can share one receiving address without being confused for one
//! another. Both the side that quotes the amount and the side that watches
//! for it recompute the code from the payment identity, so nothing needs to
//! be stored.
//!
//! MD5 is used because it is fast and the result is reduced to a handful of
//! bits anyway. The code is an obfuscation, not a commitment: anyone who
//! knows the identity can compute it.

use crate::{AcceptorError, Result};

/// Default modulus: codes fall in `0..1000`.
pub const DEFAULT_SECURITY_MODULUS: u64 = 1000;

/// Reduce the MD5 digest of `input` modulo `modulus`.
///
/// The digest is read as a 128-bit big-endian unsigned integer, which keeps
/// the result identical across platforms.
pub(crate) fn digest_mod(input: &[u8], modulus: u64) -> u64 {
    let digest = md5::compute(input);
    (u128::from_be_bytes(digest.0) % u128::from(modulus)) as u64
}

/// Derive the security code for `identity` at `epoch`.
///
/// The identity's UTF-8 bytes are concatenated with the decimal form of
/// `epoch`, hashed, and reduced into `0..modulus`. `epoch` is free for the
/// caller to use as a retry counter or a coarse time bucket; payment matching
/// always uses epoch 0.
///
/// # Errors
///
/// Returns [`AcceptorError::InvalidData`] when `modulus` is zero.
///
/// # Example
///
/// ```
/// use coinacceptor_lib::security_code::derive;
///
/// let code = derive("cab41de5-ad64-446d-9ab4-6dc794162bfc", 0, 1000).unwrap();
/// assert_eq!(code, 721);
/// ```
pub fn derive(identity: &str, epoch: i64, modulus: u64) -> Result<u64> {
    if modulus == 0 {
        return Err(AcceptorError::invalid_data(
            "security_modulus",
            "must be greater than zero",
        ));
    }
    let hashable = format!("{}{}", identity, epoch);
    Ok(digest_mod(hashable.as_bytes(), modulus))
}
