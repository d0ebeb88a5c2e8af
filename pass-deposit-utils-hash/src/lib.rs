// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Checksums for package resources.
//!
//! A [`Hash`] is an algorithm tag plus its digest bytes. Hashes render as
//! lowercase hex (the form used in BagIt manifests) or base64 (the form
//! used in HTTP `Digest`/`Content-MD5` headers), and serialize as
//! `<algorithm>:<hex>`.

use std::fmt as sfmt;
use std::str::FromStr;

use data_encoding::{BASE64, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::Digest as _;
use thiserror::Error;

mod algo;
mod hashing_reader;

pub use algo::{Algorithm, UnknownAlgorithm};
pub use hashing_reader::{Digests, HashingReader};

const LARGEST_ALGORITHM: Algorithm = Algorithm::LARGEST;

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("{algorithm} digest must be {} bytes, got {length}", algorithm.size())]
pub struct InvalidHashError {
    algorithm: Algorithm,
    length: usize,
}

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ParseHashError {
    #[error("hash '{0}' is missing an algorithm prefix")]
    MissingAlgorithm(String),
    #[error(transparent)]
    Algorithm(#[from] UnknownAlgorithm),
    #[error("invalid hex digest: {0}")]
    Hex(#[from] data_encoding::DecodeError),
    #[error(transparent)]
    Length(#[from] InvalidHashError),
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Hash {
    algorithm: Algorithm,
    data: [u8; LARGEST_ALGORITHM.size()],
}

impl Hash {
    /// Wraps digest bytes that are known to match `algorithm`'s size.
    pub(crate) fn new(algorithm: Algorithm, digest: &[u8]) -> Hash {
        let mut data = [0u8; LARGEST_ALGORITHM.size()];
        data[..algorithm.size()].copy_from_slice(digest);
        Hash { algorithm, data }
    }

    pub fn from_slice(algorithm: Algorithm, digest: &[u8]) -> Result<Hash, InvalidHashError> {
        match digest.len() {
            length if length == algorithm.size() => Ok(Hash::new(algorithm, digest)),
            length => Err(InvalidHashError { algorithm, length }),
        }
    }

    /// Parses a bare hex digest for a known algorithm.
    pub fn from_hex(algorithm: Algorithm, hex: &str) -> Result<Hash, ParseHashError> {
        let bytes = HEXLOWER_PERMISSIVE.decode(hex.as_bytes())?;
        Ok(Hash::from_slice(algorithm, &bytes)?)
    }

    #[inline]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[inline]
    pub fn digest_bytes(&self) -> &[u8] {
        &self.data[..self.algorithm.size()]
    }

    pub fn to_hex(&self) -> String {
        HEXLOWER_PERMISSIVE.encode(self.digest_bytes())
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.digest_bytes())
    }
}

impl std::ops::Deref for Hash {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        self.digest_bytes()
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        self.digest_bytes()
    }
}

impl sfmt::Display for Hash {
    fn fmt(&self, f: &mut sfmt::Formatter<'_>) -> sfmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl sfmt::Debug for Hash {
    fn fmt(&self, f: &mut sfmt::Formatter<'_>) -> sfmt::Result {
        f.debug_tuple("Hash").field(&self.to_string()).finish()
    }
}

impl FromStr for Hash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, hex) = s
            .split_once(':')
            .ok_or_else(|| ParseHashError::MissingAlgorithm(s.to_owned()))?;
        Hash::from_hex(algorithm.parse()?, hex)
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

enum InnerContext {
    MD5(md5::Context),
    SHA1(sha1::Sha1),
    SHA256(sha2::Sha256),
    SHA512(sha2::Sha512),
}

/// Incremental digest over a resource that arrives in pieces.
///
/// ```
/// use pass_deposit_utils_hash::{Algorithm, Context};
///
/// let mut ctx = Context::new(Algorithm::MD5);
/// for chunk in ["manu", "script", ".pdf"] {
///     ctx.update(chunk);
/// }
/// assert_eq!(ctx.finish(), Algorithm::MD5.digest("manuscript.pdf"));
/// ```
pub struct Context(Algorithm, InnerContext);

impl Context {
    pub fn new(algorithm: Algorithm) -> Self {
        let inner = match algorithm {
            Algorithm::MD5 => InnerContext::MD5(md5::Context::new()),
            Algorithm::SHA1 => InnerContext::SHA1(sha1::Sha1::new()),
            Algorithm::SHA256 => InnerContext::SHA256(sha2::Sha256::new()),
            Algorithm::SHA512 => InnerContext::SHA512(sha2::Sha512::new()),
        };
        Context(algorithm, inner)
    }

    /// Feeds another chunk into the running digest.
    pub fn update<D: AsRef<[u8]>>(&mut self, chunk: D) {
        let chunk = chunk.as_ref();
        match &mut self.1 {
            InnerContext::MD5(ctx) => ctx.consume(chunk),
            InnerContext::SHA1(ctx) => ctx.update(chunk),
            InnerContext::SHA256(ctx) => ctx.update(chunk),
            InnerContext::SHA512(ctx) => ctx.update(chunk),
        }
    }

    /// Consumes the context, producing the digest of everything fed so far.
    pub fn finish(self) -> Hash {
        let algorithm = self.0;
        match self.1 {
            InnerContext::MD5(ctx) => Hash::new(algorithm, &ctx.finalize().0),
            InnerContext::SHA1(ctx) => Hash::new(algorithm, &ctx.finalize()),
            InnerContext::SHA256(ctx) => Hash::new(algorithm, &ctx.finalize()),
            InnerContext::SHA512(ctx) => Hash::new(algorithm, &ctx.finalize()),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.0
    }
}

impl sfmt::Debug for Context {
    fn fmt(&self, f: &mut sfmt::Formatter<'_>) -> sfmt::Result {
        f.debug_struct("Context")
            .field("algorithm", &self.0)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod unittests {
    use hex_literal::hex;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::md5(Algorithm::MD5, &hex!("900150983cd24fb0d6963f7d28e17f72"))]
    #[case::sha1(Algorithm::SHA1, &hex!("a9993e364706816aba3e25717850c26c9cd0d89d"))]
    #[case::sha256(
        Algorithm::SHA256,
        &hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    )]
    #[case::sha512(
        Algorithm::SHA512,
        &hex!("ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f")
    )]
    fn digest_abc(#[case] algorithm: Algorithm, #[case] expected: &[u8]) {
        let hash = algorithm.digest("abc");
        assert_eq!(hash.digest_bytes(), expected);

        let mut ctx = Context::new(algorithm);
        ctx.update("a");
        ctx.update("bc");
        assert_eq!(ctx.finish(), hash);
    }

    #[test]
    fn display_and_parse() {
        let hash = Algorithm::MD5.digest("abc");
        let rendered = hash.to_string();
        assert_eq!(rendered, "md5:900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(rendered.parse::<Hash>().unwrap(), hash);
    }

    #[test]
    fn base64_rendering() {
        let hash = Algorithm::MD5.digest("abc");
        assert_eq!(hash.to_base64(), "kAFQmDzST7DWlj99KOF/cg==");
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = Hash::from_hex(Algorithm::SHA256, "00ff").unwrap_err();
        assert!(matches!(err, ParseHashError::Length(_)));
    }

    #[rstest]
    #[case::short(Algorithm::MD5, 15)]
    #[case::long(Algorithm::SHA1, 21)]
    #[case::empty(Algorithm::SHA512, 0)]
    fn mismatched_digest_length_is_an_error(#[case] algorithm: Algorithm, #[case] length: usize) {
        let err = Hash::from_slice(algorithm, &vec![0u8; length]).unwrap_err();
        assert_eq!(err, InvalidHashError { algorithm, length });
    }

    #[test]
    fn missing_prefix_is_rejected() {
        let err = "900150983cd24fb0d6963f7d28e17f72".parse::<Hash>().unwrap_err();
        assert!(matches!(err, ParseHashError::MissingAlgorithm(_)));
    }

    #[test]
    fn serde_round_trip() {
        let hash = Algorithm::SHA1.digest("abc");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, r#""sha1:a9993e364706816aba3e25717850c26c9cd0d89d""#);
        assert_eq!(serde_json::from_str::<Hash>(&json).unwrap(), hash);
    }
}
