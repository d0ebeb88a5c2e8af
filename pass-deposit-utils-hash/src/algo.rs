// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Context, Hash};

/// A checksum algorithm a package resource can be digested with.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Display, Default, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub enum Algorithm {
    #[display("md5")]
    MD5,
    #[display("sha1")]
    SHA1,
    #[default]
    #[display("sha256")]
    SHA256,
    #[display("sha512")]
    SHA512,
}

impl Algorithm {
    /// The largest supported algorithm size in bytes
    pub(crate) const LARGEST: Algorithm = Algorithm::SHA512;

    /// Every supported algorithm, weakest first.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::MD5,
        Algorithm::SHA1,
        Algorithm::SHA256,
        Algorithm::SHA512,
    ];

    /// Digest length in bytes.
    pub const fn size(&self) -> usize {
        match self {
            Algorithm::MD5 => 16,
            Algorithm::SHA1 => 20,
            Algorithm::SHA256 => 32,
            Algorithm::SHA512 => 64,
        }
    }

    /// One-shot digest of `data`.
    ///
    /// ```
    /// # use pass_deposit_utils_hash::Algorithm;
    /// let hash = Algorithm::SHA256.digest("abc");
    ///
    /// assert_eq!(
    ///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
    ///     hash.to_hex()
    /// );
    /// ```
    pub fn digest<B: AsRef<[u8]>>(&self, data: B) -> Hash {
        let mut ctx = Context::new(*self);
        ctx.update(data);
        ctx.finish()
    }
}

#[derive(Error, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
#[error("unsupported digest algorithm '{0}'")]
pub struct UnknownAlgorithm(pub(super) String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the spellings used by BagIt manifests and Java digest names.
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(Algorithm::MD5),
            "sha1" => Ok(Algorithm::SHA1),
            "sha256" => Ok(Algorithm::SHA256),
            "sha512" => Ok(Algorithm::SHA512),
            _ => Err(UnknownAlgorithm(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = UnknownAlgorithm;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> String {
        algorithm.to_string()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("md5", Algorithm::MD5)]
    #[case("SHA1", Algorithm::SHA1)]
    #[case("sha-256", Algorithm::SHA256)]
    #[case("SHA-512", Algorithm::SHA512)]
    fn parse_algorithm(#[case] input: &str, #[case] expected: Algorithm) {
        assert_eq!(input.parse::<Algorithm>().unwrap(), expected);
    }

    #[test]
    fn parse_unknown_algorithm() {
        let err = "blake3".parse::<Algorithm>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported digest algorithm 'blake3'");
    }

    #[test]
    fn serde_uses_display_name() {
        let json = serde_json::to_string(&vec![Algorithm::SHA256, Algorithm::MD5]).unwrap();
        assert_eq!(json, r#"["sha256","md5"]"#);
        let back: Vec<Algorithm> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Algorithm::SHA256, Algorithm::MD5]);
    }
}
