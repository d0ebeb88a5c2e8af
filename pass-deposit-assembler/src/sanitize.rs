// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::fmt::Write as _;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("file name must not be empty")]
    Empty,

    #[error("file name must not contain a path separator")]
    PathSeparator,

    #[error("'{0}' is not a file name")]
    Reserved(String),
}

fn is_allowed(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-')
}

/// Turns an arbitrary name into a path-free file name.
///
/// ASCII alphanumerics, `.`, `_` and `-` are kept; every other byte of the
/// UTF-8 encoding becomes `%XX`. Existing `%XX` escapes are kept as they
/// are, so sanitizing a sanitized name is a no-op.
///
/// ```
/// # use pass_deposit_assembler::sanitize_filename;
/// assert_eq!(sanitize_filename("../foo").unwrap(), "..%2Ffoo");
/// assert_eq!(sanitize_filename("..%2Ffoo").unwrap(), "..%2Ffoo");
/// ```
pub fn sanitize_filename(name: &str) -> Result<String, SanitizeError> {
    let bytes = name.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        let escaped = byte == b'%'
            && bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
            && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
        if escaped {
            out.push_str(&name[i..i + 3]);
            i += 3;
            continue;
        }
        if is_allowed(byte) {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
        i += 1;
    }

    if out.is_empty() {
        return Err(SanitizeError::Empty);
    }
    Ok(out)
}

/// Checks that a custodial file name can be used as-is for a package entry.
///
/// The name is not rewritten. Only names that would escape or alias the
/// package directory are refused.
pub fn check_custodial_name(name: &str) -> Result<&str, SanitizeError> {
    match name {
        "" => Err(SanitizeError::Empty),
        "." | ".." => Err(SanitizeError::Reserved(name.to_owned())),
        _ if name.contains(['/', '\\']) => Err(SanitizeError::PathSeparator),
        _ => Ok(name),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("foo", "foo")]
    #[case("f.o.o", "f.o.o")]
    #[case("fooö", "foo%C3%B6")]
    #[case("../foo", "..%2Ffoo")]
    #[case("f o o", "f%20o%20o")]
    #[case("foo-", "foo-")]
    #[case("fo-o", "fo-o")]
    #[case("f_oo", "f_oo")]
    #[case("_foo_", "_foo_")]
    #[case("a\\b", "a%5Cb")]
    #[case("100%", "100%25")]
    #[case("100%2", "100%252")]
    fn sanitizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_filename(input).unwrap(), expected);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(sanitize_filename(""), Err(SanitizeError::Empty));
    }

    #[rstest]
    #[case("My Manuscript (final).docx")]
    #[case("supplement 1.csv")]
    #[case("fooö%20.txt")]
    #[case("..hidden")]
    fn custodial_names_are_kept(#[case] name: &str) {
        assert_eq!(check_custodial_name(name), Ok(name));
    }

    #[rstest]
    #[case("", SanitizeError::Empty)]
    #[case(".", SanitizeError::Reserved(".".into()))]
    #[case("..", SanitizeError::Reserved("..".into()))]
    #[case("../etc/passwd", SanitizeError::PathSeparator)]
    #[case("figures/1.png", SanitizeError::PathSeparator)]
    #[case("C:\\figure.png", SanitizeError::PathSeparator)]
    fn custodial_names_that_escape_are_refused(#[case] name: &str, #[case] expected: SanitizeError) {
        assert_eq!(check_custodial_name(name), Err(expected));
    }

    proptest! {
        #[test]
        fn idempotent_and_path_free(s in "\\PC{1,40}") {
            let once = sanitize_filename(&s).unwrap();
            prop_assert!(!once.contains('/'));
            prop_assert!(!once.contains('\\'));
            prop_assert_eq!(sanitize_filename(&once).unwrap(), once);
        }

        #[test]
        fn only_allowed_characters(s in any::<String>().prop_filter("non-empty", |s| !s.is_empty())) {
            let once = sanitize_filename(&s).unwrap();
            prop_assert!(once.bytes().all(|b| is_allowed(b) || b == b'%'));
        }
    }
}
