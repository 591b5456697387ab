use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::context::Context;
use crate::exclusion::ExclusionStrategy;
use crate::metadata::{ClassMetadata, PropertyMetadata};

// -----------------------------------------------------------------------------
// Version comparison

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part<'a> {
    Number(u64),
    Label(&'a str),
}

fn push_part<'a>(s: &'a str, out: &mut Vec<Part<'a>>) {
    if s.is_empty() {
        return;
    }
    match s.parse::<u64>() {
        Ok(n) => out.push(Part::Number(n)),
        Err(_) if s.bytes().all(|b| b.is_ascii_digit()) => out.push(Part::Number(u64::MAX)),
        Err(_) => out.push(Part::Label(s)),
    }
}

// Splits on `.`, `-`, `_`, `+` and between digits and non-digits.
fn parts(version: &str) -> Vec<Part<'_>> {
    let mut out = Vec::new();
    let bytes = version.as_bytes();
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if matches!(b, b'.' | b'-' | b'_' | b'+') {
            push_part(&version[start..i], &mut out);
            start = i + 1;
        } else if i > start && bytes[i - 1].is_ascii_digit() != b.is_ascii_digit() {
            push_part(&version[start..i], &mut out);
            start = i;
        }
    }
    push_part(&version[start..], &mut out);
    out
}

// dev < alpha = a < beta = b < RC = rc < (number) < pl = p; unknown labels
// sort before everything.
fn label_rank(part: Part<'_>) -> i8 {
    const RANKS: &[(&str, i8)] = &[
        ("dev", 0),
        ("alpha", 1),
        ("a", 1),
        ("beta", 2),
        ("b", 2),
        ("RC", 3),
        ("rc", 3),
        ("pl", 5),
        ("p", 5),
    ];
    match part {
        Part::Number(_) => 4,
        Part::Label(label) => RANKS
            .iter()
            .find(|(name, _)| label.starts_with(name))
            .map_or(-1, |(_, rank)| *rank),
    }
}

fn compare_parts(a: Part<'_>, b: Part<'_>) -> Ordering {
    match (a, b) {
        (Part::Number(x), Part::Number(y)) => x.cmp(&y),
        _ => label_rank(a).cmp(&label_rank(b)),
    }
}

/// Compares two dotted version strings.
///
/// Numeric parts compare as numbers. Pre-release labels rank
/// `dev < alpha < beta < RC < release < pl`. When one version has more parts,
/// an extra number makes it greater and an extra label is ranked against a
/// release.
///
/// # Examples
///
/// ```
/// use core::cmp::Ordering;
/// use vc_serializer::exclusion::compare_versions;
///
/// assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
/// assert_eq!(compare_versions("2.0", "2.0"), Ordering::Equal);
/// assert_eq!(compare_versions("2.0-beta1", "2.0-RC1"), Ordering::Less);
/// assert_eq!(compare_versions("2.0rc1", "2.0"), Ordering::Less);
/// assert_eq!(compare_versions("2.0.1", "2.0"), Ordering::Greater);
/// ```
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (parts(a), parts(b));
    let release = Part::Number(0);

    for i in 0..a.len().max(b.len()) {
        let ord = match (a.get(i), b.get(i)) {
            (Some(&x), Some(&y)) => compare_parts(x, y),
            (Some(&Part::Number(_)), None) => Ordering::Greater,
            (None, Some(&Part::Number(_))) => Ordering::Less,
            (Some(&x), None) => label_rank(x).cmp(&label_rank(release)),
            (None, Some(&y)) => label_rank(release).cmp(&label_rank(y)),
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

// -----------------------------------------------------------------------------
// VersionExclusionStrategy

/// Skips properties outside their `since`/`until` window.
///
/// A property is skipped if the current version is lower than its `since`
/// version or higher than its `until` version. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionExclusionStrategy {
    version: String,
}

impl VersionExclusionStrategy {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl ExclusionStrategy for VersionExclusionStrategy {
    fn should_skip_class(&self, _metadata: &ClassMetadata, _context: &Context) -> bool {
        false
    }

    fn should_skip_property(&self, metadata: &PropertyMetadata, _context: &Context) -> bool {
        if let Some(since) = metadata.since_version()
            && compare_versions(&self.version, since) == Ordering::Less
        {
            return true;
        }
        if let Some(until) = metadata.until_version()
            && compare_versions(&self.version, until) == Ordering::Greater
        {
            return true;
        }
        false
    }
}
