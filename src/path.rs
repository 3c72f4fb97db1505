// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Catalog paths and object references.
//!
//! A [`CatalogPath`] is the canonical form of a location in the catalog: a
//! non-empty sequence of trimmed, non-empty segments. Paths can be built from
//! slash-delimited strings (`space/folder/dataset`), SQL notation
//! (`space."my folder".dataset`, `[space, "my folder", dataset]`) or segment
//! lists. All validation happens locally, before any request is sent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const SEPARATOR: char = '/';

/// Canonical, validated catalog path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CatalogPath(Vec<String>);

impl CatalogPath {
    /// Parses a slash-delimited path.
    ///
    /// A single leading and trailing separator is accepted, so `a/b`, `/a/b`
    /// and `a/b/` are the same path.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        let trimmed = trimmed.strip_prefix(SEPARATOR).unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix(SEPARATOR).unwrap_or(trimmed);
        if trimmed.trim().is_empty() {
            return Err(Error::InvalidPath(format!("{path:?} has no segments")));
        }
        Self::from_segments(trimmed.split(SEPARATOR)).map_err(|_| {
            Error::InvalidPath(format!("{path:?} contains an empty segment"))
        })
    }

    /// Builds a path from an ordered list of segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical = Vec::new();
        for (index, segment) in segments.into_iter().enumerate() {
            let segment = segment.as_ref().trim();
            if segment.is_empty() {
                return Err(Error::InvalidPath(format!(
                    "segment {index} is empty after trimming"
                )));
            }
            canonical.push(segment.to_string());
        }
        if canonical.is_empty() {
            return Err(Error::InvalidPath("path has no segments".to_string()));
        }
        Ok(Self(canonical))
    }

    /// Parses SQL notation: dotted identifiers with optional quoting, or a
    /// bracketed list such as `[a, "b c", 'd']`.
    pub fn parse_sql(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        let segments = match trimmed
            .strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
        {
            Some(inner) => split_quoted(inner, ',')?,
            None => split_quoted(trimmed, '.')?,
        };
        Self::from_segments(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a canonical path has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last segment.
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// The enclosing path, or `None` for a root-level object.
    pub fn parent(&self) -> Option<CatalogPath> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// Appends one segment.
    pub fn join(&self, segment: &str) -> Result<CatalogPath> {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self::from_segments(segments)
    }

    pub fn starts_with(&self, prefix: &CatalogPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Moves this path from under `from` to under `to`.
    ///
    /// Returns `None` when the path is not inside `from`.
    pub fn rebase(&self, from: &CatalogPath, to: &CatalogPath) -> Option<CatalogPath> {
        let rest = self.0.strip_prefix(from.0.as_slice())?;
        let mut segments = to.0.clone();
        segments.extend(rest.iter().cloned());
        Some(Self(segments))
    }

    /// Renders the path as a quoted SQL identifier, e.g. `"a"."b c"."d"`.
    pub fn to_sql(&self) -> String {
        self.0
            .iter()
            .map(|segment| format!("\"{}\"", segment.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for CatalogPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl TryFrom<Vec<String>> for CatalogPath {
    type Error = Error;

    fn try_from(segments: Vec<String>) -> Result<Self> {
        Self::from_segments(segments)
    }
}

impl From<CatalogPath> for Vec<String> {
    fn from(path: CatalogPath) -> Self {
        path.0
    }
}

/// Conversion into a validated [`CatalogPath`].
///
/// Strings are parsed as slash-delimited paths; slices and vectors are
/// treated as segment lists.
pub trait IntoCatalogPath {
    fn into_catalog_path(self) -> Result<CatalogPath>;
}

impl IntoCatalogPath for CatalogPath {
    fn into_catalog_path(self) -> Result<CatalogPath> {
        Ok(self)
    }
}

impl IntoCatalogPath for &CatalogPath {
    fn into_catalog_path(self) -> Result<CatalogPath> {
        Ok(self.clone())
    }
}

impl IntoCatalogPath for &str {
    fn into_catalog_path(self) -> Result<CatalogPath> {
        CatalogPath::parse(self)
    }
}

impl IntoCatalogPath for String {
    fn into_catalog_path(self) -> Result<CatalogPath> {
        CatalogPath::parse(&self)
    }
}

impl IntoCatalogPath for &String {
    fn into_catalog_path(self) -> Result<CatalogPath> {
        CatalogPath::parse(self)
    }
}

impl<S: AsRef<str>> IntoCatalogPath for &[S] {
    fn into_catalog_path(self) -> Result<CatalogPath> {
        CatalogPath::from_segments(self)
    }
}

impl<S: AsRef<str>> IntoCatalogPath for Vec<S> {
    fn into_catalog_path(self) -> Result<CatalogPath> {
        CatalogPath::from_segments(self)
    }
}

impl<S: AsRef<str>, const N: usize> IntoCatalogPath for [S; N] {
    fn into_catalog_path(self) -> Result<CatalogPath> {
        CatalogPath::from_segments(self)
    }
}

/// Identifies a catalog object either by its id or by its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogRef {
    ById(String),
    ByPath(CatalogPath),
}

impl CatalogRef {
    pub fn id(id: impl Into<String>) -> Self {
        CatalogRef::ById(id.into())
    }

    /// Validates `path` and wraps it.
    pub fn path(path: impl IntoCatalogPath) -> Result<Self> {
        Ok(CatalogRef::ByPath(path.into_catalog_path()?))
    }
}

impl From<CatalogPath> for CatalogRef {
    fn from(path: CatalogPath) -> Self {
        CatalogRef::ByPath(path)
    }
}

impl From<&CatalogPath> for CatalogRef {
    fn from(path: &CatalogPath) -> Self {
        CatalogRef::ByPath(path.clone())
    }
}

impl fmt::Display for CatalogRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogRef::ById(id) => write!(f, "id {id}"),
            CatalogRef::ByPath(path) => write!(f, "path {path}"),
        }
    }
}

/// Splits `input` on `delimiter`, honouring double quotes (`""` escapes a
/// quote) and single quotes (backslash escapes).
fn split_quoted(input: &str, delimiter: char) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        current.push('"');
                    }
                    Some('"') => break,
                    Some(other) => current.push(other),
                    None => {
                        return Err(Error::InvalidPath(format!(
                            "unterminated double quote in {input:?}"
                        )))
                    }
                }
            },
            '\'' => loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(escaped) => current.push(escaped),
                        None => break,
                    },
                    Some('\'') => break,
                    Some(other) => current.push(other),
                    None => {
                        return Err(Error::InvalidPath(format!(
                            "unterminated single quote in {input:?}"
                        )))
                    }
                }
            },
            c if c == delimiter => segments.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    segments.push(current);
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(path: &CatalogPath) -> Vec<&str> {
        path.segments().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_representations_normalize_identically() {
        let expected = CatalogPath::parse("space/folder/dataset").unwrap();
        let inputs = [
            "space/folder/dataset".into_catalog_path(),
            "/space/folder/dataset/".into_catalog_path(),
            " space / folder /dataset ".into_catalog_path(),
            ["space", "folder", "dataset"].into_catalog_path(),
            vec![" space", "folder ", "dataset"].into_catalog_path(),
            CatalogPath::parse_sql("space.folder.dataset"),
            CatalogPath::parse_sql("\"space\".\"folder\".\"dataset\""),
            CatalogPath::parse_sql("[space, 'folder', \"dataset\"]"),
        ];
        for input in inputs {
            assert_eq!(input.unwrap(), expected);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = CatalogPath::parse(" a / b ").unwrap();
        let twice = once.segments().into_catalog_path().unwrap();
        assert_eq!(once, twice);
        assert_eq!(CatalogPath::parse(&once.to_string()).unwrap(), once);
    }

    #[test]
    fn test_invalid_paths() {
        assert!(matches!(CatalogPath::parse(""), Err(Error::InvalidPath(_))));
        assert!(matches!(CatalogPath::parse("/"), Err(Error::InvalidPath(_))));
        assert!(matches!(CatalogPath::parse("  "), Err(Error::InvalidPath(_))));
        assert!(matches!(CatalogPath::parse("//"), Err(Error::InvalidPath(_))));
        assert!(matches!(CatalogPath::parse("a//b"), Err(Error::InvalidPath(_))));
        assert!(matches!(
            CatalogPath::from_segments([""]),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            CatalogPath::from_segments(Vec::<String>::new()),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            CatalogPath::from_segments(["a", "  "]),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            CatalogPath::parse_sql("a.\"b"),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_parse_sql_quoting() {
        let path = CatalogPath::parse_sql("space.\"my folder\".\"a.b\"").unwrap();
        assert_eq!(segments(&path), ["space", "my folder", "a.b"]);

        let path = CatalogPath::parse_sql("'it\\'s'.x").unwrap();
        assert_eq!(segments(&path), ["it's", "x"]);

        let path = CatalogPath::parse_sql("[a, \"b, c\", 'd']").unwrap();
        assert_eq!(segments(&path), ["a", "b, c", "d"]);
    }

    #[test]
    fn test_to_sql_escapes_quotes() {
        let path = CatalogPath::from_segments(["a", "say \"hi\""]).unwrap();
        assert_eq!(path.to_sql(), "\"a\".\"say \"\"hi\"\"\"");
        assert_eq!(CatalogPath::parse_sql(&path.to_sql()).unwrap(), path);
    }

    #[test]
    fn test_navigation() {
        let path = CatalogPath::parse("a/b/c").unwrap();
        assert_eq!(path.name(), "c");
        assert_eq!(path.parent().unwrap(), CatalogPath::parse("a/b").unwrap());
        assert!(CatalogPath::parse("a").unwrap().parent().is_none());
        assert_eq!(path.join("d").unwrap().to_string(), "a/b/c/d");
        assert!(path.join(" ").is_err());

        let from = CatalogPath::parse("a/b").unwrap();
        let to = CatalogPath::parse("x").unwrap();
        assert!(path.starts_with(&from));
        assert_eq!(path.rebase(&from, &to).unwrap().to_string(), "x/c");
        assert!(to.rebase(&from, &path).is_none());
    }

    #[test]
    fn test_serde_validates() {
        let path: CatalogPath = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["a","b"]"#);
        assert!(serde_json::from_str::<CatalogPath>("[]").is_err());
    }

    #[test]
    fn test_catalog_ref() {
        assert_eq!(
            CatalogRef::path("a/b").unwrap(),
            CatalogRef::ByPath(CatalogPath::parse("a/b").unwrap())
        );
        assert!(CatalogRef::path("/").is_err());
        assert_eq!(CatalogRef::id("123").to_string(), "id 123");
    }
}
