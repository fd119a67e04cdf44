//! Hierarchical document store paths.
//!
//! Paths alternate collection and document segments:
//! `users` (collection) / `u-1` (document) / `cart` (collection) / `sku-9`
//! (document). A [`CollectionPath`] always has an odd number of segments and
//! a [`DocumentPath`] an even number.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when building a store path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path has no segments.
    #[error("path cannot be empty")]
    Empty,
    /// A segment is empty (e.g. `users//cart`).
    #[error("path segment {index} is empty")]
    EmptySegment {
        /// Zero-based index of the offending segment.
        index: usize,
    },
    /// A segment passed on its own contains `/`.
    #[error("path segment '{0}' cannot contain '/'")]
    ContainsSeparator(String),
    /// The number of segments does not match the path kind.
    #[error("'{path}' is not a {expected} path")]
    WrongDepth {
        /// The offending path.
        path: String,
        /// `"collection"` or `"document"`.
        expected: &'static str,
    },
}

fn split_segments(raw: &str) -> Result<Vec<String>, PathError> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    trimmed
        .split('/')
        .enumerate()
        .map(|(index, segment)| {
            if segment.trim().is_empty() {
                Err(PathError::EmptySegment { index })
            } else {
                Ok(segment.to_owned())
            }
        })
        .collect()
}

fn check_segment(segment: &str) -> Result<(), PathError> {
    if segment.trim().is_empty() {
        return Err(PathError::EmptySegment { index: 0 });
    }
    if segment.contains('/') {
        return Err(PathError::ContainsSeparator(segment.to_owned()));
    }
    Ok(())
}

/// Path to a collection of documents, e.g. `users/u-1/cart`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Parse a slash-separated collection path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty, has empty segments, or has an
    /// even number of segments.
    ///
    /// ```
    /// use souq_core::CollectionPath;
    ///
    /// let catalog = CollectionPath::parse("kids/closes/Boys Pullovers").unwrap();
    /// assert_eq!(catalog.name(), "Boys Pullovers");
    /// assert!(CollectionPath::parse("users/u-1").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let segments = split_segments(raw)?;
        if segments.len() % 2 == 0 {
            return Err(PathError::WrongDepth {
                path: raw.to_owned(),
                expected: "collection",
            });
        }
        Ok(Self { segments })
    }

    /// A top-level collection.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or contains `/`.
    pub fn root(name: &str) -> Result<Self, PathError> {
        check_segment(name)?;
        Ok(Self {
            segments: vec![name.to_owned()],
        })
    }

    /// Path to the document `id` inside this collection.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is empty or contains `/`.
    pub fn doc(&self, id: &str) -> Result<DocumentPath, PathError> {
        check_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_owned());
        Ok(DocumentPath { segments })
    }

    /// The last segment (the collection's own name).
    #[must_use]
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Whether `doc` lives directly inside this collection.
    #[must_use]
    pub fn contains(&self, doc: &DocumentPath) -> bool {
        doc.segments.len() == self.segments.len() + 1
            && doc.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl TryFrom<String> for CollectionPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CollectionPath> for String {
    fn from(path: CollectionPath) -> Self {
        path.to_string()
    }
}

/// Path to a single document, e.g. `users/u-1/cart/sku-9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Parse a slash-separated document path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty, has empty segments, or has an
    /// odd number of segments.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let segments = split_segments(raw)?;
        if segments.len() % 2 == 1 {
            return Err(PathError::WrongDepth {
                path: raw.to_owned(),
                expected: "document",
            });
        }
        Ok(Self { segments })
    }

    /// The document's key (last segment).
    #[must_use]
    pub fn id(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// The collection holding this document.
    #[must_use]
    pub fn parent(&self) -> CollectionPath {
        let mut segments = self.segments.clone();
        segments.pop();
        CollectionPath { segments }
    }

    /// A subcollection nested under this document.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or contains `/`.
    pub fn collection(&self, name: &str) -> Result<CollectionPath, PathError> {
        check_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Ok(CollectionPath { segments })
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl TryFrom<String> for DocumentPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentPath> for String {
    fn from(path: DocumentPath) -> Self {
        path.to_string()
    }
}
