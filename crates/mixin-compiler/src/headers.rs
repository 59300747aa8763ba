/// Header resolution for multi-file inputs
///
/// This module handles:
/// - Resolving quoted `#import` / `#include` paths to files
/// - Parsing each header once, however often it is imported
/// - Ordering headers so dependencies come before their importers
///
/// Angle-bracket imports name system headers and are not followed.

use crate::error::{CompileError, Result};
use mixin_parser::{ParseOptions, TranslationUnit};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A parsed header with its resolved imports
#[derive(Debug, Clone)]
pub struct Header {
    /// Canonical path of the file
    pub path: PathBuf,
    pub unit: TranslationUnit,
    /// Canonical paths of the quoted imports
    pub imports: Vec<PathBuf>,
}

/// Header resolver that follows quoted imports from an entry file
pub struct HeaderResolver {
    /// Searched after the importing file's directory
    include_dirs: Vec<PathBuf>,
    options: ParseOptions,
    /// Parsed headers by canonical path
    headers: HashMap<PathBuf, Header>,
    /// Dependency order (post-order of the import graph)
    order: Vec<PathBuf>,
    /// Headers currently being visited
    visiting: HashSet<PathBuf>,
    entry: Option<PathBuf>,
}

impl HeaderResolver {
    pub fn new(include_dirs: Vec<PathBuf>, options: ParseOptions) -> Self {
        Self {
            include_dirs,
            options,
            headers: HashMap::new(),
            order: Vec::new(),
            visiting: HashSet::new(),
            entry: None,
        }
    }

    /// Resolve the entry file and everything it imports
    pub fn resolve(&mut self, entry_path: impl AsRef<Path>) -> Result<()> {
        let entry_path = entry_path.as_ref();
        if !entry_path.exists() {
            return Err(CompileError::FileNotFound(entry_path.to_path_buf()));
        }

        let entry = entry_path.canonicalize()?;
        self.resolve_header(&entry)?;
        self.entry = Some(entry);
        Ok(())
    }

    fn resolve_header(&mut self, path: &Path) -> Result<()> {
        // `#import` semantics: each file is read once, and an import cycle
        // just stops at the header already being visited
        if self.headers.contains_key(path) || self.visiting.contains(path) {
            return Ok(());
        }

        self.visiting.insert(path.to_path_buf());

        let source = std::fs::read_to_string(path)?;
        let unit = mixin_parser::parse_with(&source, &self.options)
            .map_err(|e| CompileError::parse(path, e.to_string()))?;

        let mut imports = Vec::new();
        for import in unit.imports() {
            if import.system {
                debug!(header = %import.path, "skipping system import");
                continue;
            }
            let resolved = self.locate(&import.path, path)?;
            self.resolve_header(&resolved)?;
            imports.push(resolved);
        }

        debug!(path = %path.display(), imports = imports.len(), "parsed header");

        self.visiting.remove(path);
        self.order.push(path.to_path_buf());
        self.headers.insert(
            path.to_path_buf(),
            Header {
                path: path.to_path_buf(),
                unit,
                imports,
            },
        );

        Ok(())
    }

    /// Find a quoted import next to the importing file, then in the
    /// include directories
    fn locate(&self, include: &str, from: &Path) -> Result<PathBuf> {
        let local = from.parent().map(|dir| dir.join(include));
        let candidates = local
            .into_iter()
            .chain(self.include_dirs.iter().map(|dir| dir.join(include)));

        for candidate in candidates {
            if candidate.is_file() {
                return Ok(candidate.canonicalize()?);
            }
        }

        Err(CompileError::IncludeNotFound {
            include: include.to_string(),
            from: from.to_path_buf(),
        })
    }

    /// The entry header, once resolved
    pub fn entry(&self) -> Option<&Header> {
        self.entry.as_ref().and_then(|path| self.headers.get(path))
    }

    /// Headers with every dependency before its importers; the entry is last
    pub fn headers(&self) -> impl Iterator<Item = &Header> {
        self.order.iter().filter_map(|path| self.headers.get(path))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
