//! Format registry
//!
//! A [`FormatRegistry`] groups the schemas of one file format family by
//! version string, append-only. Lookups never fail; an unknown version is
//! simply absent. Migrating a document between versions has no generic
//! algorithm, so the registry only carries per-pair migration hooks that a
//! concrete format may register.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::encoding::SCHEMA_EXTENSION;
use crate::error::{FormatError, Result};
use crate::loader;
use crate::schema::FormatSchema;
use crate::tree::Tree;

/// A registered migration between two concrete versions
pub type Migration = Box<dyn Fn(&Tree) -> Result<Tree> + Send + Sync>;

/// Versioned schemas of one file format family
pub struct FormatRegistry {
    /// Format family name, e.g. `"album"`
    name: String,
    /// Version string to schema, iterated in lexicographic order
    schemas: BTreeMap<String, FormatSchema>,
    /// Migration hooks keyed by (from, to) version pair
    migrations: HashMap<(String, String), Migration>,
}

impl FormatRegistry {
    /// Create an empty registry for one format family
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schemas: BTreeMap::new(),
            migrations: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with versioned schemas
    pub fn from_versions<I, S>(name: impl Into<String>, versions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FormatSchema)>,
        S: Into<String>,
    {
        let mut registry = Self::new(name);
        for (version, schema) in versions {
            registry.register(version, schema)?;
        }
        Ok(registry)
    }

    /// Build a registry from a directory of schema documents.
    ///
    /// Every `<version>.tfs` file in `dir` is loaded and registered under
    /// its file stem; other files are ignored.
    pub fn load_dir(name: impl Into<String>, dir: &Path) -> Result<Self> {
        let mut registry = Self::new(name);
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_schema = !path.is_dir()
                && path.extension().and_then(|e| e.to_str()) == SCHEMA_EXTENSION.strip_prefix('.');
            if !is_schema {
                continue;
            }
            let version = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            let schema = loader::load_schema_file(&path)?;
            registry.register(version, schema)?;
        }
        tracing::info!(
            "loaded {} schema version(s) for format {:?} from {:?}",
            registry.schemas.len(),
            registry.name,
            dir
        );
        Ok(registry)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a schema under a version string.
    ///
    /// Versions are append-only; registering an existing one fails.
    pub fn register(&mut self, version: impl Into<String>, schema: FormatSchema) -> Result<()> {
        let version = version.into();
        if self.schemas.contains_key(&version) {
            return Err(FormatError::AlreadyRegistered {
                format: self.name.clone(),
                version,
            });
        }
        self.schemas.insert(version, schema);
        Ok(())
    }

    /// Look up the schema of one version; absent when unknown
    pub fn schema(&self, version: &str) -> Option<&FormatSchema> {
        self.schemas.get(version)
    }

    /// All registered versions, lexicographically sorted
    pub fn versions(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// The lexicographically last registered version
    pub fn latest_version(&self) -> Option<&str> {
        self.schemas.keys().next_back().map(String::as_str)
    }

    /// Register a migration hook for one (from, to) version pair
    pub fn register_migration<F>(&mut self, from: impl Into<String>, to: impl Into<String>, migrate: F)
    where
        F: Fn(&Tree) -> Result<Tree> + Send + Sync + 'static,
    {
        self.migrations
            .insert((from.into(), to.into()), Box::new(migrate));
    }

    /// Migrate a document between versions via the registered hook.
    ///
    /// Fails with [`FormatError::MigrationUnsupported`] when no hook covers
    /// the pair.
    pub fn update_file(&self, tree: &Tree, from: &str, to: &str) -> Result<Tree> {
        match self.migrations.get(&(from.to_string(), to.to_string())) {
            Some(migrate) => migrate(tree),
            None => Err(FormatError::MigrationUnsupported {
                format: self.name.clone(),
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}
