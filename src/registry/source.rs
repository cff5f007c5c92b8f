//! Module sources searched by the registry.
//!
//! Each source answers one question: does this search root contain the
//! module? The registry tries sources in order and stops at the first hit.

use super::RegistryEntry;
use crate::handler::{CardHandler, ProcessHandler, core_modules};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which search root a module was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleOrigin {
    /// Compiled into the binary.
    Core,
    /// An executable in the extensions directory.
    Extension,
}

impl fmt::Display for ModuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleOrigin::Core => write!(f, "core"),
            ModuleOrigin::Extension => write!(f, "extension"),
        }
    }
}

/// A module found in some search root.
///
/// The module may still lack the `handle_card` entry point; that is checked
/// by the dispatcher, not here.
#[derive(Clone)]
pub struct LoadedModule {
    /// Module name.
    pub name: String,
    /// Search root the module came from.
    pub origin: ModuleOrigin,
    /// Where the module lives, for diagnostics.
    pub location: String,
    entry_point: Option<Arc<dyn CardHandler>>,
}

impl LoadedModule {
    /// A module exposing `handler` as its entry point.
    pub fn new(
        name: impl Into<String>,
        origin: ModuleOrigin,
        location: impl Into<String>,
        handler: Arc<dyn CardHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            origin,
            location: location.into(),
            entry_point: Some(handler),
        }
    }

    /// A module that was found but exposes no entry point.
    pub fn without_entry_point(
        name: impl Into<String>,
        origin: ModuleOrigin,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            origin,
            location: location.into(),
            entry_point: None,
        }
    }

    /// The `handle_card` entry point, if the module has one.
    pub fn entry_point(&self) -> Option<Arc<dyn CardHandler>> {
        self.entry_point.clone()
    }

    /// Whether the module conforms to the handler contract.
    pub fn is_conforming(&self) -> bool {
        self.entry_point.is_some()
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("location", &self.location)
            .field("conforming", &self.is_conforming())
            .finish()
    }
}

/// Outcome of searching one root.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// The module exists in this root.
    Found(LoadedModule),
    /// The module is not in this root.
    NotFound,
}

/// A search root for handler modules.
pub trait ModuleSource: Send + Sync {
    /// Short label naming this root in diagnostics.
    fn label(&self) -> String;

    /// Look up the module named by `entry`.
    fn locate(&self, entry: &RegistryEntry) -> Lookup;
}

/// Handlers compiled into the binary.
#[derive(Clone)]
pub struct CoreSource {
    modules: BTreeMap<String, Arc<dyn CardHandler>>,
}

impl CoreSource {
    /// The binary's built-in modules.
    pub fn builtin() -> Self {
        Self {
            modules: core_modules(),
        }
    }

    /// An empty core table.
    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            modules: BTreeMap::new(),
        }
    }

    /// Add or replace a core module.
    #[cfg(test)]
    pub fn with_module(mut self, name: impl Into<String>, handler: Arc<dyn CardHandler>) -> Self {
        self.modules.insert(name.into(), handler);
        self
    }
}

impl ModuleSource for CoreSource {
    fn label(&self) -> String {
        "core".to_string()
    }

    fn locate(&self, entry: &RegistryEntry) -> Lookup {
        match self.modules.get(&entry.module) {
            Some(handler) => Lookup::Found(LoadedModule::new(
                &entry.module,
                ModuleOrigin::Core,
                format!("core:{}", entry.module),
                Arc::clone(handler),
            )),
            None => Lookup::NotFound,
        }
    }
}

/// Executables in an extensions directory, one file per module.
#[derive(Debug, Clone)]
pub struct ExtensionSource {
    dir: PathBuf,
}

impl ExtensionSource {
    /// Search `dir` for extension modules.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ModuleSource for ExtensionSource {
    fn label(&self) -> String {
        format!("extension:{}", self.dir.display())
    }

    fn locate(&self, entry: &RegistryEntry) -> Lookup {
        let path = self.dir.join(&entry.module);
        if !path.is_file() {
            return Lookup::NotFound;
        }

        let location = path.display().to_string();
        if !is_executable(&path) {
            return Lookup::Found(LoadedModule::without_entry_point(
                &entry.module,
                ModuleOrigin::Extension,
                location,
            ));
        }

        let handler = ProcessHandler::new(path, entry.timeout)
            .with_environment(entry.environment.clone());
        Lookup::Found(LoadedModule::new(
            &entry.module,
            ModuleOrigin::Extension,
            location,
            Arc::new(handler),
        ))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
