//! Per-interpreter entry points.
//!
//! Every base command has a sibling per supported interpreter version, e.g.
//! `run_in_virtualenv3.7`, which pre-binds `python3.7[.exe]`. The registry is
//! built once and looked up by exact name.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use virtualenvrunner_env::platform;

use crate::cli::Flavour;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PythonVersion {
    pub major: u8,
    pub minor: Option<u8>,
}

impl PythonVersion {
    pub const fn new(major: u8, minor: Option<u8>) -> Self {
        Self { major, minor }
    }

    /// `python<version>` plus the platform executable suffix.
    pub fn executable(&self) -> String {
        format!("python{}{}", self, platform::exe_suffix())
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

pub const SUPPORTED_VERSIONS: &[PythonVersion] = &[
    PythonVersion::new(2, None),
    PythonVersion::new(2, Some(7)),
    PythonVersion::new(3, None),
    PythonVersion::new(3, Some(4)),
    PythonVersion::new(3, Some(5)),
    PythonVersion::new(3, Some(6)),
    PythonVersion::new(3, Some(7)),
    PythonVersion::new(3, Some(8)),
    PythonVersion::new(3, Some(9)),
    PythonVersion::new(3, Some(10)),
    PythonVersion::new(3, Some(11)),
    PythonVersion::new(3, Some(12)),
    PythonVersion::new(3, Some(13)),
];

/// A named command bound to a flavour and, for versioned names, an interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub flavour: Flavour,
    pub version: Option<PythonVersion>,
}

impl EntryPoint {
    /// Interpreter passed to `virtualenv -p`; `None` means the default.
    pub fn python(&self) -> Option<String> {
        self.version.map(|v| v.executable())
    }

    /// `python` or `python<version>`, as shown in help text.
    pub fn python_label(&self) -> String {
        match self.version {
            Some(v) => format!("python{}", v),
            None => "python".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct EntryPointRegistry {
    entries: HashMap<String, EntryPoint>,
}

impl EntryPointRegistry {
    fn new() -> Self {
        let mut entries = HashMap::new();
        for flavour in Flavour::ALL {
            let base = flavour.base_name();
            entries.insert(
                base.to_string(),
                EntryPoint {
                    name: base.to_string(),
                    flavour,
                    version: None,
                },
            );
            for version in SUPPORTED_VERSIONS {
                let name = format!("{}{}", base, version);
                entries.insert(
                    name.clone(),
                    EntryPoint {
                        name,
                        flavour,
                        version: Some(*version),
                    },
                );
            }
        }
        Self { entries }
    }

    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<EntryPointRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::new)
    }

    pub fn get(&self, name: &str) -> Option<&EntryPoint> {
        self.entries.get(name)
    }

    /// Look up the entry point a program path was invoked as
    /// (`/usr/local/bin/run_in_virtualenv3.7`, `create_virtualenv.exe`).
    pub fn for_program(&self, program: &Path) -> Option<&EntryPoint> {
        let file_name = program.file_name()?.to_str()?;
        let name = file_name.strip_suffix(".exe").unwrap_or(file_name);
        self.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_display() {
        assert_eq!(PythonVersion::new(3, None).to_string(), "3");
        assert_eq!(PythonVersion::new(2, Some(7)).to_string(), "2.7");
        assert_eq!(
            PythonVersion::new(3, Some(7)).executable(),
            format!("python3.7{}", platform::exe_suffix())
        );
    }

    #[test]
    fn test_registry_covers_every_flavour_and_version() {
        let registry = EntryPointRegistry::new();
        assert_eq!(registry.names().len(), 3 * (SUPPORTED_VERSIONS.len() + 1));
        for flavour in Flavour::ALL {
            let base = registry.get(flavour.base_name()).unwrap();
            assert_eq!(base.flavour, flavour);
            assert_eq!(base.python(), None);
            assert_eq!(base.python_label(), "python");
            for version in SUPPORTED_VERSIONS {
                let entry = registry
                    .get(&format!("{}{}", flavour.base_name(), version))
                    .unwrap();
                assert_eq!(entry.flavour, flavour);
                assert_eq!(entry.python(), Some(version.executable()));
            }
        }
    }

    #[test]
    fn test_exact_lookup_only() {
        let registry = EntryPointRegistry::global();
        let entry = registry.get("run_in_readonly_virtualenv2.7").unwrap();
        assert_eq!(entry.flavour, Flavour::Readonly);
        assert_eq!(entry.python_label(), "python2.7");
        assert!(registry.get("run_in_virtualenv3.99").is_none());
        assert!(registry.get("run_in_virtualenv27").is_none());
        assert!(registry.get("RUN_IN_VIRTUALENV").is_none());
    }

    #[test]
    fn test_program_path_lookup() {
        let registry = EntryPointRegistry::global();
        let entry = registry
            .for_program(Path::new("/usr/local/bin/create_virtualenv3.6"))
            .unwrap();
        assert_eq!(entry.flavour, Flavour::Create);
        assert_eq!(entry.version, Some(PythonVersion::new(3, Some(6))));
        assert!(registry.for_program(Path::new("run_in_virtualenv.exe")).is_some());
        assert!(registry.for_program(Path::new("virtualenvrunner")).is_none());
    }
}
