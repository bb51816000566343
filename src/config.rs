// Copyright (c) 2018 Fabian Schuiki

//! Compiler options and path resolution.

use std::env;
use std::path::{Path, PathBuf};

/// The environment variable that overrides the application directory.
pub const HOME_VAR: &str = "TINYPG_HOME";

/// Options that control where a grammar compile looks for files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// The directory relative output paths are resolved against. Usually the
    /// directory of the grammar file.
    pub base_dir: PathBuf,
    /// The directory relative template paths and the default template root
    /// are resolved against.
    pub app_dir: PathBuf,
}

impl Options {
    /// Create options with explicit directories.
    pub fn new<B: Into<PathBuf>, A: Into<PathBuf>>(base_dir: B, app_dir: A) -> Options {
        Options {
            base_dir: base_dir.into(),
            app_dir: app_dir.into(),
        }
    }

    /// Determine the options from the environment.
    ///
    /// The application directory is taken from `TINYPG_HOME`, then from the
    /// directory of the running executable if it carries a `templates`
    /// directory, and finally from the directory this crate was built in.
    pub fn from_env() -> Options {
        let base_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let app_dir = match env::var_os(HOME_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => exe_dir()
                .filter(|d| d.join("templates").is_dir())
                .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
        };
        Options { base_dir, app_dir }
    }

    /// Use a different base directory.
    pub fn with_base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Options {
        self.base_dir = dir.into();
        self
    }

    /// Resolve an output path. Returns `None` if the directory does not exist.
    pub fn resolve_output(&self, value: &str) -> Option<PathBuf> {
        existing_dir(&self.base_dir, value)
    }

    /// Resolve a template path. Returns `None` if the directory does not exist.
    pub fn resolve_template(&self, value: &str) -> Option<PathBuf> {
        existing_dir(&self.app_dir, value)
    }

    /// The default template directory for a language.
    pub fn default_template_dir(&self, lang_dir: &str) -> PathBuf {
        self.app_dir.join("templates").join(lang_dir)
    }
}

impl Default for Options {
    fn default() -> Options {
        Options::from_env()
    }
}

fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}

fn existing_dir(root: &Path, value: &str) -> Option<PathBuf> {
    let path = Path::new(value);
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    if full.is_dir() {
        Some(full)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_to_roots() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let opts = Options::new(root.join("src"), root.clone());
        assert_eq!(opts.resolve_output("runtime"), Some(root.join("src").join("runtime")));
        assert_eq!(opts.resolve_template("templates/rust"), Some(root.join("templates/rust")));
        assert_eq!(opts.resolve_output("does/not/exist"), None);
        let abs = root.to_string_lossy().into_owned();
        assert_eq!(opts.resolve_output(&abs), Some(root.clone()));
        assert_eq!(opts.default_template_dir("csharp"), root.join("templates").join("csharp"));
    }
}
