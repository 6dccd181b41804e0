//! Configuration settings and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::graph::normalize_path;
use crate::render::OutputStyle;
use crate::watcher::DEFAULT_DEBOUNCE;
use crate::{Error, Result};

/// Extension given to compiled output files.
const CSS_EXTENSION: &str = "css";

/// Main configuration for a compile or watch session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Stylesheet file or directory to compile.
    pub root: PathBuf,

    /// Directory compiled CSS is written to. `None` writes next to the source.
    pub output_dir: Option<PathBuf>,

    /// Extra directories searched when resolving imports.
    pub include_paths: Vec<PathBuf>,

    /// Include subdirectories of a directory root.
    pub recursive: bool,

    /// Keep running and recompile on change.
    pub watch: bool,

    /// CSS output style passed to the compiler.
    pub output_style: OutputStyle,

    /// Emit a `.map` file next to each output.
    pub source_map: bool,

    /// Compiler executable used by the command renderer.
    pub compiler: String,

    /// Debounce window for filesystem events.
    pub debounce: Duration,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output_dir: None,
            include_paths: Vec::new(),
            recursive: true,
            watch: false,
            output_style: OutputStyle::default(),
            source_map: false,
            compiler: "sass".to_string(),
            debounce: DEFAULT_DEBOUNCE,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::config("root path cannot be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.debounce.is_zero() {
            return Err(Error::config("debounce cannot be 0"));
        }

        if self.compiler.trim().is_empty() {
            return Err(Error::config("compiler cannot be empty"));
        }

        for dir in &self.include_paths {
            if !dir.is_dir() {
                return Err(Error::config(format!(
                    "include path '{}' is not a directory",
                    dir.display()
                )));
            }
        }

        Ok(())
    }

    /// Compute where the compiled CSS for `src` is written.
    ///
    /// With an output directory, the source's position relative to the scan
    /// root is kept. The scan root is the root itself for a directory root
    /// and its containing directory for a file root. A source outside the
    /// scan root lands directly in the output directory. Without an output
    /// directory the CSS sits next to its source.
    #[must_use]
    pub fn destination_for(&self, src: &Path) -> PathBuf {
        let Some(output_dir) = &self.output_dir else {
            return src.with_extension(CSS_EXTENSION);
        };

        let scan_root = if self.root.is_file() {
            self.root
                .parent()
                .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        } else {
            Some(self.root.as_path())
        };

        let relative = scan_root.and_then(|root| {
            src.strip_prefix(normalize_path(root))
                .or_else(|_| src.strip_prefix(root))
                .ok()
                .filter(|rel| rel.is_relative() && !rel.as_os_str().is_empty())
                .map(Path::to_path_buf)
        });

        let relative = relative.unwrap_or_else(|| {
            src.file_name()
                .map_or_else(|| src.to_path_buf(), PathBuf::from)
        });

        output_dir.join(relative).with_extension(CSS_EXTENSION)
    }
}
