//! Per-invocation render options.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::extension::Importer;
use crate::config::Config;

/// CSS output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputStyle {
    /// Human-readable output, one declaration per line.
    #[default]
    Expanded,
    /// Minified output.
    Compressed,
}

impl OutputStyle {
    /// Name understood by the compiler's `--style` flag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expanded => "expanded",
            Self::Compressed => "compressed",
        }
    }
}

impl FromStr for OutputStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expanded" => Ok(Self::Expanded),
            "compressed" => Ok(Self::Compressed),
            other => Err(format!(
                "invalid output style '{other}', must be one of: expanded, compressed"
            )),
        }
    }
}

impl std::fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the render collaborator needs to compile one file.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Stylesheet being compiled.
    pub src: PathBuf,
    /// Where the CSS goes.
    pub dest: PathBuf,
    /// Import search roots, in priority order.
    pub include_paths: Vec<PathBuf>,
    /// CSS output style.
    pub output_style: OutputStyle,
    /// Source map destination, when source maps are enabled.
    pub source_map: Option<PathBuf>,
    /// Custom importer capabilities.
    pub importers: Vec<Arc<dyn Importer>>,
}

/// Session-wide settings from which per-file [`RenderOptions`] are derived.
#[derive(Debug, Clone)]
pub struct OptionsTemplate {
    config: Config,
    importers: Vec<Arc<dyn Importer>>,
}

impl OptionsTemplate {
    /// Create a template from validated configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            importers: Vec::new(),
        }
    }

    /// Register a custom importer, consulted before the include paths.
    #[must_use]
    pub fn with_importer(mut self, importer: Arc<dyn Importer>) -> Self {
        self.importers.push(importer);
        self
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Registered importers.
    #[must_use]
    pub fn importers(&self) -> &[Arc<dyn Importer>] {
        &self.importers
    }

    /// Derive fresh options for `src`. `src` and `dest` are always recomputed.
    #[must_use]
    pub fn derive(&self, src: &Path) -> RenderOptions {
        let dest = self.config.destination_for(src);
        let source_map = self.config.source_map.then(|| {
            let mut map = dest.clone().into_os_string();
            map.push(".map");
            PathBuf::from(map)
        });

        RenderOptions {
            src: src.to_path_buf(),
            dest,
            include_paths: self.config.include_paths.clone(),
            output_style: self.config.output_style,
            source_map,
            importers: self.importers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_style_parse() {
        assert_eq!("expanded".parse::<OutputStyle>(), Ok(OutputStyle::Expanded));
        assert_eq!(
            "COMPRESSED".parse::<OutputStyle>(),
            Ok(OutputStyle::Compressed)
        );
        assert!("nested".parse::<OutputStyle>().is_err());
        assert_eq!(OutputStyle::Compressed.to_string(), "compressed");
    }

    #[test]
    fn test_derive_recomputes_destination() {
        let template = OptionsTemplate::new(Config {
            include_paths: vec![PathBuf::from("/vendor")],
            ..Default::default()
        });

        let a = template.derive(Path::new("/styles/a.scss"));
        let b = template.derive(Path::new("/styles/b.sass"));

        assert_eq!(a.dest, PathBuf::from("/styles/a.css"));
        assert_eq!(b.dest, PathBuf::from("/styles/b.css"));
        assert_eq!(a.include_paths, vec![PathBuf::from("/vendor")]);
        assert!(a.source_map.is_none());
    }

    #[test]
    fn test_derive_source_map_path() {
        let template = OptionsTemplate::new(Config {
            source_map: true,
            output_dir: Some(PathBuf::from("/out")),
            root: PathBuf::from("/nonexistent/main.scss"),
            ..Default::default()
        });

        let opts = template.derive(Path::new("/nonexistent/main.scss"));
        assert_eq!(opts.dest, PathBuf::from("/out/main.css"));
        assert_eq!(opts.source_map, Some(PathBuf::from("/out/main.css.map")));
    }
}
