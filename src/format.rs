//! Formatter registry
//!
//! Generated contents are formatted before any comparison or merge, because
//! the previous generated snapshot was itself stored post-formatting; two
//! texts that differ only in formatting would otherwise look like generator
//! changes on every run.
//!
//! Formatters are external collaborators: pure `format(contents, path)`
//! callbacks registered by extension or exact file name. Ownership per file
//! type must be unambiguous by construction; two formatters claiming the
//! same file is a configuration error, never resolved by priority at
//! runtime.
//!
//! The registry is an explicit configuration object carried in the write
//! context, so concurrent runs never interfere through shared registration
//! state.

use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::file::{FileContents, FileOptions};

/// A formatter plugin.
///
/// Claims files by extension (without the leading dot) or by exact file name
/// (for dotfiles without extensions, e.g. `.prettierrc`).
pub trait Formatter: Send + Sync {
    /// Short name used in logs and configuration errors.
    fn name(&self) -> &str;

    /// File extensions this formatter claims, without the leading dot.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// Exact file names this formatter claims.
    fn file_names(&self) -> &[&str] {
        &[]
    }

    /// Format the contents of a file. Failures are surfaced as warnings and
    /// the unformatted contents continue down the pipeline.
    fn format(&self, contents: &str, relative_path: &Path) -> anyhow::Result<String>;
}

/// Immutable set of registered formatters for one reconciliation run.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    formatters: Vec<Arc<dyn Formatter>>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a formatter to the registry.
    pub fn register(&mut self, formatter: Arc<dyn Formatter>) {
        self.formatters.push(formatter);
    }

    /// Select the formatter claiming the given path, if any.
    ///
    /// Fails with a configuration error naming all claimants if more than
    /// one registered formatter matches.
    pub fn select(&self, relative_path: &Path) -> Result<Option<&dyn Formatter>> {
        let extension = relative_path.extension().and_then(|e| e.to_str());
        let file_name = relative_path.file_name().and_then(|n| n.to_str());

        let matches: Vec<&Arc<dyn Formatter>> = self
            .formatters
            .iter()
            .filter(|formatter| {
                let by_extension = extension
                    .map(|ext| formatter.file_extensions().contains(&ext))
                    .unwrap_or(false);
                let by_name = file_name
                    .map(|name| formatter.file_names().contains(&name))
                    .unwrap_or(false);
                by_extension || by_name
            })
            .collect();

        if matches.len() > 1 {
            let names: Vec<&str> = matches.iter().map(|f| f.name()).collect();
            return Err(Error::Configuration {
                message: format!(
                    "multiple formatters claim '{}': [{}]; formatter ownership per file \
                     type must be unambiguous",
                    relative_path.display(),
                    names.join(", ")
                ),
            });
        }

        Ok(matches.first().copied().map(|f| f.as_ref()))
    }

    /// Format generated contents for the given destination path.
    ///
    /// Contents pass through unchanged when formatting is skipped for the
    /// file, when the payload is binary (a formatter can never see bytes),
    /// or when no formatter claims the path.
    pub fn format_contents(
        &self,
        relative_path: &Path,
        contents: &FileContents,
        options: &FileOptions,
    ) -> Result<FileContents> {
        if options.skip_formatting {
            return Ok(contents.clone());
        }

        let Some(text) = contents.as_text() else {
            return Ok(contents.clone());
        };

        let Some(formatter) = self.select(relative_path)? else {
            return Ok(contents.clone());
        };

        match formatter.format(text, relative_path) {
            Ok(formatted) => Ok(FileContents::Text(formatted)),
            Err(e) => Err(Error::Formatter {
                relative_path: relative_path.display().to_string(),
                message: format!("{} ({})", e, formatter.name()),
            }),
        }
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field(
                "formatters",
                &self
                    .formatters
                    .iter()
                    .map(|fmt| fmt.name().to_string())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
