//! External structural checkers
//!
//! HTML, CSS and SVG conformance and EPUB structure are checked by Java tools
//! that run as child processes. They sit behind [`ExternalChecker`] so the
//! validator can run without them, and so tests never need a JVM.

use crate::validate::result::{EpubcheckMessage, VnuMessage};
use crate::{Result, ValidatorError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Which conformance mode the markup checker runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    Html,
    Css,
    Svg,
}

impl MarkupKind {
    fn flag(&self) -> &'static str {
        match self {
            MarkupKind::Html => "--html",
            MarkupKind::Css => "--css",
            MarkupKind::Svg => "--svg",
        }
    }
}

/// Runs the external structural checks on a file
///
/// Methods are blocking and are only called from worker pool tasks. An `Err`
/// means the checker itself could not run, which aborts validation; problems
/// in the file are returned as messages.
pub trait ExternalChecker: Send + Sync {
    fn check_markup(&self, path: &Path, kind: MarkupKind) -> Result<Vec<VnuMessage>>;

    fn check_epub(&self, path: &Path) -> Result<Vec<EpubcheckMessage>>;
}

/// A checker that reports nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalChecks;

impl ExternalChecker for NoExternalChecks {
    fn check_markup(&self, _path: &Path, _kind: MarkupKind) -> Result<Vec<VnuMessage>> {
        Ok(Vec::new())
    }

    fn check_epub(&self, _path: &Path) -> Result<Vec<EpubcheckMessage>> {
        Ok(Vec::new())
    }
}

/// Runs the Nu HTML checker and epubcheck jars through `java -jar`
///
/// A jar that is not configured skips its checks.
#[derive(Debug, Clone)]
pub struct CommandChecker {
    java: PathBuf,
    vnu_jar: Option<PathBuf>,
    epubcheck_jar: Option<PathBuf>,
}

#[derive(Deserialize)]
struct VnuOutput {
    messages: Vec<VnuMessage>,
}

#[derive(Deserialize)]
struct EpubcheckOutput {
    #[serde(default)]
    messages: Vec<EpubcheckMessage>,
}

impl CommandChecker {
    pub fn new(java: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            vnu_jar: None,
            epubcheck_jar: None,
        }
    }

    pub fn with_vnu_jar(mut self, jar: impl Into<PathBuf>) -> Self {
        self.vnu_jar = Some(jar.into());
        self
    }

    pub fn with_epubcheck_jar(mut self, jar: impl Into<PathBuf>) -> Self {
        self.epubcheck_jar = Some(jar.into());
        self
    }

    /// Runs `java -jar <jar> <args>` and returns its stdout
    fn run_jar(&self, checker: &str, jar: &Path, args: &[&std::ffi::OsStr]) -> Result<Vec<u8>> {
        tracing::debug!("Running {} on {:?}", checker, args.last());
        let output = Command::new(&self.java)
            .arg("-jar")
            .arg(jar)
            .args(args)
            .output()
            .map_err(|e| ValidatorError::Checker {
                checker: checker.to_string(),
                message: format!("failed to start {}: {}", self.java.display(), e),
            })?;
        Ok(output.stdout)
    }
}

impl Default for CommandChecker {
    fn default() -> Self {
        Self::new("java")
    }
}

impl ExternalChecker for CommandChecker {
    fn check_markup(&self, path: &Path, kind: MarkupKind) -> Result<Vec<VnuMessage>> {
        let Some(jar) = &self.vnu_jar else {
            return Ok(Vec::new());
        };

        let stdout = self.run_jar(
            "vnu",
            jar,
            &[
                kind.flag().as_ref(),
                "--exit-zero-always".as_ref(),
                "--stdout".as_ref(),
                "--format".as_ref(),
                "json".as_ref(),
                path.as_os_str(),
            ],
        )?;
        parse_vnu_output(&stdout)
    }

    fn check_epub(&self, path: &Path) -> Result<Vec<EpubcheckMessage>> {
        let Some(jar) = &self.epubcheck_jar else {
            return Ok(Vec::new());
        };

        let stdout = self.run_jar(
            "epubcheck",
            jar,
            &[path.as_os_str(), "--json".as_ref(), "-".as_ref()],
        )?;
        let output: EpubcheckOutput =
            serde_json::from_slice(&stdout).map_err(|e| ValidatorError::Checker {
                checker: "epubcheck".to_string(),
                message: format!("unreadable output: {}", e),
            })?;
        Ok(output.messages)
    }
}

/// Parses the JSON report of the Nu checker
///
/// A `non-document-error` means the checker failed on its own, not on the
/// document, and is fatal.
fn parse_vnu_output(stdout: &[u8]) -> Result<Vec<VnuMessage>> {
    let output: VnuOutput = serde_json::from_slice(stdout).map_err(|e| ValidatorError::Checker {
        checker: "vnu".to_string(),
        message: format!("unreadable output: {}", e),
    })?;

    if let Some(failure) = output
        .messages
        .iter()
        .find(|message| message.kind == "non-document-error")
    {
        return Err(ValidatorError::Checker {
            checker: "vnu".to_string(),
            message: failure.message.clone(),
        });
    }

    Ok(output.messages)
}
