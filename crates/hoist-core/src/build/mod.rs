//! Build adapter: runs the external package compiler and turns its output
//! into an [`ArtifactDescriptor`].
//!
//! Each build runs in a fresh, process-exclusive temporary install directory
//! that is removed when the build returns, fails, or its future is dropped
//! (the compiler child is killed on drop as well). No caching.

mod output;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

pub use output::parse_build_output;

use crate::error::{Error, Result};
use crate::types::ObjectId;

/// Default compiler binary.
pub const DEFAULT_COMPILER: &str = "sui";

/// Compiled package, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    modules: Vec<Vec<u8>>,
    dependencies: Vec<ObjectId>,
    digest: Vec<u8>,
}

impl ArtifactDescriptor {
    pub fn new(modules: Vec<Vec<u8>>, dependencies: Vec<ObjectId>, digest: Vec<u8>) -> Self {
        Self {
            modules,
            dependencies,
            digest,
        }
    }

    /// Bytecode modules in compiler order.
    pub fn modules(&self) -> &[Vec<u8>] {
        &self.modules
    }

    /// Packages the modules link against, deduplicated, compiler order.
    pub fn dependencies(&self) -> &[ObjectId] {
        &self.dependencies
    }

    /// Content digest binding an upgrade authorization to this bytecode.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

/// How the compiler is invoked.
#[derive(Debug, Clone)]
pub struct BuildAdapter {
    /// Compiler command line, e.g. `sui` or `cargo run --bin sui`.
    compiler: String,
    with_unpublished_dependencies: bool,
    /// Where per-build install directories are created; system temp dir if unset.
    scratch_root: Option<PathBuf>,
}

impl Default for BuildAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_COMPILER)
    }
}

impl BuildAdapter {
    pub fn new(compiler: impl Into<String>) -> Self {
        Self {
            compiler: compiler.into(),
            with_unpublished_dependencies: false,
            scratch_root: None,
        }
    }

    pub fn with_scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(dir.into());
        self
    }

    /// Bundle not-yet-published dependencies into the package (first publish).
    pub fn with_unpublished_dependencies(mut self, enabled: bool) -> Self {
        self.with_unpublished_dependencies = enabled;
        self
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub async fn build(&self, source_path: &Path) -> Result<ArtifactDescriptor> {
        if !source_path.is_dir() {
            return Err(Error::BuildFailed {
                diagnostics: format!("package directory not found: {}", source_path.display()),
            });
        }

        let mut words = self.compiler.split_whitespace();
        let program = words.next().ok_or_else(|| Error::BuildFailed {
            diagnostics: "compiler command is empty".to_string(),
        })?;

        let mut scratch = tempfile::Builder::new();
        scratch.prefix("hoist-build-");
        let install_dir = match &self.scratch_root {
            Some(root) => scratch.tempdir_in(root),
            None => scratch.tempdir(),
        }
        .map_err(|e| Error::BuildFailed {
            diagnostics: format!("failed to create build directory: {}", e),
        })?;

        let mut command = Command::new(program);
        command
            .args(words)
            .args(["move", "build", "--dump-bytecode-as-base64", "--path"])
            .arg(source_path)
            .arg("--install-dir")
            .arg(install_dir.path())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if self.with_unpublished_dependencies {
            command.arg("--with-unpublished-dependencies");
        }

        tracing::info!(
            path = %source_path.display(),
            install_dir = %install_dir.path().display(),
            "building package"
        );
        let output = command.output().await.map_err(|e| Error::BuildFailed {
            diagnostics: format!("failed to run compiler '{}': {}", program, e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(Error::BuildFailed {
                diagnostics: format!("{}\n{}", stderr.trim(), stdout.trim())
                    .trim()
                    .to_string(),
            });
        }

        let artifact = parse_build_output(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(
            modules = artifact.modules().len(),
            dependencies = artifact.dependencies().len(),
            "build complete"
        );
        // install_dir dropped here: temporary output removed.
        Ok(artifact)
    }
}
