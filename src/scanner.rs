use anyhow::Result;
use log::{debug, warn};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

/// File scanner for the documentation workspace and the KDF source tree.
///
/// The `FileScanner` recursively walks a directory and collects every file whose extension is
/// in its filter list. Build output (`target`), `node_modules` and hidden directories (those
/// starting with `.`) are skipped.
///
/// # Example
///
/// ```no_run
/// use kdf_docs_toolkit::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./src/pages")).with_extensions(&["mdx"]);
/// let result = scanner.scan().unwrap();
/// println!("Found {} MDX pages", result.files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    extensions: Vec<String>,
}

/// Result of directory scanning operation.
///
/// Contains the list of discovered files and any warnings encountered during scanning.
pub struct ScanResult {
    /// Matching files, sorted by path
    pub files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    ///
    /// The scanner looks for `.rs` files until [`FileScanner::with_extensions`] says otherwise.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The root directory to scan
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            extensions: vec!["rs".to_string()],
        }
    }

    /// Replaces the extension filter. Extensions are given without the leading dot.
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Scans the directory tree and collects all matching files.
    ///
    /// If any directories or files cannot be accessed, warnings are logged and added to
    /// the result, but scanning continues. A missing root yields an empty result with a
    /// single warning.
    ///
    /// # Returns
    ///
    /// Returns a `ScanResult` containing the sorted list of discovered files and any warnings.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut files = Vec::new();
        let mut warnings = Vec::new();

        if !self.root_path.exists() {
            let warning = format!("Directory does not exist: {}", self.root_path.display());
            warn!("{}", warning);
            warnings.push(warning);
            return Ok(ScanResult { files, warnings });
        }

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_skipped = e.file_type().is_dir() && SKIPPED_DIRS.contains(&&*file_name);

                !is_hidden && !is_skipped
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let matches = path
                        .extension()
                        .and_then(|s| s.to_str())
                        .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
                        .unwrap_or(false);

                    if entry.file_type().is_file() && matches {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        files.sort();
        debug!(
            "Scanned {}: {} files matching {:?}",
            self.root_path.display(),
            files.len(),
            self.extensions
        );

        Ok(ScanResult { files, warnings })
    }
}
