//! Local file source loader.

use std::path::Path;

use super::FetchError;

/// Loads lists from local files.
pub struct FileLoader;

impl FileLoader {
    /// Read a local list.
    ///
    /// Local sources never fall back to the archive: any read failure is
    /// reported and the source is skipped by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::LocalReadFailed`] if the file cannot be read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use hostsgen::source::loader::FileLoader;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let body = FileLoader::load(Path::new("/etc/hostsgen/local.txt")).await?;
    /// println!("Read {} bytes", body.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load(path: &Path) -> Result<Vec<u8>, FetchError> {
        tokio::fs::read(path)
            .await
            .map_err(|source| FetchError::LocalReadFailed {
                path: path.to_path_buf(),
                source,
            })
    }
}
