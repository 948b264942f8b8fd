//! Schema File Reconciler
//!
//! Development mode rewrites the cache file from the freshly built document.
//! Production mode trusts the file: a missing or malformed file leaves the
//! schema unsynchronized without failing startup.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::Mode;
use crate::error::{Result, SchemaError};
use crate::schema::SchemaDocument;

pub const MSG_FILE_MISSING: &str = "The .forestadmin-schema.json file does not exist.";
pub const MSG_NOT_SYNCHRONIZED: &str = "The schema cannot be synchronized with Forest Admin servers.";
pub const MSG_INVALID_JSON: &str = "The content of .forestadmin-schema.json file is not a correct JSON.";

/// The persisted schema cache file
#[derive(Debug, Clone)]
pub struct SchemaFile {
    path: PathBuf,
}

impl SchemaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the document as 2-space indented JSON, replacing prior content
    pub fn persist(&self, document: &SchemaDocument) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, document)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        tracing::debug!(path = %self.path.display(), "schema file written");
        Ok(())
    }

    /// Read and parse the file
    pub fn load_and_validate(&self) -> Result<SchemaDocument> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SchemaError::SchemaFileMissing(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut content = String::new();
        file.read_to_string(&mut content).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => self.invalid(e.to_string()),
            _ => SchemaError::Io(e),
        })?;

        serde_json::from_str(&content).map_err(|e| self.invalid(e.to_string()))
    }

    fn invalid(&self, reason: String) -> SchemaError {
        SchemaError::SchemaFileInvalid {
            path: self.path.clone(),
            reason,
        }
    }

    /// One reconciliation pass
    ///
    /// Returns the schema to synchronize, or `None` when production mode
    /// cannot use the file. Only a development-mode write failure is an error.
    pub fn reconcile(&self, mode: Mode, built: &SchemaDocument) -> Result<Option<SchemaDocument>> {
        match mode {
            Mode::Development => {
                self.persist(built)?;
                Ok(Some(built.clone()))
            }
            Mode::Production => match self.load_and_validate() {
                Ok(persisted) => {
                    self.report_drift(built, &persisted);
                    Ok(Some(persisted))
                }
                Err(SchemaError::SchemaFileMissing(_)) => {
                    tracing::warn!("{}", MSG_FILE_MISSING);
                    tracing::warn!("{}", MSG_NOT_SYNCHRONIZED);
                    Ok(None)
                }
                Err(SchemaError::SchemaFileInvalid { reason, .. }) => {
                    tracing::debug!(%reason, "schema file rejected");
                    tracing::warn!("{}", MSG_INVALID_JSON);
                    tracing::warn!("{}", MSG_NOT_SYNCHRONIZED);
                    Ok(None)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cannot read schema file");
                    tracing::warn!("{}", MSG_NOT_SYNCHRONIZED);
                    Ok(None)
                }
            },
        }
    }

    fn report_drift(&self, built: &SchemaDocument, persisted: &SchemaDocument) {
        match (built.checksum(), persisted.checksum()) {
            (Ok(current), Ok(on_disk)) if current != on_disk => {
                tracing::warn!(
                    built = current.short(),
                    persisted = on_disk.short(),
                    "schema file differs from the models, regenerate it in debug mode"
                );
            }
            _ => {}
        }
    }
}
