//! Struct archiving functionality
//!
//! To add archiving functionality to a struct implement the `Archived` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::path::Path;
use std::fs::{File, OpenOptions};
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
///
/// A default archiver is not attached to any file and discards records, which
/// lets modules run without a session (for example in tests).
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot open the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot write the archive record: {0}")]
    CsvError(csv::Error),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as a timestamped csv.
///
/// To implement this trait, the struct shall have an `Archiver` member per
/// archive file. The archivers shall be setup in the struct's `init` or `new`
/// functions. 
pub trait Archived {
    /// Write the archives for this struct
    fn write(&mut self) -> Result<(), ArchiveError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        // Make sure the module's archive directory exists
        if let Some(parent) = session_path.parent() {
            std::fs::create_dir_all(parent).map_err(ArchiveError::FileError)?;
        }
        
        // Open the file in append mode, creating it if it does not exist
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(session_path)
            .map_err(ArchiveError::FileError)?;

        let w = WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);

        Ok(Self {
            writer: Some(w)
        })
    }

    /// Returns true if the archiver is attached to a file.
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Serialise a record into the archive.
    ///
    /// Records must be flat structs, the CSV writer does not support nested
    /// containers.
    pub fn serialise<T: Serialize>(
        &mut self, record: T
    ) -> Result<(), ArchiveError> {
        if let Some(ref mut w) = self.writer {
            w.serialize(record).map_err(ArchiveError::CsvError)?;
            w.flush().map_err(ArchiveError::FileError)?;
        }

        Ok(())
    }
}

/// Get the time to stamp an archive record with.
///
/// Returns NaN if no session has been started.
pub fn record_time_s() -> f64 {
    match crate::session::try_get_elapsed_seconds() {
        Some(t) => t,
        None => std::f64::NAN
    }
}
