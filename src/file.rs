//! Whole-file reads and writes by path.
//!
//! A [`TextFile`] holds no handle: every operation opens the file, does its
//! work and closes it again, so several processes can append to the same
//! file. Files are opened with shared read and write access.

use std::{
    ffi::{CStr, CString},
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};
use widestring::U16String;

use crate::{
    Error,
    string::{self, CodePage},
    util::until_nul,
};

const UTF16_BOM: u16 = 0xFEFF;

/// A file addressed by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    path: PathBuf,
}

impl TextFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a `TextFile` from a path in the ambient ANSI code page.
    pub fn from_multi_byte(path: &CStr) -> Result<Self, Error> {
        let path = string::unicode_string(path)?;
        Ok(Self::new(path.to_os_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `contents` to the end of the file, creating it if it does not
    /// exist. Existing contents are never truncated.
    pub fn append(&self, contents: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        file.write_all(contents)
    }

    /// Replace the contents of the file with `contents`, creating it if it
    /// does not exist.
    pub fn create(&self, contents: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(contents)
    }

    /// Read the entire file.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    /// Read the file as multi-byte text in `code_page`, up to the first
    /// null byte.
    ///
    /// Decoding falls back like [`string::to_unicode`].
    pub fn read_text(&self, code_page: CodePage) -> Result<U16String, Error> {
        let mut contents = self.read()?;
        if let Some(end) = contents.iter().position(|&b| b == 0) {
            contents.truncate(end);
        }
        // No interior nulls remain
        let text = CString::new(contents).map_err(|_| Error::Conversion {
            code_page: code_page.id(),
        })?;
        string::to_unicode(&text, code_page)
    }

    /// Read the file as little-endian UTF-16 text, up to the first null
    /// character. A leading byte order mark is removed.
    pub fn read_unicode_text(&self) -> io::Result<U16String> {
        let contents = self.read()?;
        let units: Vec<u16> = contents
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        let text = until_nul(&units);
        let text = text.strip_prefix(&[UTF16_BOM]).unwrap_or(text);
        Ok(U16String::from_vec(text))
    }
}
