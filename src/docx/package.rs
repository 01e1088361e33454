//! OPC package (zip container) access.

use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Compound File Binary signature used by legacy `.doc` files.
const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// Zip local file header signature.
const ZIP_MAGIC: [u8; 2] = [0x50, 0x4B];

/// The parts of a package, in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a package from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Read a package from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.starts_with(&OLE_MAGIC) {
            return Err(Error::UnsupportedFormat(
                "legacy binary Word document (.doc)".to_string(),
            ));
        }
        if !data.starts_with(&ZIP_MAGIC) {
            return Err(Error::UnsupportedFormat(
                "not a WordprocessingML package".to_string(),
            ));
        }

        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            parts.push((file.name().to_string(), bytes));
        }

        log::debug!("Opened package with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// A part decoded as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<Option<String>> {
        match self.part(name) {
            Some(data) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| Error::InvalidPackage(format!("{name} is not UTF-8: {e}"))),
            None => Ok(None),
        }
    }

    /// A part that must exist, decoded as UTF-8 text.
    pub fn require_str(&self, name: &str) -> Result<String> {
        self.part_str(name)?
            .ok_or_else(|| Error::InvalidPackage(format!("missing part {name}")))
    }

    /// Check if the package contains a part.
    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Part names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Insert or replace a part.
    pub fn set_part(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        let name = name.into();
        let data = data.into();
        match self.parts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name, data)),
        }
    }

    /// Write the package as a zip archive.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?)
    }

    /// Serialize the package to memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let cursor = self.write_to(Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    /// Write the package to `path` through a temporary file in the same
    /// directory, so a failure never leaves a partial file at `path`.
    pub fn save_atomic<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let tmp = NamedTempFile::new_in(dir).map_err(|e| save_error(path, e))?;
        let file: File = tmp.reopen().map_err(|e| save_error(path, e))?;
        let file = self.write_to(file).map_err(|e| save_error(path, e))?;
        file.sync_all().map_err(|e| save_error(path, e))?;
        tmp.persist(path).map_err(|e| save_error(path, e.error))?;

        log::debug!("Saved package to {}", path.display());
        Ok(())
    }
}

fn save_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::SaveFailed(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Package {
        let mut pkg = Package::new();
        pkg.set_part("word/document.xml", b"<w:document/>".to_vec());
        pkg.set_part("word/media/image1.png", vec![1, 2, 3]);
        pkg
    }

    #[test]
    fn test_set_part_replaces() {
        let mut pkg = sample();
        pkg.set_part("word/document.xml", b"<x/>".to_vec());
        assert_eq!(pkg.part_names().count(), 2);
        assert_eq!(pkg.part("word/document.xml"), Some(&b"<x/>"[..]));
    }

    #[test]
    fn test_bytes_reopen() {
        let bytes = sample().to_bytes().unwrap();
        let pkg = Package::from_bytes(&bytes).unwrap();
        assert_eq!(
            pkg.part_names().collect::<Vec<_>>(),
            vec!["word/document.xml", "word/media/image1.png"]
        );
        assert_eq!(pkg.part("word/media/image1.png"), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_legacy_doc_rejected() {
        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        let err = Package::from_bytes(&ole).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));

        let err = Package::from_bytes(b"plain text").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_require_missing_part() {
        let err = sample().require_str("word/styles.xml").unwrap_err();
        assert!(matches!(err, Error::InvalidPackage(_)));
    }

    #[test]
    fn test_save_atomic_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nope").join("out.docx");
        let err = sample().save_atomic(&target).unwrap_err();
        assert!(matches!(err, Error::SaveFailed(_)));
        assert!(!target.exists());
    }

    #[test]
    fn test_save_atomic_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.docx");
        sample().save_atomic(&target).unwrap();
        let pkg = Package::open(&target).unwrap();
        assert!(pkg.has_part("word/document.xml"));
    }
}
