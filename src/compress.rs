//! Gzip support for the collection endpoints.
//!
//! Exports are compressed straight into memory and handed to the multipart
//! body, so no compressed artifact is ever left on disk.

use std::io::{self, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Read a file and return its gzip-compressed bytes.
pub fn gzip_file(path: &Path) -> io::Result<Vec<u8>> {
    let contents = std::fs::read(path)?;
    gzip_bytes(&contents)
}

pub fn gzip_bytes(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
