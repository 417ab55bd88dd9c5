//! Single-pass DEFLATE ZIP alternative (C9, §4.8).
use anyhow::{Context, Result};
use std::io::{Seek, Write};
use zip::{ZipWriter, write::SimpleFileOptions};

/// Appends payloads to a standard ZIP archive, one at a time, in driver-enumeration
/// order. No encryption, no MD5, no alignment padding — this format exists purely
/// as the non-proprietary export alternative to the PCK (§4.8).
pub struct ZipEmitter<W: Write + Seek> {
    writer: ZipWriter<W>,
}

impl<W: Write + Seek> ZipEmitter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: ZipWriter::new(sink),
        }
    }

    /// Stores `bytes` under `path` with its `res://` prefix stripped.
    pub fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        let name = path.trim_start_matches("res://");
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        self.writer
            .start_file(name, options)
            .with_context(|| format!("starting zip entry for {name}"))?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.finish().context("finishing zip archive")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    #[test]
    fn strips_res_prefix_and_round_trips() {
        let mut emitter = ZipEmitter::new(Cursor::new(Vec::new()));
        emitter.add_file("res://a/b.txt", b"hello").unwrap();
        let cursor = emitter.finish().unwrap();

        let mut archive = ZipArchive::new(cursor).unwrap();
        let mut file = archive.by_name("a/b.txt").unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello");
    }
}
