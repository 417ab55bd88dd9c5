//! Two-pass PCK writer (C8, §4.7, §6.1). The centerpiece of the packaging core.
use crate::ext::io::{ReadExt, SeekExt, WriteAt, WriteExt};
use crate::filter::GlobList;
use crate::pack::crypto::encrypt_cfb;
use crate::pad::{self, DEFAULT_ALIGNMENT};
use anyhow::{Context, Result, bail};
use std::io::{Read, Seek, SeekFrom, Write};

pub const MAGIC: u32 = 0x4350_4447;
pub const FORMAT_VERSION: u32 = 2;
const DIR_ENCRYPTED_FLAG: u32 = 1;
const FILE_ENCRYPTED_FLAG: u32 = 1;
const COPY_CHUNK: usize = 16 * 1024;

/// Engine version triple stamped into the header (§6.1). Not meaningful beyond
/// being round-tripped by a loader; held fixed for this implementation.
#[derive(Debug, Clone, Copy)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// A source of padding bytes for body/directory alignment. Production builds use
/// [`pad::fill_padding`]; test builds that need byte-identical archives (R2) use
/// [`pad::fill_padding_deterministic`].
pub type PaddingFn = fn(&mut [u8]);

/// Configuration for one [`PackWriter`] run.
pub struct PackOptions {
    pub engine_version: EngineVersion,
    pub enc_pck: bool,
    pub enc_directory: bool,
    pub key: [u8; 32],
    pub body_include: GlobList,
    pub body_exclude: GlobList,
    pub padding_fn: PaddingFn,
    /// If set, the PCK is appended after the existing contents of this stream
    /// rather than written from offset 0 (§4.7 step 1, embedding).
    pub embed: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            engine_version: EngineVersion {
                major: 4,
                minor: 0,
                patch: 0,
            },
            enc_pck: false,
            enc_directory: false,
            key: [0u8; 32],
            body_include: GlobList::default(),
            body_exclude: GlobList::default(),
            padding_fn: pad::fill_padding,
            embed: false,
        }
    }
}

struct StagedEntry {
    path: String,
    offset: u64,
    size: u64,
    md5: [u8; 16],
    encrypted: bool,
}

/// Stages payloads to a temporary stream, then splices a header and directory
/// index ahead of the bodies in the destination stream (§4.7).
pub struct PackWriter<T: Read + Write + Seek> {
    options: PackOptions,
    temp: T,
    entries: Vec<StagedEntry>,
}

impl<T: Read + Write + Seek> PackWriter<T> {
    pub fn new(temp: T, options: PackOptions) -> Self {
        Self {
            options,
            temp,
            entries: Vec::new(),
        }
    }

    /// Stages one payload (Pass 1, §4.7 steps 1-5).
    pub fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        let offset = self.temp.stream_position()?;
        let md5 = pad::md5_digest(bytes);

        let resource = crate::types::ResourcePath::new(path);
        let mut encrypted = false;
        if self.options.body_include.matches(&resource) {
            encrypted = true;
        }
        if self.options.body_exclude.matches(&resource) {
            encrypted = false;
        }

        if encrypted {
            let ciphertext = encrypt_cfb(&self.options.key, bytes).context("encrypting body")?;
            self.temp.write_all(&ciphertext)?;
        } else {
            self.temp.write_all(bytes)?;
        }

        let written = self.temp.stream_position()? - offset;
        debug_assert_eq!(written, bytes.len() as u64);
        let pad_len = pad::pad_amount(DEFAULT_ALIGNMENT, written);
        if pad_len > 0 {
            let mut padding = vec![0u8; pad_len as usize];
            (self.options.padding_fn)(&mut padding);
            self.temp.write_all(&padding)?;
        }

        self.entries.push(StagedEntry {
            path: path.trim_start_matches("res://").to_string(),
            offset,
            size: bytes.len() as u64,
            md5,
            encrypted,
        });
        Ok(())
    }

    /// Finalizes the archive into `dest` (Pass 2, §4.7 steps 1-14). Returns
    /// `(embedded_start, embedded_size)` when `options.embed` is set.
    pub fn finish<D: Write + Seek>(mut self, mut dest: D) -> Result<(u64, u64)> {
        self.entries.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));

        let embed_pos = if self.options.embed {
            dest.seek(SeekFrom::End(0))?
        } else {
            0
        };
        if self.options.embed {
            let pad_len = pad::pad_amount(8, embed_pos);
            if pad_len > 0 {
                dest.write_all(&vec![0u8; pad_len as usize])?;
            }
        }

        let pck_start = dest.stream_position()?;
        dest.write_u32(MAGIC)?;
        dest.write_u32(FORMAT_VERSION)?;
        dest.write_u32(self.options.engine_version.major)?;
        dest.write_u32(self.options.engine_version.minor)?;
        dest.write_u32(self.options.engine_version.patch)?;

        let dir_encrypted = self.options.enc_pck && self.options.enc_directory;
        let pack_flags: u32 = if dir_encrypted { DIR_ENCRYPTED_FLAG } else { 0 };
        dest.write_u32(pack_flags)?;

        let file_base_ofs = dest.stream_position()?;
        dest.write_u64(0)?; // files_base placeholder

        for _ in 0..16 {
            dest.write_u32(0)?;
        }
        dest.write_u32(self.entries.len() as u32)?;

        if dir_encrypted {
            let mut buf = Vec::new();
            Self::write_directory(&mut buf, &self.entries)?;
            let ciphertext = encrypt_cfb(&self.options.key, &buf).context("encrypting directory")?;
            dest.write_all(&ciphertext)?;
        } else {
            Self::write_directory(&mut dest, &self.entries)?;
        }

        let dir_end = dest.stream_position()?;
        let pad_len = pad::pad_amount(DEFAULT_ALIGNMENT, dir_end - pck_start);
        if pad_len > 0 {
            let mut padding = vec![0u8; pad_len as usize];
            (self.options.padding_fn)(&mut padding);
            dest.write_all(&padding)?;
        }

        let file_base = dest.stream_position()?;
        dest.write_u64_at(file_base_ofs, file_base)?;

        self.temp.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; COPY_CHUNK];
        loop {
            let n = self.temp.read(&mut buf)?;
            if n == 0 {
                break;
            }
            dest.write_all(&buf[..n])?;
        }

        let mut trailer_end = dest.stream_position()?;
        if self.options.embed {
            let pad_len = pad_amount_embed(embed_pos, trailer_end);
            if pad_len > 0 {
                dest.write_all(&vec![0u8; pad_len as usize])?;
                trailer_end += pad_len;
            }
            let pck_size = trailer_end - pck_start;
            dest.write_u64(pck_size)?;
            dest.write_u32(MAGIC)?;
            return Ok((pck_start, pck_size + 12));
        }

        Ok((pck_start, trailer_end - pck_start))
    }

    fn write_directory<W: Write>(out: &mut W, entries: &[StagedEntry]) -> Result<()> {
        for entry in entries {
            let path_bytes = entry.path.as_bytes();
            let pad4 = pad::pad_amount(4, path_bytes.len() as u64) as usize;
            out.write_u32((path_bytes.len() + pad4) as u32)?;
            out.write_all(path_bytes)?;
            out.write_all(&vec![0u8; pad4])?;
            out.write_u64(entry.offset)?;
            out.write_u64(entry.size)?;
            out.write_all(&entry.md5)?;
            let flags: u32 = if entry.encrypted { FILE_ENCRYPTED_FLAG } else { 0 };
            out.write_u32(flags)?;
        }
        Ok(())
    }
}

/// The embedded-trailer padding formula from §4.7 step 14 / §9: the trailer
/// that follows is 12 bytes, so padding targets 8-byte alignment *as if* those
/// 12 bytes were already written.
fn pad_amount_embed(embed_pos: u64, position: u64) -> u64 {
    let delta = (position - embed_pos + 12) % 8;
    if delta == 0 { 0 } else { 8 - delta }
}

/// Reads a PCK's trailer from a stream whose end is the end of an (optionally
/// embedding) executable, per §6.2/I5: the last 12 bytes are `(pck_size, magic)`.
pub fn read_embedded_trailer<R: Read + Seek>(mut src: R) -> Result<(u64, u64)> {
    let total_len = src.stream_length()?;
    if total_len < 12 {
        bail!("file too small to contain an embedded PCK trailer");
    }
    src.seek(SeekFrom::End(-12))?;
    let pck_size = src.read_u64()?;
    let magic = src.read_u32()?;
    if magic != MAGIC {
        bail!("trailer magic mismatch: found {magic:#010x}, expected {MAGIC:#010x}");
    }
    let pck_start = total_len - 12 - pck_size;
    Ok((pck_start, pck_size))
}
