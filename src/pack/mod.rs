//! Archive emitters: the PCK writer (C8), its AES-256-CFB sink (C11), and the
//! ZIP alternative (C9).
pub mod crypto;
pub mod emitter;
pub mod zip;
