//! Chunked file content comparison

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{Error, Result};

const CHUNK_SIZE: usize = 8 * 1024;

/// Compare two files and report whether their contents differ.
///
/// A path that is missing or not a regular file counts as different,
/// as does a size mismatch. Contents are read in fixed-size chunks in
/// lockstep; neither file is loaded fully into memory.
pub fn files_differ(a: &Path, b: &Path) -> Result<bool> {
    let Some((mut file_a, len_a)) = open_regular(a)? else {
        return Ok(true);
    };
    let Some((mut file_b, len_b)) = open_regular(b)? else {
        return Ok(true);
    };

    if len_a != len_b {
        return Ok(true);
    }

    let mut buf_a = [0u8; CHUNK_SIZE];
    let mut buf_b = [0u8; CHUNK_SIZE];
    loop {
        let read_a = read_chunk(&mut file_a, &mut buf_a).map_err(|e| Error::io(a, e))?;
        let read_b = read_chunk(&mut file_b, &mut buf_b).map_err(|e| Error::io(b, e))?;
        if read_a != read_b || buf_a[..read_a] != buf_b[..read_b] {
            return Ok(true);
        }
        if read_a == 0 {
            return Ok(false);
        }
    }
}

/// Compare an on-disk file against desired in-memory content.
///
/// Same policy as [`files_differ`]: missing means different.
pub fn file_differs_from(path: &Path, want: &[u8]) -> Result<bool> {
    let Some((mut file, len)) = open_regular(path)? else {
        return Ok(true);
    };

    if len != want.len() as u64 {
        return Ok(true);
    }

    let mut buf = [0u8; CHUNK_SIZE];
    let mut offset = 0usize;
    loop {
        let read = read_chunk(&mut file, &mut buf).map_err(|e| Error::io(path, e))?;
        if read == 0 {
            return Ok(offset != want.len());
        }
        if offset + read > want.len() || buf[..read] != want[offset..offset + read] {
            return Ok(true);
        }
        offset += read;
    }
}

fn open_regular(path: &Path) -> Result<Option<(File, u64)>> {
    match File::open(path) {
        Ok(file) => {
            let meta = file.metadata().map_err(|e| Error::io(path, e))?;
            if meta.is_file() {
                Ok(Some((file, meta.len())))
            } else {
                Ok(None)
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

fn read_chunk(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
