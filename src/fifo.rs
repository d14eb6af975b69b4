//! L2 FifoOpener — open-or-create a named pipe for the status/command FIFO
//! options (spec.md section 6: `-s FIFO` / `-c FIFO`).
//!
//! Grounded on the teacher's `platform.rs` Unix-socket bootstrap (create
//! the node if absent, then open non-blocking) but targeting `mkfifo`
//! instead of a Unix domain socket, since spec.md names plain FIFOs.

use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::unix::io::FromRawFd;

/// Create `path` as a FIFO if it doesn't already exist (ignoring `EEXIST`),
/// then open it read-write, non-blocking, so a lone reader never blocks
/// waiting for a writer (and vice versa) — spec.md section 5's
/// "FIFOs are opened O_NONBLOCK" suspension-point rule.
pub fn open_or_create(path: &str) -> io::Result<File> {
    let c_path = CString::new(path).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "NUL in fifo path"))?;

    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EEXIST) {
            return Err(err);
        }
    }

    let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR | libc::O_NONBLOCK) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { File::from_raw_fd(fd) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn open_or_create_roundtrips_a_write() {
        let dir = std::env::temp_dir().join(format!("tilemux-fifo-test-{}", std::process::id()));
        let path = dir.to_str().unwrap().to_string();
        let _ = std::fs::remove_file(&path);

        let mut w = open_or_create(&path).expect("create fifo");
        let mut r = open_or_create(&path).expect("reopen fifo");

        w.write_all(b"hello\n").expect("write");
        drop(w);

        let mut buf = [0u8; 16];
        // Give the non-blocking read a moment; a FIFO with data queued
        // returns immediately regardless, so no sleep is needed here.
        let n = loop {
            match r.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => panic!("read failed: {e}"),
            }
        };
        assert_eq!(&buf[..n], b"hello\n");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn open_or_create_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("tilemux-fifo-test2-{}", std::process::id()));
        let path = dir.to_str().unwrap().to_string();
        let _ = std::fs::remove_file(&path);

        let _a = open_or_create(&path).expect("first create");
        let _b = open_or_create(&path).expect("second open reuses existing node");
        let _ = std::fs::remove_file(&path);
    }
}
