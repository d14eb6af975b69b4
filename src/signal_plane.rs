//! L1 SelfPipe + L12 SignalPlane — async-signal-safe notification from
//! `SIGWINCH`/`SIGCHLD`/`SIGTERM` into the cooperative event loop, per
//! spec.md section 5: "Signal handlers perform only async-signal-safe
//! work: `write(1 byte)` into a non-blocking self-pipe."
//!
//! Grounded on the teacher's own comment in `app.rs` about avoiding shared
//! mutable state across OS callbacks; there is no self-pipe precedent in
//! the teacher (Windows-only, no POSIX signals), so the pipe mechanics
//! here are learned from `other_examples/` and the `libc` crate itself.

use std::io::{self, Read};
use std::os::unix::io::{FromRawFd, RawFd};
use std::sync::atomic::{AtomicI32, Ordering};

static WINCH_WRITE_FD: AtomicI32 = AtomicI32::new(-1);
static CHLD_WRITE_FD: AtomicI32 = AtomicI32::new(-1);
static TERM_WRITE_FD: AtomicI32 = AtomicI32::new(-1);

extern "C" fn on_winch(_sig: libc::c_int) {
    write_one_byte(WINCH_WRITE_FD.load(Ordering::Relaxed));
}

extern "C" fn on_chld(_sig: libc::c_int) {
    write_one_byte(CHLD_WRITE_FD.load(Ordering::Relaxed));
}

extern "C" fn on_term(_sig: libc::c_int) {
    write_one_byte(TERM_WRITE_FD.load(Ordering::Relaxed));
}

fn write_one_byte(fd: RawFd) {
    if fd < 0 {
        return;
    }
    let byte: u8 = 1;
    unsafe {
        libc::write(fd, &byte as *const u8 as *const libc::c_void, 1);
    }
}

/// One self-pipe: a non-blocking pipe whose write end a signal handler
/// uses and whose read end the event loop polls.
pub struct SelfPipe {
    read_end: std::fs::File,
}

impl SelfPipe {
    fn new(write_fd_cell: &'static AtomicI32) -> io::Result<Self> {
        let mut fds: [libc::c_int; 2] = [0; 2];
        if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK | libc::O_CLOEXEC) } != 0 {
            return Err(io::Error::last_os_error());
        }
        write_fd_cell.store(fds[1], Ordering::Relaxed);
        Ok(SelfPipe { read_end: unsafe { std::fs::File::from_raw_fd(fds[0]) } })
    }

    /// Drain the pipe fully in a tight non-blocking loop, per spec.md 4.9
    /// tick 7. Returns `true` if at least one byte was pending.
    pub fn drain(&mut self) -> bool {
        let mut buf = [0u8; 64];
        let mut any = false;
        loop {
            match self.read_end.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => any = true,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        any
    }
}

/// The three self-pipes plus the handlers installed for them. `SIGPIPE` is
/// ignored process-wide rather than piped (spec.md section 7), since
/// nothing in the event loop needs to react to it beyond "don't die".
pub struct SignalPlane {
    pub winch: SelfPipe,
    pub chld: SelfPipe,
    pub term: SelfPipe,
}

impl SignalPlane {
    pub fn install() -> io::Result<Self> {
        let winch = SelfPipe::new(&WINCH_WRITE_FD)?;
        let chld = SelfPipe::new(&CHLD_WRITE_FD)?;
        let term = SelfPipe::new(&TERM_WRITE_FD)?;

        install_handler(libc::SIGWINCH, on_winch)?;
        install_handler(libc::SIGCHLD, on_chld)?;
        install_handler(libc::SIGTERM, on_term)?;
        ignore_signal(libc::SIGPIPE)?;

        Ok(SignalPlane { winch, chld, term })
    }
}

fn install_handler(signum: libc::c_int, handler: extern "C" fn(libc::c_int)) -> io::Result<()> {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = handler as usize;
        libc::sigemptyset(&mut sa.sa_mask);
        sa.sa_flags = libc::SA_RESTART;
        if libc::sigaction(signum, &sa, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn ignore_signal(signum: libc::c_int) -> io::Result<()> {
    unsafe {
        if libc::signal(signum, libc::SIG_IGN) == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Kill a child's whole process group with `SIGKILL`, per spec.md
/// section 5's cancellation rule.
pub fn kill_process_group(pid: libc::pid_t) {
    unsafe {
        libc::kill(-pid, libc::SIGKILL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_pipe_drain_reports_pending_byte() {
        let mut fds: [libc::c_int; 2] = [0; 2];
        unsafe {
            libc::pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK);
        }
        let read_end = unsafe { std::fs::File::from_raw_fd(fds[0]) };
        let mut pipe = SelfPipe { read_end };
        let byte: u8 = 1;
        unsafe {
            libc::write(fds[1], &byte as *const u8 as *const libc::c_void, 1);
        }
        assert!(pipe.drain());
        assert!(!pipe.drain());
        unsafe {
            libc::close(fds[1]);
        }
    }
}
