//! Small stateless helpers shared across modules: shell resolution, title
//! truncation, and the pty-attach environment variables.

use std::env;
use std::path::Path;

/// Resolve the login shell the way spec.md section 6 describes:
/// `$SHELL` if absolute, executable, and not our own binary; else the
/// password-database shell; else `/bin/sh`.
pub fn resolve_shell(own_exe_name: &str) -> String {
    if let Ok(shell) = env::var("SHELL") {
        if is_usable_shell(&shell, own_exe_name) {
            return shell;
        }
    }
    if let Some(shell) = passwd_shell() {
        if is_usable_shell(&shell, own_exe_name) {
            return shell;
        }
    }
    "/bin/sh".to_string()
}

fn is_usable_shell(path: &str, own_exe_name: &str) -> bool {
    let p = Path::new(path);
    if !p.is_absolute() {
        return false;
    }
    let basename = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
    if basename == own_exe_name {
        return false;
    }
    is_executable(p)
}

#[cfg(unix)]
fn is_executable(p: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(p)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(unix)]
fn passwd_shell() -> Option<String> {
    unsafe {
        let pw = libc::getpwuid(libc::getuid());
        if pw.is_null() {
            return None;
        }
        let cstr = std::ffi::CStr::from_ptr((*pw).pw_shell);
        cstr.to_str().ok().map(|s| s.to_string())
    }
}

/// Truncate a title right-to-fit within `max` display cells, matching
/// spec.md's "truncated right-to-fit when drawn" rule for `Client.title`.
pub fn truncate_right(s: &str, max: usize) -> String {
    use unicode_width::UnicodeWidthStr;
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut width = 0usize;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w > max {
            break;
        }
        out.push(ch);
        width += w;
    }
    out
}

/// Title byte-length cap from spec.md section 3 (255 bytes, last byte
/// reserved for NUL-terminator semantics carried over from the C model).
pub const MAX_TITLE_BYTES: usize = 254;

pub fn truncate_title_bytes(s: &str) -> String {
    if s.len() <= MAX_TITLE_BYTES {
        return s.to_string();
    }
    let mut end = MAX_TITLE_BYTES;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_rejects_own_binary() {
        assert!(!is_usable_shell("/usr/bin/tilemux", "tilemux"));
    }

    #[test]
    fn shell_rejects_relative_path() {
        assert!(!is_usable_shell("bash", "tilemux"));
    }

    #[test]
    fn truncate_right_respects_width() {
        assert_eq!(truncate_right("hello world", 5), "hello");
        assert_eq!(truncate_right("hi", 5), "hi");
    }

    #[test]
    fn truncate_title_bytes_caps_length() {
        let long = "x".repeat(300);
        assert_eq!(truncate_title_bytes(&long).len(), MAX_TITLE_BYTES);
    }
}
