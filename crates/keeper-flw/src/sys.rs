// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host and process facts for `envi` and `mntr`.

use std::path::PathBuf;

/// Crate version reported by `mntr`, `srvr`, `stat` and `envi`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serving environment, gathered fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub host_name: String,
    pub os_name: &'static str,
    pub os_arch: &'static str,
    pub os_family: &'static str,
    pub cpu_count: usize,
    pub user_name: String,
    pub user_home: String,
    pub user_dir: String,
    pub user_tmp: String,
}

impl Environment {
    pub fn current() -> Self {
        Self {
            host_name: host_name().unwrap_or_default(),
            os_name: std::env::consts::OS,
            os_arch: std::env::consts::ARCH,
            os_family: std::env::consts::FAMILY,
            cpu_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            // Unknown user is not worth failing over.
            user_name: std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_default(),
            user_home: std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_default(),
            user_dir: std::env::current_dir()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            user_tmp: path_string(std::env::temp_dir()),
        }
    }
}

fn path_string(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(unix)]
fn host_name() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY:
    // - buf is a valid mutable buffer of 256 bytes
    // - gethostname writes at most buf.len() bytes
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if ret != 0 {
        return None;
    }
    // Truncated names may lack the terminator, so search instead of CStr::from_ptr.
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..end]).into_owned();
    (!name.is_empty()).then_some(name)
}

#[cfg(windows)]
fn host_name() -> Option<String> {
    std::env::var("COMPUTERNAME").ok().filter(|s| !s.is_empty())
}

#[cfg(not(any(unix, windows)))]
fn host_name() -> Option<String> {
    None
}

/// Number of descriptors currently open by this process.
#[cfg(any(target_os = "linux", target_os = "macos"))]
pub fn open_file_descriptor_count() -> Option<u64> {
    #[cfg(target_os = "linux")]
    const FD_DIR: &str = "/proc/self/fd";
    #[cfg(target_os = "macos")]
    const FD_DIR: &str = "/dev/fd";

    // The directory handle itself shows up in the listing.
    let entries = std::fs::read_dir(FD_DIR).ok()?.count() as u64;
    Some(entries.saturating_sub(1))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn open_file_descriptor_count() -> Option<u64> {
    None
}

/// Soft descriptor limit of this process.
#[cfg(any(target_os = "linux", target_os = "macos"))]
pub fn max_file_descriptor_count() -> Option<u64> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: limit is a valid, writable rlimit struct.
    let ret = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) };
    if ret != 0 {
        return None;
    }
    Some(limit.rlim_cur as u64)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn max_file_descriptor_count() -> Option<u64> {
    None
}
