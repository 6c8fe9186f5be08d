// src/exec/sys.rs

//! Thin wrappers over the OS process primitives the executors need.

use std::io;

/// Signals the executors send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Terminate,
    Kill,
}

#[cfg(unix)]
impl StopSignal {
    fn raw(self) -> libc::c_int {
        match self {
            StopSignal::Terminate => libc::SIGTERM,
            StopSignal::Kill => libc::SIGKILL,
        }
    }
}

/// Whether a process with this pid exists and has not become a zombie.
///
/// `EPERM` means the process exists but belongs to someone else, which still
/// counts as alive.
#[cfg(unix)]
pub fn is_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    let rc = unsafe { libc::kill(pid, 0) };
    if rc == 0 {
        return !is_zombie(pid);
    }
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn is_alive(pid: i32) -> bool {
    // No portable probe; any positive pid is assumed to exist.
    pid > 0
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: i32) -> bool {
    // Field 3 of /proc/<pid>/stat, after the parenthesised command name.
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            let (_, rest) = stat.rsplit_once(')')?;
            rest.split_whitespace().next().map(|state| state == "Z")
        })
        .unwrap_or(false)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: i32) -> bool {
    false
}

/// Whether `pid` is the leader of its own process group.
#[cfg(unix)]
pub fn leads_process_group(pid: i32) -> bool {
    pid > 0 && unsafe { libc::getpgid(pid) } == pid
}

#[cfg(not(unix))]
pub fn leads_process_group(_pid: i32) -> bool {
    false
}

/// Send `signal` to `pid`, or to the process group led by `pid`.
#[cfg(unix)]
pub fn send_signal(pid: i32, signal: StopSignal, group: bool) -> io::Result<()> {
    if pid <= 0 {
        return Err(io::Error::from_raw_os_error(libc::ESRCH));
    }
    let target = if group { -pid } else { pid };
    if unsafe { libc::kill(target, signal.raw()) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub fn send_signal(_pid: i32, _signal: StopSignal, _group: bool) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "signalling processes by pid is not supported on this platform",
    ))
}

/// Whether an io error from a signal call means "no such process".
#[cfg(unix)]
pub fn is_no_such_process(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ESRCH)
}

#[cfg(not(unix))]
pub fn is_no_such_process(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn own_process_is_alive() {
        assert!(is_alive(std::process::id() as i32));
    }

    #[test]
    fn non_positive_pids_lead_no_group() {
        assert!(!leads_process_group(0));
        assert!(!leads_process_group(-1));
    }

    #[test]
    fn non_positive_pids_are_never_alive() {
        assert!(!is_alive(0));
        assert!(!is_alive(-1));
        assert!(send_signal(0, StopSignal::Kill, false).is_err());
    }
}
