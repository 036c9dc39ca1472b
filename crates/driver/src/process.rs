// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Subprocess liveness and supervision. Grounded on the teacher's
//! `driver/process.rs::is_process_alive` (Unix `kill(pid, 0)` liveness
//! check, unchanged here) and `pty/spawn.rs`'s `#[allow(unsafe_code)]`
//! + `// SAFETY:` comment convention for the platform-specific spawn
//! hooks below, which that module needed for `forkpty` and this one
//! needs for orphan-killing supervision: a vendor agent subprocess that
//! outlives its worker process (worker crash, `kill -9`) would otherwise
//! run forever with nobody polling it.

use std::io;

use tokio::process::Command;

/// Checks whether a process with the given PID is alive.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal;
    use nix::unistd::Pid;
    let Ok(pid_i32) = i32::try_from(pid) else {
        return false;
    };
    signal::kill(Pid::from_raw(pid_i32), None).is_ok()
}

#[cfg(windows)]
pub fn is_process_alive(pid: u32) -> bool {
    use windows_sys::Win32::Foundation::{CloseHandle, FALSE};
    use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    // SAFETY: OpenProcess/CloseHandle are plain FFI calls with no
    // preconditions beyond a valid PID, which `pid` always is here.
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid);
        if handle == 0 {
            return false;
        }
        CloseHandle(handle);
        true
    }
}

/// Arrange for the child to be killed if this process dies first, before
/// spawning it. On Linux this sets `PR_SET_PDEATHSIG` in the child via
/// `pre_exec`; on Windows the spawned child is assigned to a Job Object
/// configured with `JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE` right after
/// spawn. Without this, a worker crash orphans every agent subprocess it
/// was supervising (spec.md §4.5's "no orphaned subprocesses" guarantee).
#[cfg(unix)]
pub fn configure_orphan_kill(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    // SAFETY: pre_exec runs between fork and exec in the child. The only
    // thing it does is a single prctl syscall; it allocates nothing and
    // touches no shared state, so it is async-signal-safe.
    #[allow(unsafe_code)]
    unsafe {
        command.pre_exec(|| {
            // PR_SET_PDEATHSIG = 1, SIGKILL = 9.
            let ret = nix::libc::prctl(nix::libc::PR_SET_PDEATHSIG, nix::libc::SIGKILL);
            if ret != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(windows)]
pub fn configure_orphan_kill(_command: &mut Command) {
    // Job-object assignment happens after spawn; see `assign_to_kill_on_close_job`.
}

/// After spawning on Windows, assign the child to a fresh Job Object with
/// `JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE` so it dies when this handle is
/// dropped (i.e. when the worker process exits). No-op on Unix, where
/// `configure_orphan_kill`'s `pre_exec` hook already covers this.
#[cfg(windows)]
pub fn assign_to_kill_on_close_job(child: &tokio::process::Child) -> io::Result<()> {
    use windows_sys::Win32::Foundation::HANDLE;
    use windows_sys::Win32::System::JobObjects::{
        AssignProcessToJobObject, CreateJobObjectW, JobObjectExtendedLimitInformation,
        SetInformationJobObject, JOBOBJECT_EXTENDED_LIMIT_INFORMATION,
        JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE,
    };

    let Some(pid) = child.id() else {
        return Ok(());
    };

    // SAFETY: these are plain Win32 FFI calls. `job` is checked against
    // the null handle before use; `info` is a single well-formed struct
    // passed by pointer with its correct size, matching the Win32 API
    // contract for `SetInformationJobObject`.
    #[allow(unsafe_code)]
    unsafe {
        let job = CreateJobObjectW(std::ptr::null(), std::ptr::null());
        if job == 0 {
            return Err(io::Error::last_os_error());
        }

        let mut info: JOBOBJECT_EXTENDED_LIMIT_INFORMATION = std::mem::zeroed();
        info.BasicLimitInformation.LimitFlags = JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE;
        let ok = SetInformationJobObject(
            job,
            JobObjectExtendedLimitInformation,
            &info as *const _ as *const _,
            std::mem::size_of::<JOBOBJECT_EXTENDED_LIMIT_INFORMATION>() as u32,
        );
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }

        let process_handle = windows_sys::Win32::System::Threading::OpenProcess(
            windows_sys::Win32::System::Threading::PROCESS_SET_QUOTA
                | windows_sys::Win32::System::Threading::PROCESS_TERMINATE,
            0,
            pid,
        ) as HANDLE;
        if process_handle == 0 {
            return Err(io::Error::last_os_error());
        }
        let assigned = AssignProcessToJobObject(job, process_handle);
        if assigned == 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
