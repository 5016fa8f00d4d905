//! Well-known directories and temporary files

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::text::base_file_name;

#[cfg(windows)]
pub use native::{get_system_directory, get_windows_directory, windows_dll_path};

#[cfg(windows)]
mod native {
    use std::{ffi::OsString, io, os::windows::ffi::OsStringExt, path::PathBuf};
    use windows_sys::Win32::{
        Foundation::MAX_PATH,
        System::SystemInformation::{GetSystemDirectoryW, GetWindowsDirectoryW},
    };

    use super::relative;

    /// Call a `Get*DirectoryW` style function, growing the buffer if the
    /// path does not fit.
    fn directory_from(get: unsafe extern "system" fn(*mut u16, u32) -> u32) -> io::Result<PathBuf> {
        let mut buffer = vec![0u16; MAX_PATH as usize + 1];
        loop {
            // SAFETY: We have a valid buffer and length
            let len = unsafe { get(buffer.as_mut_ptr(), buffer.len() as u32) } as usize;
            if len == 0 {
                return Err(io::Error::last_os_error());
            }
            // On success the length excludes the terminator; otherwise it is the
            // required size including it
            if len < buffer.len() {
                return Ok(PathBuf::from(OsString::from_wide(&buffer[..len])));
            }
            buffer.resize(len, 0);
        }
    }

    /// Get the system directory path. This is typically `C:\Windows\System32`.
    ///
    /// This corresponds to the Windows API function [`GetSystemDirectoryW`].
    ///
    /// [`GetSystemDirectoryW`]: https://learn.microsoft.com/en-us/windows/win32/api/sysinfoapi/nf-sysinfoapi-getsystemdirectoryw
    pub fn get_system_directory() -> io::Result<PathBuf> {
        directory_from(GetSystemDirectoryW)
    }

    /// Get the Windows directory path. This is typically `C:\Windows`.
    ///
    /// This corresponds to the Windows API function [`GetWindowsDirectoryW`].
    ///
    /// [`GetWindowsDirectoryW`]: https://learn.microsoft.com/en-us/windows/win32/api/sysinfoapi/nf-sysinfoapi-getwindowsdirectoryw
    pub fn get_windows_directory() -> io::Result<PathBuf> {
        directory_from(GetWindowsDirectoryW)
    }

    /// Path of `file_name` in the Windows directory.
    pub fn windows_dll_path(file_name: &str) -> io::Result<PathBuf> {
        Ok(get_windows_directory()?.join(relative(file_name)))
    }
}

/// Strip leading separators, so that joining keeps the base directory.
fn relative(file_name: &str) -> &Path {
    Path::new(file_name.trim_start_matches(['\\', '/']))
}

/// Path of `file_name` in the user's documents folder, or `None` if the
/// folder is unknown.
pub fn user_data_path(file_name: &str) -> Option<PathBuf> {
    dirs::document_dir().map(|documents| documents.join(relative(file_name)))
}

/// Path of the base name of `file_name` in the temporary directory.
pub fn file_name_temp_path(file_name: &str) -> PathBuf {
    std::env::temp_dir().join(base_file_name(file_name))
}

/// Create an empty file with a unique name starting with `prefix` in the
/// temporary directory, and return its path. The file is not deleted.
pub fn temp_file_path_name(prefix: &str) -> io::Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".tmp")
        .tempfile()?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}
