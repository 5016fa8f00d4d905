//! User-facing output channels: the debugger, the console, message boxes and
//! system error descriptions.
//!
//! Everything that shows text to a person goes through [`Platform`], so that
//! callers can substitute their own implementation, for instance one that
//! records messages instead of blocking on a dialog.
//!
//! References:
//! * [`OutputDebugStringW`]
//! * [`MessageBoxW`]
//! * [`FormatMessageW`]
//!
//! [`OutputDebugStringW`]: https://learn.microsoft.com/en-us/windows/win32/api/debugapi/nf-debugapi-outputdebugstringw
//! [`MessageBoxW`]: https://learn.microsoft.com/en-us/windows/win32/api/winuser/nf-winuser-messageboxw
//! [`FormatMessageW`]: https://learn.microsoft.com/en-us/windows/win32/api/winbase/nf-winbase-formatmessagew

use std::io;

use crate::define_int_enum;

define_int_enum!("Buttons shown in a message box", u32, MessageStyle {
    Ok = 0x0, "One push button: OK (`MB_OK`)";
    OkCancel = 0x1, "Two push buttons: OK and Cancel (`MB_OKCANCEL`)";
    YesNo = 0x4, "Two push buttons: Yes and No (`MB_YESNO`)";
});

define_int_enum!("Button a message box was dismissed with", i32, DialogResult {
    Ok = 1, "OK (`IDOK`)";
    Cancel = 2, "Cancel (`IDCANCEL`)";
    Abort = 3, "Abort (`IDABORT`)";
    Retry = 4, "Retry (`IDRETRY`)";
    Ignore = 5, "Ignore (`IDIGNORE`)";
    Yes = 6, "Yes (`IDYES`)";
    No = 7, "No (`IDNO`)";
});

/// Output channels and error lookup used by diagnostics and resources.
pub trait Platform: Send + Sync {
    /// Write `text` to the debugger. This never fails.
    fn debug_output(&self, text: &str);

    /// Write `text` as a line on standard output.
    fn console(&self, text: &str);

    /// Show a modal message box and wait for it to be dismissed.
    fn show_message(&self, title: &str, body: &str, style: MessageStyle) -> DialogResult;

    /// Describe system error `code`, consulting the message table of the
    /// loaded module `module` first if one is named.
    fn error_description(&self, module: Option<&str>, code: u32) -> Option<String>;

    /// The calling thread's last error code.
    fn last_error(&self) -> u32 {
        io::Error::last_os_error().raw_os_error().unwrap_or(0) as u32
    }
}

/// The platform of the running process.
///
/// Off Windows, debug output and message boxes are logged instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePlatform;

#[cfg(windows)]
mod native {
    use std::{
        io::{self, Write},
        ptr,
    };
    use windows_sys::Win32::{
        Foundation::LocalFree,
        System::{
            Diagnostics::Debug::{
                FORMAT_MESSAGE_ALLOCATE_BUFFER, FORMAT_MESSAGE_FROM_HMODULE,
                FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS, FormatMessageW,
                OutputDebugStringW,
            },
            LibraryLoader::GetModuleHandleW,
        },
        UI::{Input::KeyboardAndMouse::GetActiveWindow, WindowsAndMessaging::MessageBoxW},
    };

    use super::{DialogResult, MessageStyle, NativePlatform, Platform};
    use crate::util::{string_from_wide_with_len, string_to_null_terminated_utf16};

    /// `MAKELANGID(LANG_NEUTRAL, SUBLANG_DEFAULT)`
    const LANG_USER_DEFAULT: u32 = 0x0400;

    impl Platform for NativePlatform {
        fn debug_output(&self, text: &str) {
            let text: Vec<u16> = string_to_null_terminated_utf16(format!("{text}\r\n"));
            // SAFETY: `text` is null-terminated
            unsafe { OutputDebugStringW(text.as_ptr()) };
        }

        fn console(&self, text: &str) {
            let mut stdout = io::stdout().lock();
            if let Err(error) = write!(stdout, "{text}\r\n").and_then(|()| stdout.flush()) {
                debug!(%error, "failed to write to console");
            }
        }

        fn show_message(&self, title: &str, body: &str, style: MessageStyle) -> DialogResult {
            let title: Vec<u16> = string_to_null_terminated_utf16(title);
            let body: Vec<u16> = string_to_null_terminated_utf16(body);

            // SAFETY: Both strings are null-terminated; the active window may be null
            let result = unsafe {
                MessageBoxW(GetActiveWindow(), body.as_ptr(), title.as_ptr(), style.id())
            };
            DialogResult::try_from(result).unwrap_or_else(|result| {
                warn!(result, error = %io::Error::last_os_error(), "MessageBoxW failed");
                DialogResult::Cancel
            })
        }

        fn error_description(&self, module: Option<&str>, code: u32) -> Option<String> {
            let mut flags = FORMAT_MESSAGE_ALLOCATE_BUFFER
                | FORMAT_MESSAGE_FROM_SYSTEM
                | FORMAT_MESSAGE_IGNORE_INSERTS;

            let mut source = ptr::null();
            if let Some(module) = module {
                let name: Vec<u16> = string_to_null_terminated_utf16(module);
                // SAFETY: `name` is null-terminated
                let handle = unsafe { GetModuleHandleW(name.as_ptr()) };
                if handle.is_null() {
                    trace!(module, "module not loaded, using the system message table");
                } else {
                    flags |= FORMAT_MESSAGE_FROM_HMODULE;
                    source = handle.cast_const();
                }
            }

            let mut buffer: *mut u16 = ptr::null_mut();
            // SAFETY: With FORMAT_MESSAGE_ALLOCATE_BUFFER, the buffer argument receives a
            // pointer to a buffer allocated by the system
            let len = unsafe {
                FormatMessageW(
                    flags,
                    source,
                    code,
                    LANG_USER_DEFAULT,
                    (&raw mut buffer).cast(),
                    0,
                    ptr::null(),
                )
            };
            if len == 0 || buffer.is_null() {
                return None;
            }

            // SAFETY: `buffer` holds `len` characters
            let description = unsafe { string_from_wide_with_len(buffer, len as usize) };
            // SAFETY: `buffer` was allocated by FormatMessageW
            unsafe { LocalFree(buffer.cast()) };

            Some(description.trim_end().to_owned())
        }
    }
}

#[cfg(not(windows))]
impl Platform for NativePlatform {
    fn debug_output(&self, text: &str) {
        debug!(target: "zenutils::debug_output", "{text}");
        #[cfg(not(feature = "tracing"))]
        let _ = text;
    }

    fn console(&self, text: &str) {
        println!("{text}");
    }

    fn show_message(&self, title: &str, body: &str, style: MessageStyle) -> DialogResult {
        warn!(title, body, ?style, "message box requested without a desktop");
        #[cfg(not(feature = "tracing"))]
        let _ = (title, body, style);
        DialogResult::Ok
    }

    fn error_description(&self, _module: Option<&str>, code: u32) -> Option<String> {
        let code = i32::try_from(code).ok()?;
        Some(io::Error::from_raw_os_error(code).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_result() {
        assert_eq!(DialogResult::try_from(6), Ok(DialogResult::Yes));
        assert_eq!(DialogResult::try_from(0), Err(0));
        assert_eq!(MessageStyle::YesNo.id(), 4);
    }

    #[test]
    fn test_error_description() {
        // ERROR_FILE_NOT_FOUND / ENOENT
        let description = NativePlatform.error_description(None, 2).unwrap();
        assert!(!description.is_empty());
        assert_eq!(description, description.trim_end());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_portable_message_box() {
        let result = NativePlatform.show_message("Zenware", "hello", MessageStyle::YesNo);
        assert_eq!(result, DialogResult::Ok);
    }
}
