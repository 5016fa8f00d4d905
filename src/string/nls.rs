//! Win32 NLS conversions.
//!
//! Both wrappers keep the calling convention of the underlying routines:
//! counts include the terminator and zero means failure.

use std::{ffi::CStr, io, ptr};
use windows_sys::Win32::Globalization::{
    GetACP, IsValidCodePage, MB_ERR_INVALID_CHARS, MB_PRECOMPOSED, MultiByteToWideChar,
    WC_COMPOSITECHECK, WC_SEPCHARS, WideCharToMultiByte,
};

use super::allow_conversion_flags;

const CP_UTF8: u32 = 65001;
const CP_GB18030: u32 = 54936;

/// Return the active ANSI code page. This corresponds to [`GetACP`].
///
/// [`GetACP`]: https://learn.microsoft.com/en-us/windows/win32/api/winnls/nf-winnls-getacp
pub(super) fn active_code_page() -> u32 {
    // SAFETY: Trivially safe
    unsafe { GetACP() }
}

/// `MultiByteToWideChar` resolves the remaining ambient pages itself.
pub(super) fn resolve_ambient(code_page: u32) -> u32 {
    code_page
}

pub(super) fn is_supported(code_page: u32) -> bool {
    // SAFETY: Trivially safe
    unsafe { IsValidCodePage(code_page) != 0 }
}

/// Flags for decoding with `code_page`. Invalid input always fails, so the
/// caller can move on to another code page.
fn decode_flags(code_page: u32) -> u32 {
    if allow_conversion_flags(code_page) {
        MB_PRECOMPOSED | MB_ERR_INVALID_CHARS
    } else if code_page == CP_UTF8 || code_page == CP_GB18030 {
        MB_ERR_INVALID_CHARS
    } else {
        0
    }
}

fn encode_flags(code_page: u32) -> u32 {
    if allow_conversion_flags(code_page) {
        WC_COMPOSITECHECK | WC_SEPCHARS
    } else {
        0
    }
}

/// Decode `source` into `dest` with [`MultiByteToWideChar`].
///
/// [`MultiByteToWideChar`]: https://learn.microsoft.com/en-us/windows/win32/api/stringapiset/nf-stringapiset-multibytetowidechar
pub(super) fn multi_byte_to_wide(code_page: u32, source: &CStr, dest: &mut [u16]) -> usize {
    let capacity = i32::try_from(dest.len()).unwrap_or(i32::MAX);

    // SAFETY: `source` is null-terminated and `dest` can hold `capacity` characters
    let chars_written = unsafe {
        MultiByteToWideChar(
            code_page,
            decode_flags(code_page),
            source.as_ptr() as *const u8,
            -1,
            dest.as_mut_ptr(),
            capacity,
        )
    };

    if chars_written <= 0 {
        trace!(code_page, error = %io::Error::last_os_error(), "MultiByteToWideChar failed");
        return 0;
    }
    chars_written as usize
}

/// Encode null-terminated `source` with [`WideCharToMultiByte`]. Without a
/// destination, returns the required buffer size.
///
/// [`WideCharToMultiByte`]: https://learn.microsoft.com/en-us/windows/win32/api/stringapiset/nf-stringapiset-widechartomultibyte
pub(super) fn wide_to_multi_byte(code_page: u32, source: &[u16], dest: Option<&mut [u8]>) -> usize {
    debug_assert_eq!(source.last(), Some(&0));

    let (dest_ptr, capacity) = match dest {
        Some(dest) => (dest.as_mut_ptr(), i32::try_from(dest.len()).unwrap_or(i32::MAX)),
        None => (ptr::null_mut(), 0),
    };

    // SAFETY: `source` is null-terminated, and `dest_ptr` is either null with a zero
    // capacity or valid for `capacity` bytes
    let chars_written = unsafe {
        WideCharToMultiByte(
            code_page,
            encode_flags(code_page),
            source.as_ptr(),
            -1,
            dest_ptr,
            capacity,
            ptr::null(),
            ptr::null_mut(),
        )
    };

    if chars_written <= 0 {
        debug!(code_page, error = %io::Error::last_os_error(), "WideCharToMultiByte failed");
        return 0;
    }
    chars_written as usize
}
