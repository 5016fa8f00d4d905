/// Define a `#[repr]` enum over a fixed set of Win32 integer constants, with
/// lossless conversions to and from the raw value.
#[macro_export]
macro_rules! define_int_enum {
    ($enum_doc:expr, $repr_type:ty, $enum_name:ident { $($variant:ident = $value:expr, $doc:expr;)* }) => {
        #[doc = $enum_doc]
        #[repr($repr_type)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $(
                #[doc = $doc]
                $variant = $value,
            )*
        }

        impl $enum_name {
            /// Return the raw value
            pub const fn id(self) -> $repr_type {
                self as $repr_type
            }
        }

        impl From<$enum_name> for $repr_type {
            fn from(value: $enum_name) -> $repr_type {
                value as $repr_type
            }
        }

        impl TryFrom<$repr_type> for $enum_name {
            type Error = $repr_type;

            /// Fails with the unrecognized raw value.
            fn try_from(value: $repr_type) -> Result<Self, Self::Error> {
                match value {
                    $(x if x == $value => Ok($enum_name::$variant),)*
                    other => Err(other),
                }
            }
        }
    };
}

/// Convert `s` into a null-terminated wide string.
#[cfg(windows)]
pub fn string_to_null_terminated_utf16<T: FromIterator<u16>>(s: impl AsRef<std::ffi::OsStr>) -> T {
    use std::os::windows::ffi::OsStrExt;

    s.as_ref()
        .encode_wide()
        .chain(std::iter::once(0u16))
        .collect()
}

/// Convert `s` into a `String`, replacing invalid UTF-16.
///
/// # Safety
///
/// `s` must be at least `len` chars long, initialized, and aligned.
#[cfg(windows)]
pub unsafe fn string_from_wide_with_len(s: *const u16, len: usize) -> String {
    // SAFETY: `s` is initialized for `len` elements
    let slice = unsafe { std::slice::from_raw_parts(s, len) };
    String::from_utf16_lossy(slice)
}

/// Return the prefix of `units` before the first null character.
pub fn until_nul(units: &[u16]) -> &[u16] {
    match units.iter().position(|&unit| unit == 0) {
        Some(end) => &units[..end],
        None => units,
    }
}
