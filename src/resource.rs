//! Localized strings from a module's string table.
//!
//! String tables are stored in blocks of 16 strings. Block `n` (numbered
//! from 1) holds the strings with ids `(n - 1) * 16` through `n * 16 - 1`,
//! each encoded as a UTF-16 length followed by that many characters.
//!
//! # Examples
//!
//! ```no_run
//! # #[cfg(windows)]
//! # {
//! use zenutils::platform::NativePlatform;
//! use zenutils::resource::{LanguageId, ResourceConfig, ResourceModule, StringSource};
//!
//! let config = ResourceConfig::new("ZenwareResources.dll").with_language(LanguageId::JAPANESE);
//! let resources = ResourceModule::open(&config)?;
//! if resources.show_message_yes_no(&NativePlatform, 100, 101) {
//!     println!("{:?}", resources.get_string(102));
//! }
//! # }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! References:
//! * [String resources]
//!
//! [String resources]: https://learn.microsoft.com/en-us/windows/win32/menurc/stringtable-resource

use std::path::PathBuf;

use crate::platform::{DialogResult, MessageStyle, Platform};

/// Strings per string table block.
const BLOCK_LEN: usize = 16;

/// A Windows language identifier, as built by `MAKELANGID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LanguageId(pub u16);

impl LanguageId {
    /// Language neutral
    pub const NEUTRAL: LanguageId = LanguageId(0);
    /// English (United States)
    pub const ENGLISH: LanguageId = make_lang_id(0x09, 0x01);
    /// Japanese (Japan)
    pub const JAPANESE: LanguageId = make_lang_id(0x11, 0x01);

    /// Primary language identifier
    pub const fn primary(self) -> u16 {
        self.0 & 0x3FF
    }

    /// Sublanguage identifier
    pub const fn sub(self) -> u16 {
        self.0 >> 10
    }
}

/// Combine a primary language and a sublanguage into a [`LanguageId`].
pub const fn make_lang_id(primary: u16, sub: u16) -> LanguageId {
    LanguageId((sub << 10) | primary)
}

/// Where to load localized strings from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Path of the module holding the string table
    pub module_path: PathBuf,
    /// Preferred language. Neutral strings are used when it has none.
    pub language_id: LanguageId,
}

impl ResourceConfig {
    pub fn new(module_path: impl Into<PathBuf>) -> Self {
        Self {
            module_path: module_path.into(),
            language_id: LanguageId::NEUTRAL,
        }
    }

    pub fn with_language(mut self, language_id: LanguageId) -> Self {
        self.language_id = language_id;
        self
    }
}

/// Return the string table block number and the index within that block
/// of string `id`.
///
/// String ids are 16-bit, so larger ids have no location.
pub fn string_table_location(id: u32) -> Option<(u16, usize)> {
    let id = u16::try_from(id).ok()?;
    Some(((id >> 4) + 1, usize::from(id & 0xF)))
}

/// Return string `index` of a string table block.
///
/// Returns `None` if the index is out of range, the block is truncated, or
/// the string is empty, since empty entries mark unused ids.
pub fn string_table_entry(block: &[u16], index: usize) -> Option<String> {
    if index >= BLOCK_LEN {
        return None;
    }

    let mut rest = block;
    for _ in 0..index {
        let len = usize::from(*rest.first()?);
        rest = rest.get(1 + len..)?;
    }

    let (&len, rest) = rest.split_first()?;
    let text = rest.get(..usize::from(len))?;
    if text.is_empty() {
        return None;
    }
    Some(String::from_utf16_lossy(text))
}

/// Source of localized strings, with message boxes built from them.
///
/// Missing strings are shown as empty text.
pub trait StringSource {
    /// Look up string `id`.
    fn get_string(&self, id: u32) -> Option<String>;

    /// Show string `string_id` in a message box titled with string `title_id`.
    fn show_message(&self, platform: &dyn Platform, title_id: u32, string_id: u32) -> DialogResult {
        let title = self.get_string(title_id).unwrap_or_default();
        let message = self.get_string(string_id).unwrap_or_default();
        platform.show_message(&title, &message, MessageStyle::Ok)
    }

    /// Show `"<message>: <string_id>"` in a message box titled with string
    /// `title_id`.
    fn show_message_error(
        &self,
        platform: &dyn Platform,
        title_id: u32,
        message: &str,
        string_id: u32,
    ) -> DialogResult {
        let title = self.get_string(title_id).unwrap_or_default();
        let error = self.get_string(string_id).unwrap_or_default();
        platform.show_message(&title, &format!("{message}: {error}"), MessageStyle::Ok)
    }

    /// Ask a yes or no question. Returns whether the answer was yes.
    fn show_message_yes_no(&self, platform: &dyn Platform, title_id: u32, string_id: u32) -> bool {
        let title = self.get_string(title_id).unwrap_or_default();
        let message = self.get_string(string_id).unwrap_or_default();
        platform.show_message(&title, &message, MessageStyle::YesNo) == DialogResult::Yes
    }
}

#[cfg(windows)]
pub use native::ResourceModule;

#[cfg(windows)]
mod native {
    use std::{io, ptr, slice};
    use windows_sys::Win32::{
        Foundation::{FreeLibrary, HMODULE},
        System::LibraryLoader::{
            FindResourceExW, LOAD_LIBRARY_AS_DATAFILE, LOAD_LIBRARY_AS_IMAGE_RESOURCE,
            LoadLibraryExW, LoadResource, LockResource, SizeofResource,
        },
        UI::WindowsAndMessaging::RT_STRING,
    };

    use super::{LanguageId, ResourceConfig, StringSource, string_table_entry};
    use crate::util::string_to_null_terminated_utf16;

    /// A module loaded for its resources only. The module is freed on drop.
    pub struct ResourceModule {
        module: HMODULE,
        language_id: LanguageId,
    }

    impl ResourceModule {
        /// Load the module named by `config` as a data file. This uses
        /// [`LoadLibraryExW`].
        ///
        /// [`LoadLibraryExW`]: https://learn.microsoft.com/en-us/windows/win32/api/libloaderapi/nf-libloaderapi-loadlibraryexw
        pub fn open(config: &ResourceConfig) -> io::Result<Self> {
            let path: Vec<u16> = string_to_null_terminated_utf16(&config.module_path);

            // SAFETY: `path` is null-terminated
            let module = unsafe {
                LoadLibraryExW(
                    path.as_ptr(),
                    ptr::null_mut(),
                    LOAD_LIBRARY_AS_DATAFILE | LOAD_LIBRARY_AS_IMAGE_RESOURCE,
                )
            };
            if module.is_null() {
                return Err(io::Error::last_os_error());
            }

            Ok(Self {
                module,
                language_id: config.language_id,
            })
        }

        pub fn language_id(&self) -> LanguageId {
            self.language_id
        }

        /// Return string table block `block` in `language`. This uses
        /// [`FindResourceExW`].
        ///
        /// [`FindResourceExW`]: https://learn.microsoft.com/en-us/windows/win32/api/libloaderapi/nf-libloaderapi-findresourceexw
        fn block(&self, block: u16, language: LanguageId) -> Option<&[u16]> {
            // MAKEINTRESOURCE
            let block_id = usize::from(block) as *const u16;

            // SAFETY: `module` is loaded; integer resource names are valid names
            let resource = unsafe { FindResourceExW(self.module, RT_STRING, block_id, language.0) };
            if resource.is_null() {
                return None;
            }

            // SAFETY: `resource` belongs to `module`
            let (data, size) = unsafe {
                let handle = LoadResource(self.module, resource);
                if handle.is_null() {
                    return None;
                }
                (LockResource(handle), SizeofResource(self.module, resource))
            };
            if data.is_null() {
                return None;
            }

            // SAFETY: Resource data is aligned, and lives as long as the module
            Some(unsafe { slice::from_raw_parts(data as *const u16, size as usize / 2) })
        }
    }

    impl StringSource for ResourceModule {
        fn get_string(&self, id: u32) -> Option<String> {
            let (block, index) = string_table_location(id)?;
            let mut languages = vec![self.language_id];
            if self.language_id != LanguageId::NEUTRAL {
                languages.push(LanguageId::NEUTRAL);
            }

            languages.into_iter().find_map(|language| {
                string_table_entry(self.block(block, language)?, index)
            })
        }
    }

    impl Drop for ResourceModule {
        fn drop(&mut self) {
            // SAFETY: `module` was loaded by `open`
            unsafe { FreeLibrary(self.module) };
        }
    }
}
