//! Reading and writing configuration values in the registry.
//!
//! [`ConfigStore`] is the interface the rest of the crate uses. [`Registry`]
//! implements it over the Windows registry, and [`MemoryStore`] implements
//! it in memory for tests and for targets without a registry.
//!
//! # Examples
//!
//! ```
//! use zenutils::registry::{ConfigStore, MemoryStore, RootKey};
//!
//! let store = MemoryStore::new();
//! store.write_dword(RootKey::LocalMachine, r"SOFTWARE\Zenware", "Diagnostics", 5)?;
//!
//! let value = store.read_dword(RootKey::LocalMachine, r"Software\zenware", "diagnostics")?;
//! assert_eq!(value, Some(5));
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! References:
//! * [Registry functions]
//!
//! [Registry functions]: https://learn.microsoft.com/en-us/windows/win32/sysinfo/registry-functions

use std::{
    collections::BTreeMap,
    io,
    sync::{Mutex, PoisonError},
};

/// Predefined registry root keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RootKey {
    /// `HKEY_CLASSES_ROOT`
    ClassesRoot,
    /// `HKEY_CURRENT_USER`
    CurrentUser,
    /// `HKEY_LOCAL_MACHINE`
    LocalMachine,
    /// `HKEY_USERS`
    Users,
    /// `HKEY_CURRENT_CONFIG`
    CurrentConfig,
}

/// A hierarchical store of named values, addressed by root key, key path and
/// value name.
///
/// Reads of missing keys or values return `Ok(None)`. Writes create the key
/// if needed.
pub trait ConfigStore: Send + Sync {
    /// Read a 32-bit integer value.
    fn read_dword(&self, root: RootKey, path: &str, name: &str) -> io::Result<Option<u32>>;

    /// Read a string value.
    fn read_string(&self, root: RootKey, path: &str, name: &str) -> io::Result<Option<String>>;

    fn write_dword(&self, root: RootKey, path: &str, name: &str, value: u32) -> io::Result<()>;

    fn write_string(&self, root: RootKey, path: &str, name: &str, value: &str) -> io::Result<()>;

    /// Names of the values in a key. A missing key has no values.
    fn value_names(&self, root: RootKey, path: &str) -> io::Result<Vec<String>>;

    /// Number of values in a key.
    fn value_count(&self, root: RootKey, path: &str) -> io::Result<usize> {
        self.value_names(root, path).map(|names| names.len())
    }

    /// Delete `sub_key` below `path`.
    ///
    /// If `only_if_empty` is set, the deletion fails when `sub_key` has sub
    /// keys of its own. Otherwise the whole tree is removed.
    fn delete_key(&self, root: RootKey, path: &str, sub_key: &str, only_if_empty: bool)
    -> io::Result<()>;
}

/// The configuration store of this system: the registry on Windows, an empty
/// [`MemoryStore`] elsewhere.
pub fn system_store() -> Box<dyn ConfigStore> {
    #[cfg(windows)]
    {
        Box::new(Registry)
    }
    #[cfg(not(windows))]
    {
        Box::new(MemoryStore::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoredValue {
    Dword(u32),
    String(String),
}

#[derive(Debug, Default)]
struct StoredKey {
    /// Values by lowercase name, with the name as written
    values: BTreeMap<String, (String, StoredValue)>,
}

/// An in-memory [`ConfigStore`]. Key paths and value names are
/// case-insensitive, as in the registry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    keys: Mutex<BTreeMap<(RootKey, String), StoredKey>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, root: RootKey, path: &str, name: &str) -> Option<StoredValue> {
        let keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        let key = keys.get(&(root, normalize_path(path)))?;
        key.values
            .get(&name.to_lowercase())
            .map(|(_, value)| value.clone())
    }

    fn write(&self, root: RootKey, path: &str, name: &str, value: StoredValue) {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.entry((root, normalize_path(path)))
            .or_default()
            .values
            .insert(name.to_lowercase(), (name.to_owned(), value));
    }
}

impl ConfigStore for MemoryStore {
    fn read_dword(&self, root: RootKey, path: &str, name: &str) -> io::Result<Option<u32>> {
        match self.read(root, path, name) {
            None => Ok(None),
            Some(StoredValue::Dword(value)) => Ok(Some(value)),
            Some(StoredValue::String(_)) => Err(wrong_type(name)),
        }
    }

    fn read_string(&self, root: RootKey, path: &str, name: &str) -> io::Result<Option<String>> {
        match self.read(root, path, name) {
            None => Ok(None),
            Some(StoredValue::String(value)) => Ok(Some(value)),
            Some(StoredValue::Dword(_)) => Err(wrong_type(name)),
        }
    }

    fn write_dword(&self, root: RootKey, path: &str, name: &str, value: u32) -> io::Result<()> {
        self.write(root, path, name, StoredValue::Dword(value));
        Ok(())
    }

    fn write_string(&self, root: RootKey, path: &str, name: &str, value: &str) -> io::Result<()> {
        self.write(root, path, name, StoredValue::String(value.to_owned()));
        Ok(())
    }

    fn value_names(&self, root: RootKey, path: &str) -> io::Result<Vec<String>> {
        let keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(keys
            .get(&(root, normalize_path(path)))
            .map(|key| key.values.values().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    fn delete_key(
        &self,
        root: RootKey,
        path: &str,
        sub_key: &str,
        only_if_empty: bool,
    ) -> io::Result<()> {
        let target = normalize_path(&format!("{path}\\{sub_key}"));
        let descendants = format!("{target}\\");
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);

        let in_tree = |(key_root, key_path): &(RootKey, String)| {
            *key_root == root && (*key_path == target || key_path.starts_with(&descendants))
        };

        if !keys.keys().any(in_tree) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("registry key {target} does not exist"),
            ));
        }
        if only_if_empty
            && keys
                .keys()
                .any(|(key_root, key_path)| *key_root == root && key_path.starts_with(&descendants))
        {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("registry key {target} has sub keys"),
            ));
        }

        keys.retain(|key, _| !in_tree(key));
        Ok(())
    }
}

/// Lowercase `path` and drop empty components.
fn normalize_path(path: &str) -> String {
    path.split('\\')
        .filter(|component| !component.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\\")
}

fn wrong_type(name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("registry value {name} has an unexpected type"),
    )
}

#[cfg(windows)]
pub use native::Registry;

#[cfg(windows)]
mod native {
    use std::{io, mem, ptr};
    use windows_sys::Win32::{
        Foundation::{ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, WIN32_ERROR},
        System::Registry::{
            HKEY, HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE,
            HKEY_USERS, KEY_ALL_ACCESS, KEY_READ, KEY_WRITE, REG_DWORD, REG_EXPAND_SZ,
            REG_OPTION_NON_VOLATILE, REG_SAM_FLAGS, REG_SZ, REG_VALUE_TYPE, RegCloseKey,
            RegCreateKeyExW, RegDeleteKeyW, RegDeleteTreeW, RegEnumValueW, RegOpenKeyExW,
            RegQueryInfoKeyW, RegQueryValueExW, RegSetValueExW,
        },
    };

    use super::{ConfigStore, RootKey, wrong_type};
    use crate::util::{string_to_null_terminated_utf16, until_nul};

    /// Longest value name the registry allows, plus the terminator.
    const MAX_VALUE_NAME: usize = 16_384;

    impl RootKey {
        fn as_hkey(self) -> HKEY {
            match self {
                RootKey::ClassesRoot => HKEY_CLASSES_ROOT,
                RootKey::CurrentUser => HKEY_CURRENT_USER,
                RootKey::LocalMachine => HKEY_LOCAL_MACHINE,
                RootKey::Users => HKEY_USERS,
                RootKey::CurrentConfig => HKEY_CURRENT_CONFIG,
            }
        }
    }

    fn check(code: WIN32_ERROR) -> io::Result<()> {
        if code == ERROR_SUCCESS {
            Ok(())
        } else {
            Err(io::Error::from_raw_os_error(code as i32))
        }
    }

    /// An open registry key, closed on drop.
    struct OwnedKey(HKEY);

    impl OwnedKey {
        /// Open an existing key with [`RegOpenKeyExW`]. Returns `None` if the
        /// key does not exist.
        ///
        /// [`RegOpenKeyExW`]: https://learn.microsoft.com/en-us/windows/win32/api/winreg/nf-winreg-regopenkeyexw
        fn open(root: RootKey, path: &str, access: REG_SAM_FLAGS) -> io::Result<Option<Self>> {
            let path: Vec<u16> = string_to_null_terminated_utf16(path);
            let mut key: HKEY = ptr::null_mut();

            // SAFETY: `path` is null-terminated and `key` is a valid out pointer
            let result =
                unsafe { RegOpenKeyExW(root.as_hkey(), path.as_ptr(), 0, access, &mut key) };
            if result == ERROR_FILE_NOT_FOUND {
                return Ok(None);
            }
            check(result)?;
            Ok(Some(Self(key)))
        }

        /// Open or create a key with [`RegCreateKeyExW`].
        ///
        /// [`RegCreateKeyExW`]: https://learn.microsoft.com/en-us/windows/win32/api/winreg/nf-winreg-regcreatekeyexw
        fn create(root: RootKey, path: &str) -> io::Result<Self> {
            let path: Vec<u16> = string_to_null_terminated_utf16(path);
            let mut key: HKEY = ptr::null_mut();

            // SAFETY: `path` is null-terminated and `key` is a valid out pointer
            check(unsafe {
                RegCreateKeyExW(
                    root.as_hkey(),
                    path.as_ptr(),
                    0,
                    ptr::null(),
                    REG_OPTION_NON_VOLATILE,
                    KEY_WRITE,
                    ptr::null(),
                    &mut key,
                    ptr::null_mut(),
                )
            })?;
            Ok(Self(key))
        }

        /// Query a value with [`RegQueryValueExW`]. Returns `None` if the value
        /// does not exist.
        ///
        /// [`RegQueryValueExW`]: https://learn.microsoft.com/en-us/windows/win32/api/winreg/nf-winreg-regqueryvalueexw
        fn query(&self, name: &str) -> io::Result<Option<(REG_VALUE_TYPE, Vec<u8>)>> {
            let name: Vec<u16> = string_to_null_terminated_utf16(name);
            let mut value_type = 0;
            let mut size = 0u32;

            // Query the size first
            // SAFETY: `name` is null-terminated; a null data pointer only queries the size
            let result = unsafe {
                RegQueryValueExW(
                    self.0,
                    name.as_ptr(),
                    ptr::null(),
                    &mut value_type,
                    ptr::null_mut(),
                    &mut size,
                )
            };
            if result == ERROR_FILE_NOT_FOUND {
                return Ok(None);
            }
            check(result)?;

            let mut data = vec![0u8; size as usize];
            // SAFETY: `data` is valid for `size` bytes
            check(unsafe {
                RegQueryValueExW(
                    self.0,
                    name.as_ptr(),
                    ptr::null(),
                    &mut value_type,
                    data.as_mut_ptr(),
                    &mut size,
                )
            })?;
            data.truncate(size as usize);
            Ok(Some((value_type, data)))
        }

        /// Set a value with [`RegSetValueExW`].
        ///
        /// [`RegSetValueExW`]: https://learn.microsoft.com/en-us/windows/win32/api/winreg/nf-winreg-regsetvalueexw
        fn set(&self, name: &str, value_type: REG_VALUE_TYPE, data: &[u8]) -> io::Result<()> {
            let name: Vec<u16> = string_to_null_terminated_utf16(name);
            let size = u32::try_from(data.len())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "registry value too large"))?;

            // SAFETY: `name` is null-terminated and `data` is valid for `size` bytes
            check(unsafe {
                RegSetValueExW(self.0, name.as_ptr(), 0, value_type, data.as_ptr(), size)
            })
        }
    }

    impl Drop for OwnedKey {
        fn drop(&mut self) {
            // SAFETY: This is a valid, open key handle
            unsafe { RegCloseKey(self.0) };
        }
    }

    /// The Windows registry.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Registry;

    impl ConfigStore for Registry {
        fn read_dword(&self, root: RootKey, path: &str, name: &str) -> io::Result<Option<u32>> {
            let Some(key) = OwnedKey::open(root, path, KEY_READ)? else {
                return Ok(None);
            };
            match key.query(name)? {
                None => Ok(None),
                Some((REG_DWORD, data)) => {
                    let bytes = data
                        .get(..mem::size_of::<u32>())
                        .and_then(|bytes| <[u8; 4]>::try_from(bytes).ok())
                        .ok_or_else(|| wrong_type(name))?;
                    Ok(Some(u32::from_le_bytes(bytes)))
                }
                Some(_) => Err(wrong_type(name)),
            }
        }

        fn read_string(&self, root: RootKey, path: &str, name: &str) -> io::Result<Option<String>> {
            let Some(key) = OwnedKey::open(root, path, KEY_READ)? else {
                return Ok(None);
            };
            match key.query(name)? {
                None => Ok(None),
                Some((REG_SZ | REG_EXPAND_SZ, data)) => {
                    let units: Vec<u16> = data
                        .chunks_exact(2)
                        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                        .collect();
                    Ok(Some(String::from_utf16_lossy(until_nul(&units))))
                }
                Some(_) => Err(wrong_type(name)),
            }
        }

        fn write_dword(&self, root: RootKey, path: &str, name: &str, value: u32) -> io::Result<()> {
            OwnedKey::create(root, path)?.set(name, REG_DWORD, &value.to_le_bytes())
        }

        fn write_string(&self, root: RootKey, path: &str, name: &str, value: &str) -> io::Result<()> {
            let units: Vec<u16> = string_to_null_terminated_utf16(value);
            let data: Vec<u8> = units.iter().flat_map(|unit| unit.to_le_bytes()).collect();
            OwnedKey::create(root, path)?.set(name, REG_SZ, &data)
        }

        /// Enumerates values with [`RegQueryInfoKeyW`] and [`RegEnumValueW`].
        ///
        /// [`RegQueryInfoKeyW`]: https://learn.microsoft.com/en-us/windows/win32/api/winreg/nf-winreg-regqueryinfokeyw
        /// [`RegEnumValueW`]: https://learn.microsoft.com/en-us/windows/win32/api/winreg/nf-winreg-regenumvaluew
        fn value_names(&self, root: RootKey, path: &str) -> io::Result<Vec<String>> {
            let Some(key) = OwnedKey::open(root, path, KEY_READ)? else {
                return Ok(Vec::new());
            };

            let mut value_count = 0u32;
            // SAFETY: Every pointer is either null or a valid out pointer
            check(unsafe {
                RegQueryInfoKeyW(
                    key.0,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    &mut value_count,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                )
            })?;

            let mut names = Vec::with_capacity(value_count as usize);
            let mut buffer = vec![0u16; MAX_VALUE_NAME];

            for index in 0..value_count {
                let mut len = buffer.len() as u32;
                // SAFETY: `buffer` is valid for `len` characters
                let result = unsafe {
                    RegEnumValueW(
                        key.0,
                        index,
                        buffer.as_mut_ptr(),
                        &mut len,
                        ptr::null(),
                        ptr::null_mut(),
                        ptr::null_mut(),
                        ptr::null_mut(),
                    )
                };
                if result == ERROR_NO_MORE_ITEMS {
                    break;
                }
                check(result)?;
                names.push(String::from_utf16_lossy(&buffer[..len as usize]));
            }

            Ok(names)
        }

        /// Deletes with [`RegDeleteKeyW`] if `only_if_empty` is set, otherwise
        /// with [`RegDeleteTreeW`].
        ///
        /// [`RegDeleteKeyW`]: https://learn.microsoft.com/en-us/windows/win32/api/winreg/nf-winreg-regdeletekeyw
        /// [`RegDeleteTreeW`]: https://learn.microsoft.com/en-us/windows/win32/api/winreg/nf-winreg-regdeletetreew
        fn delete_key(
            &self,
            root: RootKey,
            path: &str,
            sub_key: &str,
            only_if_empty: bool,
        ) -> io::Result<()> {
            let access = if only_if_empty { KEY_READ } else { KEY_ALL_ACCESS };
            let key = OwnedKey::open(root, path, access)?
                .ok_or_else(|| io::Error::from_raw_os_error(ERROR_FILE_NOT_FOUND as i32))?;
            let sub_key: Vec<u16> = string_to_null_terminated_utf16(sub_key);

            // SAFETY: `key` is open and `sub_key` is null-terminated
            check(unsafe {
                if only_if_empty {
                    RegDeleteKeyW(key.0, sub_key.as_ptr())
                } else {
                    RegDeleteTreeW(key.0, sub_key.as_ptr())
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = r"SOFTWARE\Zenware";

    #[test]
    fn test_memory_store_values() {
        let store = MemoryStore::new();
        assert_eq!(store.read_dword(RootKey::LocalMachine, PATH, "Diagnostics").unwrap(), None);

        store.write_dword(RootKey::LocalMachine, PATH, "Diagnostics", 7).unwrap();
        store.write_string(RootKey::LocalMachine, PATH, "Owner", "zen").unwrap();

        assert_eq!(
            store.read_dword(RootKey::LocalMachine, r"\software\ZENWARE\", "DIAGNOSTICS").unwrap(),
            Some(7)
        );
        assert_eq!(
            store.read_string(RootKey::LocalMachine, PATH, "owner").unwrap().as_deref(),
            Some("zen")
        );
        // Roots are separate
        assert_eq!(store.read_dword(RootKey::CurrentUser, PATH, "Diagnostics").unwrap(), None);

        let error = store.read_string(RootKey::LocalMachine, PATH, "Diagnostics").unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_memory_store_value_names() {
        let store = MemoryStore::new();
        store.write_dword(RootKey::CurrentUser, PATH, "Beta", 1).unwrap();
        store.write_dword(RootKey::CurrentUser, PATH, "Alpha", 2).unwrap();
        store.write_dword(RootKey::CurrentUser, PATH, "alpha", 3).unwrap();

        assert_eq!(store.value_names(RootKey::CurrentUser, PATH).unwrap(), ["alpha", "Beta"]);
        assert_eq!(store.value_count(RootKey::CurrentUser, PATH).unwrap(), 2);
        assert_eq!(store.value_count(RootKey::CurrentUser, r"SOFTWARE\Missing").unwrap(), 0);
    }

    #[test]
    fn test_memory_store_delete() {
        let store = MemoryStore::new();
        store.write_dword(RootKey::CurrentUser, r"SOFTWARE\Zenware\App", "A", 1).unwrap();
        store.write_dword(RootKey::CurrentUser, r"SOFTWARE\Zenware\App\Child", "B", 2).unwrap();

        let error = store
            .delete_key(RootKey::CurrentUser, PATH, "App", true)
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::PermissionDenied);

        store.delete_key(RootKey::CurrentUser, PATH, "app", false).unwrap();
        assert_eq!(
            store.read_dword(RootKey::CurrentUser, r"SOFTWARE\Zenware\App\Child", "B").unwrap(),
            None
        );

        let error = store
            .delete_key(RootKey::CurrentUser, PATH, "App", false)
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(windows)]
    #[test]
    fn test_registry_round_trip() {
        let path = format!(r"SOFTWARE\zenutils-test-{}", std::process::id());
        let registry = Registry;

        assert_eq!(registry.read_dword(RootKey::CurrentUser, &path, "Level").unwrap(), None);

        registry.write_dword(RootKey::CurrentUser, &path, "Level", 0x15).unwrap();
        registry.write_string(RootKey::CurrentUser, &path, "Name", "zen").unwrap();
        assert_eq!(registry.read_dword(RootKey::CurrentUser, &path, "Level").unwrap(), Some(0x15));
        assert_eq!(
            registry.read_string(RootKey::CurrentUser, &path, "Name").unwrap().as_deref(),
            Some("zen")
        );
        assert_eq!(registry.value_count(RootKey::CurrentUser, &path).unwrap(), 2);

        let (parent, leaf) = path.rsplit_once('\\').unwrap();
        registry.delete_key(RootKey::CurrentUser, parent, leaf, false).unwrap();
        assert_eq!(registry.read_dword(RootKey::CurrentUser, &path, "Level").unwrap(), None);
    }
}
