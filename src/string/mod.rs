//! Code page conversion between multi-byte text and UTF-16.
//!
//! [`to_unicode`] decodes a null-terminated multi-byte string. If the
//! requested code page cannot decode it, the conversion is retried with each
//! code page in [`FALLBACK_CODE_PAGES`] before giving up.
//!
//! [`to_multi_byte`] encodes UTF-16 text in a single code page. The output
//! size is queried first and the buffer allocated to match.
//!
//! On Windows both directions go through [`MultiByteToWideChar`] and
//! [`WideCharToMultiByte`]. Elsewhere they go through `encoding_rs`, which
//! covers the common ANSI, OEM, ISO-8859 and CJK code pages. US-ASCII is
//! converted in Rust on every platform.
//!
//! # Examples
//!
//! ```
//! use zenutils::string::{to_multi_byte, to_unicode, CodePage};
//!
//! let wide = to_unicode(c"Hello", CodePage::Utf8)?;
//! assert_eq!(wide.to_string_lossy(), "Hello");
//!
//! let narrow = to_multi_byte(&wide, CodePage::UsAscii)?;
//! assert_eq!(narrow.as_bytes(), b"Hello");
//! # Ok::<(), zenutils::Error>(())
//! ```
//!
//! [`MultiByteToWideChar`]: https://learn.microsoft.com/en-us/windows/win32/api/stringapiset/nf-stringapiset-multibytetowidechar
//! [`WideCharToMultiByte`]: https://learn.microsoft.com/en-us/windows/win32/api/stringapiset/nf-stringapiset-widechartomultibyte

use std::ffi::{CStr, CString};
use widestring::{U16Str, U16String};

use crate::{Error, define_int_enum, util::until_nul};

#[cfg(windows)]
#[path = "nls.rs"]
mod backend;

#[cfg(not(windows))]
#[path = "portable.rs"]
mod backend;

define_int_enum!("Windows code page identifiers", u32, CodePage {
    Acp = 0, "System default ANSI code page\n\nThis may vary between systems";
    Oem = 1, "System OEM code page\n\nThis may vary between systems";
    Mac = 2, "System Macintosh code page\n\nThis may vary between systems";
    ThreadAcp = 3, "ANSI code page for the current thread\n\nThis may vary between systems";
    Symbol = 42, "Symbol code page";
    Ibm437 = 437, "OEM United States";
    Ibm850 = 850, "OEM Multilingual Latin 1; Western European (DOS)";
    Ibm852 = 852, "OEM Latin 2; Central European (DOS)";
    Cp866 = 866, "OEM Russian; Cyrillic (DOS)";
    Windows874 = 874, "Thai (Windows)";
    ShiftJis = 932, "ANSI/OEM Japanese; Japanese (Shift-JIS)";
    Gb2312 = 936, "ANSI/OEM Simplified Chinese (PRC, Singapore)";
    KsC56011987 = 949, "ANSI/OEM Korean (Unified Hangul Code)";
    Big5 = 950, "ANSI/OEM Traditional Chinese (Taiwan; Hong Kong SAR, PRC)";
    Utf16 = 1200, "Unicode UTF-16, little endian byte order";
    Utf16Be = 1201, "Unicode UTF-16, big endian byte order";
    Windows1250 = 1250, "ANSI Central European; Central European (Windows)";
    Windows1251 = 1251, "ANSI Cyrillic; Cyrillic (Windows)";
    Windows1252 = 1252, "ANSI Latin 1; Western European (Windows)";
    Windows1253 = 1253, "ANSI Greek; Greek (Windows)";
    Windows1254 = 1254, "ANSI Turkish; Turkish (Windows)";
    Windows1255 = 1255, "ANSI Hebrew; Hebrew (Windows)";
    Windows1256 = 1256, "ANSI Arabic; Arabic (Windows)";
    Windows1257 = 1257, "ANSI Baltic; Baltic (Windows)";
    Windows1258 = 1258, "ANSI/OEM Vietnamese; Vietnamese (Windows)";
    Macintosh = 10000, "MAC Roman; Western European (Mac)";
    MacCyrillic = 10007, "Cyrillic (Mac)";
    Utf32 = 12000, "Unicode UTF-32, little endian byte order";
    Utf32Be = 12001, "Unicode UTF-32, big endian byte order";
    UsAscii = 20127, "US-ASCII (7-bit)";
    Koi8R = 20866, "Russian (KOI8-R); Cyrillic (KOI8-R)";
    EucJp = 20932, "Japanese (JIS 0208-1990 and 0212-1990)\n\nThe EUC-JP variant the NLS subsystem actually implements";
    Koi8U = 21866, "Ukrainian (KOI8-U); Cyrillic (KOI8-U)";
    Iso88591 = 28591, "ISO 8859-1 Latin 1; Western European (ISO)";
    Iso88592 = 28592, "ISO 8859-2 Central European";
    Iso88593 = 28593, "ISO 8859-3 Latin 3";
    Iso88594 = 28594, "ISO 8859-4 Baltic";
    Iso88595 = 28595, "ISO 8859-5 Cyrillic";
    Iso88596 = 28596, "ISO 8859-6 Arabic";
    Iso88597 = 28597, "ISO 8859-7 Greek";
    Iso88598 = 28598, "ISO 8859-8 Hebrew; Hebrew (ISO-Visual)";
    Iso88599 = 28599, "ISO 8859-9 Turkish";
    Iso885913 = 28603, "ISO 8859-13 Estonian";
    Iso885915 = 28605, "ISO 8859-15 Latin 9";
    Iso88598I = 38598, "ISO 8859-8 Hebrew; Hebrew (ISO-Logical)";
    Iso2022Jp = 50220, "ISO 2022 Japanese with no halfwidth Katakana";
    Iso2022JpAllow1ByteKana = 50221, "ISO 2022 Japanese with halfwidth Katakana";
    Iso2022JpSoSi = 50222, "ISO 2022 Japanese JIS X 0201-1989";
    Iso2022Kr = 50225, "ISO 2022 Korean";
    Cp50227 = 50227, "ISO 2022 Simplified Chinese";
    Iso2022TradChinese = 50229, "ISO 2022 Traditional Chinese";
    EucJpComplete = 51932, "EUC Japanese\n\nNot available through the NLS subsystem on most systems";
    EucCn = 51936, "EUC Simplified Chinese";
    EucKr = 51949, "EUC Korean";
    HzGb2312 = 52936, "HZ-GB2312 Simplified Chinese";
    Gb18030 = 54936, "GB18030 Simplified Chinese (4 byte)";
    IsciiDevanagari = 57002, "ISCII Devanagari";
    IsciiBangla = 57003, "ISCII Bangla";
    IsciiTamil = 57004, "ISCII Tamil";
    IsciiTelugu = 57005, "ISCII Telugu";
    IsciiAssamese = 57006, "ISCII Assamese";
    IsciiOdia = 57007, "ISCII Odia";
    IsciiKannada = 57008, "ISCII Kannada";
    IsciiMalayalam = 57009, "ISCII Malayalam";
    IsciiGujarati = 57010, "ISCII Gujarati";
    IsciiPunjabi = 57011, "ISCII Punjabi";
    Utf7 = 65000, "Unicode (UTF-7)";
    Utf8 = 65001, "Unicode (UTF-8)";
});

impl CodePage {
    /// The raw identifier callers pass to request the ambient code page.
    pub const AMBIENT_ID: i32 = -1;

    /// Look up a code page by signed identifier. [`CodePage::AMBIENT_ID`]
    /// maps to [`CodePage::Acp`].
    pub fn from_id(id: i32) -> Option<CodePage> {
        if id == Self::AMBIENT_ID {
            return Some(CodePage::Acp);
        }
        u32::try_from(id).ok().and_then(|id| CodePage::try_from(id).ok())
    }

    /// Resolve [`CodePage::Acp`] to the process's active code page.
    ///
    /// Other ambient pages (`Oem`, `Mac`, `ThreadAcp`) are passed through on
    /// Windows, where the conversion routines resolve them, and map to UTF-8
    /// elsewhere.
    pub fn resolve(self) -> u32 {
        match self {
            CodePage::Acp => backend::active_code_page(),
            other => backend::resolve_ambient(other.id()),
        }
    }
}

/// Code pages retried, in order, when [`to_unicode`] fails with the
/// requested one. The end of the slice stops the chain.
pub const FALLBACK_CODE_PAGES: [CodePage; 2] = [CodePage::Utf8, CodePage::UsAscii];

/// Extra UTF-16 units allocated beyond the input length when decoding.
///
/// Decoding never produces more UTF-16 units than input bytes, so the margin
/// only needs room for the terminator.
const DECODE_MARGIN: usize = 2;

const US_ASCII: u32 = CodePage::UsAscii.id();

/// Returns whether the conversion routines accept composition flags for
/// `code_page`.
///
/// The stateful ISO-2022 pages, HZ, GB18030, ISCII, UTF-7, UTF-8 and the
/// symbol page reject any flags other than error checking.
pub fn allow_conversion_flags(code_page: u32) -> bool {
    !matches!(
        code_page,
        42 | 50220..=50222
            | 50225
            | 50227
            | 50229
            | 52936
            | 54936
            | 57002..=57011
            | 65000
            | 65001
    )
}

/// Decode `s`, a null-terminated multi-byte string in `code_page`, to UTF-16.
///
/// If no characters can be decoded with `code_page`, each page in
/// [`FALLBACK_CODE_PAGES`] is tried in turn. An empty input yields an empty
/// string.
///
/// # Errors
///
/// [`Error::FallbackExhausted`] if every attempted code page failed.
pub fn to_unicode(s: &CStr, code_page: CodePage) -> Result<U16String, Error> {
    if s.is_empty() {
        return Ok(U16String::new());
    }

    let mut buffer = vec![0u16; s.to_bytes().len() + DECODE_MARGIN];
    let mut tried = Vec::with_capacity(1 + FALLBACK_CODE_PAGES.len());

    for candidate in std::iter::once(code_page).chain(FALLBACK_CODE_PAGES) {
        let resolved = candidate.resolve();
        tried.push(resolved);

        buffer.fill(0);
        let chars_written = decode_into(resolved, s, &mut buffer);

        // `chars_written` includes the terminator
        if let Some(len) = chars_written.checked_sub(1).filter(|&len| len > 0) {
            if tried.len() > 1 {
                debug!(requested = code_page.id(), used = resolved, "decoded with fallback code page");
            }
            buffer.truncate(len);
            return Ok(U16String::from_vec(buffer));
        }

        trace!(code_page = resolved, "decode attempt failed");
    }

    warn!(tried = ?tried, "every code page failed to decode input");
    Err(Error::FallbackExhausted { tried })
}

/// Encode `s` in `code_page`. Conversion stops at the first null character.
///
/// Characters with no mapping in `code_page` are replaced with the code
/// page's default character. An empty input yields an empty string.
///
/// # Errors
///
/// [`Error::UnsupportedCodePage`] if there is no converter for `code_page`,
/// [`Error::Conversion`] if the conversion produced nothing.
pub fn to_multi_byte(s: &U16Str, code_page: CodePage) -> Result<CString, Error> {
    let units = until_nul(s.as_slice());
    if units.is_empty() {
        return Ok(CString::default());
    }

    let resolved = code_page.resolve();
    if resolved != US_ASCII && !backend::is_supported(resolved) {
        return Err(Error::UnsupportedCodePage(resolved));
    }

    let mut source = Vec::with_capacity(units.len() + 1);
    source.extend_from_slice(units);
    source.push(0);

    // Query the required size first
    let required = encode_into(resolved, &source, None);
    if required == 0 {
        return Err(Error::Conversion { code_page: resolved });
    }

    let mut buffer = vec![0u8; required];
    let chars_written = encode_into(resolved, &source, Some(&mut buffer));

    let Some(len) = chars_written.checked_sub(1).filter(|&len| len > 0) else {
        return Err(Error::Conversion { code_page: resolved });
    };
    buffer.truncate(len);

    CString::new(buffer).map_err(|_| Error::Conversion { code_page: resolved })
}

/// Decode `s` using the ambient ANSI code page.
pub fn unicode_string(s: &CStr) -> Result<U16String, Error> {
    to_unicode(s, CodePage::Acp)
}

/// Encode `s` using the ambient ANSI code page.
pub fn multi_byte_string(s: &U16Str) -> Result<CString, Error> {
    to_multi_byte(s, CodePage::Acp)
}

/// Encode `s` as UTF-8.
pub fn utf8_multi_byte_string(s: &U16Str) -> Result<CString, Error> {
    to_multi_byte(s, CodePage::Utf8)
}

/// Decode into `dest`, returning the number of units written including the
/// terminator, or zero on failure.
fn decode_into(code_page: u32, source: &CStr, dest: &mut [u16]) -> usize {
    if code_page == US_ASCII {
        ascii::decode(source.to_bytes(), dest)
    } else {
        backend::multi_byte_to_wide(code_page, source, dest)
    }
}

/// Encode null-terminated `source` into `dest`, returning the number of bytes
/// written including the terminator, or zero on failure. With no `dest`,
/// returns the required buffer size instead.
fn encode_into(code_page: u32, source: &[u16], dest: Option<&mut [u8]>) -> usize {
    if code_page == US_ASCII {
        ascii::encode(source, dest)
    } else {
        backend::wide_to_multi_byte(code_page, source, dest)
    }
}

mod ascii {
    use crate::util::until_nul;

    const DEFAULT_CHAR: u8 = b'?';

    pub(super) fn decode(source: &[u8], dest: &mut [u16]) -> usize {
        if source.len() >= dest.len() || !source.is_ascii() {
            return 0;
        }
        for (unit, &byte) in dest.iter_mut().zip(source) {
            *unit = u16::from(byte);
        }
        dest[source.len()] = 0;
        source.len() + 1
    }

    pub(super) fn encode(source: &[u16], dest: Option<&mut [u8]>) -> usize {
        let units = until_nul(source);
        let Some(dest) = dest else {
            return units.len() + 1;
        };
        if units.len() >= dest.len() {
            return 0;
        }
        for (byte, &unit) in dest.iter_mut().zip(units) {
            *byte = u8::try_from(unit).ok().filter(u8::is_ascii).unwrap_or(DEFAULT_CHAR);
        }
        dest[units.len()] = 0;
        units.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use widestring::u16str;

    #[test]
    fn test_multibyte_to_wide() {
        // € = 0x20AC in UTF-16
        let converted = to_unicode(c"€€", CodePage::Utf8).unwrap();
        assert_eq!(converted.as_slice(), &[0x20AC, 0x20AC]);

        // boundary case
        let converted = to_unicode(c"", CodePage::Utf8).unwrap();
        assert!(converted.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            (CodePage::UsAscii, "plain ascii text"),
            (CodePage::Utf8, "Grüße, 世界 🙂"),
            (CodePage::ShiftJis, "日本語のテキスト ｶﾀｶﾅ"),
        ];

        for (code_page, text) in cases {
            let wide = U16String::from_str(text);
            let narrow = to_multi_byte(&wide, code_page).unwrap();
            let back = to_unicode(&narrow, code_page).unwrap();
            assert_eq!(back, wide, "round trip through {code_page:?}");
        }
    }

    #[test]
    fn test_shift_jis_bytes() {
        // "日本語" in Shift-JIS
        let encoded = to_multi_byte(u16str!("日本語"), CodePage::ShiftJis).unwrap();
        assert_eq!(encoded.as_bytes(), &[0x93, 0xFA, 0x96, 0x7B, 0x8C, 0xEA]);
    }

    #[test]
    fn test_fallback_to_utf8() {
        // Valid UTF-8, but not 7-bit ASCII
        let input = CString::new("Résumé").unwrap();
        let converted = to_unicode(&input, CodePage::UsAscii).unwrap();
        assert_eq!(converted.to_string_lossy(), "Résumé");
    }

    #[test]
    fn test_fallback_exhausted() {
        // Invalid as UTF-8 and as ASCII
        let input = CString::new(vec![0xFF, 0xFE, 0xFD]).unwrap();
        match to_unicode(&input, CodePage::UsAscii) {
            Err(Error::FallbackExhausted { tried }) => {
                assert_eq!(tried, vec![20127, 65001, 20127]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_empty_multi_byte() {
        let converted = to_multi_byte(u16str!(""), CodePage::Utf8).unwrap();
        assert!(converted.as_bytes().is_empty());
    }

    #[test]
    fn test_multi_byte_stops_at_nul() {
        let wide = U16String::from_vec(vec![0x61, 0x62, 0, 0x63]);
        let converted = to_multi_byte(&wide, CodePage::Utf8).unwrap();
        assert_eq!(converted.as_bytes(), b"ab");
    }

    #[test]
    fn test_ascii_default_char() {
        let converted = to_multi_byte(u16str!("naïve"), CodePage::UsAscii).unwrap();
        assert_eq!(converted.as_bytes(), b"na?ve");
    }

    #[test]
    fn test_utf8_expansion() {
        // Three bytes per character in UTF-8
        let converted = utf8_multi_byte_string(u16str!("€€€€")).unwrap();
        assert_eq!(converted.as_bytes().len(), 12);
    }

    #[test]
    fn test_conversion_flags() {
        assert!(allow_conversion_flags(1252));
        assert!(allow_conversion_flags(932));
        assert!(!allow_conversion_flags(65001));
        assert!(!allow_conversion_flags(50221));
        assert!(!allow_conversion_flags(57007));
        assert!(!allow_conversion_flags(42));
    }

    #[test]
    fn test_code_page_from_id() {
        assert_eq!(CodePage::from_id(-1), Some(CodePage::Acp));
        assert_eq!(CodePage::from_id(65001), Some(CodePage::Utf8));
        assert_eq!(CodePage::from_id(-2), None);
        assert_eq!(CodePage::from_id(12345), None);
    }
}
