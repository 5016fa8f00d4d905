//! `encoding_rs` conversions for targets without the NLS subsystem.
//!
//! Mirrors the Win32 calling convention: counts include the terminator and
//! zero means failure. Decoding is strict; encoding substitutes `?` for
//! unmappable characters.

use encoding_rs::{DecoderResult, Encoder, EncoderResult, Encoding};
use std::ffi::CStr;

const UTF8: u32 = 65001;

/// There is no system ANSI code page here; text is UTF-8.
pub(super) fn active_code_page() -> u32 {
    UTF8
}

pub(super) fn resolve_ambient(code_page: u32) -> u32 {
    match code_page {
        0..=3 => UTF8,
        other => other,
    }
}

pub(super) fn is_supported(code_page: u32) -> bool {
    encoder_for(code_page).is_some()
}

pub(super) fn multi_byte_to_wide(code_page: u32, source: &CStr, dest: &mut [u16]) -> usize {
    let Some(encoding) = encoding_for(code_page) else {
        trace!(code_page, "no decoder for code page");
        return 0;
    };
    let Some(capacity) = dest.len().checked_sub(1) else {
        return 0;
    };

    let mut decoder = encoding.new_decoder_without_bom_handling();
    let (result, _read, written) =
        decoder.decode_to_utf16_without_replacement(source.to_bytes(), &mut dest[..capacity], true);

    match result {
        DecoderResult::InputEmpty => {
            dest[written] = 0;
            written + 1
        }
        DecoderResult::OutputFull | DecoderResult::Malformed(..) => 0,
    }
}

pub(super) fn wide_to_multi_byte(code_page: u32, source: &[u16], dest: Option<&mut [u8]>) -> usize {
    let Some(encoding) = encoder_for(code_page) else {
        return 0;
    };
    let units = source.strip_suffix(&[0]).unwrap_or(source);
    let mut encoder = encoding.new_encoder();

    match dest {
        // Room for a replacement escape sequence, plus the terminator
        None => encoder
            .max_buffer_length_from_utf16_without_replacement(units.len())
            .map_or(0, |len| len + REPLACEMENT_SLACK + 1),
        Some(dest) => encode(&mut encoder, units, dest),
    }
}

const REPLACEMENT_SLACK: usize = 8;

fn encode(encoder: &mut Encoder, mut units: &[u16], dest: &mut [u8]) -> usize {
    let Some(capacity) = dest.len().checked_sub(1) else {
        return 0;
    };
    let mut total = 0;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf16_without_replacement(units, &mut dest[total..capacity], true);
        total += written;
        units = &units[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => return 0,
            EncoderResult::Unmappable(_) => {
                let (result, _, written) =
                    encoder.encode_from_utf8_without_replacement("?", &mut dest[total..capacity], false);
                total += written;
                if !matches!(result, EncoderResult::InputEmpty) {
                    return 0;
                }
            }
        }
    }

    dest[total] = 0;
    total + 1
}

/// Encoders only exist for encodings that are their own output encoding;
/// the UTF-16 encodings encode to UTF-8 and are rejected.
fn encoder_for(code_page: u32) -> Option<&'static Encoding> {
    encoding_for(code_page).filter(|&encoding| encoding.output_encoding() == encoding)
}

fn encoding_for(code_page: u32) -> Option<&'static Encoding> {
    Some(match code_page {
        UTF8 => encoding_rs::UTF_8,
        866 => encoding_rs::IBM866,
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1200 => encoding_rs::UTF_16LE,
        1201 => encoding_rs::UTF_16BE,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        // ISO 8859-1 is treated as its Windows superset, as browsers do
        1252 | 28591 => encoding_rs::WINDOWS_1252,
        1253 => encoding_rs::WINDOWS_1253,
        1254 | 28599 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        10000 => encoding_rs::MACINTOSH,
        10007 => encoding_rs::X_MAC_CYRILLIC,
        20866 => encoding_rs::KOI8_R,
        20932 | 51932 => encoding_rs::EUC_JP,
        21866 => encoding_rs::KOI8_U,
        28592 => encoding_rs::ISO_8859_2,
        28593 => encoding_rs::ISO_8859_3,
        28594 => encoding_rs::ISO_8859_4,
        28595 => encoding_rs::ISO_8859_5,
        28596 => encoding_rs::ISO_8859_6,
        28597 => encoding_rs::ISO_8859_7,
        28598 => encoding_rs::ISO_8859_8,
        28603 => encoding_rs::ISO_8859_13,
        28605 => encoding_rs::ISO_8859_15,
        38598 => encoding_rs::ISO_8859_8_I,
        50220..=50222 => encoding_rs::ISO_2022_JP,
        51949 => encoding_rs::EUC_KR,
        51936 => encoding_rs::GBK,
        54936 => encoding_rs::GB18030,
        _ => return None,
    })
}
