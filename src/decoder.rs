// 🔤 Decoder - bytes from the Banco Central into clean text
//
// The feeds have been published as UTF-8, UTF-8 with BOM and Windows-1252
// at different times, with no reliable charset header. Each candidate is
// tried in order and must decode AND read like real Portuguese.

use crate::fallback::first_success;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    Utf8,
    Windows1252,
    Iso88591,
    /// Permissive UTF-8 with U+FFFD substitution (last resort)
    Utf8Lossy,
    /// Windows-1252 with U+FFFD for its five undefined bytes (last resort)
    Windows1252Lossy,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Windows1252 => "windows-1252",
            Encoding::Iso88591 => "iso-8859-1",
            Encoding::Utf8Lossy => "utf-8 (lossy)",
            Encoding::Windows1252Lossy => "windows-1252 (lossy)",
        }
    }
}

/// Strict candidates, in the order they are tried
pub const CANDIDATE_ENCODINGS: [Encoding; 3] =
    [Encoding::Utf8, Encoding::Windows1252, Encoding::Iso88591];

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: Encoding,
    /// True when no strict candidate produced clean text
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeRejection {
    /// Bytes are not valid in this encoding
    Invalid { offset: usize },
    /// Decoded fine but the output carries mis-decoding markers
    Mojibake,
}

/// Decode raw feed bytes, never failing.
pub fn decode(bytes: &[u8]) -> DecodedText {
    let result = first_success(CANDIDATE_ENCODINGS, |encoding| {
        let text = decode_strict(bytes, *encoding)?;
        if has_mojibake(&text) {
            return Err(DecodeRejection::Mojibake);
        }
        Ok(text)
    });

    match result {
        Ok((encoding, text)) => {
            debug!(encoding = encoding.name(), "decoded payload");
            DecodedText {
                text,
                encoding,
                degraded: false,
            }
        }
        Err(failures) => {
            warn!(
                attempts = ?failures.iter().map(|f| (f.candidate.name(), f.error.clone())).collect::<Vec<_>>(),
                "no clean encoding found, decoding with replacement characters"
            );
            // Single-byte text keeps its accents; only undefined bytes are replaced
            let encoding = if std::str::from_utf8(strip_bom(bytes)).is_ok() {
                Encoding::Utf8Lossy
            } else {
                Encoding::Windows1252Lossy
            };
            DecodedText {
                text: lossy_decode(bytes, encoding),
                encoding,
                degraded: true,
            }
        }
    }
}

pub fn decode_strict(bytes: &[u8], encoding: Encoding) -> Result<String, DecodeRejection> {
    match encoding {
        Encoding::Utf8 => std::str::from_utf8(strip_bom(bytes))
            .map(|s| s.to_string())
            .map_err(|e| DecodeRejection::Invalid {
                offset: e.valid_up_to(),
            }),
        Encoding::Windows1252 => bytes
            .iter()
            .enumerate()
            .map(|(offset, &b)| windows_1252_char(b).ok_or(DecodeRejection::Invalid { offset }))
            .collect(),
        Encoding::Iso88591 => Ok(bytes.iter().map(|&b| b as char).collect()),
        Encoding::Utf8Lossy | Encoding::Windows1252Lossy => Ok(lossy_decode(bytes, encoding)),
    }
}

fn lossy_decode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Windows1252Lossy => bytes
            .iter()
            .map(|&b| windows_1252_char(b).unwrap_or('\u{FFFD}'))
            .collect(),
        _ => String::from_utf8_lossy(strip_bom(bytes)).into_owned(),
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Windows-1252 differs from Latin-1 only in 0x80..=0x9F; five of those are undefined.
fn windows_1252_char(byte: u8) -> Option<char> {
    const HIGH: [Option<char>; 32] = [
        Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
        Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
        None, Some('‘'), Some('’'), Some('“'), Some('”'), Some('•'), Some('–'), Some('—'),
        Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
    ];

    match byte {
        0x80..=0x9F => HIGH[(byte - 0x80) as usize],
        _ => Some(byte as char),
    }
}

/// Characters that show up after a UTF-8 lead byte (Ã, Â) is read as 1252
const WINDOWS_1252_SPECIALS: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

/// Replacement characters, C1 controls, or UTF-8 read as a single-byte charset
pub fn has_mojibake(text: &str) -> bool {
    let mut previous: Option<char> = None;

    for c in text.chars() {
        if c == '\u{FFFD}' || ('\u{80}'..='\u{9F}').contains(&c) {
            return true;
        }
        if matches!(previous, Some('Ã') | Some('Â'))
            && (('\u{A0}'..='\u{BF}').contains(&c) || WINDOWS_1252_SPECIALS.contains(c))
        {
            return true;
        }
        previous = Some(c);
    }

    false
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        let decoded = decode("ISPB;Nome;Tipo de Instituição".as_bytes());
        assert_eq!(decoded.encoding, Encoding::Utf8);
        assert!(!decoded.degraded);
        assert!(decoded.text.ends_with("Instituição"));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("ISPB,Nome".as_bytes());

        let decoded = decode(&bytes);
        assert_eq!(decoded.text, "ISPB,Nome");
        assert_eq!(decoded.encoding, Encoding::Utf8);
    }

    #[test]
    fn test_latin1_bytes_fall_back_to_windows_1252() {
        // "Instituição" in Latin-1
        let bytes = b"Institui\xe7\xe3o";

        let decoded = decode(bytes);
        assert_eq!(decoded.encoding, Encoding::Windows1252);
        assert_eq!(decoded.text, "Instituição");
        assert!(!decoded.degraded);
    }

    #[test]
    fn test_windows_1252_punctuation() {
        let decoded = decode(b"Cr\xe9dito \x96 Cooperativa");
        assert_eq!(decoded.encoding, Encoding::Windows1252);
        assert_eq!(decoded.text, "Crédito – Cooperativa");
    }

    #[test]
    fn test_double_encoded_text_is_degraded() {
        // UTF-8 text that was already mis-decoded once upstream
        let decoded = decode("InstituiÃ§Ã£o".as_bytes());
        assert!(decoded.degraded);
        assert_eq!(decoded.encoding, Encoding::Utf8Lossy);
        assert_eq!(decoded.text, "InstituiÃ§Ã£o");
    }

    #[test]
    fn test_undefined_byte_degrades_with_replacement() {
        let decoded = decode(&[b'A', 0x81, b'B']);
        assert!(decoded.degraded);
        assert_eq!(decoded.encoding, Encoding::Windows1252Lossy);
        assert_eq!(decoded.text, "A\u{FFFD}B");
    }

    #[test]
    fn test_stray_undefined_byte_keeps_latin1_accents() {
        let decoded = decode(b"Cr\xe9dito Cooperativo \x81 S\xe3o Paulo");

        assert!(decoded.degraded);
        assert_eq!(decoded.encoding, Encoding::Windows1252Lossy);
        assert_eq!(decoded.text, "Crédito Cooperativo \u{FFFD} São Paulo");
    }

    #[test]
    fn test_mojibake_markers() {
        assert!(has_mojibake("Cr\u{FFFD}dito"));
        assert!(has_mojibake("CrÃ©dito"));
        assert!(has_mojibake("AÃ‡O"));
        assert!(!has_mojibake("SÃO PAULO"));
        assert!(!has_mojibake("Crédito Cooperativo"));
    }

    #[test]
    fn test_strict_windows_1252_rejects_undefined_bytes() {
        assert_eq!(
            decode_strict(&[b'a', 0x8D], Encoding::Windows1252),
            Err(DecodeRejection::Invalid { offset: 1 })
        );
    }
}
