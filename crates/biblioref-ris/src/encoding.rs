//! Best-effort encoding detection for citation export files.
//!
//! Exports from Korean reference managers commonly arrive as CP949/EUC-KR
//! rather than UTF-8, and some tools prepend a UTF-8 BOM. Candidates are
//! tried in a fixed order and the first strict decode wins; as a last
//! resort the bytes are decoded as UTF-8 with replacement characters so
//! that reading never fails on garbage input.

use crate::error::{Error, Result};
use std::path::Path;

/// Decode `data` by trying the candidate encodings in order.
///
/// Returns the decoded text and a label for the encoding that was used.
pub fn decode_guess(data: &[u8]) -> (String, &'static str) {
    // UTF-8 with BOM first: a BOM would otherwise survive into the first
    // tag name.
    if let Some(stripped) = data.strip_prefix(b"\xef\xbb\xbf") {
        if let Ok(s) = std::str::from_utf8(stripped) {
            return (s.to_string(), "utf-8-sig");
        }
    }

    if let Ok(s) = std::str::from_utf8(data) {
        return (s.to_string(), "utf-8");
    }

    // encoding_rs's EUC-KR is the windows-949 superset, which covers both
    // the cp949 and euc-kr cases of real exports.
    let (decoded, _, had_errors) = encoding_rs::EUC_KR.decode(data);
    if !had_errors {
        return (decoded.into_owned(), "euc-kr");
    }

    (String::from_utf8_lossy(data).into_owned(), "utf-8(replace)")
}

/// Read a file with best-effort encoding guessing.
pub fn read_text_guess(path: &Path) -> Result<(String, &'static str)> {
    let data = std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, encoding) = decode_guess(&data);
    tracing::debug!(path = %path.display(), encoding, "decoded export file");
    Ok((text, encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        let (text, enc) = decode_guess("TY  - JOUR\n".as_bytes());
        assert_eq!(text, "TY  - JOUR\n");
        assert_eq!(enc, "utf-8");
    }

    #[test]
    fn bom_is_stripped() {
        let mut data = vec![0xef, 0xbb, 0xbf];
        data.extend_from_slice(b"TY  - JOUR\n");
        let (text, enc) = decode_guess(&data);
        assert_eq!(text, "TY  - JOUR\n");
        assert_eq!(enc, "utf-8-sig");
    }

    #[test]
    fn euc_kr_is_detected() {
        // "제목" in EUC-KR
        let (encoded, _, _) = encoding_rs::EUC_KR.encode("TI  - 제목");
        let (text, enc) = decode_guess(&encoded);
        assert_eq!(text, "TI  - 제목");
        assert_eq!(enc, "euc-kr");
    }

    #[test]
    fn garbage_falls_back_to_replacement() {
        let (_, enc) = decode_guess(&[0xff, 0xfe, 0x00, 0xd8, 0x01]);
        assert_eq!(enc, "utf-8(replace)");
    }
}
