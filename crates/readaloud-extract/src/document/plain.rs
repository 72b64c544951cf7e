//! Plain text and Markdown passthrough

use crate::error::Result;
use std::io::Read;

/// Read everything, decode as UTF-8 and trim surrounding whitespace.
///
/// Invalid byte sequences become U+FFFD and a leading byte-order mark is
/// dropped; nothing else is touched.
pub fn extract_plain_text<R: Read>(mut reader: R) -> Result<String> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let text = String::from_utf8_lossy(&data);
    Ok(text.trim_start_matches('\u{feff}').trim().to_string())
}
