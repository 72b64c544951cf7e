//! Temporary buffering for parsers that need random access.
//!
//! Both helpers hand back an owned temp object; dropping it removes the
//! backing file, so cleanup happens on every exit path.

use crate::error::Result;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tempfile::{NamedTempFile, SpooledTempFile};

/// Copy `reader` into a uniquely named file that lives until the returned
/// handle is dropped
#[cfg_attr(not(feature = "pdf"), allow(dead_code))]
pub(crate) fn spool_to_file<R: Read>(mut reader: R, suffix: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("read-aloud-")
        .suffix(suffix)
        .tempfile()?;
    io::copy(&mut reader, &mut file)?;
    file.flush()?;
    Ok(file)
}

/// Copy `reader` into memory, rolling over to an anonymous file past
/// `threshold` bytes. The result is rewound to the start.
#[cfg_attr(not(feature = "docx"), allow(dead_code))]
pub(crate) fn spool<R: Read>(mut reader: R, threshold: usize) -> Result<SpooledTempFile> {
    let mut spooled = SpooledTempFile::new(threshold);
    io::copy(&mut reader, &mut spooled)?;
    spooled.seek(SeekFrom::Start(0))?;
    Ok(spooled)
}
