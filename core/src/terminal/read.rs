//! terminal/read.rs
//! Document reader: header validation, then the body through a bounded read
//! cache into the dispatcher.

use std::io::{self, Read};

use tracing::{debug, trace};

use crate::pipeline::{ReadContext, ReadDispatcher};
use crate::terminal::header::DocumentHeader;
use crate::types::{PipelineError, Result, Stage};

/// Read one document from the current position of `input`.
///
/// At most `total_size` bytes are taken after the header, so trailing data
/// (a runtime trailer, for instance) is left alone. Reading stops early once
/// the outermost frame completes.
pub fn read_document<R: Read>(input: &mut R, cx: &mut ReadContext<'_>, cache_size: usize) -> Result<DocumentHeader> {
    let header = DocumentHeader::read_from(input)?;
    debug!(
        version = %header.version,
        min_version = %header.min_version,
        total_size = header.total_size,
        flags = header.flags,
        "document header accepted"
    );

    let mut remaining = u64::from(header.total_size);
    let cache_len = (cache_size.max(1) as u64).min(remaining.max(1)) as usize;
    let mut cache = vec![0u8; cache_len];
    let mut dispatcher = ReadDispatcher::new();

    while remaining > 0 && !dispatcher.is_done() {
        let want = (cache.len() as u64).min(remaining) as usize;
        let n = match input.read(&mut cache[..want]) {
            Ok(0) => return Err(PipelineError::Truncated { stage: Stage::Terminal }),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        trace!(bytes = n, remaining, "read cache filled");
        dispatcher.push(&cache[..n], cx)?;
        remaining -= n as u64;
    }

    dispatcher.finish()?;
    Ok(header)
}
