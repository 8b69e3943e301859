use std::fmt;
use num_enum::TryFromPrimitive;

/// One-shot CRC-32 (IEEE) over `data`.
#[inline]
pub fn compute_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Incremental CRC-32 folded chunk by chunk as payload streams through a stage.
#[derive(Clone, Default)]
pub struct RunningCrc {
    hasher: crc32fast::Hasher,
    bytes: u64,
}

impl RunningCrc {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes += data.len() as u64;
    }

    /// Bytes folded so far.
    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

impl fmt::Debug for RunningCrc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningCrc").field("bytes", &self.bytes).finish()
    }
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

pub fn fmt_bytes(b: &[u8]) -> String {
    if b.iter().all(|&c| c.is_ascii_graphic() || c == b' ') {
        format!("b\"{}\"", String::from_utf8_lossy(b))
    } else {
        format!("0x{}", hex::encode(b))
    }
}

/// Copy as many bytes as still fit into a fixed-size accumulation buffer.
/// Returns how many bytes of `input` were taken.
#[inline]
pub fn fill_from(buf: &mut Vec<u8>, target_len: usize, input: &[u8]) -> usize {
    let want = target_len.saturating_sub(buf.len());
    let take = want.min(input.len());
    buf.extend_from_slice(&input[..take]);
    take
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_crc_matches_one_shot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut crc = RunningCrc::new();
        for chunk in data.chunks(5) {
            crc.update(chunk);
        }
        assert_eq!(crc.len(), data.len() as u64);
        assert_eq!(crc.finalize(), compute_checksum(data));
    }

    #[test]
    fn fill_from_stops_at_target() {
        let mut buf = vec![1, 2];
        let taken = fill_from(&mut buf, 4, &[3, 4, 5, 6]);
        assert_eq!(taken, 2);
        assert_eq!(buf, vec![1, 2, 3, 4]);
        assert_eq!(fill_from(&mut buf, 4, &[7]), 0);
    }

    #[test]
    fn fmt_bytes_prefers_ascii() {
        assert_eq!(fmt_bytes(b"GLUEDOC"), "b\"GLUEDOC\"");
        assert_eq!(fmt_bytes(&[0x00, 0xff]), "0x00ff");
    }
}
