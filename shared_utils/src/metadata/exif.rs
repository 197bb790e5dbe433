//! EXIF block handling
//!
//! HEIF stores EXIF as an item whose payload starts with a 4-byte
//! big-endian offset to the TIFF header, usually followed by the JPEG-style
//! `Exif\0\0` marker. Encoders want the bare TIFF structure.
//!
//! Decoders apply the container's rotation and mirroring to the pixels, so
//! the Orientation tag has to be reset or viewers rotate the image twice.

const EXIF_MARKER: &[u8] = b"Exif\0\0";
const ORIENTATION_TAG: u16 = 0x0112;
const TYPE_SHORT: u16 = 3;
const IFD_ENTRY_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn detect(tiff: &[u8]) -> Option<Self> {
        match tiff.get(..4)? {
            [b'I', b'I', 42, 0] => Some(ByteOrder::Little),
            [b'M', b'M', 0, 42] => Some(ByteOrder::Big),
            _ => None,
        }
    }

    fn u16_at(self, data: &[u8], offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = data.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32_at(self, data: &[u8], offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = data.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    fn put_u16(self, data: &mut [u8], offset: usize, value: u16) -> Option<()> {
        let slot = data.get_mut(offset..offset.checked_add(2)?)?;
        let bytes = match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        slot.copy_from_slice(&bytes);
        Some(())
    }
}

fn is_tiff(data: &[u8]) -> bool {
    ByteOrder::detect(data).is_some()
}

/// Locate the TIFF structure inside an EXIF block as found in HEIF or JPEG
/// APP1 payloads. Returns `None` if no TIFF header can be found.
pub fn tiff_payload(block: &[u8]) -> Option<&[u8]> {
    if is_tiff(block) {
        return Some(block);
    }
    if let Some(rest) = block.strip_prefix(EXIF_MARKER) {
        return is_tiff(rest).then_some(rest);
    }

    let offset = u32::from_be_bytes(block.get(..4)?.try_into().ok()?) as usize;
    let after_offset = &block[4..];
    if let Some(body) = after_offset.get(offset..) {
        if is_tiff(body) {
            return Some(body);
        }
    }
    // some writers put the marker after the offset without counting it
    after_offset
        .strip_prefix(EXIF_MARKER)
        .filter(|rest| is_tiff(rest))
}

/// Set IFD0 Orientation to 1 (top-left) in place.
///
/// Returns true if the tag was present and rewritten. Malformed or
/// truncated structures are left untouched.
pub fn reset_orientation(tiff: &mut [u8]) -> bool {
    rewrite_orientation(tiff).unwrap_or(false)
}

fn rewrite_orientation(tiff: &mut [u8]) -> Option<bool> {
    let order = ByteOrder::detect(tiff)?;
    let ifd0 = order.u32_at(tiff, 4)? as usize;
    let count = order.u16_at(tiff, ifd0)? as usize;

    for index in 0..count {
        let entry = ifd0 + 2 + index * IFD_ENTRY_LEN;
        if order.u16_at(tiff, entry)? != ORIENTATION_TAG {
            continue;
        }
        if order.u16_at(tiff, entry + 2)? != TYPE_SHORT || order.u32_at(tiff, entry + 4)? != 1 {
            return Some(false);
        }
        order.put_u16(tiff, entry + 8, 1)?;
        return Some(true);
    }

    Some(false)
}

/// Extract the TIFF payload and reset its orientation, yielding bytes ready
/// to embed in the converted file.
pub fn prepare_for_embedding(block: &[u8]) -> Option<Vec<u8>> {
    let mut tiff = tiff_payload(block)?.to_vec();
    if reset_orientation(&mut tiff) {
        tracing::debug!("EXIF orientation reset to top-left");
    }
    Some(tiff)
}

/// Read IFD0 Orientation, if present.
pub fn orientation(tiff: &[u8]) -> Option<u16> {
    let order = ByteOrder::detect(tiff)?;
    let ifd0 = order.u32_at(tiff, 4)? as usize;
    let count = order.u16_at(tiff, ifd0)? as usize;
    (0..count)
        .map(|i| ifd0 + 2 + i * IFD_ENTRY_LEN)
        .find(|&entry| order.u16_at(tiff, entry) == Some(ORIENTATION_TAG))
        .and_then(|entry| order.u16_at(tiff, entry + 8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Minimal TIFF: header, IFD0 with Make(ASCII) and Orientation(SHORT).
    fn sample_tiff(big_endian: bool, orientation: u16) -> Vec<u8> {
        let mut out = Vec::new();
        let u16b = |v: u16| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
        let u32b = |v: u32| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };

        out.extend_from_slice(if big_endian { b"MM" } else { b"II" });
        out.extend_from_slice(&u16b(42));
        out.extend_from_slice(&u32b(8));
        out.extend_from_slice(&u16b(2));
        // Make = "Abc\0", inline
        out.extend_from_slice(&u16b(0x010F));
        out.extend_from_slice(&u16b(2));
        out.extend_from_slice(&u32b(4));
        out.extend_from_slice(b"Abc\0");
        // Orientation
        out.extend_from_slice(&u16b(ORIENTATION_TAG));
        out.extend_from_slice(&u16b(TYPE_SHORT));
        out.extend_from_slice(&u32b(1));
        out.extend_from_slice(&u16b(orientation));
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&u32b(0));
        out
    }

    #[test]
    fn test_reset_orientation_little_endian() {
        let mut tiff = sample_tiff(false, 6);
        assert_eq!(orientation(&tiff), Some(6));
        assert!(reset_orientation(&mut tiff));
        assert_eq!(orientation(&tiff), Some(1));
    }

    #[test]
    fn test_reset_orientation_big_endian_keeps_other_bytes() {
        let original = sample_tiff(true, 8);
        let mut tiff = original.clone();
        assert!(reset_orientation(&mut tiff));
        assert_eq!(orientation(&tiff), Some(1));

        let changed: Vec<usize> = (0..tiff.len()).filter(|&i| tiff[i] != original[i]).collect();
        assert_eq!(changed.len(), 1, "only the low byte of the value should change");
    }

    #[test]
    fn test_reset_orientation_without_tag() {
        let mut tiff = sample_tiff(false, 1);
        // turn the Orientation entry into an unrelated tag
        tiff[22] = 0x31;
        tiff[23] = 0x01;
        assert!(!reset_orientation(&mut tiff));
    }

    #[test]
    fn test_tiff_payload_heif_layout() {
        let tiff = sample_tiff(false, 3);
        let mut block = 6u32.to_be_bytes().to_vec();
        block.extend_from_slice(EXIF_MARKER);
        block.extend_from_slice(&tiff);

        assert_eq!(tiff_payload(&block), Some(tiff.as_slice()));
    }

    #[test]
    fn test_tiff_payload_zero_offset_with_marker() {
        let tiff = sample_tiff(true, 3);
        let mut block = 0u32.to_be_bytes().to_vec();
        block.extend_from_slice(EXIF_MARKER);
        block.extend_from_slice(&tiff);

        assert_eq!(tiff_payload(&block), Some(tiff.as_slice()));
    }

    #[test]
    fn test_tiff_payload_bare_and_jpeg_layouts() {
        let tiff = sample_tiff(false, 1);
        assert_eq!(tiff_payload(&tiff), Some(tiff.as_slice()));

        let mut app1 = EXIF_MARKER.to_vec();
        app1.extend_from_slice(&tiff);
        assert_eq!(tiff_payload(&app1), Some(tiff.as_slice()));
    }

    #[test]
    fn test_tiff_payload_garbage() {
        assert_eq!(tiff_payload(b""), None);
        assert_eq!(tiff_payload(b"\0\0\0\x02no tiff here"), None);
    }

    #[test]
    fn test_prepare_for_embedding() {
        let mut block = 6u32.to_be_bytes().to_vec();
        block.extend_from_slice(EXIF_MARKER);
        block.extend_from_slice(&sample_tiff(false, 6));

        let prepared = prepare_for_embedding(&block).unwrap();
        assert_eq!(&prepared[..2], b"II");
        assert_eq!(orientation(&prepared), Some(1));
    }

    proptest! {
        #[test]
        fn prop_reset_orientation_never_panics(mut data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = reset_orientation(&mut data);
            let _ = tiff_payload(&data);
        }
    }
}
