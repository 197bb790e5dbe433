//! Format-specific utilities and helpers

pub mod webp {
    //! RIFF/WebP container handling.
    //!
    //! libwebp's simple encoder emits `RIFF....WEBP` + one `VP8 `/`VP8L`
    //! chunk with no room for metadata. Embedding an ICC profile or EXIF
    //! requires the extended layout:
    //!
    //! `VP8X` (flags + canvas size) → `ICCP` → image chunks → `EXIF`

    use thiserror::Error;

    const RIFF: &[u8; 4] = b"RIFF";
    const WEBP: &[u8; 4] = b"WEBP";
    const VP8X: &[u8; 4] = b"VP8X";
    const ICCP: &[u8; 4] = b"ICCP";
    const EXIF: &[u8; 4] = b"EXIF";
    const XMP: &[u8; 4] = b"XMP ";
    const ALPH: &[u8; 4] = b"ALPH";

    const FLAG_ICC: u8 = 0x20;
    const FLAG_ALPHA: u8 = 0x10;
    const FLAG_EXIF: u8 = 0x08;

    const MAX_CANVAS: u32 = 1 << 24;

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum MuxError {
        #[error("not a RIFF/WEBP stream")]
        NotWebp,

        #[error("chunk '{0}' runs past the end of the stream")]
        Truncated(String),

        #[error("stream has no VP8/VP8L bitstream chunk")]
        MissingBitstream,

        #[error("canvas {0}x{1} outside the WebP range")]
        CanvasOutOfRange(u32, u32),

        #[error("container would exceed 4 GiB")]
        TooLarge,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Chunk<'a> {
        pub fourcc: [u8; 4],
        pub payload: &'a [u8],
    }

    /// Split a WebP file into its top-level chunks.
    pub fn chunks(data: &[u8]) -> Result<Vec<Chunk<'_>>, MuxError> {
        if data.len() < 12 || &data[0..4] != RIFF || &data[8..12] != WEBP {
            return Err(MuxError::NotWebp);
        }
        let riff_len = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let end = riff_len.saturating_add(8).min(data.len());

        let mut out = Vec::new();
        let mut pos = 12;
        while pos + 8 <= end {
            let fourcc: [u8; 4] = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
            let len = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                as usize;
            let start = pos + 8;
            let payload = data
                .get(start..start.saturating_add(len))
                .filter(|_| start + len <= end)
                .ok_or_else(|| MuxError::Truncated(String::from_utf8_lossy(&fourcc).into_owned()))?;
            out.push(Chunk { fourcc, payload });
            pos = start + len + (len & 1);
        }
        Ok(out)
    }

    fn push_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) -> Result<(), MuxError> {
        let len = u32::try_from(payload.len()).map_err(|_| MuxError::TooLarge)?;
        out.extend_from_slice(fourcc);
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
        Ok(())
    }

    fn push_u24(out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&value.to_le_bytes()[..3]);
    }

    /// Rewrap a simple WebP stream into the extended layout carrying the
    /// given ICC profile and EXIF (bare TIFF) payloads.
    ///
    /// Existing metadata chunks in `encoded` are dropped. With neither
    /// payload the input is returned unchanged.
    pub fn embed_metadata(
        encoded: &[u8],
        width: u32,
        height: u32,
        icc_profile: Option<&[u8]>,
        exif: Option<&[u8]>,
    ) -> Result<Vec<u8>, MuxError> {
        let parsed = chunks(encoded)?;
        if icc_profile.is_none() && exif.is_none() {
            return Ok(encoded.to_vec());
        }
        if width == 0 || height == 0 || width > MAX_CANVAS || height > MAX_CANVAS {
            return Err(MuxError::CanvasOutOfRange(width, height));
        }

        let image_chunks: Vec<&Chunk<'_>> = parsed
            .iter()
            .filter(|c| ![VP8X, ICCP, EXIF, XMP].contains(&&c.fourcc))
            .collect();
        if !image_chunks
            .iter()
            .any(|c| &c.fourcc == b"VP8 " || &c.fourcc == b"VP8L")
        {
            return Err(MuxError::MissingBitstream);
        }

        let mut flags = 0u8;
        if icc_profile.is_some() {
            flags |= FLAG_ICC;
        }
        if exif.is_some() {
            flags |= FLAG_EXIF;
        }
        if image_chunks.iter().any(|c| &c.fourcc == ALPH) {
            flags |= FLAG_ALPHA;
        }

        let mut vp8x = Vec::with_capacity(10);
        vp8x.push(flags);
        vp8x.extend_from_slice(&[0, 0, 0]);
        push_u24(&mut vp8x, width - 1);
        push_u24(&mut vp8x, height - 1);

        let mut body = Vec::with_capacity(encoded.len() + 64);
        body.extend_from_slice(WEBP);
        push_chunk(&mut body, VP8X, &vp8x)?;
        if let Some(icc) = icc_profile {
            push_chunk(&mut body, ICCP, icc)?;
        }
        for chunk in image_chunks {
            push_chunk(&mut body, &chunk.fourcc, chunk.payload)?;
        }
        if let Some(exif) = exif {
            push_chunk(&mut body, EXIF, exif)?;
        }

        let riff_len = u32::try_from(body.len()).map_err(|_| MuxError::TooLarge)?;
        let mut out = Vec::with_capacity(body.len() + 8);
        out.extend_from_slice(RIFF);
        out.extend_from_slice(&riff_len.to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

}
