//! YUV4MPEG2 stream parsing and writing.
//!
//! Supports 8-bit 4:2:0, 4:4:4 and mono streams. Pixels are converted to and
//! from RGBA with BT.601 full-range coefficients.

use crate::domain::errors::DomainError;
use crate::domain::model::{yuv_to_rgb, Frame, VideoBlob, VideoMetadata, Yuv420Frame};

pub const Y4M_MIME: &str = "video/x-yuv4mpeg";

/// Largest accepted width or height
pub const MAX_DIMENSION: u32 = 16_384;

const STREAM_MAGIC: &[u8] = b"YUV4MPEG2";
const FRAME_MAGIC: &[u8] = b"FRAME";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chroma {
    C420,
    C444,
    Mono,
}

impl Chroma {
    fn parse(tag: &str) -> Result<Self, DomainError> {
        match tag {
            t if t.starts_with("420") => Ok(Chroma::C420),
            "444" => Ok(Chroma::C444),
            "mono" => Ok(Chroma::Mono),
            other => Err(DomainError::Decode(format!(
                "Unsupported Y4M colorspace: C{}",
                other
            ))),
        }
    }

    fn plane_size(&self, width: usize, height: usize) -> Option<usize> {
        match self {
            Chroma::C420 => width.div_ceil(2).checked_mul(height.div_ceil(2)),
            Chroma::C444 => width.checked_mul(height),
            Chroma::Mono => Some(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Y4mHeader {
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub chroma: Chroma,
}

impl Y4mHeader {
    pub fn frame_rate(&self) -> f64 {
        self.fps_num as f64 / self.fps_den as f64
    }

    /// Bytes of one frame's planes; `None` when the size does not fit `usize`
    fn frame_size(&self) -> Option<usize> {
        let (w, h) = (self.width as usize, self.height as usize);
        let chroma = self.chroma.plane_size(w, h)?.checked_mul(2)?;
        w.checked_mul(h)?.checked_add(chroma)
    }

    fn parse(line: &str) -> Result<Self, DomainError> {
        let mut width = None;
        let mut height = None;
        let mut fps = (25, 1);
        let mut chroma = Chroma::C420;

        for token in line.split_ascii_whitespace().skip(1) {
            let mut chars = token.chars();
            let tag = chars.next().unwrap_or_default();
            let value = chars.as_str();
            match tag {
                'W' => width = Some(parse_u32(value, "width")?),
                'H' => height = Some(parse_u32(value, "height")?),
                'F' => {
                    let (num, den) = value.split_once(':').ok_or_else(|| {
                        DomainError::Decode(format!("Bad Y4M frame rate: {}", value))
                    })?;
                    fps = (parse_u32(num, "frame rate")?, parse_u32(den, "frame rate")?);
                }
                'C' => chroma = Chroma::parse(value)?,
                // interlacing, aspect and extensions do not affect decoding
                _ => {}
            }
        }

        let width =
            width.ok_or_else(|| DomainError::Decode("Y4M header has no width".to_string()))?;
        let height =
            height.ok_or_else(|| DomainError::Decode("Y4M header has no height".to_string()))?;
        if width == 0
            || height == 0
            || width > MAX_DIMENSION
            || height > MAX_DIMENSION
            || fps.0 == 0
            || fps.1 == 0
        {
            return Err(DomainError::Decode(format!(
                "Y4M header out of range: {}x{} @ {}:{}",
                width, height, fps.0, fps.1
            )));
        }

        Ok(Self {
            width,
            height,
            fps_num: fps.0,
            fps_den: fps.1,
            chroma,
        })
    }
}

fn parse_u32(value: &str, what: &str) -> Result<u32, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::Decode(format!("Bad Y4M {}: {}", what, value)))
}

/// A parsed stream; frame data stays in the shared source bytes
#[derive(Debug, Clone)]
pub struct Y4mVideo {
    pub header: Y4mHeader,
    source: VideoBlob,
    frame_size: usize,
    frame_offsets: Vec<usize>,
}

impl Y4mVideo {
    pub fn parse(source: &VideoBlob) -> Result<Self, DomainError> {
        let bytes = source.bytes();
        if !bytes.starts_with(STREAM_MAGIC) {
            return Err(DomainError::Decode("Not a YUV4MPEG2 stream".to_string()));
        }
        let header_end = find_newline(bytes, 0)
            .ok_or_else(|| DomainError::Decode("Unterminated Y4M header".to_string()))?;
        let header_line = std::str::from_utf8(&bytes[..header_end])
            .map_err(|_| DomainError::Decode("Y4M header is not ASCII".to_string()))?;
        let header = Y4mHeader::parse(header_line)?;

        let frame_size = header.frame_size().ok_or_else(|| {
            DomainError::Decode(format!(
                "Y4M frame size overflows: {}x{}",
                header.width, header.height
            ))
        })?;
        let mut frame_offsets = Vec::new();
        let mut pos = header_end + 1;
        while pos < bytes.len() {
            if !bytes[pos..].starts_with(FRAME_MAGIC) {
                return Err(DomainError::Decode(format!(
                    "Expected FRAME marker at byte {}",
                    pos
                )));
            }
            let line_end = find_newline(bytes, pos)
                .ok_or_else(|| DomainError::Decode("Unterminated FRAME marker".to_string()))?;
            let data_start = line_end + 1;
            let data_end = match data_start.checked_add(frame_size) {
                Some(end) if end <= bytes.len() => end,
                // a truncated trailing frame is dropped, as players do
                _ => break,
            };
            frame_offsets.push(data_start);
            pos = data_end;
        }

        Ok(Self {
            header,
            source: source.clone(),
            frame_size,
            frame_offsets,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_offsets.len()
    }

    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.header.frame_rate()
    }

    pub fn metadata(&self) -> VideoMetadata {
        VideoMetadata {
            duration: self.duration(),
            width: self.header.width,
            height: self.header.height,
        }
    }

    /// Index of the frame displayed at `seconds`
    pub fn frame_index_at(&self, seconds: f64) -> usize {
        let last = self.frame_count().saturating_sub(1);
        let index = (seconds.max(0.0) * self.header.frame_rate() + 1e-9).floor() as usize;
        index.min(last)
    }

    /// Decode frame `index` to RGBA
    pub fn frame(&self, index: usize) -> Result<Frame, DomainError> {
        let offset = *self.frame_offsets.get(index).ok_or_else(|| {
            DomainError::Decode(format!(
                "Frame {} out of range ({} frames)",
                index,
                self.frame_count()
            ))
        })?;

        let (w, h) = (self.header.width as usize, self.header.height as usize);
        let data = &self.source.bytes()[offset..offset + self.frame_size];
        let luma = &data[..w * h];
        let chroma_size = self.header.chroma.plane_size(w, h).unwrap_or(0);
        let cb = &data[w * h..w * h + chroma_size];
        let cr = &data[w * h + chroma_size..];

        let mut pixels = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                let luma_value = luma[y * w + x];
                let (u, v) = match self.header.chroma {
                    Chroma::C420 => {
                        let index = (y / 2) * w.div_ceil(2) + x / 2;
                        (cb[index], cr[index])
                    }
                    Chroma::C444 => (cb[y * w + x], cr[y * w + x]),
                    Chroma::Mono => (128, 128),
                };
                let [r, g, b] = yuv_to_rgb(luma_value, u, v);
                pixels.extend_from_slice(&[r, g, b, 255]);
            }
        }
        Frame::new(self.header.width, self.header.height, pixels)
    }
}

fn find_newline(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..].iter().position(|b| *b == b'\n').map(|i| from + i)
}

/// Writes 4:2:0 streams frame by frame
#[derive(Debug, Clone)]
pub struct Y4mWriter {
    width: u32,
    height: u32,
    frame_rate: u32,
}

impl Y4mWriter {
    pub fn new(width: u32, height: u32, frame_rate: u32) -> Self {
        Self {
            width,
            height,
            frame_rate: frame_rate.max(1),
        }
    }

    pub fn header(&self) -> Vec<u8> {
        format!(
            "YUV4MPEG2 W{} H{} F{}:1 Ip A1:1 C420jpeg\n",
            self.width, self.height, self.frame_rate
        )
        .into_bytes()
    }

    /// One `FRAME` record; chroma is averaged over each 2x2 block
    pub fn frame(&self, frame: &Frame) -> Result<Vec<u8>, DomainError> {
        if frame.width != self.width || frame.height != self.height {
            return Err(DomainError::EncodingSession(format!(
                "Frame is {}x{}, stream is {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }

        let planes = Yuv420Frame::from_rgba(frame).into_planes();
        let mut out = Vec::with_capacity(FRAME_MAGIC.len() + 1 + planes.len());
        out.extend_from_slice(FRAME_MAGIC);
        out.push(b'\n');
        out.extend(planes);
        Ok(out)
    }

    /// Whole stream from a frame sequence
    pub fn encode_all<'a>(
        &self,
        frames: impl IntoIterator<Item = &'a Frame>,
    ) -> Result<Vec<u8>, DomainError> {
        let mut out = self.header();
        for frame in frames {
            out.extend(self.frame(frame)?);
        }
        Ok(out)
    }
}
