// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading (videos and frame images).
//!
//! This module probes uploaded videos for playability and basic timing
//! information, and decodes frame images into RGBA pixels suitable for
//! display in egui.

use crate::io::validation::UploadError;
use crate::models::video::{Container, VideoMetadata};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Inspects a video file to decide whether it can be played.
pub trait MediaProbe: Send + Sync {
    fn probe(&self, path: &Path, container: Container) -> Result<VideoMetadata, UploadError>;
}

/// Result of a probe bounded by a timeout.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Playable(VideoMetadata),
    TimedOut,
}

/// Run `probe` on a worker thread and wait at most `timeout` for it.
///
/// A probe that overruns keeps running in the background; its answer is
/// discarded.
pub fn probe_with_timeout(
    probe: Arc<dyn MediaProbe>,
    path: &Path,
    container: Container,
    timeout: Duration,
) -> Result<ProbeOutcome, UploadError> {
    let (sender, receiver) = channel();
    let path: PathBuf = path.to_path_buf();

    std::thread::spawn(move || {
        let _ = sender.send(probe.probe(&path, container));
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result.map(ProbeOutcome::Playable),
        Err(RecvTimeoutError::Timeout) => Ok(ProbeOutcome::TimedOut),
        Err(RecvTimeoutError::Disconnected) => {
            Err(UploadError::Unplayable("video check stopped unexpectedly".to_string()))
        }
    }
}

/// The probe used when nothing else is configured.
pub fn default_probe() -> Arc<dyn MediaProbe> {
    #[cfg(feature = "video-opencv")]
    {
        Arc::new(OpenCvProbe)
    }
    #[cfg(not(feature = "video-opencv"))]
    {
        Arc::new(HeaderProbe)
    }
}

/// Broad container families recognisable from the first bytes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerFamily {
    IsoMedia,
    Riff,
    Asf,
    Flv,
}

impl ContainerFamily {
    fn of(container: Container) -> Self {
        match container {
            Container::Mp4 | Container::Mov => ContainerFamily::IsoMedia,
            Container::Avi => ContainerFamily::Riff,
            Container::Wmv => ContainerFamily::Asf,
            Container::Flv => ContainerFamily::Flv,
        }
    }
}

const ASF_HEADER_GUID: [u8; 16] = [
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];

const ISO_TOP_LEVEL_BOXES: [&[u8; 4]; 7] = [b"ftyp", b"moov", b"mdat", b"wide", b"free", b"skip", b"pnot"];

/// Upper bound on how much of a `moov` box we are willing to read.
const MAX_MOOV_BYTES: u64 = 64 * 1024 * 1024;

fn sniff_family(head: &[u8]) -> Option<ContainerFamily> {
    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"AVI " {
        return Some(ContainerFamily::Riff);
    }
    if head.len() >= 16 && head[0..16] == ASF_HEADER_GUID {
        return Some(ContainerFamily::Asf);
    }
    if head.len() >= 3 && &head[0..3] == b"FLV" {
        return Some(ContainerFamily::Flv);
    }
    if head.len() >= 8 && ISO_TOP_LEVEL_BOXES.iter().any(|b| &head[4..8] == *b) {
        return Some(ContainerFamily::IsoMedia);
    }
    None
}

/// Dependency-free probe: recognises the container from its header and
/// reads duration (and for AVI, frame rate) where the header carries it.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderProbe;

impl MediaProbe for HeaderProbe {
    fn probe(&self, path: &Path, container: Container) -> Result<VideoMetadata, UploadError> {
        let mut file = File::open(path).map_err(|e| UploadError::Unreadable(e.to_string()))?;
        let mut head = vec![0u8; 4096];
        let read = read_up_to(&mut file, &mut head).map_err(|e| UploadError::Unreadable(e.to_string()))?;
        head.truncate(read);

        let family = sniff_family(&head)
            .ok_or_else(|| UploadError::Unplayable("unrecognised video container".to_string()))?;
        if family != ContainerFamily::of(container) {
            // Extension and content disagree; the backend decodes by content
            log::warn!(
                "{} has a {:?} extension but {:?} content",
                path.display(),
                container,
                family
            );
        }

        let metadata = match family {
            ContainerFamily::IsoMedia => VideoMetadata {
                duration_secs: iso_duration(&mut file).map_err(|e| UploadError::Unplayable(e.to_string()))?,
                ..Default::default()
            },
            ContainerFamily::Riff => avi_metadata(&head),
            ContainerFamily::Asf | ContainerFamily::Flv => VideoMetadata::default(),
        };
        Ok(metadata)
    }
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Walk the top-level boxes of an ISO media file, find `moov/mvhd` and
/// return the movie duration in seconds.
fn iso_duration<R: Read + Seek>(reader: &mut R) -> Result<Option<f64>> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    let mut offset = 0u64;

    while offset + 8 <= file_len {
        reader.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let kind = [header[4], header[5], header[6], header[7]];

        let (box_size, header_len) = match size32 {
            0 => (file_len - offset, 8),
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                (u64::from_be_bytes(large), 16)
            }
            n => (n, 8),
        };
        if box_size < header_len {
            anyhow::bail!("corrupt box header at offset {}", offset);
        }

        if &kind == b"moov" {
            let body_len = (box_size - header_len).min(MAX_MOOV_BYTES);
            let mut body = vec![0u8; body_len as usize];
            let read = read_up_to(reader, &mut body)?;
            body.truncate(read);
            return Ok(find_mvhd_duration(&body));
        }
        offset += box_size;
    }
    Ok(None)
}

fn find_mvhd_duration(moov: &[u8]) -> Option<f64> {
    let mut pos = 0usize;
    while pos + 8 <= moov.len() {
        let size = u32::from_be_bytes(moov[pos..pos + 4].try_into().ok()?) as usize;
        if size < 8 {
            return None;
        }
        if &moov[pos + 4..pos + 8] == b"mvhd" {
            let body = moov.get(pos + 8..pos + size)?;
            return mvhd_duration(body);
        }
        pos += size;
    }
    None
}

fn mvhd_duration(body: &[u8]) -> Option<f64> {
    let version = *body.first()?;
    let (timescale, duration) = if version == 1 {
        let timescale = u32::from_be_bytes(body.get(20..24)?.try_into().ok()?);
        let duration = u64::from_be_bytes(body.get(24..32)?.try_into().ok()?);
        (timescale, duration)
    } else {
        let timescale = u32::from_be_bytes(body.get(12..16)?.try_into().ok()?);
        let duration = u32::from_be_bytes(body.get(16..20)?.try_into().ok()?) as u64;
        (timescale, duration)
    };
    if timescale == 0 {
        return None;
    }
    Some(duration as f64 / timescale as f64)
}

/// Read frame rate and duration from the AVI main header (`avih`).
fn avi_metadata(head: &[u8]) -> VideoMetadata {
    let Some(pos) = head.windows(4).position(|w| w == b"avih") else {
        return VideoMetadata::default();
    };
    let field = |index: usize| -> Option<u32> {
        let start = pos + 8 + index * 4;
        head.get(start..start + 4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
    };
    let (Some(micros_per_frame), Some(total_frames)) = (field(0), field(4)) else {
        return VideoMetadata::default();
    };
    let mut metadata = VideoMetadata {
        width: field(8),
        height: field(9),
        ..Default::default()
    };
    if micros_per_frame > 0 {
        metadata.fps = Some(1_000_000.0 / micros_per_frame as f64);
        metadata.duration_secs = Some(total_frames as f64 * micros_per_frame as f64 / 1_000_000.0);
    }
    metadata
}

/// Probe backed by OpenCV's decoder: the file must open and yield a frame.
#[cfg(feature = "video-opencv")]
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvProbe;

#[cfg(feature = "video-opencv")]
impl MediaProbe for OpenCvProbe {
    fn probe(&self, path: &Path, _container: Container) -> Result<VideoMetadata, UploadError> {
        use opencv::{core::Mat, prelude::*, videoio};

        let unplayable = |e: opencv::Error| UploadError::Unplayable(e.to_string());
        let path_str = path.to_string_lossy();
        let mut cap = videoio::VideoCapture::from_file(&path_str, videoio::CAP_ANY).map_err(unplayable)?;
        if !cap.is_opened().map_err(unplayable)? {
            return Err(UploadError::Unplayable("decoder could not open the file".to_string()));
        }
        let mut frame = Mat::default();
        if !cap.read(&mut frame).map_err(unplayable)? || frame.empty() {
            return Err(UploadError::Unplayable("no decodable frames".to_string()));
        }

        let fps = cap.get(videoio::CAP_PROP_FPS).map_err(unplayable)?;
        let frames = cap.get(videoio::CAP_PROP_FRAME_COUNT).map_err(unplayable)?;
        let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH).map_err(unplayable)?;
        let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT).map_err(unplayable)?;

        Ok(VideoMetadata {
            duration_secs: (fps > 0.0).then(|| frames / fps),
            fps: (fps > 0.0).then_some(fps),
            width: (width > 0.0).then(|| width as u32),
            height: (height > 0.0).then(|| height as u32),
        })
    }
}

/// Decoded image data ready for texture upload.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode an encoded image (JPEG, PNG, ...) into RGBA8 pixels.
pub fn decode_image(bytes: &[u8]) -> Result<LoadedImage> {
    let img = image::load_from_memory(bytes).context("failed to decode frame image")?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(LoadedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Decode the frame at `seconds` for the frame selector preview.
#[cfg(feature = "video-opencv")]
pub fn grab_frame(path: &Path, seconds: f64) -> Result<LoadedImage> {
    use opencv::{core::Mat, imgproc, prelude::*, videoio};

    let path_str = path.to_string_lossy();
    let mut cap = videoio::VideoCapture::from_file(&path_str, videoio::CAP_ANY)?;
    if !cap.is_opened()? {
        anyhow::bail!("could not open {}", path.display());
    }
    cap.set(videoio::CAP_PROP_POS_MSEC, seconds * 1000.0)?;

    let mut bgr = Mat::default();
    if !cap.read(&mut bgr)? || bgr.empty() {
        anyhow::bail!("no frame at {:.1}s", seconds);
    }
    let mut rgba = Mat::default();
    imgproc::cvt_color(&bgr, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)?;

    Ok(LoadedImage {
        width: rgba.cols() as u32,
        height: rgba.rows() as u32,
        pixels: rgba.data_bytes()?.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn iso_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(body);
        out
    }

    fn mvhd_v0(timescale: u32, duration: u32) -> Vec<u8> {
        let mut body = vec![0u8; 4]; // version + flags
        body.extend_from_slice(&0u32.to_be_bytes()); // creation
        body.extend_from_slice(&0u32.to_be_bytes()); // modification
        body.extend_from_slice(&timescale.to_be_bytes());
        body.extend_from_slice(&duration.to_be_bytes());
        body.extend_from_slice(&[0u8; 80]);
        iso_box(b"mvhd", &body)
    }

    fn mp4_bytes(timescale: u32, duration: u32, moov_first: bool) -> Vec<u8> {
        let ftyp = iso_box(b"ftyp", b"isom\0\0\x02\0isommp41");
        let moov = iso_box(b"moov", &mvhd_v0(timescale, duration));
        let mdat = iso_box(b"mdat", &[0u8; 256]);
        let mut out = ftyp;
        if moov_first {
            out.extend(moov);
            out.extend(mdat);
        } else {
            out.extend(mdat);
            out.extend(moov);
        }
        out
    }

    #[test]
    fn test_sniff_family() {
        assert_eq!(sniff_family(&mp4_bytes(1000, 1, true)), Some(ContainerFamily::IsoMedia));
        assert_eq!(sniff_family(b"RIFF\0\0\0\0AVI LIST"), Some(ContainerFamily::Riff));
        assert_eq!(sniff_family(b"FLV\x01\x05"), Some(ContainerFamily::Flv));
        assert_eq!(sniff_family(&ASF_HEADER_GUID), Some(ContainerFamily::Asf));
        assert_eq!(sniff_family(b"plain text, not a video"), None);
        assert_eq!(sniff_family(b""), None);
    }

    #[test]
    fn test_iso_duration_moov_anywhere() {
        let mut front = Cursor::new(mp4_bytes(1000, 90_000, true));
        assert_eq!(iso_duration(&mut front).unwrap(), Some(90.0));

        let mut back = Cursor::new(mp4_bytes(600, 7_500, false));
        assert_eq!(iso_duration(&mut back).unwrap(), Some(12.5));
    }

    #[test]
    fn test_iso_duration_without_moov() {
        let mut bytes = iso_box(b"ftyp", b"isom");
        bytes.extend(iso_box(b"mdat", &[1, 2, 3]));
        assert_eq!(iso_duration(&mut Cursor::new(bytes)).unwrap(), None);
    }

    #[test]
    fn test_iso_duration_corrupt_header() {
        let mut bytes = iso_box(b"ftyp", b"isom");
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(b"junk");
        assert!(iso_duration(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_avi_metadata() {
        let mut head = b"RIFF\0\0\0\0AVI LIST\0\0\0\0hdrlavih".to_vec();
        head.extend_from_slice(&56u32.to_le_bytes());
        let fields: [u32; 10] = [40_000, 0, 0, 0, 250, 0, 1, 0, 1280, 720];
        for f in fields {
            head.extend_from_slice(&f.to_le_bytes());
        }
        let metadata = avi_metadata(&head);
        assert_eq!(metadata.fps, Some(25.0));
        assert_eq!(metadata.duration_secs, Some(10.0));
        assert_eq!(metadata.width, Some(1280));
        assert_eq!(metadata.height, Some(720));
    }

    #[test]
    fn test_header_probe_on_files() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("match.mp4");
        std::fs::write(&good, mp4_bytes(1000, 45_000, false)).unwrap();
        let metadata = HeaderProbe.probe(&good, Container::Mp4).unwrap();
        assert_eq!(metadata.duration_secs, Some(45.0));

        let bad = dir.path().join("fake.mp4");
        std::fs::write(&bad, b"this is not a video at all").unwrap();
        assert!(matches!(
            HeaderProbe.probe(&bad, Container::Mp4),
            Err(UploadError::Unplayable(_))
        ));
    }

    #[test]
    fn test_mismatched_content_is_advisory() {
        let dir = tempfile::tempdir().unwrap();
        let renamed = dir.path().join("match.avi");
        std::fs::write(&renamed, mp4_bytes(1000, 30_000, true)).unwrap();

        // Warned about, but still playable: the backend decodes by content
        let metadata = HeaderProbe.probe(&renamed, Container::Avi).unwrap();
        assert_eq!(metadata.duration_secs, Some(30.0));
    }

    #[test]
    fn test_decode_image() {
        let img = image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let loaded = decode_image(&png).unwrap();
        assert_eq!((loaded.width, loaded.height), (4, 3));
        assert_eq!(loaded.pixels.len(), 4 * 3 * 4);
        assert_eq!(&loaded.pixels[0..4], &[10, 20, 30, 255]);

        assert!(decode_image(b"not an image").is_err());
    }
}
