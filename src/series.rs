use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use dicom_core::header::Header;
use dicom_core::VR;
use dicom_object::{open_file, DefaultDicomObject, Tag};
use dicom_pixeldata::PixelDecoder;

use crate::tags::{tag_code, TagMap};

const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

/// One decoded slice: a row-major grid of signed intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Arc<[i32]>,
}

impl Frame {
    pub fn new(width: usize, height: usize, pixels: Vec<i32>) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .context("Overflow while calculating frame size")?;
        if pixels.len() != expected {
            bail!(
                "Pixel count mismatch: got {}, expected {} ({}x{})",
                pixels.len(),
                expected,
                width,
                height
            );
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::from(pixels.into_boxed_slice()),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[i32] {
        &self.pixels
    }

    pub fn min_max(&self) -> Option<(i32, i32)> {
        let mut iter = self.pixels.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Ordered stack of equally sized frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    frames: Vec<Frame>,
}

impl Volume {
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        let Some(first) = frames.first() else {
            bail!("A volume needs at least one frame");
        };
        let (width, height) = (first.width, first.height);
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, frame)| frame.width != width || frame.height != height)
        {
            bail!(
                "Frame {} is {}x{} but the series is {}x{}",
                index + 1,
                frame.width,
                frame.height,
                width,
                height
            );
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }
}

/// Raw result of reading a folder: pixel volume plus one tag map per frame.
#[derive(Debug, Clone)]
pub struct DecodedSeries {
    pub volume: Arc<Volume>,
    pub tag_maps: Vec<TagMap>,
}

impl DecodedSeries {
    pub fn new(volume: Volume, tag_maps: Vec<TagMap>) -> Result<Self> {
        if volume.len() != tag_maps.len() {
            bail!(
                "Series has {} frames but {} metadata sets",
                volume.len(),
                tag_maps.len()
            );
        }
        Ok(Self {
            volume: Arc::new(volume),
            tag_maps,
        })
    }

    pub fn slice_count(&self) -> usize {
        self.volume.len()
    }

    pub fn tag_keys(&self, frame_index: usize) -> Option<impl Iterator<Item = &str>> {
        self.tag_maps.get(frame_index).map(TagMap::keys)
    }

    pub fn tag_value(&self, frame_index: usize, code: &str) -> Option<&str> {
        self.tag_maps.get(frame_index)?.get(code)
    }
}

/// Something that can turn a folder into a decoded series.
pub trait SeriesSource {
    /// Slice files in the order they become frames.
    fn list_slice_paths(&self, folder: &Path) -> Result<Vec<PathBuf>>;

    fn decode(&self, paths: &[PathBuf]) -> Result<DecodedSeries>;
}

pub fn load_series(source: &dyn SeriesSource, folder: &Path) -> Result<DecodedSeries> {
    let paths = source.list_slice_paths(folder)?;
    if paths.is_empty() {
        bail!("No slice files found in {}", folder.display());
    }
    log::info!(
        "Decoding {} slice(s) from {}",
        paths.len(),
        folder.display()
    );
    source
        .decode(&paths)
        .with_context(|| format!("Could not decode series in {}", folder.display()))
}

/// Sub-folders of `root`, sorted by name, for the folder selector.
pub fn list_series_folders(root: &Path) -> Result<Vec<String>> {
    let mut names = fs::read_dir(root)
        .with_context(|| format!("Could not list {}", root.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| !name.starts_with('.'))
        .collect::<Vec<_>>();
    names.sort();
    Ok(names)
}

/// Reads a folder of single-frame DICOM files, one file per slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomFolderSource;

impl SeriesSource for DicomFolderSource {
    fn list_slice_paths(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = fs::read_dir(folder)
            .with_context(|| format!("Could not list {}", folder.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| is_candidate_slice(path))
            .collect::<Vec<_>>();
        paths.sort();
        Ok(paths)
    }

    fn decode(&self, paths: &[PathBuf]) -> Result<DecodedSeries> {
        let mut frames = Vec::with_capacity(paths.len());
        let mut tag_maps = Vec::with_capacity(paths.len());
        for path in paths {
            let obj =
                open_file(path).with_context(|| format!("Could not open {}", path.display()))?;
            frames.push(
                decode_first_frame(&obj)
                    .with_context(|| format!("Could not read pixels of {}", path.display()))?,
            );
            tag_maps.push(collect_tag_map(&obj));
        }
        DecodedSeries::new(Volume::new(frames)?, tag_maps)
    }
}

fn is_candidate_slice(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    !name.starts_with('.') && !name.eq_ignore_ascii_case("DICOMDIR")
}

fn decode_first_frame(obj: &DefaultDicomObject) -> Result<Frame> {
    let decoded = obj
        .decode_pixel_data_frame(0)
        .context("Failed to decode PixelData frame 0")?;
    if decoded.samples_per_pixel() != 1 {
        bail!(
            "Unsupported SamplesPerPixel={} (only monochrome series are supported)",
            decoded.samples_per_pixel()
        );
    }
    let pixels: Vec<i32> = decoded
        .to_vec_frame(0)
        .context("Could not convert decoded frame 0 to i32 samples")?;
    Frame::new(decoded.columns() as usize, decoded.rows() as usize, pixels)
}

fn collect_tag_map(obj: &DefaultDicomObject) -> TagMap {
    obj.iter()
        .filter(|element| element.tag() != PIXEL_DATA)
        .filter(|element| !is_binary_vr(element.vr()))
        .filter_map(|element| {
            let tag = element.tag();
            element
                .to_str()
                .ok()
                .map(|value| (tag_code(tag.group(), tag.element()), value.to_string()))
        })
        .collect()
}

fn is_binary_vr(vr: VR) -> bool {
    matches!(
        vr,
        VR::OB | VR::OD | VR::OF | VR::OL | VR::OV | VR::OW | VR::UN | VR::SQ
    )
}
