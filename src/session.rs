//! Per-session viewer state and the render step that is re-run on every
//! interaction.
//!
//! The driver owns a [`SessionState`] and calls [`render`] with the current
//! control values whenever anything changes. Everything the view shows is
//! recomputed from those inputs plus the session record; the only artifacts
//! that survive between renders are the de-identified tag maps (and the
//! shared volume handle) stored in [`Phase::Deidentified`].

use std::path::{Path, PathBuf};

use crate::deidentify::{deidentify_series, DeidentifiedSeries, SensitiveTagSet};
use crate::series::{DecodedSeries, Frame};
use crate::tags::{TagMap, PATIENT_NAME};
use crate::windowing::{
    apply_window, aspect_ratio, default_window_level, format_capture_moment, WindowChoice,
    WindowSpec, Windowed,
};

pub const DEIDENTIFIED_NOTICE: &str =
    "Series is de-identified. Sensitive metadata has been removed.";
pub const NOT_A_SERIES: &str = "This does not look like a DICOM folder!";

#[derive(Debug, Clone, Default)]
pub enum Phase {
    #[default]
    Fresh,
    Deidentified(DeidentifiedSeries),
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    selected_folder: Option<PathBuf>,
    phase: Phase,
    pending_notice: bool,
    mobile: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_folder(&self) -> Option<&Path> {
        self.selected_folder.as_deref()
    }

    #[cfg(test)]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_deidentified(&self) -> bool {
        matches!(self.phase, Phase::Deidentified(_))
    }

    pub fn deidentified(&self) -> Option<&DeidentifiedSeries> {
        match &self.phase {
            Phase::Fresh => None,
            Phase::Deidentified(series) => Some(series),
        }
    }

    #[cfg(test)]
    pub fn has_pending_notice(&self) -> bool {
        self.pending_notice
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    pub fn set_mobile(&mut self, mobile: bool) {
        self.mobile = mobile;
    }

    /// Records the folder selection. A different folder drops anything
    /// derived from the previous one and returns `true`.
    pub fn select_folder(&mut self, folder: &Path) -> bool {
        if self.selected_folder.as_deref() == Some(folder) {
            return false;
        }
        log::info!("Folder selected: {}", folder.display());
        self.selected_folder = Some(folder.to_path_buf());
        self.phase = Phase::Fresh;
        self.pending_notice = false;
        true
    }

    /// Fresh → Deidentified. Returns `false` (and does nothing) when the
    /// current folder is already de-identified.
    pub fn deidentify(&mut self, series: &DecodedSeries, sensitive: &SensitiveTagSet) -> bool {
        if self.is_deidentified() {
            return false;
        }
        self.phase = Phase::Deidentified(deidentify_series(series, sensitive));
        self.pending_notice = true;
        true
    }

    /// Consumes the one-shot "just de-identified" notice.
    pub fn take_notice(&mut self) -> Option<&'static str> {
        std::mem::take(&mut self.pending_notice).then_some(DEIDENTIFIED_NOTICE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Image,
    Metadata,
}

/// Control values for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewInputs {
    pub folder: PathBuf,
    /// 1-based slice number; clamped to the series.
    pub slice: usize,
    pub window: WindowChoice,
    pub display: DisplayMode,
    pub deidentify_requested: bool,
    pub mobile: bool,
}

/// Which copy of the series the displayed slice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Raw,
    Deidentified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationAnchor {
    /// Stacked above the image; line 0 is the top one.
    Header(u8),
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub text: String,
    pub anchor: AnnotationAnchor,
    pub font_size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub pan_zoom: bool,
    pub drawing_tools: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pan_zoom: true,
            drawing_tools: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageView {
    pub image: Windowed,
    pub window_label: String,
    pub annotations: Vec<Annotation>,
    pub aspect_ratio: f64,
    /// Horizontal stretch of one pixel when painting. Only pixel spacing
    /// says anything about pixel shape, so the geometry fallback paints
    /// square pixels.
    pub pixel_aspect: f64,
    pub options: RenderOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SliceContent {
    Image(ImageView),
    Metadata(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSlice {
    /// 0-based index actually shown.
    pub slice_index: usize,
    pub slice_count: usize,
    pub source: DataSource,
    pub default_window: WindowSpec,
    pub offer_deidentify: bool,
    pub notice: Option<&'static str>,
    pub content: SliceContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedView {
    Error(String),
    Slice(RenderedSlice),
}

/// One pass of the viewer: reconcile the session with `inputs`, apply a
/// pending de-identify request, and build what should be on screen.
///
/// `series` is the raw series for `inputs.folder`, or the reason it could
/// not be read.
pub fn render(
    state: &mut SessionState,
    inputs: &ViewInputs,
    series: Result<&DecodedSeries, &anyhow::Error>,
) -> RenderedView {
    state.select_folder(&inputs.folder);
    state.set_mobile(inputs.mobile);

    let series = match series {
        Ok(series) => series,
        Err(err) => {
            log::warn!("Could not load {}: {err:#}", inputs.folder.display());
            return RenderedView::Error(format!("{NOT_A_SERIES} ({err:#})"));
        }
    };

    if inputs.deidentify_requested && !state.deidentify(series, SensitiveTagSet::standard()) {
        log::debug!("De-identify ignored: series already de-identified");
    }

    let slice_count = series.slice_count();
    let slice_index = inputs.slice.clamp(1, slice_count.max(1)) - 1;
    let raw_tags = &series.tag_maps[slice_index];
    let default_window = *default_window_level(raw_tags).value();
    let pass_through = inputs.window.is_pass_through(default_window);

    let (source, frame, tags) = resolve_slice(state, series, slice_index, pass_through);
    log::debug!(
        "Render slice {}/{} from {:?} (pass-through: {})",
        slice_index + 1,
        slice_count,
        source,
        pass_through
    );

    let content = match inputs.display {
        DisplayMode::Image => SliceContent::Image(build_image_view(
            frame,
            tags,
            &inputs.window,
            default_window,
            slice_index,
            slice_count,
            state.is_mobile(),
        )),
        DisplayMode::Metadata => SliceContent::Metadata(tags.rows()),
    };

    RenderedView::Slice(RenderedSlice {
        slice_index,
        slice_count,
        source,
        default_window,
        offer_deidentify: !state.is_deidentified(),
        notice: state.take_notice(),
        content,
    })
}

/// Picks the pixel and metadata source for the shown slice. Pass-through
/// reads the raw copy even after de-identification; every windowed mode
/// reads the scrubbed one.
fn resolve_slice<'a>(
    state: &'a SessionState,
    series: &'a DecodedSeries,
    slice_index: usize,
    pass_through: bool,
) -> (DataSource, &'a Frame, &'a TagMap) {
    let raw_frame = series
        .volume
        .frame(slice_index)
        .expect("slice index is clamped to the series");

    match state.deidentified() {
        Some(deidentified) if !pass_through => {
            assert_eq!(
                deidentified.slice_count(),
                series.slice_count(),
                "de-identified series does not match the loaded folder"
            );
            let frame = deidentified
                .volume
                .frame(slice_index)
                .expect("de-identified volume matches the raw series");
            (
                DataSource::Deidentified,
                frame,
                &deidentified.tag_maps[slice_index],
            )
        }
        _ => (DataSource::Raw, raw_frame, &series.tag_maps[slice_index]),
    }
}

fn build_image_view(
    frame: &Frame,
    tags: &TagMap,
    window: &WindowChoice,
    default_window: WindowSpec,
    slice_index: usize,
    slice_count: usize,
    mobile: bool,
) -> ImageView {
    let font_size = if mobile { 12.0 } else { 14.0 };
    let annotation = |text: String, anchor| Annotation {
        text,
        anchor,
        font_size,
    };

    let aspect = aspect_ratio(tags);
    if let Some(reason) = aspect.reason() {
        log::debug!("Aspect ratio fallback: {reason}");
    }
    let pixel_aspect = if aspect.is_fallback() {
        1.0
    } else {
        *aspect.value()
    };
    let window_label = window.label(default_window);

    ImageView {
        image: apply_window(frame, window, default_window),
        annotations: vec![
            annotation(
                tags.trimmed(PATIENT_NAME).unwrap_or_default().to_string(),
                AnnotationAnchor::Header(0),
            ),
            annotation(format_capture_moment(tags), AnnotationAnchor::Header(1)),
            annotation(
                format!("Slice {}/{}", slice_index + 1, slice_count),
                AnnotationAnchor::BottomLeft,
            ),
            annotation(window_label.clone(), AnnotationAnchor::BottomRight),
        ],
        aspect_ratio: aspect.into_value(),
        pixel_aspect,
        window_label,
        options: RenderOptions::default(),
    }
}
