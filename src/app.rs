use std::path::{Path, PathBuf};

use eframe::egui::{self, Color32, Sense, TextureHandle, TextureOptions};

use crate::launch::LaunchRequest;
use crate::renderer::to_color_image;
use crate::series::{
    list_series_folders, load_series, DecodedSeries, DicomFolderSource, SeriesSource,
};
use crate::session::{
    render, AnnotationAnchor, DisplayMode, ImageView, RenderedSlice, RenderedView, SessionState,
    SliceContent, ViewInputs,
};
use crate::settings::{save_settings, Settings};
use crate::tags::SERIES_DESCRIPTION;
use crate::windowing::{
    default_window_level, Preset, WindowChoice, WindowSpec, CENTER_RANGE, FALLBACK_WINDOW,
    WIDTH_RANGE,
};

const APP_TITLE: &str = "DICOM Viewer";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const ANNOTATION_PADDING: f32 = 4.0;
const STROKE_COLOR: Color32 = Color32::from_rgb(255, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowMode {
    Preset(Preset),
    Custom,
}

impl WindowMode {
    fn label(self) -> &'static str {
        match self {
            WindowMode::Preset(preset) => preset.label(),
            WindowMode::Custom => "Custom",
        }
    }
}

/// Raw series of the selected folder, kept so egui repaints do not re-read
/// the folder. Replaced as soon as a different folder is selected.
struct LoadedFolder {
    folder: PathBuf,
    series: anyhow::Result<DecodedSeries>,
}

pub struct SliceViewerApp {
    root: PathBuf,
    folders: Vec<String>,
    selected_folder: Option<String>,
    source: Box<dyn SeriesSource>,
    loaded: Option<LoadedFolder>,
    session: SessionState,
    slice: usize,
    window_mode: WindowMode,
    custom_window: WindowSpec,
    display: DisplayMode,
    mobile: bool,
    last_inputs: Option<ViewInputs>,
    view: Option<RenderedView>,
    texture: Option<TextureHandle>,
    zoom: f32,
    pan: egui::Vec2,
    draw_mode: bool,
    strokes: Vec<Vec<egui::Pos2>>,
    settings: Settings,
    settings_path: Option<PathBuf>,
    status_line: String,
}

impl SliceViewerApp {
    pub fn new(
        request: LaunchRequest,
        settings: Settings,
        settings_path: Option<PathBuf>,
        initial_status: Option<String>,
    ) -> Self {
        let mut app = Self {
            root: request.root,
            folders: Vec::new(),
            selected_folder: None,
            source: Box::new(DicomFolderSource),
            loaded: None,
            session: SessionState::new(),
            slice: 1,
            window_mode: WindowMode::Preset(request.preset),
            custom_window: FALLBACK_WINDOW,
            display: DisplayMode::Image,
            mobile: request.mobile,
            last_inputs: None,
            view: None,
            texture: None,
            zoom: 1.0,
            pan: egui::Vec2::ZERO,
            draw_mode: false,
            strokes: Vec::new(),
            settings,
            settings_path,
            status_line: initial_status.unwrap_or_default(),
        };
        app.refresh_folders();
        if let Some(folder) = request.folder {
            if app.folders.contains(&folder) {
                app.selected_folder = Some(folder);
            } else {
                app.status_line = format!("Folder '{folder}' not found in {}", app.root.display());
            }
        }
        app
    }

    fn apply_black_background(ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = Color32::BLACK;
        visuals.window_fill = Color32::BLACK;
        visuals.extreme_bg_color = Color32::BLACK;
        visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, Color32::from_gray(28));
        ctx.set_visuals(visuals);
    }

    fn refresh_folders(&mut self) {
        match list_series_folders(&self.root) {
            Ok(folders) => {
                self.folders = folders;
                if self
                    .selected_folder
                    .as_ref()
                    .map_or(true, |name| !self.folders.contains(name))
                {
                    self.selected_folder = self.folders.first().cloned();
                }
            }
            Err(err) => {
                self.folders.clear();
                self.selected_folder = None;
                self.status_line = format!("{err:#}");
            }
        }
    }

    fn choose_root(&mut self) {
        let Some(root) = rfd::FileDialog::new().set_directory(&self.root).pick_folder() else {
            return;
        };
        self.root = root;
        self.selected_folder = None;
        self.status_line.clear();
        self.refresh_folders();
        self.settings.root = Some(self.root.clone());
        self.persist_settings();
    }

    fn persist_settings(&self) {
        let Some(path) = self.settings_path.as_ref() else {
            return;
        };
        if let Err(err) = save_settings(path, &self.settings) {
            log::warn!("Could not save settings: {err:#}");
        }
    }

    fn active_folder(&self) -> Option<PathBuf> {
        self.selected_folder.as_ref().map(|name| self.root.join(name))
    }

    fn ensure_loaded(&mut self, folder: &Path) {
        if self.loaded.as_ref().is_some_and(|loaded| loaded.folder == folder) {
            return;
        }

        let series = load_series(self.source.as_ref(), folder);
        if let Ok(series) = &series {
            log::info!(
                "Loaded {} slice(s), {} tag(s) per slice ({})",
                series.slice_count(),
                series.tag_keys(0).map_or(0, Iterator::count),
                series.tag_value(0, SERIES_DESCRIPTION).unwrap_or("no description")
            );
            // Start in the middle of the stack with the sliders on the
            // series' own window.
            self.slice = (series.slice_count() / 2).max(1);
            self.custom_window = *default_window_level(&series.tag_maps[self.slice - 1]).value();
        }
        self.loaded = Some(LoadedFolder {
            folder: folder.to_path_buf(),
            series,
        });
        self.zoom = 1.0;
        self.pan = egui::Vec2::ZERO;
        self.strokes.clear();
    }

    fn current_inputs(&self, folder: PathBuf, deidentify_requested: bool) -> ViewInputs {
        ViewInputs {
            folder,
            slice: self.slice,
            window: match self.window_mode {
                WindowMode::Preset(preset) => WindowChoice::Preset(preset),
                WindowMode::Custom => WindowChoice::Custom(self.custom_window),
            },
            display: self.display,
            deidentify_requested,
            mobile: self.mobile,
        }
    }

    fn rerender(&mut self, ctx: &egui::Context, inputs: &ViewInputs) {
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };
        let view = render(&mut self.session, inputs, loaded.series.as_ref());

        if let RenderedView::Slice(RenderedSlice {
            content: SliceContent::Image(image),
            ..
        }) = &view
        {
            let color_image = to_color_image(&image.image);
            if let Some(texture) = self.texture.as_mut() {
                texture.set(color_image, TextureOptions::LINEAR);
            } else {
                self.texture =
                    Some(ctx.load_texture("dicom-slice", color_image, TextureOptions::LINEAR));
            }
        }
        self.view = Some(view);
    }

    /// Puts the custom sliders back on the DICOM window of the shown slice.
    fn reset_custom_window(&mut self) {
        if let Some(default_window) = self.rendered_slice().map(|slice| slice.default_window) {
            self.custom_window = default_window;
        }
    }

    fn window_mode_changed(&mut self) {
        if let WindowMode::Preset(preset) = self.window_mode {
            self.settings.preset = Some(preset.label().to_string());
            self.persist_settings();
        }
    }

    fn rendered_slice(&self) -> Option<&RenderedSlice> {
        match self.view.as_ref()? {
            RenderedView::Slice(slice) => Some(slice),
            RenderedView::Error(_) => None,
        }
    }

    /// Side panel controls. Returns whether de-identification was requested.
    fn show_controls(&mut self, ui: &mut egui::Ui) -> bool {
        let mut deidentify_clicked = false;

        ui.heading(APP_TITLE);
        ui.label(egui::RichText::new(format!("v{APP_VERSION}")).small().weak());
        ui.separator();

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(self.root.display().to_string()).small());
            if ui.small_button("Browse…").clicked() {
                self.choose_root();
            }
        });

        let folders = &self.folders;
        let selected = &mut self.selected_folder;
        egui::ComboBox::from_label("Select a folder")
            .selected_text(selected.clone().unwrap_or_default())
            .show_ui(ui, |ui| {
                for name in folders {
                    ui.selectable_value(selected, Some(name.clone()), name.as_str());
                }
            });

        if !self.status_line.is_empty() {
            ui.colored_label(Color32::LIGHT_RED, &self.status_line);
        }

        let (slice_count, offer_deidentify) = match self.rendered_slice() {
            Some(slice) => (slice.slice_count, slice.offer_deidentify),
            None => (0, false),
        };
        if slice_count == 0 {
            return false;
        }

        ui.separator();
        ui.add(egui::Slider::new(&mut self.slice, 1..=slice_count).text("Slice"));

        if offer_deidentify && ui.button("De-identify DICOM").clicked() {
            deidentify_clicked = true;
        }

        ui.horizontal(|ui| {
            ui.label("Output");
            ui.radio_value(&mut self.display, DisplayMode::Image, "Image");
            ui.radio_value(&mut self.display, DisplayMode::Metadata, "Metadata");
        });

        let previous_mode = self.window_mode;
        let mode = &mut self.window_mode;
        egui::ComboBox::from_label("Window")
            .selected_text(mode.label())
            .show_ui(ui, |ui| {
                for preset in Preset::ALL {
                    ui.selectable_value(mode, WindowMode::Preset(preset), preset.label());
                }
                ui.selectable_value(mode, WindowMode::Custom, WindowMode::Custom.label());
            });
        if self.window_mode != previous_mode {
            self.window_mode_changed();
        }

        if self.window_mode == WindowMode::Custom {
            // No stepping: an untouched slider must keep a fractional DICOM
            // window exactly, or "Original Values" can never match.
            ui.add(
                egui::Slider::new(&mut self.custom_window.center, CENTER_RANGE)
                    .clamping(egui::SliderClamping::Edits)
                    .text("Center"),
            );
            ui.add(
                egui::Slider::new(&mut self.custom_window.width, WIDTH_RANGE)
                    .clamping(egui::SliderClamping::Edits)
                    .text("Width"),
            );
            if ui
                .button("↺ Original Values")
                .on_hover_text("Reset the sliders to the series window")
                .clicked()
            {
                self.reset_custom_window();
            }
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.toggle_value(&mut self.draw_mode, "Draw");
            if ui.small_button("Clear").clicked() {
                self.strokes.clear();
            }
        });
        if ui.checkbox(&mut self.mobile, "Compact layout").changed() {
            self.settings.mobile = self.mobile;
            self.persist_settings();
        }

        deidentify_clicked
    }

    fn show_view(&mut self, ui: &mut egui::Ui) {
        let Some(view) = self.view.take() else {
            ui.centered_and_justified(|ui| {
                ui.label("Select a folder containing a DICOM series.");
            });
            return;
        };

        match &view {
            RenderedView::Error(message) => {
                ui.colored_label(Color32::LIGHT_RED, message);
            }
            RenderedView::Slice(slice) => {
                match &slice.content {
                    SliceContent::Image(image) => self.show_image(ui, image),
                    SliceContent::Metadata(rows) => Self::show_metadata(ui, rows),
                }
                if let Some(notice) = slice.notice {
                    ui.colored_label(Color32::LIGHT_GREEN, notice);
                }
            }
        }
        self.view = Some(view);
    }

    fn show_image(&mut self, ui: &mut egui::Ui, image: &ImageView) {
        let Some(texture_id) = self.texture.as_ref().map(TextureHandle::id) else {
            return;
        };
        let notice_height = ui.spacing().interact_size.y;
        let (viewport, response) = ui.allocate_exact_size(
            ui.available_size() - egui::vec2(0.0, notice_height),
            Sense::click_and_drag(),
        );

        if image.options.pan_zoom {
            if response.hovered() {
                let scroll = ui.input(|input| input.smooth_scroll_delta.y);
                if scroll != 0.0 {
                    self.zoom = (self.zoom * (1.0 + scroll * 0.002)).clamp(0.1, 20.0);
                }
            }
            if response.dragged() && !(self.draw_mode && image.options.drawing_tools) {
                self.pan += response.drag_delta();
            }
            if response.double_clicked() {
                self.zoom = 1.0;
                self.pan = egui::Vec2::ZERO;
            }
        }

        let natural = natural_size(image);
        let header_lines = 2.0 * (image_font_size(image) + 2.0 * ANNOTATION_PADDING);
        let fit_area = egui::vec2(
            viewport.width(),
            (viewport.height() - 2.0 * header_lines).max(1.0),
        );
        let fit = (fit_area.x / natural.x.max(1.0)).min(fit_area.y / natural.y.max(1.0));
        let image_rect =
            egui::Rect::from_center_size(viewport.center() + self.pan, natural * fit * self.zoom);

        if self.draw_mode && image.options.drawing_tools {
            self.track_stroke(&response, image_rect);
        }

        let painter = ui.painter_at(viewport);
        painter.image(
            texture_id,
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            Color32::WHITE,
        );
        for stroke in &self.strokes {
            let points = stroke
                .iter()
                .map(|uv| image_rect.min + uv.to_vec2() * image_rect.size())
                .collect::<Vec<_>>();
            painter.add(egui::Shape::line(points, egui::Stroke::new(2.0, STROKE_COLOR)));
        }

        for annotation in &image.annotations {
            if annotation.text.is_empty() {
                continue;
            }
            let (anchor, align) = match annotation.anchor {
                AnnotationAnchor::Header(line) => (
                    viewport.left_top()
                        + egui::vec2(
                            ANNOTATION_PADDING,
                            ANNOTATION_PADDING
                                + line as f32 * (annotation.font_size + 3.0 * ANNOTATION_PADDING),
                        ),
                    egui::Align2::LEFT_TOP,
                ),
                AnnotationAnchor::BottomLeft => (
                    viewport.left_bottom() + egui::vec2(ANNOTATION_PADDING, -ANNOTATION_PADDING),
                    egui::Align2::LEFT_BOTTOM,
                ),
                AnnotationAnchor::BottomRight => (
                    viewport.right_bottom() - egui::vec2(ANNOTATION_PADDING, ANNOTATION_PADDING),
                    egui::Align2::RIGHT_BOTTOM,
                ),
            };
            let galley = painter.layout_no_wrap(
                annotation.text.clone(),
                egui::FontId::proportional(annotation.font_size),
                Color32::WHITE,
            );
            let text_rect = align.anchor_size(anchor, galley.size());
            painter.rect_filled(text_rect.expand(ANNOTATION_PADDING), 0.0, Color32::BLACK);
            painter.galley(text_rect.min, galley, Color32::WHITE);
        }
    }

    /// Freehand strokes are kept in image coordinates (0..1) so they follow
    /// pan and zoom.
    fn track_stroke(&mut self, response: &egui::Response, image_rect: egui::Rect) {
        let Some(pointer) = response.interact_pointer_pos() else {
            return;
        };
        let uv = ((pointer - image_rect.min) / image_rect.size()).to_pos2();
        if response.drag_started() {
            self.strokes.push(vec![uv]);
        } else if response.dragged() {
            if let Some(stroke) = self.strokes.last_mut() {
                stroke.push(uv);
            }
        }
    }

    fn show_metadata(ui: &mut egui::Ui, rows: &[(String, String)]) {
        let max_height = (ui.available_height() - ui.spacing().interact_size.y).max(0.0);
        egui::ScrollArea::vertical()
            .id_salt("metadata-table")
            .max_height(max_height)
            .show(ui, |ui| {
                egui::Grid::new("metadata-grid")
                    .striped(true)
                    .num_columns(2)
                    .show(ui, |ui| {
                        ui.strong("Tag");
                        ui.strong("Value");
                        ui.end_row();
                        for (code, value) in rows {
                            ui.monospace(code);
                            ui.label(value);
                            ui.end_row();
                        }
                    });
            });
    }
}

/// Unscaled paint size: pixel columns stretched by the pixel shape.
fn natural_size(image: &ImageView) -> egui::Vec2 {
    let [width_px, height_px] = image.image.size();
    egui::vec2(width_px as f32 * image.pixel_aspect as f32, height_px as f32)
}

fn image_font_size(image: &ImageView) -> f32 {
    image
        .annotations
        .first()
        .map(|annotation| annotation.font_size)
        .unwrap_or(14.0)
}

impl SliceViewerApp {
    fn run_frame(&mut self, ctx: &egui::Context) {
        Self::apply_black_background(ctx);

        let mut deidentify_clicked = false;
        let panel_width = if self.mobile { 200.0 } else { 280.0 };
        egui::SidePanel::left("controls")
            .resizable(false)
            .exact_width(panel_width)
            .show(ctx, |ui| {
                deidentify_clicked = self.show_controls(ui);
            });

        match self.active_folder() {
            Some(folder) => {
                self.ensure_loaded(&folder);
                let inputs = self.current_inputs(folder, deidentify_clicked);
                if deidentify_clicked || self.last_inputs.as_ref() != Some(&inputs) {
                    self.rerender(ctx, &inputs);
                    self.last_inputs = Some(ViewInputs {
                        deidentify_requested: false,
                        ..inputs
                    });
                    ctx.request_repaint();
                }
            }
            None => {
                // Deselecting counts as a folder change.
                self.session = SessionState::new();
                self.view = None;
                self.last_inputs = None;
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| self.show_view(ui));
    }
}

impl eframe::App for SliceViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.run_frame(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deidentify::SensitiveTagSet;
    use crate::series::{Frame, Volume};
    use crate::session::DataSource;
    use crate::settings::load_settings;
    use crate::tags::{TagMap, PATIENT_NAME, WINDOW_CENTER, WINDOW_WIDTH};
    use crate::windowing::{GrayFrame, Windowed};
    use std::cell::Cell;
    use std::rc::Rc;

    /// In-memory series whose decode calls are counted.
    struct CountingSource {
        decodes: Rc<Cell<usize>>,
        center: &'static str,
    }

    impl SeriesSource for CountingSource {
        fn list_slice_paths(&self, folder: &Path) -> anyhow::Result<Vec<PathBuf>> {
            Ok((0..4).map(|i| folder.join(format!("{i}.dcm"))).collect())
        }

        fn decode(&self, paths: &[PathBuf]) -> anyhow::Result<DecodedSeries> {
            self.decodes.set(self.decodes.get() + 1);
            let frames = paths
                .iter()
                .map(|_| Frame::new(1, 1, vec![0]))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let tag_maps = paths
                .iter()
                .map(|_| {
                    [
                        (PATIENT_NAME, "Doe^Jane"),
                        (WINDOW_CENTER, self.center),
                        (WINDOW_WIDTH, "1500"),
                    ]
                    .into_iter()
                    .collect::<TagMap>()
                })
                .collect::<Vec<_>>();
            DecodedSeries::new(Volume::new(frames)?, tag_maps)
        }
    }

    fn app_with_source(decodes: Rc<Cell<usize>>) -> SliceViewerApp {
        app_with_center(decodes, "-600")
    }

    fn app_with_center(decodes: Rc<Cell<usize>>, center: &'static str) -> SliceViewerApp {
        let request = LaunchRequest {
            root: PathBuf::from("/nonexistent-root"),
            folder: None,
            mobile: false,
            preset: Preset::Standard,
        };
        let mut app = SliceViewerApp::new(request, Settings::default(), None, None);
        app.source = Box::new(CountingSource { decodes, center });
        app
    }

    /// App on folder "a" of a series whose window center is 40.5.
    fn fractional_window_app() -> SliceViewerApp {
        let mut app = app_with_center(Rc::new(Cell::new(0)), "40.5");
        app.selected_folder = Some("a".to_string());
        app.window_mode = WindowMode::Custom;
        app
    }

    fn run_frames(app: &mut SliceViewerApp, ctx: &egui::Context, frames: usize) {
        for _ in 0..frames {
            let _ = ctx.run(egui::RawInput::default(), |ctx| app.run_frame(ctx));
        }
    }

    fn shown(app: &SliceViewerApp) -> &RenderedSlice {
        app.rendered_slice().expect("a slice should be shown")
    }

    fn deidentify_loaded(app: &mut SliceViewerApp) {
        let loaded = app.loaded.as_ref().expect("loaded");
        let series = loaded.series.as_ref().expect("series should decode");
        assert!(app.session.deidentify(series, SensitiveTagSet::standard()));
    }

    #[test]
    fn missing_root_is_reported_in_status_line() {
        let app = app_with_source(Rc::new(Cell::new(0)));
        assert!(app.folders.is_empty());
        assert!(app.status_line.contains("Could not list"));
    }

    #[test]
    fn loading_starts_mid_stack_with_series_window() {
        let decodes = Rc::new(Cell::new(0));
        let mut app = app_with_source(Rc::clone(&decodes));
        let folder = PathBuf::from("/series/a");

        app.ensure_loaded(&folder);
        app.ensure_loaded(&folder);
        assert_eq!(decodes.get(), 1);
        assert_eq!(app.slice, 2);
        assert_eq!(app.custom_window, WindowSpec::new(-600.0, 1500.0));

        app.ensure_loaded(Path::new("/series/b"));
        assert_eq!(decodes.get(), 2);
    }

    #[test]
    fn custom_mode_on_series_window_is_pass_through() {
        let mut app = app_with_source(Rc::new(Cell::new(0)));
        let folder = PathBuf::from("/series/a");
        app.ensure_loaded(&folder);
        app.window_mode = WindowMode::Custom;

        let inputs = app.current_inputs(folder, true);
        let loaded = app.loaded.as_ref().expect("loaded");
        let view = render(&mut app.session, &inputs, loaded.series.as_ref());
        let RenderedView::Slice(slice) = view else {
            panic!("expected a slice view");
        };
        assert_eq!(slice.source, DataSource::Raw);
        assert!(app.session.is_deidentified());
    }

    #[test]
    fn drawn_sliders_keep_a_fractional_series_window() {
        let mut app = fractional_window_app();
        let ctx = egui::Context::default();
        run_frames(&mut app, &ctx, 3);

        let default_window = WindowSpec::new(40.5, 400.0);
        assert_eq!(shown(&app).default_window, default_window);
        assert_eq!(app.custom_window, default_window);
        assert!(WindowChoice::Custom(app.custom_window).is_pass_through(default_window));
        let SliceContent::Image(image) = &shown(&app).content else {
            panic!("expected image content");
        };
        assert_eq!(image.window_label, "Original Values");
    }

    #[test]
    fn original_values_return_to_raw_data_after_deidentify() {
        let mut app = fractional_window_app();
        let ctx = egui::Context::default();
        run_frames(&mut app, &ctx, 2);
        deidentify_loaded(&mut app);

        app.custom_window = WindowSpec::new(100.0, 700.0);
        run_frames(&mut app, &ctx, 2);
        assert_eq!(shown(&app).source, DataSource::Deidentified);

        app.reset_custom_window();
        run_frames(&mut app, &ctx, 2);
        assert_eq!(app.custom_window, WindowSpec::new(40.5, 400.0));
        assert_eq!(shown(&app).source, DataSource::Raw);
    }

    #[test]
    fn deselecting_the_folder_resets_deidentification() {
        let mut app = fractional_window_app();
        app.window_mode = WindowMode::Preset(Preset::Standard);
        let ctx = egui::Context::default();
        run_frames(&mut app, &ctx, 1);
        deidentify_loaded(&mut app);

        app.selected_folder = None;
        run_frames(&mut app, &ctx, 1);
        assert!(!app.session.is_deidentified());

        app.selected_folder = Some("a".to_string());
        run_frames(&mut app, &ctx, 1);
        assert!(shown(&app).offer_deidentify);
        assert_eq!(shown(&app).source, DataSource::Raw);
    }

    #[test]
    fn choosing_a_preset_saves_it() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        let mut app = app_with_source(Rc::new(Cell::new(0)));
        app.settings_path = Some(path.clone());

        app.window_mode = WindowMode::Preset(Preset::Perfusion);
        app.window_mode_changed();
        app.window_mode = WindowMode::Custom;
        app.window_mode_changed();

        let saved = load_settings(&path).expect("settings should load");
        assert_eq!(saved.preset(), Some(Preset::Perfusion));
    }

    #[test]
    fn non_square_frame_without_spacing_keeps_its_shape() {
        let image = ImageView {
            image: Windowed::Gray(GrayFrame {
                width: 512,
                height: 256,
                pixels: vec![0; 512 * 256],
            }),
            window_label: String::new(),
            annotations: Vec::new(),
            aspect_ratio: 0.5,
            pixel_aspect: 1.0,
            options: Default::default(),
        };
        assert_eq!(natural_size(&image), egui::vec2(512.0, 256.0));
    }
}
