// ============================================================================
// hud.rs — WASD Viewport Controls
// On-screen overlay text via glyphon: status slots and a camera readout.
// ============================================================================

use glyphon::{
    Attrs, Buffer as TextBuffer, Cache as GlyphCache, Color as GlyphColor, Family, FontSystem,
    Metrics, Resolution, Shaping, SwashCache, TextArea, TextAtlas, TextBounds, TextRenderer,
    Viewport as GlyphViewport,
};

use crate::host::OverlaySlot;

const FONT_SIZE: f32 = 14.0;
const LINE_HEIGHT: f32 = 18.0;
const MARGIN: f32 = 10.0;

/// Everything the HUD shows for one frame.
pub struct HudContent<'a> {
    pub overlays: Vec<(OverlaySlot, &'a str)>,
    pub readout: String,
}

/// All glyphon resources needed for HUD text rendering.
pub struct HudRenderer {
    pub font_system: FontSystem,
    pub swash_cache: SwashCache,
    pub glyph_viewport: GlyphViewport,
    pub text_atlas: TextAtlas,
    pub text_renderer: TextRenderer,
}

impl HudRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let mut font_system = FontSystem::new();
        let swash_cache = SwashCache::new();
        let glyph_cache = GlyphCache::new(device);
        let glyph_viewport = GlyphViewport::new(device, &glyph_cache);
        let mut text_atlas = TextAtlas::new(device, queue, &glyph_cache, surface_format);
        let text_renderer =
            TextRenderer::new(&mut text_atlas, device, wgpu::MultisampleState::default(), None);

        // Prime font system so first frame renders correctly
        let mut primer = TextBuffer::new(&mut font_system, Metrics::new(FONT_SIZE, LINE_HEIGHT));
        primer.set_text(
            &mut font_system,
            "WASD",
            Attrs::new().family(Family::Monospace),
            Shaping::Basic,
        );

        Self {
            font_system,
            swash_cache,
            glyph_viewport,
            text_atlas,
            text_renderer,
        }
    }

    /// Lay out and upload HUD text for the current frame.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        content: &HudContent<'_>,
        win_w: u32,
        win_h: u32,
    ) -> Result<(), glyphon::PrepareError> {
        self.glyph_viewport.update(
            queue,
            Resolution {
                width: win_w,
                height: win_h,
            },
        );

        let column_w = win_w as f32 / f32::from(OverlaySlot::SECTION_COUNT / 2);
        let mut placed: Vec<(TextBuffer, (f32, f32), GlyphColor)> = Vec::new();

        for (slot, label) in &content.overlays {
            let buffer = self.shape_line(&overlay_text(label), column_w * 3.0, win_h as f32);
            placed.push((buffer, slot_anchor(*slot, win_w, win_h), GlyphColor::rgb(235, 235, 200)));
        }
        let readout = self.shape_line(&content.readout, win_w as f32, win_h as f32);
        placed.push((readout, (MARGIN, MARGIN), GlyphColor::rgb(200, 200, 200)));

        let bounds = TextBounds {
            left: 0,
            top: 0,
            right: win_w as i32,
            bottom: win_h as i32,
        };
        let areas = placed.iter().map(|(buffer, (left, top), color)| TextArea {
            buffer,
            left: *left,
            top: *top,
            scale: 1.0,
            bounds,
            default_color: *color,
            custom_glyphs: &[],
        });

        self.text_renderer.prepare(
            device,
            queue,
            &mut self.font_system,
            &mut self.text_atlas,
            &self.glyph_viewport,
            areas,
            &mut self.swash_cache,
        )
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), glyphon::RenderError> {
        self.text_renderer
            .render(&self.text_atlas, &self.glyph_viewport, pass)
    }

    /// Trim the glyph atlas after presenting.
    pub fn trim(&mut self) {
        self.text_atlas.trim();
    }

    fn shape_line(&mut self, text: &str, width: f32, height: f32) -> TextBuffer {
        let mut buffer = TextBuffer::new(&mut self.font_system, Metrics::new(FONT_SIZE, LINE_HEIGHT));
        buffer.set_size(&mut self.font_system, Some(width), Some(height));
        buffer.set_text(
            &mut self.font_system,
            text,
            Attrs::new().family(Family::Monospace),
            Shaping::Basic,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }
}

// ======================== Layout ========================

/// Tabs separate the overlay title from its hint.
fn overlay_text(label: &str) -> String {
    label.replace('\t', "    ")
}

/// Top-left corner of a slot's line. Top-row blocks stack downward from the
/// top edge, bottom-row blocks stack upward from the bottom edge. The top-left
/// column starts below the camera readout.
pub fn slot_anchor(slot: OverlaySlot, win_w: u32, win_h: u32) -> (f32, f32) {
    let column_w = win_w as f32 / f32::from(OverlaySlot::SECTION_COUNT / 2);
    let left = f32::from(slot.column()) * column_w + MARGIN;
    let block = f32::from(slot.block);
    let top = if slot.is_bottom() {
        win_h as f32 - MARGIN - (block + 1.0) * LINE_HEIGHT
    } else {
        let reserved = if slot.column() == 0 { LINE_HEIGHT } else { 0.0 };
        MARGIN + reserved + block * LINE_HEIGHT
    };
    (left, top.max(0.0))
}
