// File: crates/canvas-render-skia/src/text.rs
// Summary: Text shaper/renderer using Skia textlayout; bundled typefaces first, system fonts as fallback.

use skia_safe as skia;
use skia::textlayout::{FontCollection, Paragraph, ParagraphBuilder, ParagraphStyle, TextStyle, TypefaceFontProvider};

const SANS_FALLBACK: &[&str] = &["Segoe UI", "Arial", "Helvetica", "Roboto", "DejaVu Sans", "sans-serif"];
const MONO_FALLBACK: &[&str] = &["Roboto Mono", "Consolas", "Menlo", "DejaVu Sans Mono", "monospace"];

pub struct TextShaper {
    fonts: FontCollection,
    sans: Vec<String>,
    mono: Vec<String>,
}

impl TextShaper {
    /// Shaper over the system fonts only.
    pub fn new() -> Self { Self::with_typefaces("sans-serif", &[]) }

    /// Shaper that resolves `default_family` (and any other bundled family) from `typefaces`
    /// before falling back to the system font manager.
    pub fn with_typefaces(default_family: &str, typefaces: &[skia::Typeface]) -> Self {
        let mut fc = FontCollection::new();
        if !typefaces.is_empty() {
            let mut provider = TypefaceFontProvider::new();
            for tf in typefaces {
                provider.register_typeface(tf.clone(), None::<&str>);
            }
            let bundled: skia::FontMgr = provider.into();
            fc.set_asset_font_manager(Some(bundled));
        }
        // Use system manager fallback
        fc.set_default_font_manager(skia::FontMgr::default(), None);

        let with_default = |fallback: &[&str]| {
            std::iter::once(default_family)
                .chain(fallback.iter().copied().filter(|f| *f != default_family))
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        Self { fonts: fc, sans: with_default(SANS_FALLBACK), mono: MONO_FALLBACK.iter().map(|s| s.to_string()).collect() }
    }

    /// Families tried, in order, for proportional text.
    pub fn families(&self) -> &[String] { &self.sans }

    fn make_style(&self, size: f32, color: skia::Color, mono_numeric: bool) -> TextStyle {
        let mut ts = TextStyle::new();
        ts.set_font_size(size.max(1.0));
        ts.set_color(color);
        if mono_numeric {
            // Prefer monospaced/tabular-number families for numeric alignment
            ts.set_font_families(self.mono.as_slice());
        } else {
            ts.set_font_families(self.sans.as_slice());
        }
        ts
    }

    pub fn layout(&self, text: &str, size: f32, color: skia::Color, mono_numeric: bool) -> Paragraph {
        let mut pstyle = ParagraphStyle::new();
        pstyle.set_text_align(skia::textlayout::TextAlign::Left);
        let mut builder = ParagraphBuilder::new(&pstyle, &self.fonts);
        builder.push_style(&self.make_style(size, color, mono_numeric));
        builder.add_text(text);
        let mut paragraph = builder.build();
        paragraph.layout(10_000.0);
        paragraph
    }

    pub fn measure_width(&self, text: &str, size: f32, mono_numeric: bool) -> f32 {
        let p = self.layout(text, size, skia::Color::from_argb(0, 0, 0, 0), mono_numeric);
        // width of the longest line
        p.longest_line()
    }

    /// Draw with `y` as the approximate baseline.
    pub fn draw_left(&self, canvas: &skia::Canvas, text: &str, x: f32, y: f32, size: f32, color: skia::Color, mono_numeric: bool) {
        let mut p = self.layout(text, size, color, mono_numeric);
        // Paragraph draws from top-left; adjust baseline by glyph height approximation
        p.paint(canvas, (x, y - size * 0.8));
    }

    pub fn draw_centered(&self, canvas: &skia::Canvas, text: &str, cx: f32, y: f32, size: f32, color: skia::Color) {
        let mut p = self.layout(text, size, color, false);
        let half = p.longest_line() / 2.0;
        p.paint(canvas, (cx - half, y - size * 0.8));
    }
}

impl Default for TextShaper {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_family_leads_without_duplicates() {
        let t = TextShaper::with_typefaces("Arial", &[]);
        assert_eq!(t.families()[0], "Arial");
        assert_eq!(t.families().iter().filter(|f| *f == "Arial").count(), 1);
    }
}
