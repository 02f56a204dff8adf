use std::path::Path;
use std::sync::Arc;

use eframe::egui::{self, FontData, FontDefinitions, FontFamily};

/// System fonts with Hangul coverage, tried in order.
const HANGUL_FONTS: &[&str] = &[
    // Windows
    "C:/Windows/Fonts/malgun.ttf",
    "C:/Windows/Fonts/gulim.ttc",
    // macOS
    "/System/Library/Fonts/AppleSDGothicNeo.ttc",
    "/Library/Fonts/AppleGothic.ttf",
    // Linux
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
];

/// Install the first Hangul-capable system font as the preferred face.
/// egui's bundled fonts have no Hangul glyphs.
pub fn install_hangul_font(ctx: &egui::Context) {
    let mut fonts = FontDefinitions::default();

    let found = HANGUL_FONTS
        .iter()
        .find_map(|p| std::fs::read(Path::new(p)).ok().map(|bytes| (*p, bytes)));

    match found {
        Some((path, bytes)) => {
            fonts
                .font_data
                .insert("hangul".to_owned(), Arc::new(FontData::from_owned(bytes)));
            for family in [FontFamily::Proportional, FontFamily::Monospace] {
                fonts
                    .families
                    .entry(family)
                    .or_default()
                    .insert(0, "hangul".to_owned());
            }
            log::info!("Loaded Hangul font: {path}");
        }
        None => log::warn!("No Hangul font found; Korean labels may not render"),
    }

    ctx.set_fonts(fonts);
}
