// fonts.rs: UI font discovery
//
// egui's built-in fonts have no Thai glyphs. Look for a system or bundled font
// that does, validate it with ab_glyph, and put it first in both families.
// The built-in fonts stay behind it for Latin text and emoji.

use std::path::{Path, PathBuf};

const ASSET_FONTS: [&str; 6] = [
    "NotoSansThai-Regular.ttf",
    "NotoSansThai-Regular.otf",
    "NotoSansThaiUI-Regular.ttf",
    "Sarabun-Regular.ttf",
    "NotoSans-Regular.ttf",
    "NotoSans-Regular.otf",
];

fn system_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if cfg!(windows) {
        let win_fonts = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["LeelawUI.ttf", "leelawad.ttf", "tahoma.ttf", "segoeui.ttf", "arial.ttf"] {
            candidates.push(win_fonts.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for p in [
            "/System/Library/Fonts/Supplemental/Thonburi.ttf",
            "/System/Library/Fonts/Thonburi.ttf",
            "/System/Library/Fonts/Supplemental/Ayuthaya.ttf",
            "/Library/Fonts/NotoSansThai-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        ] {
            candidates.push(PathBuf::from(p));
        }
    } else if cfg!(unix) {
        for p in [
            "/usr/share/fonts/truetype/noto/NotoSansThai-Regular.ttf",
            "/usr/share/fonts/opentype/noto/NotoSansThai-Regular.otf",
            "/usr/share/fonts/noto/NotoSansThai-Regular.ttf",
            "/usr/share/fonts/google-noto/NotoSansThai-Regular.ttf",
            "/usr/share/fonts/truetype/tlwg/Garuda.ttf",
            "/usr/share/fonts/truetype/tlwg/Loma.ttf",
            "/usr/share/fonts/truetype/tlwg/Sawasdee.ttf",
        ] {
            candidates.push(PathBuf::from(p));
        }
        if let Ok(home) = std::env::var("HOME") {
            let home = PathBuf::from(home);
            candidates.push(home.join(".local/share/fonts/NotoSansThai-Regular.ttf"));
            candidates.push(home.join(".fonts/NotoSansThai-Regular.ttf"));
        }
    }

    candidates
}

fn asset_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        candidates.extend(ASSET_FONTS.iter().map(|f| dir.join("assets").join("fonts").join(f)));
    }
    candidates.extend(ASSET_FONTS.iter().map(|f| Path::new("assets").join("fonts").join(f)));
    candidates
}

/// Bytes of a font file that ab_glyph can parse. Collections (.ttc) often fail
/// and are skipped.
fn load_font(path: &Path) -> Option<Vec<u8>> {
    let bytes = std::fs::read(path).ok()?;
    ab_glyph::FontRef::try_from_slice(&bytes).ok()?;
    Some(bytes)
}

pub fn install_ui_fonts(ctx: &egui::Context) {
    // bundled fonts win over system ones
    let chosen = asset_candidates()
        .into_iter()
        .chain(system_candidates())
        .find_map(|p| load_font(&p).map(|bytes| (p, bytes)));

    let Some((path, bytes)) = chosen else {
        log::warn!("no Thai-capable UI font found, using egui defaults");
        return;
    };
    log::info!("UI font: {}", path.display());

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("ui".to_owned(), egui::FontData::from_owned(bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            list.insert(0, "ui".to_owned());
        }
    }
    ctx.set_fonts(fonts);
}
