// i18n.rs: runtime string tables
//
// - Built-in tables: assets/i18n/en.json and th.json, compiled in
// - Overrides: assets/i18n/<lang>.json next to the executable or in the
//   working directory, merged over the built-in table
// - Lookup: tr("key") / tr_with("key", &[("name", ...)]) with {name} placeholders
// - Fallback language: en

use once_cell::sync::OnceCell;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const FALLBACK_LANG: &str = "en";

/// Languages offered in the menu, with their native names.
pub const LANGUAGES: [(&str, &str); 2] = [("en", "English"), ("th", "ไทย")];

const BUILTIN_EN: &str = include_str!("../assets/i18n/en.json");
const BUILTIN_TH: &str = include_str!("../assets/i18n/th.json");

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn parse_map(text: &str) -> Option<HashMap<String, String>> {
    match serde_json::from_str(text) {
        Ok(map) => Some(map),
        Err(e) => {
            log::warn!("ignoring malformed string table: {e}");
            None
        }
    }
}

fn builtin(lang: &str) -> HashMap<String, String> {
    let text = match lang {
        "en" => BUILTIN_EN,
        "th" => BUILTIN_TH,
        _ => return HashMap::new(),
    };
    parse_map(text).unwrap_or_default()
}

/// Looks for assets/i18n/<lang>.json beside the executable, then under the
/// working directory.
fn find_lang_file(lang: &str) -> Option<PathBuf> {
    let file = format!("{lang}.json");
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    exe_dir
        .into_iter()
        .chain(std::iter::once(PathBuf::new()))
        .map(|dir| dir.join("assets").join("i18n").join(&file))
        .find(|p| p.exists())
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    let mut map = builtin(lang);
    if let Some(path) = find_lang_file(lang) {
        let overrides = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| parse_map(&text));
        if let Some(overrides) = overrides {
            log::debug!("string overrides from {}", path.display());
            map.extend(overrides);
        }
    }
    map
}

/// Initialize global i18n. Later calls switch the language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let map = load_lang(&lang);
    if map.is_empty() {
        log::warn!("no strings for language {lang}, using {FALLBACK_LANG}");
    }
    let fallback_map = if lang == FALLBACK_LANG {
        map.clone()
    } else {
        load_lang(FALLBACK_LANG)
    };

    let i = I18n {
        lang,
        map,
        fallback_map,
    };

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else if let Err(lock) = I18N.set(RwLock::new(i)) {
        // lost an init race; overwrite with our table
        if let (Some(current), Ok(i)) = (I18N.get(), lock.into_inner()) {
            if let Ok(mut w) = current.write() {
                *w = i;
            }
        }
    }
}

pub fn current_lang() -> String {
    get_locked()
        .map(|i| i.lang.clone())
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}

fn get_locked() -> Option<std::sync::RwLockReadGuard<'static, I18n>> {
    I18N.get().and_then(|l| l.read().ok())
}

/// Localized text by key; the key itself when missing everywhere.
pub fn tr(key: &str) -> String {
    let Some(i) = get_locked() else {
        return builtin(FALLBACK_LANG)
            .remove(key)
            .unwrap_or_else(|| key.to_string());
    };

    i.map
        .get(key)
        .or_else(|| i.fallback_map.get(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Localized text with `{name}` placeholders substituted.
/// Placeholders without a value are kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        let placeholder = format!("{{{k}}}");
        s = s.replace(&placeholder, v);
    }
    s
}

/// CLI value first, then PANORAMA_TOUR_LANG, then the stored setting.
pub fn resolve_lang(cli: Option<&str>, stored: &str) -> String {
    if let Some(lang) = cli.filter(|l| !l.trim().is_empty()) {
        return lang.to_string();
    }
    if let Ok(v) = std::env::var("PANORAMA_TOUR_LANG") {
        if !v.trim().is_empty() {
            return v;
        }
    }
    if stored.trim().is_empty() {
        FALLBACK_LANG.to_string()
    } else {
        stored.to_string()
    }
}
