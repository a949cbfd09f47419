use std::path::Path;

use crate::models::FontEntry;

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "woff", "woff2"];

/// Style suffixes and their CSS weights. Longer names come first so
/// `ExtraBold` wins over `Bold`.
const WEIGHTS: [(&str, u16); 13] = [
    ("ExtraLight", 200),
    ("UltraLight", 200),
    ("SemiBold", 600),
    ("DemiBold", 600),
    ("ExtraBold", 800),
    ("UltraBold", 800),
    ("Regular", 400),
    ("Medium", 500),
    ("Black", 900),
    ("Heavy", 900),
    ("Light", 300),
    ("Thin", 100),
    ("Bold", 700),
];

/// split_family
///
/// `OpenSans` → `Open Sans`, `SourceSans3` → `Source Sans 3`. Runs of capitals
/// (`PTSans`) keep their acronym together.
pub fn split_family(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let boundary = (c.is_uppercase() && prev.is_lowercase())
                || (c.is_uppercase()
                    && prev.is_uppercase()
                    && next.is_some_and(|n| n.is_lowercase()))
                || (c.is_ascii_digit() && !prev.is_ascii_digit())
                || (c.is_alphabetic() && prev.is_ascii_digit());
            if boundary && !out.ends_with(' ') {
                out.push(' ');
            }
        }
        if c == '_' || c == ' ' {
            if !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }
        out.push(c);
    }
    out.trim().to_string()
}

/// parse_style
///
/// Maps a style suffix such as `SemiBoldItalic` to `(weight, style)`.
pub fn parse_style(raw: &str) -> (u16, &'static str) {
    let (base, style) = match raw.strip_suffix("Italic") {
        Some(rest) => (rest, "italic"),
        None => (raw, "normal"),
    };
    let weight = WEIGHTS
        .iter()
        .find(|(name, _)| base.eq_ignore_ascii_case(name))
        .map(|(_, weight)| *weight)
        .unwrap_or(400);
    (weight, style)
}

/// font_entry
///
/// Builds a catalog entry from a file name like `Montserrat-BoldItalic.woff2`.
/// Returns `None` for files that are not web fonts.
pub fn font_entry(file_name: &str) -> Option<FontEntry> {
    let path = Path::new(file_name);
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if !FONT_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (family, style) = match stem.split_once('-') {
        Some((family, style)) => (family, style),
        None => (stem, "Regular"),
    };
    if family.is_empty() {
        return None;
    }
    let (weight, style) = parse_style(style);

    Some(FontEntry {
        family: split_family(family),
        weight,
        style: style.to_string(),
        url: format!("/fonts/{file_name}"),
    })
}

/// scan_fonts
///
/// Lists the fonts in `dir`, sorted by family then weight. A missing or
/// unreadable directory yields an empty catalog.
pub async fn scan_fonts(dir: &str) -> Vec<FontEntry> {
    let mut entries = Vec::new();
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) => {
            tracing::debug!("font directory {} not readable: {}", dir, e);
            return entries;
        }
    };

    while let Ok(Some(entry)) = read_dir.next_entry().await {
        if let Some(font) = entry.file_name().to_str().and_then(font_entry) {
            entries.push(font);
        }
    }

    entries.sort_by(|a, b| {
        a.family
            .cmp(&b.family)
            .then(a.weight.cmp(&b.weight))
            .then(a.style.cmp(&b.style))
    });
    entries
}
