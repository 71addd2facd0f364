use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Coarse file category derived from a MIME string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Spreadsheet,
    Presentation,
    Archive,
    Text,
    Code,
    Font,
    Executable,
    Design,
    #[serde(rename = "3d")]
    Model3d,
    Binary,
    Other,
    Unknown,
}

impl FileCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Document => "document",
            FileCategory::Spreadsheet => "spreadsheet",
            FileCategory::Presentation => "presentation",
            FileCategory::Archive => "archive",
            FileCategory::Text => "text",
            FileCategory::Code => "code",
            FileCategory::Font => "font",
            FileCategory::Executable => "executable",
            FileCategory::Design => "design",
            FileCategory::Model3d => "3d",
            FileCategory::Binary => "binary",
            FileCategory::Other => "other",
            FileCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Well-known MIME strings. Entries ending in `/` are prefix rules and are
/// consulted, in table order, only after an exact lookup misses.
const MIME_TABLE: &[(&str, FileCategory)] = &[
    ("image/", FileCategory::Image),
    ("video/", FileCategory::Video),
    ("audio/", FileCategory::Audio),
    ("text/", FileCategory::Text),
    // Archives
    ("application/zip", FileCategory::Archive),
    ("application/x-zip-compressed", FileCategory::Archive),
    ("application/x-rar-compressed", FileCategory::Archive),
    ("application/x-7z-compressed", FileCategory::Archive),
    ("application/gzip", FileCategory::Archive),
    ("application/x-tar", FileCategory::Archive),
    ("application/x-bzip2", FileCategory::Archive),
    // Documents
    ("application/pdf", FileCategory::Document),
    ("application/msword", FileCategory::Document),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        FileCategory::Document,
    ),
    ("application/rtf", FileCategory::Document),
    ("application/vnd.oasis.opendocument.text", FileCategory::Document),
    // Spreadsheets
    ("application/vnd.ms-excel", FileCategory::Spreadsheet),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        FileCategory::Spreadsheet,
    ),
    (
        "application/vnd.oasis.opendocument.spreadsheet",
        FileCategory::Spreadsheet,
    ),
    ("text/csv", FileCategory::Spreadsheet),
    // Presentations
    ("application/vnd.ms-powerpoint", FileCategory::Presentation),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        FileCategory::Presentation,
    ),
    (
        "application/vnd.oasis.opendocument.presentation",
        FileCategory::Presentation,
    ),
    // Code
    ("application/json", FileCategory::Code),
    ("application/javascript", FileCategory::Code),
    ("application/xml", FileCategory::Code),
    ("text/html", FileCategory::Code),
    ("text/css", FileCategory::Code),
    ("text/javascript", FileCategory::Code),
    ("application/x-php", FileCategory::Code),
    ("application/x-python-code", FileCategory::Code),
    // Fonts
    ("font/", FileCategory::Font),
    ("application/font-woff", FileCategory::Font),
    ("application/font-woff2", FileCategory::Font),
    ("application/vnd.ms-fontobject", FileCategory::Font),
    // Executables
    ("application/x-executable", FileCategory::Executable),
    ("application/x-msdos-program", FileCategory::Executable),
    ("application/x-msdownload", FileCategory::Executable),
    ("application/x-apple-diskimage", FileCategory::Executable),
    ("application/x-debian-package", FileCategory::Executable),
    // Design
    ("application/dwg", FileCategory::Design),
    ("application/dxf", FileCategory::Design),
    ("image/vnd.adobe.photoshop", FileCategory::Design),
    ("application/postscript", FileCategory::Design),
    // 3D models
    ("model/", FileCategory::Model3d),
    ("application/octet-stream", FileCategory::Binary),
];

/// Substring fallbacks, checked in order when neither table rule matched.
const SUBSTRING_RULES: &[(&str, FileCategory)] = &[
    ("sheet", FileCategory::Spreadsheet),
    ("document", FileCategory::Document),
    ("presentation", FileCategory::Presentation),
    ("word", FileCategory::Document),
    ("excel", FileCategory::Spreadsheet),
    ("powerpoint", FileCategory::Presentation),
    ("compressed", FileCategory::Archive),
    ("zip", FileCategory::Archive),
];

/// Classifies a MIME string. Total: every input, including the empty
/// string, maps to a category.
pub fn classify(mime_type: Option<&str>) -> FileCategory {
    let mime = match mime_type.map(str::trim) {
        Some(m) if !m.is_empty() => m.to_lowercase(),
        _ => return FileCategory::Unknown,
    };

    if let Some((_, category)) = MIME_TABLE.iter().find(|(pattern, _)| *pattern == mime) {
        return *category;
    }

    if let Some((_, category)) = MIME_TABLE
        .iter()
        .find(|(pattern, _)| pattern.ends_with('/') && mime.starts_with(pattern))
    {
        return *category;
    }

    SUBSTRING_RULES
        .iter()
        .find(|(needle, _)| mime.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or(FileCategory::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_missing_are_unknown() {
        assert_eq!(classify(None), FileCategory::Unknown);
        assert_eq!(classify(Some("")), FileCategory::Unknown);
        assert_eq!(classify(Some("   ")), FileCategory::Unknown);
    }

    #[test]
    fn test_prefix_rules() {
        assert_eq!(classify(Some("image/png")), FileCategory::Image);
        assert_eq!(classify(Some("video/mp4")), FileCategory::Video);
        assert_eq!(classify(Some("audio/mpeg")), FileCategory::Audio);
        assert_eq!(classify(Some("text/plain")), FileCategory::Text);
        assert_eq!(classify(Some("font/woff2")), FileCategory::Font);
        assert_eq!(classify(Some("model/gltf+json")), FileCategory::Model3d);
    }

    #[test]
    fn test_exact_match_beats_prefix() {
        assert_eq!(classify(Some("text/csv")), FileCategory::Spreadsheet);
        assert_eq!(classify(Some("text/html")), FileCategory::Code);
        assert_eq!(
            classify(Some("image/vnd.adobe.photoshop")),
            FileCategory::Design
        );
    }

    #[test]
    fn test_office_formats() {
        assert_eq!(
            classify(Some(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            )),
            FileCategory::Spreadsheet
        );
        assert_eq!(classify(Some("application/pdf")), FileCategory::Document);
        assert_eq!(
            classify(Some("application/vnd.ms-powerpoint")),
            FileCategory::Presentation
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify(Some("IMAGE/JPEG")), FileCategory::Image);
        assert_eq!(classify(Some("Application/ZIP")), FileCategory::Archive);
    }

    #[test]
    fn test_substring_fallback() {
        assert_eq!(
            classify(Some("application/vnd.custom-sheet")),
            FileCategory::Spreadsheet
        );
        assert_eq!(
            classify(Some("application/x-wordperfect")),
            FileCategory::Document
        );
        assert_eq!(
            classify(Some("application/x-lzh-compressed")),
            FileCategory::Archive
        );
        assert_eq!(classify(Some("application/x-zip")), FileCategory::Archive);
    }

    #[test]
    fn test_everything_else_is_other() {
        assert_eq!(classify(Some("application/x-unheard-of")), FileCategory::Other);
        assert_eq!(classify(Some("garbage")), FileCategory::Other);
        assert_eq!(classify(Some("application/octet-stream")), FileCategory::Binary);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_string(&FileCategory::Model3d).unwrap(),
            "\"3d\""
        );
        assert_eq!(FileCategory::Spreadsheet.to_string(), "spreadsheet");
    }
}
