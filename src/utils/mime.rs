use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Lowercased extension of a client filename, without the dot.
pub fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

fn from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "csv" => "text/csv",
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "7z" => "application/x-7z-compressed",
        "txt" | "md" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        _ => return None,
    };
    Some(mime)
}

fn normalize(content_type: &str) -> Option<String> {
    let parsed: ::mime::Mime = content_type.trim().parse().ok()?;
    if parsed.essence_str().eq_ignore_ascii_case(OCTET_STREAM) {
        return None;
    }
    Some(parsed.essence_str().to_lowercase())
}

/// MIME type of an upload: sniffed from the content first, then the
/// client-declared type, then the filename extension.
pub fn detect_mime(bytes: &[u8], filename: &str, client_type: Option<&str>) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }

    if let Some(declared) = client_type.and_then(normalize) {
        return declared;
    }

    extension(filename)
        .as_deref()
        .and_then(from_extension)
        .unwrap_or(OCTET_STREAM)
        .to_string()
}
