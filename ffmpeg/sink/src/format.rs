/*!
    Known output container formats.
*/

use std::path::Path;

/**
    Identity of an output container format.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatInfo {
    /// Short name (e.g., "mp4", "matroska").
    pub name: &'static str,
    /// Descriptive name.
    pub long_name: &'static str,
    /// MIME type, if the format has one.
    pub mime_type: Option<&'static str>,
    /// File extensions, without the dot.
    pub extensions: &'static [&'static str],
}

impl FormatInfo {
    pub fn has_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

const FORMATS: &[FormatInfo] = &[
    FormatInfo {
        name: "mp4",
        long_name: "MP4 (MPEG-4 Part 14)",
        mime_type: Some("video/mp4"),
        extensions: &["mp4", "m4v"],
    },
    FormatInfo {
        name: "mov",
        long_name: "QuickTime / MOV",
        mime_type: Some("video/quicktime"),
        extensions: &["mov"],
    },
    FormatInfo {
        name: "matroska",
        long_name: "Matroska",
        mime_type: Some("video/x-matroska"),
        extensions: &["mkv"],
    },
    FormatInfo {
        name: "webm",
        long_name: "WebM",
        mime_type: Some("video/webm"),
        extensions: &["webm"],
    },
    FormatInfo {
        name: "mxf",
        long_name: "MXF (Material eXchange Format)",
        mime_type: Some("application/mxf"),
        extensions: &["mxf"],
    },
    FormatInfo {
        name: "mxf_d10",
        long_name: "MXF (Material eXchange Format) D-10 Mapping",
        mime_type: Some("application/mxf"),
        extensions: &["mxf"],
    },
    FormatInfo {
        name: "mxf_opatom",
        long_name: "MXF (Material eXchange Format) Operational Pattern Atom",
        mime_type: Some("application/mxf"),
        extensions: &["mxf"],
    },
    FormatInfo {
        name: "mpegts",
        long_name: "MPEG-TS (MPEG-2 Transport Stream)",
        mime_type: Some("video/MP2T"),
        extensions: &["ts", "m2t", "m2ts", "mts"],
    },
    FormatInfo {
        name: "avi",
        long_name: "AVI (Audio Video Interleaved)",
        mime_type: Some("video/x-msvideo"),
        extensions: &["avi"],
    },
    FormatInfo {
        name: "flv",
        long_name: "FLV (Flash Video)",
        mime_type: Some("video/x-flv"),
        extensions: &["flv"],
    },
    FormatInfo {
        name: "wav",
        long_name: "WAV / WAVE (Waveform Audio)",
        mime_type: Some("audio/x-wav"),
        extensions: &["wav"],
    },
    FormatInfo {
        name: "mp3",
        long_name: "MP3 (MPEG audio layer 3)",
        mime_type: Some("audio/mpeg"),
        extensions: &["mp3"],
    },
    FormatInfo {
        name: "ogg",
        long_name: "Ogg",
        mime_type: Some("application/ogg"),
        extensions: &["ogg"],
    },
    FormatInfo {
        name: "flac",
        long_name: "raw FLAC",
        mime_type: Some("audio/x-flac"),
        extensions: &["flac"],
    },
    FormatInfo {
        name: "adts",
        long_name: "ADTS AAC (Advanced Audio Coding)",
        mime_type: Some("audio/aac"),
        extensions: &["aac", "adts"],
    },
    FormatInfo {
        name: "rawvideo",
        long_name: "raw video",
        mime_type: None,
        extensions: &["yuv", "rgb"],
    },
];

/**
    Returns every known output format.
*/
pub fn formats() -> &'static [FormatInfo] {
    FORMATS
}

/**
    Look a format up by its short name.
*/
pub fn find_format(name: &str) -> Option<&'static FormatInfo> {
    FORMATS.iter().find(|f| f.name == name)
}

/**
    Pick the best output format for a filename and optional hints.

    A matching short name scores highest, then a matching MIME type, then a
    matching file extension. Returns `None` when nothing scores.
*/
pub fn guess_format(
    filename: &str,
    format_name: Option<&str>,
    mime_type: Option<&str>,
) -> Option<&'static FormatInfo> {
    let extension = extension_of(filename);

    let mut best: Option<(&'static FormatInfo, u32)> = None;
    for format in FORMATS {
        let mut score = 0;
        if format_name.is_some_and(|name| name == format.name) {
            score += 100;
        }
        if mime_type.is_some_and(|mime| Some(mime) == format.mime_type) {
            score += 10;
        }
        if extension.is_some_and(|ext| format.has_extension(ext)) {
            score += 5;
        }
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((format, score));
        }
    }

    best.map(|(format, _)| format)
}

/**
    Returns true if `format` is a known format and the filename's extension,
    when it has one, belongs to that format.
*/
pub fn match_format(format: &str, filename: &str) -> bool {
    let Some(info) = find_format(format) else {
        return false;
    };
    match extension_of(filename) {
        Some(ext) => info.has_extension(ext),
        None => true,
    }
}

fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|ext| ext.to_str())
}
