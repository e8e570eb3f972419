//! Supported file extensions and the mimetype lookup tables
//!
//! The mimetype table is static, read-only, and a bijection: each listed
//! mimetype has exactly one canonical extension and each extension in the
//! table appears once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// File extensions accepted by storage-backed ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ext {
    Txt,
    Csv,
    Pdf,
    Png,
    Jpeg,
    Mpeg,
    Webm,
    Wav,
    Mp4,
    Mp3,
    Avi,
    Mkv,
    Mov,
    Wmv,
    Gif,
    Jpg,
    Tiff,
    Tif,
    Bmp,
    Jp2,
    Dib,
    Pgm,
    Ppm,
    Pnm,
    Ras,
    Hdr,
    Webp,
}

/// Canonical `(mimetype, extension)` pairs
const MIMETYPES: [(&str, Ext); 17] = [
    ("text/plain", Ext::Txt),
    ("text/csv", Ext::Csv),
    ("application/pdf", Ext::Pdf),
    ("image/png", Ext::Png),
    ("image/jpeg", Ext::Jpeg),
    ("image/gif", Ext::Gif),
    ("image/bmp", Ext::Bmp),
    ("image/webp", Ext::Webp),
    ("audio/wav", Ext::Wav),
    ("audio/mpeg", Ext::Mp3),
    ("video/mp4", Ext::Mp4),
    ("video/vnd.avi", Ext::Avi),
    ("video/webm", Ext::Webm),
    ("video/mpeg", Ext::Mpeg),
    ("video/x-matroska", Ext::Mkv),
    ("video/quicktime", Ext::Mov),
    ("video/x-ms-wmv", Ext::Wmv),
];

impl Ext {
    pub const ALL: [Ext; 27] = [
        Ext::Txt,
        Ext::Csv,
        Ext::Pdf,
        Ext::Png,
        Ext::Jpeg,
        Ext::Mpeg,
        Ext::Webm,
        Ext::Wav,
        Ext::Mp4,
        Ext::Mp3,
        Ext::Avi,
        Ext::Mkv,
        Ext::Mov,
        Ext::Wmv,
        Ext::Gif,
        Ext::Jpg,
        Ext::Tiff,
        Ext::Tif,
        Ext::Bmp,
        Ext::Jp2,
        Ext::Dib,
        Ext::Pgm,
        Ext::Ppm,
        Ext::Pnm,
        Ext::Ras,
        Ext::Hdr,
        Ext::Webp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ext::Txt => "txt",
            Ext::Csv => "csv",
            Ext::Pdf => "pdf",
            Ext::Png => "png",
            Ext::Jpeg => "jpeg",
            Ext::Mpeg => "mpeg",
            Ext::Webm => "webm",
            Ext::Wav => "wav",
            Ext::Mp4 => "mp4",
            Ext::Mp3 => "mp3",
            Ext::Avi => "avi",
            Ext::Mkv => "mkv",
            Ext::Mov => "mov",
            Ext::Wmv => "wmv",
            Ext::Gif => "gif",
            Ext::Jpg => "jpg",
            Ext::Tiff => "tiff",
            Ext::Tif => "tif",
            Ext::Bmp => "bmp",
            Ext::Jp2 => "jp2",
            Ext::Dib => "dib",
            Ext::Pgm => "pgm",
            Ext::Ppm => "ppm",
            Ext::Pnm => "pnm",
            Ext::Ras => "ras",
            Ext::Hdr => "hdr",
            Ext::Webp => "webp",
        }
    }

    /// Canonical mimetype for this extension, if it has one
    pub fn mimetype(&self) -> Option<&'static str> {
        MIMETYPES
            .iter()
            .find(|(_, ext)| ext == self)
            .map(|(mime, _)| *mime)
    }

    /// Canonical extension for a mimetype
    pub fn from_mimetype(mimetype: &str) -> Option<Ext> {
        MIMETYPES
            .iter()
            .find(|(mime, _)| *mime == mimetype)
            .map(|(_, ext)| *ext)
    }
}

impl fmt::Display for Ext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ext::ALL
            .iter()
            .copied()
            .find(|ext| ext.as_str() == s)
            .ok_or_else(|| format!("unsupported extension '{}'", s))
    }
}

/// Extensions offered by the default image storage picker
pub const IMAGE_PICKER_EXTS: &[Ext] = &[Ext::Png, Ext::Jpg, Ext::Jpeg];

/// Extensions offered by the default video storage picker
pub const VIDEO_PICKER_EXTS: &[Ext] = &[
    Ext::Mpeg,
    Ext::Webm,
    Ext::Mp4,
    Ext::Avi,
    Ext::Mkv,
    Ext::Mov,
    Ext::Wmv,
];

/// Extensions offered by the default audio storage picker
pub const AUDIO_PICKER_EXTS: &[Ext] = &[Ext::Wav, Ext::Mp3];

/// Extensions offered by the default PDF storage picker
pub const PDF_PICKER_EXTS: &[Ext] = &[Ext::Pdf];
