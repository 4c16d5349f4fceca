//! File delivery rules: asset types, link lifetimes, download filenames,
//! and parsing of legacy media-CDN URLs.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lifetime of a preview playback link.
pub const PREVIEW_URL_TTL: Duration = Duration::from_secs(30);

/// Lifetime of a master or stems download link.
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(30 * 60);

/// Used when a title sanitizes to nothing.
pub const FALLBACK_BASENAME: &str = "beat";

// ---------------------------------------------------------------------------
// Asset types
// ---------------------------------------------------------------------------

/// The deliverable files attached to a beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Preview,
    Master,
    Stems,
}

impl AssetType {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "preview" => Ok(Self::Preview),
            "master" => Ok(Self::Master),
            "stems" => Ok(Self::Stems),
            other => Err(CoreError::Validation(format!(
                "Invalid asset type '{other}'. Must be one of: preview, master, stems"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Master => "master",
            Self::Stems => "stems",
        }
    }

    /// Whether the asset is sold (requires a purchase or admin access).
    pub fn is_paid(self) -> bool {
        !matches!(self, Self::Preview)
    }

    /// Link lifetime for this asset type.
    pub fn url_ttl(self) -> Duration {
        match self {
            Self::Preview => PREVIEW_URL_TTL,
            Self::Master | Self::Stems => DOWNLOAD_URL_TTL,
        }
    }

    /// Extension used when the stored object does not carry one.
    pub fn default_extension(self) -> &'static str {
        match self {
            Self::Preview => "mp3",
            Self::Master => "wav",
            Self::Stems => "zip",
        }
    }

    /// Suffix appended to the title in the download filename.
    fn filename_suffix(self) -> &'static str {
        match self {
            Self::Preview => " (Preview)",
            Self::Master => "",
            Self::Stems => " (Stems)",
        }
    }
}

/// MIME type for a file extension (case-insensitive).
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "aiff" | "aif" => "audio/aiff",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Extension of the last path segment of a key or URL, if it has one.
pub fn extension_of(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let last = path.rsplit('/').next()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

// ---------------------------------------------------------------------------
// Download filenames
// ---------------------------------------------------------------------------

/// Download filename and headers derived from a beat title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadName {
    /// Original (possibly non-ASCII) filename including extension.
    pub filename: String,
    /// ASCII-only fallback used in the plain `filename=` parameter.
    pub ascii_filename: String,
    pub extension: String,
}

impl DownloadName {
    pub fn new(title: &str, asset: AssetType, extension: Option<&str>) -> Self {
        let extension = extension
            .unwrap_or_else(|| asset.default_extension())
            .to_ascii_lowercase();

        let title = title.trim();
        let title = if title.is_empty() { FALLBACK_BASENAME } else { title };
        let filename = format!("{title}{}.{extension}", asset.filename_suffix());

        let ascii_base = ascii_sanitize(title);
        let ascii_base = if ascii_base.is_empty() {
            FALLBACK_BASENAME.to_string()
        } else {
            ascii_base
        };
        let ascii_filename = format!("{ascii_base}{}.{extension}", asset.filename_suffix());

        Self {
            filename,
            ascii_filename,
            extension,
        }
    }

    /// `Content-Disposition` value forcing a download.
    ///
    /// Always carries the ASCII `filename=`; adds the RFC 5987 `filename*`
    /// parameter with the percent-encoded UTF-8 name.
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            self.ascii_filename,
            urlencoding::encode(&self.filename)
        )
    }

    pub fn content_type(&self) -> &'static str {
        content_type_for_extension(&self.extension)
    }
}

/// Reduce a title to printable ASCII safe inside a quoted header parameter.
///
/// Latin accented letters are transliterated to their base letter, other
/// non-ASCII characters and filesystem-hostile punctuation become `_`, and
/// runs of whitespace collapse to one space.
pub fn ascii_sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii() {
            match c {
                '"' | '\\' | '/' | ':' | '*' | '?' | '<' | '>' | '|' => out.push('_'),
                c if c.is_ascii_whitespace() => {
                    if !out.ends_with(' ') {
                        out.push(' ');
                    }
                }
                c if c.is_ascii_control() => out.push('_'),
                c => out.push(c),
            }
        } else if let Some(replacement) = transliterate(c) {
            out.push_str(replacement);
        } else if c.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push('_');
        }
    }
    out.trim().to_string()
}

fn transliterate(c: char) -> Option<&'static str> {
    let s = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ď' | 'Đ' | 'Ð' => "D",
        'ď' | 'đ' | 'ð' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ğ' => "G",
        'ğ' => "g",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => "I",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'Ł' => "L",
        'ł' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Š' | 'Ş' => "S",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'Ť' | 'Ţ' => "T",
        'ť' | 'ţ' => "t",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        'Þ' => "Th",
        'þ' => "th",
        '‘' | '’' | '‚' | '′' => "'",
        '“' | '”' | '„' | '″' => "'",
        '–' | '—' | '‐' => "-",
        '…' => "...",
        _ => return None,
    };
    Some(s)
}

// ---------------------------------------------------------------------------
// Legacy media-CDN URLs
// ---------------------------------------------------------------------------

/// Identifier of an asset on the media CDN, recovered from a delivery URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// `image`, `video`, or `raw` (audio is stored as `video`).
    pub resource_type: String,
    /// `upload`, `authenticated`, or `private`.
    pub delivery_type: String,
    /// Public id including folders, without version or extension.
    pub public_id: String,
    pub format: Option<String>,
}

static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+$").expect("version segment regex is valid"));

static DELIVERY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^/]+/[^/]+/(image|video|raw)/(upload|authenticated|private)/(.+)$")
        .expect("delivery url regex is valid")
});

/// Parse a media-CDN delivery URL of the form
/// `https://<host>/<cloud>/<resource_type>/<type>/[<transformations>/]v<version>/<public_id>.<ext>`.
///
/// When no version segment is present every remaining segment is taken as
/// part of the public id.
pub fn parse_media_url(url: &str) -> Result<MediaRef, CoreError> {
    let url = url.trim();
    let without_query = url.split(['?', '#']).next().unwrap_or(url);

    let caps = DELIVERY_URL.captures(without_query).ok_or_else(|| {
        CoreError::Validation(format!("Not a media delivery URL: '{url}'"))
    })?;

    let resource_type = caps[1].to_string();
    let delivery_type = caps[2].to_string();
    let segments: Vec<&str> = caps[3].split('/').filter(|s| !s.is_empty()).collect();

    let start = segments
        .iter()
        .position(|s| VERSION_SEGMENT.is_match(s))
        .map_or(0, |i| i + 1);
    let id_segments = &segments[start..];

    let (last, folders) = id_segments
        .split_last()
        .ok_or_else(|| CoreError::Validation(format!("Media URL has no public id: '{url}'")))?;

    let (name, format) = match last.rsplit_once('.') {
        // Raw assets keep their extension as part of the public id.
        Some(_) if resource_type == "raw" => (last.to_string(), extension_of(last).map(String::from)),
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_ascii_lowercase())),
        _ => (last.to_string(), None),
    };

    let public_id = if folders.is_empty() {
        name
    } else {
        format!("{}/{name}", folders.join("/"))
    };

    Ok(MediaRef {
        resource_type,
        delivery_type,
        public_id: urlencoding::decode(&public_id)
            .map(|s| s.into_owned())
            .unwrap_or(public_id),
        format,
    })
}
