//! Audio container identification
//!
//! Recordings arrive either labelled with a MIME type (browser recorder,
//! file extension) or as bare bytes. The magic bytes win when they are
//! recognizable; the label is the fallback.
//!
//! Microphone capture yields raw PCM and skips container selection; the
//! preference list only applies to recordings made by an external recorder.

/// Recorder formats in order of preference
pub const PREFERRED_MIME_TYPES: [&str; 3] = [
    "audio/ogg;codecs=opus",
    "audio/webm;codecs=opus",
    "audio/webm",
];

/// First preferred MIME type the recorder supports
pub fn select_mime_type(is_supported: impl Fn(&str) -> bool) -> Option<&'static str> {
    PREFERRED_MIME_TYPES
        .iter()
        .copied()
        .find(|mime| is_supported(mime))
}

/// Audio container kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Ogg,
    WebM,
    Wav,
    Mp3,
    Flac,
    Mp4,
    Unknown,
}

impl Container {
    /// From a MIME type, ignoring parameters such as `;codecs=opus`
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "audio/ogg" | "application/ogg" | "audio/opus" => Container::Ogg,
            "audio/webm" | "video/webm" => Container::WebM,
            "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => Container::Wav,
            "audio/mpeg" | "audio/mp3" => Container::Mp3,
            "audio/flac" | "audio/x-flac" => Container::Flac,
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => Container::Mp4,
            _ => Container::Unknown,
        }
    }

    /// From a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "ogg" | "oga" | "opus" => Container::Ogg,
            "webm" | "weba" | "mka" => Container::WebM,
            "wav" | "wave" => Container::Wav,
            "mp3" => Container::Mp3,
            "flac" => Container::Flac,
            "m4a" | "mp4" | "aac" => Container::Mp4,
            _ => Container::Unknown,
        }
    }

    /// From leading magic bytes
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"OggS") {
            Container::Ogg
        } else if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            Container::WebM
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            Container::Wav
        } else if bytes.starts_with(b"fLaC") {
            Container::Flac
        } else if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
            Container::Mp4
        } else if bytes.starts_with(b"ID3")
            || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0)
        {
            Container::Mp3
        } else {
            Container::Unknown
        }
    }

    /// Magic bytes first, then the MIME label
    pub fn detect(bytes: &[u8], mime: Option<&str>) -> Self {
        match Container::sniff(bytes) {
            Container::Unknown => mime.map(Container::from_mime).unwrap_or(Container::Unknown),
            known => known,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Container::Ogg => "audio/ogg",
            Container::WebM => "audio/webm",
            Container::Wav => "audio/wav",
            Container::Mp3 => "audio/mpeg",
            Container::Flac => "audio/flac",
            Container::Mp4 => "audio/mp4",
            Container::Unknown => "application/octet-stream",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Container::Ogg => "ogg",
            Container::WebM => "webm",
            Container::Wav => "wav",
            Container::Mp3 => "mp3",
            Container::Flac => "flac",
            Container::Mp4 => "m4a",
            Container::Unknown => "bin",
        }
    }

    /// Label for an encoded clip: the preferred recorder MIME type matching
    /// this container, or the plain container type.
    pub fn recorder_mime(&self) -> &'static str {
        select_mime_type(|candidate| Container::from_mime(candidate) == *self)
            .unwrap_or_else(|| self.mime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_first_supported() {
        assert_eq!(select_mime_type(|_| true), Some("audio/ogg;codecs=opus"));
        assert_eq!(
            select_mime_type(|m| m.starts_with("audio/webm")),
            Some("audio/webm;codecs=opus")
        );
        assert_eq!(select_mime_type(|m| m == "audio/webm"), Some("audio/webm"));
        assert_eq!(select_mime_type(|_| false), None);
    }

    #[test]
    fn test_from_mime_ignores_parameters() {
        assert_eq!(Container::from_mime("audio/ogg;codecs=opus"), Container::Ogg);
        assert_eq!(Container::from_mime("audio/webm; codecs=opus"), Container::WebM);
        assert_eq!(Container::from_mime("AUDIO/WAV"), Container::Wav);
        assert_eq!(Container::from_mime("text/plain"), Container::Unknown);
    }

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(Container::sniff(b"OggS\0\x02"), Container::Ogg);
        assert_eq!(Container::sniff(&[0x1A, 0x45, 0xDF, 0xA3, 0x9F]), Container::WebM);
        assert_eq!(Container::sniff(b"RIFF\x24\0\0\0WAVEfmt "), Container::Wav);
        assert_eq!(Container::sniff(b"fLaC\0\0"), Container::Flac);
        assert_eq!(Container::sniff(b"ID3\x04"), Container::Mp3);
        assert_eq!(Container::sniff(b"\0\0\0\x20ftypM4A "), Container::Mp4);
        assert_eq!(Container::sniff(b"hello"), Container::Unknown);
    }

    #[test]
    fn test_detect_prefers_bytes_over_label() {
        assert_eq!(Container::detect(b"OggS....", Some("audio/webm")), Container::Ogg);
        assert_eq!(Container::detect(b"????", Some("audio/webm")), Container::WebM);
        assert_eq!(Container::detect(b"????", None), Container::Unknown);
    }

    #[test]
    fn test_recorder_mime() {
        assert_eq!(Container::Ogg.recorder_mime(), "audio/ogg;codecs=opus");
        assert_eq!(Container::WebM.recorder_mime(), "audio/webm;codecs=opus");
        assert_eq!(Container::Wav.recorder_mime(), "audio/wav");
    }
}
