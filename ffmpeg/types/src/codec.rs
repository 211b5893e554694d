/*!
    Codec identities.
*/

use std::fmt;

/**
    Kind of media carried by a stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaType {
    Video,
    Audio,
    /// Data or subtitle tracks (timecode, captions, ancillary data).
    Data,
}

impl MediaType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
    Codec identifiers understood across the ecosystem.

    This is a subset of the codecs FFmpeg knows about, limited to those that
    commonly end up in the containers we write.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    // Video
    H264,
    H265,
    Vp9,
    Av1,
    Mpeg2Video,
    ProRes,
    DnxHd,
    RawVideo,
    // Audio
    Aac,
    Opus,
    Mp3,
    Flac,
    PcmS16le,
    PcmS24le,
    // Data / subtitles
    SubRip,
    WebVtt,
    Timecode,
    BinData,
}

impl CodecId {
    /**
        Returns the media type this codec produces.
    */
    pub const fn media_type(self) -> MediaType {
        match self {
            Self::H264
            | Self::H265
            | Self::Vp9
            | Self::Av1
            | Self::Mpeg2Video
            | Self::ProRes
            | Self::DnxHd
            | Self::RawVideo => MediaType::Video,
            Self::Aac | Self::Opus | Self::Mp3 | Self::Flac | Self::PcmS16le | Self::PcmS24le => {
                MediaType::Audio
            }
            Self::SubRip | Self::WebVtt | Self::Timecode | Self::BinData => MediaType::Data,
        }
    }

    /**
        Returns the FFmpeg short name of the codec.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::Mpeg2Video => "mpeg2video",
            Self::ProRes => "prores",
            Self::DnxHd => "dnxhd",
            Self::RawVideo => "rawvideo",
            Self::Aac => "aac",
            Self::Opus => "opus",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::PcmS16le => "pcm_s16le",
            Self::PcmS24le => "pcm_s24le",
            Self::SubRip => "subrip",
            Self::WebVtt => "webvtt",
            Self::Timecode => "timecode",
            Self::BinData => "bin_data",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_of_codecs() {
        assert_eq!(CodecId::H264.media_type(), MediaType::Video);
        assert_eq!(CodecId::PcmS24le.media_type(), MediaType::Audio);
        assert_eq!(CodecId::Timecode.media_type(), MediaType::Data);
    }

    #[test]
    fn codec_names_match_ffmpeg() {
        assert_eq!(CodecId::H265.to_string(), "hevc");
        assert_eq!(CodecId::PcmS16le.name(), "pcm_s16le");
    }
}
