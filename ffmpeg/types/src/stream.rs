/*!
    Stream description types.

    These describe the coded output of an encoder: everything a muxer needs
    to declare a stream in a container, without the encoder itself.
*/

use crate::{ChannelLayout, CodecId, MediaType, PixelFormat, Rational, SampleFormat};

/**
    Description of a coded video stream.
*/
#[derive(Clone, Debug)]
pub struct VideoStreamInfo {
    /// Codec used.
    pub codec_id: CodecId,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub pixel_format: PixelFormat,
    /// Encoder time base (usually the inverse of the frame rate).
    pub time_base: Rational,
    /// Number of time base ticks per frame (2 for some interlaced codecs).
    pub ticks_per_frame: u32,
    /// Codec extradata (SPS/PPS for H.264, VPS/SPS/PPS for H.265, etc.).
    pub extradata: Option<Vec<u8>>,
    /// Bitrate in bits per second (if known).
    pub bitrate: Option<u64>,
    /// Codec profile (codec-specific value, e.g., H.264 High Profile).
    pub profile: Option<i32>,
    /// Codec level (codec-specific value, e.g., H.264 Level 4.1).
    pub level: Option<i32>,
}

impl VideoStreamInfo {
    /**
        Describe a video stream with one tick per frame and no optional fields.
    */
    pub fn new(codec_id: CodecId, width: u32, height: u32, time_base: Rational) -> Self {
        Self {
            codec_id,
            width,
            height,
            pixel_format: PixelFormat::default(),
            time_base,
            ticks_per_frame: 1,
            extradata: None,
            bitrate: None,
            profile: None,
            level: None,
        }
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_ticks_per_frame(mut self, ticks_per_frame: u32) -> Self {
        self.ticks_per_frame = ticks_per_frame;
        self
    }

    pub fn with_extradata(mut self, extradata: impl Into<Vec<u8>>) -> Self {
        self.extradata = Some(extradata.into());
        self
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    pub fn with_profile(mut self, profile: i32, level: Option<i32>) -> Self {
        self.profile = Some(profile);
        self.level = level;
        self
    }

    /**
        Returns the nominal frame rate derived from the time base and ticks
        per frame, if the time base is valid.
    */
    pub fn frame_rate(&self) -> Option<Rational> {
        if self.time_base.num == 0 || !self.time_base.is_valid() {
            return None;
        }
        Some(Rational::reduce(
            self.time_base.den as i64,
            self.time_base.num as i64 * self.ticks_per_frame.max(1) as i64,
            i32::MAX as i64,
        ))
    }
}

/**
    Description of a coded audio stream.
*/
#[derive(Clone, Debug)]
pub struct AudioStreamInfo {
    /// Codec used.
    pub codec_id: CodecId,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Sample format.
    pub sample_format: SampleFormat,
    /// Samples per coded frame. `None` for codecs with variable frame sizes.
    pub frame_size: Option<u32>,
    /// Encoder time base (usually `1/sample_rate`).
    pub time_base: Rational,
    /// Codec extradata (AudioSpecificConfig for AAC, etc.).
    pub extradata: Option<Vec<u8>>,
    /// Bitrate in bits per second (if known).
    pub bitrate: Option<u64>,
    /// Codec profile (codec-specific value, e.g., AAC LC, HE-AAC).
    pub profile: Option<i32>,
}

impl AudioStreamInfo {
    /**
        Describe an audio stream whose time base is `1/sample_rate`.
    */
    pub fn new(codec_id: CodecId, sample_rate: u32, channels: ChannelLayout) -> Self {
        Self {
            codec_id,
            sample_rate,
            channels,
            sample_format: SampleFormat::default(),
            frame_size: None,
            time_base: Rational::new(1, sample_rate as i32),
            extradata: None,
            bitrate: None,
            profile: None,
        }
    }

    pub fn with_sample_format(mut self, sample_format: SampleFormat) -> Self {
        self.sample_format = sample_format;
        self
    }

    pub fn with_frame_size(mut self, frame_size: u32) -> Self {
        self.frame_size = Some(frame_size);
        self
    }

    pub fn with_extradata(mut self, extradata: impl Into<Vec<u8>>) -> Self {
        self.extradata = Some(extradata.into());
        self
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.channels()
    }
}

/**
    Description of a data or subtitle stream.
*/
#[derive(Clone, Debug)]
pub struct DataStreamInfo {
    /// Codec used.
    pub codec_id: CodecId,
    /// Time base of the stream, when the producer has one.
    pub time_base: Option<Rational>,
}

impl DataStreamInfo {
    pub fn new(codec_id: CodecId) -> Self {
        Self {
            codec_id,
            time_base: None,
        }
    }

    pub fn with_time_base(mut self, time_base: Rational) -> Self {
        self.time_base = Some(time_base);
        self
    }
}

/**
    A stream description of any kind, as handed to a muxer at registration.
*/
#[derive(Clone, Debug)]
pub enum StreamDescription {
    Video(VideoStreamInfo),
    Audio(AudioStreamInfo),
    Data(DataStreamInfo),
}

impl StreamDescription {
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Video(_) => MediaType::Video,
            Self::Audio(_) => MediaType::Audio,
            Self::Data(_) => MediaType::Data,
        }
    }

    pub fn codec_id(&self) -> CodecId {
        match self {
            Self::Video(info) => info.codec_id,
            Self::Audio(info) => info.codec_id,
            Self::Data(info) => info.codec_id,
        }
    }
}

impl From<VideoStreamInfo> for StreamDescription {
    fn from(info: VideoStreamInfo) -> Self {
        Self::Video(info)
    }
}

impl From<AudioStreamInfo> for StreamDescription {
    fn from(info: AudioStreamInfo) -> Self {
        Self::Audio(info)
    }
}

impl From<DataStreamInfo> for StreamDescription {
    fn from(info: DataStreamInfo) -> Self {
        Self::Data(info)
    }
}
