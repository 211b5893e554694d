/*!
    The contract between the output file and the backend that writes bytes.
*/

use thiserror::Error;

use ffmpeg_types::{ChannelLayout, CodecId, MediaType, PixelFormat, Rational, Result, SampleFormat};

use crate::format::match_format;

/**
    Why a format option could not be set.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// No option with this name exists on the muxer.
    #[error("option not found")]
    NotFound,

    /// The option exists but can only be set once the resource is open.
    #[error("option requires an open resource")]
    RequiresOpenResource,

    /// The option exists but rejected the value.
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
}

impl OptionError {
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }
}

/**
    Codec and timing fields of one destination stream.

    Returned mutably by [`ContainerWriter::add_stream`] so the caller can
    fill in what the container needs to describe the stream.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct StreamParameters {
    /// Position in the container's stream table.
    pub index: usize,
    pub codec_id: CodecId,
    pub width: u32,
    pub height: u32,
    pub pixel_format: Option<PixelFormat>,
    pub sample_rate: u32,
    pub channels: Option<ChannelLayout>,
    pub sample_format: Option<SampleFormat>,
    /// Samples per coded audio frame, 0 when variable or unknown.
    pub frame_size: u32,
    pub bitrate: Option<u64>,
    pub profile: Option<i32>,
    pub level: Option<i32>,
    pub extradata: Vec<u8>,
    /// Time base of the coded data.
    pub codec_time_base: Rational,
    /// Container-level time base. Left to the container when `None`.
    pub time_base: Option<Rational>,
}

impl StreamParameters {
    pub fn new(index: usize, codec_id: CodecId) -> Self {
        Self {
            index,
            codec_id,
            width: 0,
            height: 0,
            pixel_format: None,
            sample_rate: 0,
            channels: None,
            sample_format: None,
            frame_size: 0,
            bitrate: None,
            profile: None,
            level: None,
            extradata: Vec::new(),
            codec_time_base: Rational::new(0, 1),
            time_base: None,
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.codec_id.media_type()
    }

    /**
        The time base packet timestamps are expressed in: the container-level
        one when set, otherwise the codec time base, otherwise `1/sample_rate`
        for audio and `1/1000` as a last resort.
    */
    pub fn effective_time_base(&self) -> Rational {
        if let Some(tb) = self.time_base.filter(|tb| tb.num > 0 && tb.is_valid()) {
            return tb;
        }
        if self.codec_time_base.num > 0 && self.codec_time_base.is_valid() {
            return self.codec_time_base;
        }
        if self.sample_rate > 0 {
            return Rational::new(1, self.sample_rate as i32);
        }
        Rational::new(1, 1000)
    }

    /**
        Duration of a packet of `size` bytes, in [`effective_time_base`] ticks,
        for packets that do not carry one.

        Video packets last one codec tick. Audio packets last `frame_size`
        samples, or for PCM as many samples as the payload holds. Data packets
        have no implicit duration.

        [`effective_time_base`]: Self::effective_time_base
    */
    pub fn default_packet_duration(&self, size: usize) -> i64 {
        let tb = self.effective_time_base();
        match self.media_type() {
            MediaType::Video => {
                if self.codec_time_base.num > 0 && self.codec_time_base.is_valid() {
                    self.codec_time_base.rescale(1, tb)
                } else {
                    0
                }
            }
            MediaType::Audio => {
                if self.sample_rate == 0 {
                    return 0;
                }
                let samples = if self.frame_size > 0 {
                    self.frame_size as i64
                } else {
                    self.pcm_samples(size)
                };
                Rational::new(1, self.sample_rate as i32).rescale(samples, tb)
            }
            MediaType::Data => 0,
        }
    }

    fn pcm_samples(&self, size: usize) -> i64 {
        let sample_width = match self.codec_id {
            CodecId::PcmS24le => 3,
            CodecId::PcmS16le => 2,
            _ => return 0,
        };
        let channels = self.channels.map(|c| c.channels()).unwrap_or(1).max(1) as usize;
        (size / (sample_width * channels)) as i64
    }
}

/**
    A packet handed to the container.

    Borrows the caller's buffer for the duration of the write call only.
*/
#[derive(Clone, Copy, Debug)]
pub struct PacketRef<'a> {
    pub stream_index: usize,
    pub data: &'a [u8],
    /// Duration in the stream's effective time base. When `None` the
    /// container derives one from the stream parameters.
    pub duration: Option<i64>,
}

impl<'a> PacketRef<'a> {
    pub fn new(stream_index: usize, data: &'a [u8]) -> Self {
        Self {
            stream_index,
            data,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = Some(duration);
        self
    }
}

/**
    A container backend: owns the destination resource and turns streams,
    options and packets into an output file.

    Calls arrive in lifecycle order: streams, format and options while
    configured, then `open`, `write_header`, any number of `write_packet`,
    `write_trailer` and `close`.
*/
pub trait ContainerWriter {
    /// Set the destination filename or URL.
    fn set_filename(&mut self, filename: &str);

    /// Choose the output format from a name hint, the filename and a mime type hint.
    fn set_output_format(
        &mut self,
        filename: &str,
        format_name: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<()>;

    /// Allocate a new stream slot. The slot index is the previous stream count.
    fn add_stream(&mut self, codec_id: CodecId) -> Result<&mut StreamParameters>;

    fn stream_count(&self) -> usize;

    /// Open the destination for writing.
    fn open(&mut self, filename: &str) -> Result<()>;

    fn write_header(&mut self) -> Result<()>;

    fn write_packet(&mut self, packet: &PacketRef<'_>) -> Result<()>;

    fn write_trailer(&mut self) -> Result<()>;

    /// Release the destination. Safe to call on a resource that was never opened.
    fn close(&mut self) -> Result<()>;

    /// Set a named muxer option from its string form.
    fn set_option(&mut self, name: &str, value: &str) -> std::result::Result<(), OptionError>;

    /// Whether `format` names a muxer that can write `filename`.
    fn matches_format(&self, format: &str, filename: &str) -> bool {
        match_format(format, filename)
    }

    fn add_metadata(&mut self, key: &str, value: &str);

    fn format_name(&self) -> Option<&str>;

    fn format_long_name(&self) -> Option<&str>;

    fn format_mime_type(&self) -> Option<&str>;

    /// Seconds of media written so far to the stream at `index`.
    fn stream_duration(&self, index: usize) -> Result<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_packets_last_one_codec_tick() {
        let mut params = StreamParameters::new(0, CodecId::H264);
        params.codec_time_base = Rational::new(1, 25);
        params.time_base = Some(Rational::new(1, 25));
        assert_eq!(params.default_packet_duration(1000), 1);

        params.time_base = Some(Rational::new(1, 90000));
        assert_eq!(params.default_packet_duration(1000), 3600);
    }

    #[test]
    fn audio_packets_last_one_frame() {
        let mut params = StreamParameters::new(1, CodecId::Aac);
        params.sample_rate = 48000;
        params.frame_size = 1024;
        params.codec_time_base = Rational::new(1, 48000);
        assert_eq!(params.effective_time_base(), Rational::new(1, 48000));
        assert_eq!(params.default_packet_duration(300), 1024);
    }

    #[test]
    fn pcm_duration_follows_payload_size() {
        let mut params = StreamParameters::new(1, CodecId::PcmS24le);
        params.sample_rate = 48000;
        params.channels = Some(ChannelLayout::Stereo);
        params.codec_time_base = Rational::new(1, 48000);
        // 1920 samples * 2 channels * 3 bytes
        assert_eq!(params.default_packet_duration(11520), 1920);
    }

    #[test]
    fn data_packets_have_no_implicit_duration() {
        let params = StreamParameters::new(2, CodecId::Timecode);
        assert_eq!(params.default_packet_duration(4), 0);
        assert_eq!(params.effective_time_base(), Rational::new(1, 1000));
    }

    #[test]
    fn packet_ref_borrows_data() {
        let data = vec![1u8, 2, 3];
        let packet = PacketRef::new(0, &data).with_duration(5);
        assert_eq!(packet.data.len(), 3);
        assert_eq!(packet.duration, Some(5));
    }
}
