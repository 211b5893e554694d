/*!
    Output file multiplexing for the transcoding pipeline.

    This crate handles the output side of the media pipeline. It takes encoded
    packets from the encoders and interleaves them into a container through an
    [`OutputFile`]. The container itself sits behind the [`ContainerWriter`]
    trait: [`MemoryContainer`] records everything it is asked to do, and the
    `ffmpeg` feature adds a libavformat backend.

    # Example

    ```ignore
    use ffmpeg_sink::{MemoryContainer, OutputFile, Profile, WrappingStatus};
    use ffmpeg_types::{AudioStreamInfo, ChannelLayout, CodecId, Rational, VideoStreamInfo};

    let mut output = OutputFile::new(MemoryContainer::new(), "out.mp4", None)?;
    let video = VideoStreamInfo::new(CodecId::H264, 1920, 1080, Rational::new(1, 25));
    output.add_video_stream(&video)?;
    output.add_audio_stream(&AudioStreamInfo::new(CodecId::Aac, 48000, ChannelLayout::Stereo))?;
    output.setup_wrapping(&Profile::format("mp4", "MP4", "mp4").with("movflags", "faststart"))?;

    output.begin_wrap()?;
    loop {
        let packet = next_packet();
        match output.wrap(&packet.data, packet.stream_index)? {
            WrappingStatus::Success => {}
            WrappingStatus::WaitingForData => {} // feed this stream again
        }
    }
    output.end_wrap()?;
    ```
*/

mod config;
mod container;
mod format;
mod memory;
mod options;
mod output;
mod profile;
mod stream;

#[cfg(feature = "ffmpeg")]
mod ffmpeg;

pub use config::{OptionPolicy, OutputConfig};
pub use container::{ContainerWriter, OptionError, PacketRef, StreamParameters};
pub use format::{FormatInfo, find_format, formats, guess_format, match_format};
pub use memory::{ContainerEvent, MemoryContainer, OptionSpec};
pub use options::{apply_options, replay_options};
pub use output::{OutputFile, WrapState, WrappingStatus};
pub use profile::{
    PROFILE_FORMAT, PROFILE_IDENTIFICATOR, PROFILE_IDENTIFICATOR_HUMAN, PROFILE_TYPE,
    PROFILE_TYPE_FORMAT, Profile, RESERVED_KEYS, check_format_profile, is_reserved_key,
};
pub use stream::OutputStream;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegContainer;

// Re-export the shared types so users only need one import
pub use ffmpeg_types::{
    AudioStreamInfo, ChannelLayout, CodecId, DataStreamInfo, Error, MediaType, Rational, Result,
    StreamDescription, VideoStreamInfo,
};
