/*!
    Shared types for the ffmpeg crate ecosystem.

    This crate defines the vocabulary that crosses crate boundaries: time bases,
    codec identities, stream descriptions and the common error type. It has no
    dependency on FFmpeg, so consumers can describe streams and handle errors
    without pulling in FFmpeg bindings.
*/

mod codec;
mod error;
mod format;
mod rational;
mod stream;

pub use self::codec::{CodecId, MediaType};
pub use self::error::{Error, Result};
pub use self::format::{ChannelLayout, PixelFormat, SampleFormat};
pub use self::rational::Rational;
pub use self::stream::{AudioStreamInfo, DataStreamInfo, StreamDescription, VideoStreamInfo};
