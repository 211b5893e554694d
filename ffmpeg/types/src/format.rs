/*!
    Pixel and sample format types.
*/

/**
    Video pixel formats.

    A subset of FFmpeg pixel formats, covering what the encoders we feed
    the muxer with actually produce.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp
    #[default]
    Yuv420p,
    /// Semi-planar YUV 4:2:0, 12bpp
    Nv12,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:2:2, 10-bit (ProRes, DNxHR)
    Yuv422p10,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit
    Yuv420p10,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed RGBA, 32bpp
    Rgba,
}

impl PixelFormat {
    /**
        Returns the FFmpeg name of the format.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Nv12 => "nv12",
            Self::Yuv422p => "yuv422p",
            Self::Yuv422p10 => "yuv422p10le",
            Self::Yuv444p => "yuv444p",
            Self::Yuv420p10 => "yuv420p10le",
            Self::Rgb24 => "rgb24",
            Self::Rgba => "rgba",
        }
    }
}

/**
    Audio sample formats.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SampleFormat {
    /// Signed 16-bit integer, interleaved
    #[default]
    S16,
    /// Signed 32-bit integer, interleaved
    S32,
    /// 32-bit float, interleaved
    F32,
    /// 32-bit float, planar (AAC encoder output)
    F32p,
}

impl SampleFormat {
    /**
        Returns the FFmpeg name of the format.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::F32 => "flt",
            Self::F32p => "fltp",
        }
    }

    /**
        Returns the number of bytes per sample.
    */
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16 => 2,
            Self::S32 | Self::F32 | Self::F32p => 4,
        }
    }
}

/**
    Audio channel layout.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChannelLayout {
    Mono,
    #[default]
    Stereo,
    /// 5.1 surround (FL, FR, FC, LFE, BL, BR)
    Surround5_1,
    /// 7.1 surround (FL, FR, FC, LFE, BL, BR, SL, SR)
    Surround7_1,
}

impl ChannelLayout {
    pub const fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround5_1 => 6,
            Self::Surround7_1 => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_names() {
        assert_eq!(PixelFormat::Yuv422p10.name(), "yuv422p10le");
        assert_eq!(PixelFormat::default(), PixelFormat::Yuv420p);
    }

    #[test]
    fn sample_format_sizes() {
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F32p.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F32p.name(), "fltp");
    }

    #[test]
    fn channel_layout_channels() {
        assert_eq!(ChannelLayout::Mono.channels(), 1);
        assert_eq!(ChannelLayout::Surround5_1.channels(), 6);
    }
}
