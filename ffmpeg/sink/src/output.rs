/*!
    Output file: interleaves coded packets of several streams into one container.
*/

use std::fmt;

use tracing::{debug, error, info, warn};

use ffmpeg_types::{
    AudioStreamInfo, DataStreamInfo, Error, Rational, Result, StreamDescription, VideoStreamInfo,
};

use crate::config::OutputConfig;
use crate::container::{ContainerWriter, PacketRef, StreamParameters};
use crate::options::{apply_options, replay_options};
use crate::profile::{Profile, check_format_profile};
use crate::stream::OutputStream;

/// Largest denominator allowed when reducing time bases.
const MAX_TIME_BASE_DEN: i64 = i32::MAX as i64;

/**
    Lifecycle state of an [`OutputFile`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapState {
    /// Streams, metadata and options may be set up.
    Configured,
    /// The resource is open and the header written; packets may be wrapped.
    Open,
    /// The trailer is written and the resource closed.
    Closed,
}

impl fmt::Display for WrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configured => "configured",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/**
    Outcome of wrapping one packet.
*/
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrappingStatus {
    /// The packet was written and counted.
    Success,
    /// The packet was written, but its stream is now behind the furthest
    /// stream. Feed this stream again before the others.
    WaitingForData,
}

/**
    An output file being wrapped.

    Owns the container backend for its whole lifetime. Streams are
    registered while [`Configured`](WrapState::Configured), then
    [`begin_wrap`](Self::begin_wrap) opens the resource, packets go through
    [`wrap`](Self::wrap) and [`end_wrap`](Self::end_wrap) finalizes the file.

    Every wrap reports whether the stream that received data is behind the
    furthest stream so far. A scheduler can alternate between encoders using
    only that status.
*/
pub struct OutputFile<C: ContainerWriter> {
    container: C,
    filename: String,
    streams: Vec<OutputStream>,
    /// Largest stream duration seen on an accepted packet.
    previous_duration: f64,
    pending_options: Profile,
    failed_options: Vec<Error>,
    state: WrapState,
    config: OutputConfig,
}

impl<C: ContainerWriter> OutputFile<C> {
    /**
        Create an output file for `filename`, guessing the format from the
        name hint and the filename.
    */
    pub fn new(container: C, filename: &str, format_name: Option<&str>) -> Result<Self> {
        Self::with_config(container, filename, format_name, OutputConfig::default())
    }

    pub fn with_config(
        mut container: C,
        filename: &str,
        format_name: Option<&str>,
        config: OutputConfig,
    ) -> Result<Self> {
        container.set_filename(filename);
        container.set_output_format(filename, format_name, config.mime_type.as_deref())?;

        Ok(Self {
            container,
            filename: filename.to_string(),
            streams: Vec::new(),
            previous_duration: 0.0,
            pending_options: Profile::new(),
            failed_options: Vec::new(),
            state: WrapState::Configured,
            config,
        })
    }

    /**
        Register a stream. Its index is the number of streams registered before it.
    */
    pub fn add_stream(&mut self, description: &StreamDescription) -> Result<&OutputStream> {
        self.expect_state(WrapState::Configured, "add a stream")?;

        let params = self.container.add_stream(description.codec_id())?;
        match description {
            StreamDescription::Video(info) => copy_video_fields(params, info),
            StreamDescription::Audio(info) => copy_audio_fields(params, info),
            StreamDescription::Data(info) => copy_data_fields(params, info),
        }
        let index = params.index;

        debug!(
            index,
            kind = %description.media_type(),
            codec = %description.codec_id(),
            "added output stream"
        );

        self.streams.push(OutputStream::new(index, description.media_type()));
        Ok(&self.streams[self.streams.len() - 1])
    }

    pub fn add_video_stream(&mut self, info: &VideoStreamInfo) -> Result<&OutputStream> {
        self.add_stream(&StreamDescription::Video(info.clone()))
    }

    pub fn add_audio_stream(&mut self, info: &AudioStreamInfo) -> Result<&OutputStream> {
        self.add_stream(&StreamDescription::Audio(info.clone()))
    }

    pub fn add_data_stream(&mut self, info: &DataStreamInfo) -> Result<&OutputStream> {
        self.add_stream(&StreamDescription::Data(info.clone()))
    }

    pub fn stream(&self, index: usize) -> Result<&OutputStream> {
        self.streams
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.streams.len()))
    }

    pub fn stream_mut(&mut self, index: usize) -> Result<&mut OutputStream> {
        let count = self.streams.len();
        self.streams
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, count))
    }

    pub fn streams(&self) -> &[OutputStream] {
        &self.streams
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /**
        Configure wrapping from a format profile.

        Validates the profile, checks its format against the filename, sets
        the format and applies the remaining options. Options the container
        refuses now are kept and retried by [`begin_wrap`](Self::begin_wrap).
    */
    pub fn setup_wrapping(&mut self, profile: &Profile) -> Result<()> {
        self.expect_state(WrapState::Configured, "set up wrapping")?;

        if let Err(err) = check_format_profile(profile) {
            error!("invalid format profile to setup wrapping: {}", err);
            return Err(err);
        }

        if !profile.is_empty() {
            info!("setup wrapping with:\n{}", profile);
        }

        let format = profile.format_name().unwrap_or_default();
        if !self.container.matches_format(format, &self.filename) {
            return Err(Error::format_mismatch(format, &self.filename));
        }

        self.container.set_output_format(
            &self.filename,
            Some(format),
            self.config.mime_type.as_deref(),
        )?;

        apply_options(
            &mut self.container,
            profile.options(),
            self.config.option_policy,
            &mut self.pending_options,
        )?;

        Ok(())
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) -> Result<()> {
        if self.state == WrapState::Closed {
            return Err(Error::invalid_state("cannot add metadata to a closed output file"));
        }
        self.container.add_metadata(key, value);
        Ok(())
    }

    pub fn add_metadata_list<K, V>(&mut self, entries: &[(K, V)]) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in entries {
            self.add_metadata(key.as_ref(), value.as_ref())?;
        }
        Ok(())
    }

    /**
        Open the resource, write the header and replay deferred options.

        Options that still fail are logged and listed by
        [`failed_options`](Self::failed_options). On error the file stays
        configured and nothing is left open.
    */
    pub fn begin_wrap(&mut self) -> Result<()> {
        self.expect_state(WrapState::Configured, "begin wrapping")?;
        if self.streams.is_empty() {
            return Err(Error::invalid_state("cannot begin wrapping without streams"));
        }

        debug!("begin wrap of {}", self.filename);

        self.container.open(&self.filename).map_err(|err| match err {
            Error::ResourceOpenFailed(_) => err,
            other => Error::resource_open(format!("{}: {}", self.filename, other)),
        })?;

        if let Err(err) = self.container.write_header() {
            if let Err(close_err) = self.container.close() {
                warn!("failed to close {} after header error: {}", self.filename, close_err);
            }
            return Err(Error::resource_open(format!(
                "failed to write header of {}: {}",
                self.filename, err
            )));
        }

        self.failed_options = replay_options(&mut self.container, &self.pending_options);

        for stream in &mut self.streams {
            stream.reset_frame_count();
        }
        self.previous_duration = 0.0;
        self.state = WrapState::Open;

        Ok(())
    }

    /**
        Write one coded packet to the stream at `stream_index`.

        Empty data is accepted without writing anything. Otherwise the packet
        is written and the status tells whether the stream is now behind the
        furthest stream ([`WaitingForData`](WrappingStatus::WaitingForData)).
    */
    pub fn wrap(&mut self, data: &[u8], stream_index: usize) -> Result<WrappingStatus> {
        self.wrap_packet(PacketRef::new(stream_index, data))
    }

    /**
        Like [`wrap`](Self::wrap), with an explicit packet duration in the
        stream's time base.
    */
    pub fn wrap_with_duration(
        &mut self,
        data: &[u8],
        stream_index: usize,
        duration: i64,
    ) -> Result<WrappingStatus> {
        self.wrap_packet(PacketRef::new(stream_index, data).with_duration(duration))
    }

    fn wrap_packet(&mut self, packet: PacketRef<'_>) -> Result<WrappingStatus> {
        self.expect_state(WrapState::Open, "wrap")?;

        if packet.data.is_empty() {
            return Ok(WrappingStatus::Success);
        }

        let index = packet.stream_index;
        let frame = self.stream(index)?.frame_count();

        debug!(
            "wrap on stream {} ({} bytes for frame {})",
            index,
            packet.data.len(),
            frame
        );

        self.container.write_packet(&packet)?;

        let current = self.container.stream_duration(index)?;
        let stream = &mut self.streams[index];
        stream.record_duration(current);

        // A stream strictly behind the previous one waits for more data.
        if current < self.previous_duration {
            return Ok(WrappingStatus::WaitingForData);
        }

        self.previous_duration = current;
        stream.count_frame();

        Ok(WrappingStatus::Success)
    }

    /**
        Write the trailer and close the resource.

        The file is closed even if the trailer fails; the trailer error is
        returned afterwards.
    */
    pub fn end_wrap(&mut self) -> Result<()> {
        self.expect_state(WrapState::Open, "end wrapping")?;

        debug!("end wrap of {}", self.filename);

        let trailer = self.container.write_trailer();
        let close = self.container.close();
        self.state = WrapState::Closed;

        trailer?;
        close
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn format_name(&self) -> &str {
        self.container.format_name().unwrap_or_else(|| {
            warn!("unknown muxer format name of '{}'", self.filename);
            ""
        })
    }

    pub fn format_long_name(&self) -> &str {
        self.container.format_long_name().unwrap_or_else(|| {
            warn!("unknown muxer format long name of '{}'", self.filename);
            ""
        })
    }

    pub fn format_mime_type(&self) -> &str {
        self.container.format_mime_type().unwrap_or_else(|| {
            warn!("unknown muxer format mime type of '{}'", self.filename);
            ""
        })
    }

    pub fn state(&self) -> WrapState {
        self.state
    }

    /**
        The largest stream duration, in seconds, reached by an accepted packet.
    */
    pub fn pacing_watermark(&self) -> f64 {
        self.previous_duration
    }

    /**
        Options waiting to be applied when wrapping begins.
    */
    pub fn pending_options(&self) -> &Profile {
        &self.pending_options
    }

    /**
        Deferred options that could not be applied by the last `begin_wrap`.
    */
    pub fn failed_options(&self) -> &[Error] {
        &self.failed_options
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    fn expect_state(&self, expected: WrapState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::invalid_state(format!(
                "cannot {} while the output file is {}",
                action, self.state
            )));
        }
        Ok(())
    }
}

fn copy_video_fields(params: &mut StreamParameters, info: &VideoStreamInfo) {
    params.width = info.width;
    params.height = info.height;
    params.pixel_format = Some(info.pixel_format);
    params.bitrate = info.bitrate;
    params.profile = info.profile;
    params.level = info.level;
    params.extradata = info.extradata.clone().unwrap_or_default();

    // Fold ticks per frame into the time base so the frame rate stays coherent,
    // on both the codec and the container side.
    params.codec_time_base = Rational::reduce(
        info.time_base.num as i64 * info.ticks_per_frame.max(1) as i64,
        info.time_base.den as i64,
        MAX_TIME_BASE_DEN,
    );
    params.time_base = Some(params.codec_time_base);
}

fn copy_audio_fields(params: &mut StreamParameters, info: &AudioStreamInfo) {
    params.sample_rate = info.sample_rate;
    params.channels = Some(info.channels);
    params.sample_format = Some(info.sample_format);
    params.frame_size = info.frame_size.unwrap_or(0);
    params.bitrate = info.bitrate;
    params.profile = info.profile;
    params.extradata = info.extradata.clone().unwrap_or_default();

    params.codec_time_base = Rational::reduce(
        info.time_base.num as i64,
        info.time_base.den as i64,
        MAX_TIME_BASE_DEN,
    );
}

fn copy_data_fields(params: &mut StreamParameters, info: &DataStreamInfo) {
    if let Some(tb) = info.time_base {
        params.codec_time_base = Rational::reduce(tb.num as i64, tb.den as i64, MAX_TIME_BASE_DEN);
    }
}

impl<C: ContainerWriter> Drop for OutputFile<C> {
    fn drop(&mut self) {
        if self.state == WrapState::Open {
            warn!("{} dropped while open, closing without trailer", self.filename);
            if let Err(err) = self.container.close() {
                warn!("failed to close {}: {}", self.filename, err);
            }
        }
    }
}

impl<C: ContainerWriter> fmt::Debug for OutputFile<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputFile")
            .field("filename", &self.filename)
            .field("state", &self.state)
            .field("streams", &self.streams)
            .field("pacing_watermark", &self.previous_duration)
            .field("pending_options", &self.pending_options.len())
            .finish_non_exhaustive()
    }
}
