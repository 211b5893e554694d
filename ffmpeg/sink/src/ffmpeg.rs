/*!
    FFmpeg container backend.
*/

use std::ffi::{CStr, CString, c_void};
use std::ptr;

use ffmpeg_next::{ffi, format::context::Output as OutputContext};
use tracing::debug;

use ffmpeg_types::{CodecId, Error, MediaType, PixelFormat, Rational, Result, SampleFormat};

use crate::container::{ContainerWriter, OptionError, PacketRef, StreamParameters};

/**
    A [`ContainerWriter`] backed by libavformat.

    The format context is allocated without touching the destination, so
    muxer options can be set before `open`. Streams, parameters and metadata
    are pushed into the context when the resource is opened.
*/
pub struct FfmpegContainer {
    output: Option<OutputContext>,
    filename: String,
    streams: Vec<StreamParameters>,
    end_ticks: Vec<i64>,
    metadata: Vec<(String, String)>,
    is_open: bool,
}

impl FfmpegContainer {
    pub fn new() -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        Ok(Self {
            output: None,
            filename: String::new(),
            streams: Vec::new(),
            end_ticks: Vec::new(),
            metadata: Vec::new(),
            is_open: false,
        })
    }

    fn output_mut(&mut self) -> Result<&mut OutputContext> {
        self.output
            .as_mut()
            .ok_or_else(|| Error::invalid_state("output format not set"))
    }

    fn oformat_field(
        &self,
        field: impl Fn(&ffi::AVOutputFormat) -> *const std::os::raw::c_char,
    ) -> Option<&str> {
        let output = self.output.as_ref()?;
        unsafe {
            let oformat = (*output.as_ptr()).oformat;
            if oformat.is_null() {
                return None;
            }
            let value = field(&*oformat);
            if value.is_null() {
                return None;
            }
            CStr::from_ptr(value).to_str().ok()
        }
    }

    /**
        Number of streams allocated in the format context.
    */
    fn context_stream_count(&self) -> usize {
        match self.output.as_ref() {
            Some(output) => unsafe { (*output.as_ptr()).nb_streams as usize },
            None => 0,
        }
    }

    /**
        Create the container streams that don't exist yet and fill in their
        codec parameters. Streams created by an earlier failed `open` are kept.
    */
    fn create_streams(&mut self) -> Result<()> {
        let existing = self.context_stream_count();
        let streams = self.streams.get(existing..).unwrap_or_default().to_vec();
        let output = self.output_mut()?;

        for params in &streams {
            unsafe {
                let stream = ffi::avformat_new_stream(output.as_mut_ptr(), ptr::null());
                if stream.is_null() {
                    return Err(Error::codec(format!(
                        "failed to add stream {}",
                        params.index
                    )));
                }

                let tb = params.effective_time_base();
                (*stream).time_base = ffi::AVRational {
                    num: tb.num,
                    den: tb.den,
                };

                let codecpar = (*stream).codecpar;
                match params.media_type() {
                    MediaType::Video => {
                        set_video_parameters(codecpar, params)?;
                        let rate = params.codec_time_base.invert();
                        if rate.is_valid() {
                            (*stream).avg_frame_rate = ffi::AVRational {
                                num: rate.num,
                                den: rate.den,
                            };
                        }
                    }
                    MediaType::Audio => set_audio_parameters(codecpar, params)?,
                    MediaType::Data => set_data_parameters(codecpar, params)?,
                }
            }
        }

        Ok(())
    }

    fn apply_metadata(&mut self, key: &str, value: &str) -> Result<()> {
        let key = cstring(key)?;
        let value = cstring(value)?;
        let output = self.output_mut()?;
        let ret = unsafe {
            ffi::av_dict_set(
                &mut (*output.as_mut_ptr()).metadata,
                key.as_ptr(),
                value.as_ptr(),
                0,
            )
        };
        if ret < 0 {
            return Err(Error::codec(ffmpeg_next::Error::from(ret).to_string()));
        }
        Ok(())
    }
}

impl ContainerWriter for FfmpegContainer {
    fn set_filename(&mut self, filename: &str) {
        self.filename = filename.to_string();
    }

    fn set_output_format(
        &mut self,
        filename: &str,
        format_name: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<()> {
        if self.is_open {
            return Err(Error::invalid_state("cannot change the format of an open output"));
        }

        let c_filename = cstring(filename)?;
        let c_format = format_name.map(cstring).transpose()?;
        let c_mime = mime_type.map(cstring).transpose()?;

        unsafe {
            let oformat = ffi::av_guess_format(
                c_format.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
                c_filename.as_ptr(),
                c_mime.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
            );
            if oformat.is_null() {
                return Err(Error::unsupported_format(format!(
                    "no output format for '{}' (format {:?})",
                    filename, format_name
                )));
            }

            let mut ctx = ptr::null_mut();
            let ret = ffi::avformat_alloc_output_context2(
                &mut ctx,
                oformat,
                ptr::null(),
                c_filename.as_ptr(),
            );
            if ret < 0 || ctx.is_null() {
                return Err(Error::codec(format!(
                    "failed to create output: {}",
                    ffmpeg_next::Error::from(ret)
                )));
            }

            if self.output.is_some() {
                debug!("replacing output format of {}", filename);
            }
            self.output = Some(OutputContext::wrap(ctx));
        }

        Ok(())
    }

    fn add_stream(&mut self, codec_id: CodecId) -> Result<&mut StreamParameters> {
        if self.is_open {
            return Err(Error::invalid_state("cannot add a stream to an open output"));
        }
        codec_id_to_ffmpeg(codec_id)?;

        let index = self.streams.len();
        self.streams.push(StreamParameters::new(index, codec_id));
        self.end_ticks.push(0);
        Ok(&mut self.streams[index])
    }

    fn stream_count(&self) -> usize {
        self.streams.len()
    }

    fn open(&mut self, filename: &str) -> Result<()> {
        if self.is_open {
            return Err(Error::resource_open(format!("'{}' is already open", filename)));
        }

        self.create_streams()?;
        for (key, value) in self.metadata.clone() {
            self.apply_metadata(&key, &value)?;
        }

        let c_filename = cstring(filename)?;
        let output = self.output_mut()?;
        unsafe {
            let ctx = output.as_mut_ptr();
            let nofile = ((*(*ctx).oformat).flags & ffi::AVFMT_NOFILE as i32) != 0;
            if !nofile {
                let ret = ffi::avio_open(
                    &mut (*ctx).pb,
                    c_filename.as_ptr(),
                    ffi::AVIO_FLAG_WRITE as i32,
                );
                if ret < 0 {
                    return Err(Error::resource_open(format!(
                        "{}: {}",
                        filename,
                        ffmpeg_next::Error::from(ret)
                    )));
                }
            }
        }

        self.is_open = true;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        self.output_mut()?
            .write_header()
            .map_err(|e| Error::codec(format!("failed to write header: {}", e)))
    }

    fn write_packet(&mut self, packet: &PacketRef<'_>) -> Result<()> {
        let index = packet.stream_index;
        let params = self
            .streams
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.streams.len()))?;

        let from = params.effective_time_base();
        let duration = packet
            .duration
            .unwrap_or_else(|| params.default_packet_duration(packet.data.len()));
        let start = self.end_ticks[index];

        let output = self
            .output
            .as_mut()
            .ok_or_else(|| Error::invalid_state("output format not set"))?;
        let to = output
            .stream(index)
            .map(|s| {
                let tb = s.time_base();
                Rational::new(tb.numerator(), tb.denominator())
            })
            .ok_or_else(|| Error::out_of_range(index, self.streams.len()))?;

        let mut ffmpeg_pkt = ffmpeg_next::Packet::copy(packet.data);
        ffmpeg_pkt.set_stream(index);
        ffmpeg_pkt.set_pts(Some(from.rescale(start, to)));
        ffmpeg_pkt.set_dts(Some(from.rescale(start, to)));
        ffmpeg_pkt.set_duration(from.rescale(duration, to));

        ffmpeg_pkt
            .write_interleaved(output)
            .map_err(|e| Error::codec(format!("failed to write packet: {}", e)))?;

        self.end_ticks[index] = start + duration.max(0);
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<()> {
        self.output_mut()?
            .write_trailer()
            .map_err(|e| Error::codec(format!("failed to write trailer: {}", e)))
    }

    fn close(&mut self) -> Result<()> {
        if !self.is_open {
            return Ok(());
        }
        self.is_open = false;

        if let Some(output) = self.output.as_mut() {
            unsafe {
                let ctx = output.as_mut_ptr();
                if !(*ctx).pb.is_null() {
                    let ret = ffi::avio_closep(&mut (*ctx).pb);
                    if ret < 0 {
                        return Err(Error::codec(format!(
                            "failed to close {}: {}",
                            self.filename,
                            ffmpeg_next::Error::from(ret)
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: &str) -> std::result::Result<(), OptionError> {
        let Some(output) = self.output.as_mut() else {
            return Err(OptionError::RequiresOpenResource);
        };
        let c_name = CString::new(name).map_err(|e| OptionError::invalid_value(e.to_string()))?;
        let c_value = CString::new(value).map_err(|e| OptionError::invalid_value(e.to_string()))?;

        let ret = unsafe {
            ffi::av_opt_set(
                output.as_mut_ptr() as *mut c_void,
                c_name.as_ptr(),
                c_value.as_ptr(),
                ffi::AV_OPT_SEARCH_CHILDREN as i32,
            )
        };
        if ret >= 0 {
            return Ok(());
        }

        match ffmpeg_next::Error::from(ret) {
            ffmpeg_next::Error::OptionNotFound => Err(OptionError::NotFound),
            other => Err(OptionError::invalid_value(other.to_string())),
        }
    }

    fn matches_format(&self, format: &str, filename: &str) -> bool {
        let (Ok(c_format), Ok(c_filename)) = (CString::new(format), CString::new(filename)) else {
            return false;
        };
        unsafe {
            let oformat = ffi::av_guess_format(c_format.as_ptr(), c_filename.as_ptr(), ptr::null());
            if oformat.is_null() || (*oformat).name.is_null() {
                return false;
            }
            CStr::from_ptr((*oformat).name).to_bytes() == format.as_bytes()
        }
    }

    fn add_metadata(&mut self, key: &str, value: &str) {
        if self.is_open {
            if let Err(err) = self.apply_metadata(key, value) {
                debug!("failed to add metadata {}: {}", key, err);
            }
        } else {
            self.metadata.push((key.to_string(), value.to_string()));
        }
    }

    fn format_name(&self) -> Option<&str> {
        self.oformat_field(|f| f.name)
    }

    fn format_long_name(&self) -> Option<&str> {
        self.oformat_field(|f| f.long_name)
    }

    fn format_mime_type(&self) -> Option<&str> {
        self.oformat_field(|f| f.mime_type)
    }

    fn stream_duration(&self, index: usize) -> Result<f64> {
        let params = self
            .streams
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.streams.len()))?;
        Ok(self.end_ticks[index] as f64 * params.effective_time_base().to_f64())
    }
}

impl std::fmt::Debug for FfmpegContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegContainer")
            .field("filename", &self.filename)
            .field("streams", &self.streams.len())
            .field("is_open", &self.is_open)
            .finish_non_exhaustive()
    }
}

fn cstring(value: &str) -> Result<CString> {
    CString::new(value).map_err(|e| Error::invalid_data(e.to_string()))
}

fn codec_id_to_ffmpeg(codec: CodecId) -> Result<ffi::AVCodecID> {
    use ffi::AVCodecID::*;

    match codec {
        CodecId::H264 => Ok(AV_CODEC_ID_H264),
        CodecId::H265 => Ok(AV_CODEC_ID_HEVC),
        CodecId::Vp9 => Ok(AV_CODEC_ID_VP9),
        CodecId::Av1 => Ok(AV_CODEC_ID_AV1),
        CodecId::Mpeg2Video => Ok(AV_CODEC_ID_MPEG2VIDEO),
        CodecId::ProRes => Ok(AV_CODEC_ID_PRORES),
        CodecId::DnxHd => Ok(AV_CODEC_ID_DNXHD),
        CodecId::RawVideo => Ok(AV_CODEC_ID_RAWVIDEO),
        CodecId::Aac => Ok(AV_CODEC_ID_AAC),
        CodecId::Opus => Ok(AV_CODEC_ID_OPUS),
        CodecId::Mp3 => Ok(AV_CODEC_ID_MP3),
        CodecId::Flac => Ok(AV_CODEC_ID_FLAC),
        CodecId::PcmS16le => Ok(AV_CODEC_ID_PCM_S16LE),
        CodecId::PcmS24le => Ok(AV_CODEC_ID_PCM_S24LE),
        CodecId::SubRip => Ok(AV_CODEC_ID_SUBRIP),
        CodecId::WebVtt => Ok(AV_CODEC_ID_WEBVTT),
        CodecId::BinData => Ok(AV_CODEC_ID_BIN_DATA),
        _ => Err(Error::unsupported_format(format!(
            "codec {} not supported for muxing",
            codec
        ))),
    }
}

/**
    Copy extradata into a padded buffer owned by the codec parameters.
*/
unsafe fn set_extradata(codecpar: *mut ffi::AVCodecParameters, extradata: &[u8]) {
    if extradata.is_empty() {
        return;
    }
    unsafe {
        // FFmpeg requires AV_INPUT_BUFFER_PADDING_SIZE zeroed bytes after the data
        let alloc_size = extradata.len() + ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize;
        let buf = ffi::av_mallocz(alloc_size) as *mut u8;
        if !buf.is_null() {
            ptr::copy_nonoverlapping(extradata.as_ptr(), buf, extradata.len());
            (*codecpar).extradata = buf;
            (*codecpar).extradata_size = extradata.len() as i32;
        }
    }
}

fn set_video_parameters(
    codecpar: *mut ffi::AVCodecParameters,
    params: &StreamParameters,
) -> Result<()> {
    let codec_id = codec_id_to_ffmpeg(params.codec_id)?;

    unsafe {
        (*codecpar).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_VIDEO;
        (*codecpar).codec_id = codec_id;
        (*codecpar).width = params.width as i32;
        (*codecpar).height = params.height as i32;

        (*codecpar).format = match params.pixel_format.unwrap_or_default() {
            PixelFormat::Yuv420p => ffi::AVPixelFormat::AV_PIX_FMT_YUV420P as i32,
            PixelFormat::Nv12 => ffi::AVPixelFormat::AV_PIX_FMT_NV12 as i32,
            PixelFormat::Yuv422p => ffi::AVPixelFormat::AV_PIX_FMT_YUV422P as i32,
            PixelFormat::Yuv422p10 => ffi::AVPixelFormat::AV_PIX_FMT_YUV422P10LE as i32,
            PixelFormat::Yuv444p => ffi::AVPixelFormat::AV_PIX_FMT_YUV444P as i32,
            PixelFormat::Yuv420p10 => ffi::AVPixelFormat::AV_PIX_FMT_YUV420P10LE as i32,
            PixelFormat::Rgb24 => ffi::AVPixelFormat::AV_PIX_FMT_RGB24 as i32,
            PixelFormat::Rgba => ffi::AVPixelFormat::AV_PIX_FMT_RGBA as i32,
            _ => ffi::AVPixelFormat::AV_PIX_FMT_YUV420P as i32,
        };

        if let Some(bitrate) = params.bitrate {
            (*codecpar).bit_rate = bitrate as i64;
        }
        if let Some(profile) = params.profile {
            (*codecpar).profile = profile;
        }
        if let Some(level) = params.level {
            (*codecpar).level = level;
        }

        set_extradata(codecpar, &params.extradata);
    }

    Ok(())
}

fn set_audio_parameters(
    codecpar: *mut ffi::AVCodecParameters,
    params: &StreamParameters,
) -> Result<()> {
    let codec_id = codec_id_to_ffmpeg(params.codec_id)?;

    unsafe {
        (*codecpar).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_AUDIO;
        (*codecpar).codec_id = codec_id;
        (*codecpar).sample_rate = params.sample_rate as i32;
        (*codecpar).frame_size = params.frame_size as i32;

        let channels = params.channels.map(|c| c.channels()).unwrap_or(2);
        ffi::av_channel_layout_default(&mut (*codecpar).ch_layout, channels as i32);

        (*codecpar).format = match params.sample_format.unwrap_or_default() {
            SampleFormat::S16 => ffi::AVSampleFormat::AV_SAMPLE_FMT_S16 as i32,
            SampleFormat::S32 => ffi::AVSampleFormat::AV_SAMPLE_FMT_S32 as i32,
            SampleFormat::F32 => ffi::AVSampleFormat::AV_SAMPLE_FMT_FLT as i32,
            SampleFormat::F32p => ffi::AVSampleFormat::AV_SAMPLE_FMT_FLTP as i32,
            _ => ffi::AVSampleFormat::AV_SAMPLE_FMT_FLTP as i32,
        };

        if let Some(bitrate) = params.bitrate {
            (*codecpar).bit_rate = bitrate as i64;
        }
        if let Some(profile) = params.profile {
            (*codecpar).profile = profile;
        }

        set_extradata(codecpar, &params.extradata);
    }

    Ok(())
}

fn set_data_parameters(
    codecpar: *mut ffi::AVCodecParameters,
    params: &StreamParameters,
) -> Result<()> {
    let codec_id = codec_id_to_ffmpeg(params.codec_id)?;

    unsafe {
        (*codecpar).codec_type = match params.codec_id {
            CodecId::SubRip | CodecId::WebVtt => ffi::AVMediaType::AVMEDIA_TYPE_SUBTITLE,
            _ => ffi::AVMediaType::AVMEDIA_TYPE_DATA,
        };
        (*codecpar).codec_id = codec_id;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(filename: &str) -> FfmpegContainer {
        let mut container = FfmpegContainer::new().unwrap();
        container.set_filename(filename);
        container.set_output_format(filename, None, None).unwrap();
        let params = container.add_stream(CodecId::H264).unwrap();
        params.width = 640;
        params.height = 360;
        params.codec_time_base = Rational::new(1, 25);
        params.time_base = Some(Rational::new(1, 25));
        container
    }

    #[test]
    fn failed_open_can_be_retried_without_duplicating_streams() {
        let filename = "/nonexistent-directory/out.mkv";
        let mut container = container(filename);

        assert!(container.open(filename).is_err());
        assert_eq!(container.context_stream_count(), 1);

        assert!(container.open(filename).is_err());
        assert_eq!(container.context_stream_count(), 1);
        assert_eq!(container.stream_count(), 1);
    }

    #[test]
    fn streams_added_after_a_failed_open_are_created() {
        let filename = "/nonexistent-directory/out.mkv";
        let mut container = container(filename);
        assert!(container.open(filename).is_err());

        container.add_stream(CodecId::Aac).unwrap().sample_rate = 48000;
        assert!(container.open(filename).is_err());
        assert_eq!(container.context_stream_count(), 2);
    }

    #[test]
    fn format_matching_asks_libavformat() {
        let container = container("out.mxf");
        assert!(container.matches_format("mxf_d10", "out.mxf"));
        assert!(container.matches_format("mp4", "out.m4v"));
        assert!(!container.matches_format("no_such_muxer", "out.mxf"));
    }
}
