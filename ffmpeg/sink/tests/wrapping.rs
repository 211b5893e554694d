use ffmpeg_sink::{
    AudioStreamInfo, ChannelLayout, CodecId, ContainerEvent, MemoryContainer, OptionSpec,
    OutputFile, Profile, Rational, VideoStreamInfo, WrapState, WrappingStatus,
};

const VIDEO_FRAME: f64 = 1.0 / 30.0;
const AUDIO_FRAME: f64 = 1024.0 / 48000.0;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn av_output(container: MemoryContainer) -> OutputFile<MemoryContainer> {
    let mut output = OutputFile::new(container, "out.mp4", None).unwrap();
    output
        .add_video_stream(&VideoStreamInfo::new(
            CodecId::H264,
            1280,
            720,
            Rational::new(1, 30),
        ))
        .unwrap();
    output
        .add_audio_stream(
            &AudioStreamInfo::new(CodecId::Aac, 48000, ChannelLayout::Stereo).with_frame_size(1024),
        )
        .unwrap();
    output
}

#[test]
fn status_driven_scheduler_interleaves_streams() {
    let mut output = av_output(MemoryContainer::new());
    output.begin_wrap().unwrap();

    let packet = [0u8; 64];
    let mut remaining = [30usize, 48];
    let mut current = 0;
    let mut waiting = [0u64; 2];

    while remaining.iter().any(|&n| n > 0) {
        if remaining[current] == 0 {
            current = 1 - current;
            continue;
        }

        let status = output.wrap(&packet, current).unwrap();
        remaining[current] -= 1;

        match status {
            WrappingStatus::Success => current = 1 - current,
            WrappingStatus::WaitingForData => waiting[current] += 1,
        }

        if remaining.iter().all(|&n| n > 0) {
            let video = output.stream(0).unwrap().stream_duration();
            let audio = output.stream(1).unwrap().stream_duration();
            assert!(
                (video - audio).abs() <= VIDEO_FRAME + 1e-9,
                "streams drifted apart: video {} audio {}",
                video,
                audio
            );
        }
    }

    output.end_wrap().unwrap();

    assert_eq!(output.state(), WrapState::Closed);
    assert!(approx(output.stream(0).unwrap().stream_duration(), 30.0 * VIDEO_FRAME));
    assert!(approx(output.stream(1).unwrap().stream_duration(), 48.0 * AUDIO_FRAME));

    // Video always leads by up to one frame, so only audio has to catch up.
    assert_eq!(output.stream(0).unwrap().frame_count(), 30);
    assert_eq!(output.stream(1).unwrap().frame_count(), 31);
    assert_eq!(waiting, [0, 17]);

    let container = output.container();
    assert_eq!(container.packet_count(0), 30);
    assert_eq!(container.packet_count(1), 48);
    assert_eq!(container.bytes_written(), 78 * 64);
    assert!(container.trailer_written());
    assert!(!container.is_open());
    assert_eq!(container.events().last(), Some(&ContainerEvent::Closed));
}

#[test]
fn profile_options_are_applied_in_two_phases() {
    let container = MemoryContainer::new()
        .with_option(OptionSpec::new("movflags"))
        .with_option(OptionSpec::new("write_tmcd").requires_open());
    let mut output = av_output(container);

    let profile = Profile::format("mp4-web", "MP4 for the web", "mp4")
        .with("movflags", "faststart")
        .with("write_tmcd", "0")
        .with("no_such_option", "1");
    output.setup_wrapping(&profile).unwrap();

    assert_eq!(output.container().option("movflags"), Some("faststart"));
    assert_eq!(output.pending_options().get("write_tmcd"), Some("0"));
    assert_eq!(output.pending_options().get("no_such_option"), Some("1"));

    output.add_metadata("title", "Two phases").unwrap();
    output.begin_wrap().unwrap();

    assert_eq!(output.container().option("write_tmcd"), Some("0"));
    assert_eq!(output.failed_options().len(), 1);
    assert_eq!(
        output.container().metadata(),
        &[("title".to_string(), "Two phases".to_string())]
    );
    assert_eq!(output.format_name(), "mp4");
    assert_eq!(output.format_mime_type(), "video/mp4");

    output.end_wrap().unwrap();
}

#[test]
fn ticks_per_frame_folds_into_the_time_base() {
    let mut output = OutputFile::new(MemoryContainer::new(), "film.mov", None).unwrap();
    output
        .add_video_stream(
            &VideoStreamInfo::new(CodecId::ProRes, 1920, 1080, Rational::new(1001, 60000))
                .with_ticks_per_frame(2),
        )
        .unwrap();

    let params = &output.container().streams()[0];
    assert_eq!(params.codec_time_base, Rational::new(1001, 30000));
    assert_eq!(params.time_base, Some(Rational::new(1001, 30000)));
}

#[test]
fn mismatched_profile_keeps_the_file_configured() {
    let mut output = av_output(MemoryContainer::new());

    let err = output
        .setup_wrapping(&Profile::format("mkv", "Matroska", "matroska"))
        .unwrap_err();

    assert!(matches!(err, ffmpeg_sink::Error::FormatMismatch { .. }));
    assert_eq!(output.state(), WrapState::Configured);
    assert_eq!(output.format_name(), "mp4");
}

#[test]
fn specialised_muxers_accept_their_family_extension() {
    let mut output = OutputFile::new(MemoryContainer::new(), "out.mxf", None).unwrap();
    output
        .add_video_stream(&VideoStreamInfo::new(
            CodecId::Mpeg2Video,
            720,
            608,
            Rational::new(1, 25),
        ))
        .unwrap();

    output
        .setup_wrapping(&Profile::format("d10", "D10", "mxf_d10"))
        .unwrap();
    assert_eq!(output.format_name(), "mxf_d10");

    let mut m4v = OutputFile::new(MemoryContainer::new(), "clip.m4v", None).unwrap();
    m4v.setup_wrapping(&Profile::format("mp4", "MP4", "mp4")).unwrap();
    assert_eq!(m4v.format_name(), "mp4");
}
