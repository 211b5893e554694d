/*!
    Per-stream bookkeeping of an output file.
*/

use ffmpeg_types::MediaType;

/**
    A stream registered on an [`OutputFile`](crate::OutputFile).

    Tracks where the stream lives in the container and how much of it has
    been accepted so far.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct OutputStream {
    index: usize,
    media_type: MediaType,
    frame_count: u64,
    duration: f64,
}

impl OutputStream {
    pub(crate) fn new(index: usize, media_type: MediaType) -> Self {
        Self {
            index,
            media_type,
            frame_count: 0,
            duration: 0.0,
        }
    }

    /**
        Position of the stream in the container's stream table.
    */
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /**
        Number of packets accepted with a success status since wrapping began.
    */
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /**
        Seconds of media written to this stream, as reported by the container
        after the last write.
    */
    pub fn stream_duration(&self) -> f64 {
        self.duration
    }

    pub(crate) fn record_duration(&mut self, duration: f64) {
        // Never decreases.
        if duration > self.duration {
            self.duration = duration;
        }
    }

    pub(crate) fn count_frame(&mut self) {
        self.frame_count += 1;
    }

    pub(crate) fn reset_frame_count(&mut self) {
        self.frame_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_never_decreases() {
        let mut stream = OutputStream::new(0, MediaType::Audio);
        stream.record_duration(1.5);
        stream.record_duration(1.0);
        assert_eq!(stream.stream_duration(), 1.5);
    }

    #[test]
    fn frame_count_resets() {
        let mut stream = OutputStream::new(2, MediaType::Data);
        stream.count_frame();
        stream.count_frame();
        assert_eq!(stream.frame_count(), 2);
        stream.reset_frame_count();
        assert_eq!(stream.frame_count(), 0);
        assert_eq!(stream.index(), 2);
    }
}
