/*!
    In-memory container backend.

    Records every call it receives instead of producing a file. Useful for
    dry runs of a wrapping setup and for testing code that drives a
    [`ContainerWriter`].
*/

use ffmpeg_types::{CodecId, Error, Result};

use crate::container::{ContainerWriter, OptionError, PacketRef, StreamParameters};
use crate::format::{FormatInfo, guess_format};

/**
    A call received by a [`MemoryContainer`].
*/
#[derive(Clone, Debug, PartialEq)]
pub enum ContainerEvent {
    StreamAdded { index: usize, codec_id: CodecId },
    FormatSet { name: &'static str },
    OptionAttempted { name: String, value: String, accepted: bool },
    Metadata { key: String, value: String },
    Opened { filename: String },
    HeaderWritten,
    Packet { stream_index: usize, size: usize, duration: i64 },
    TrailerWritten,
    Closed,
}

/**
    Declaration of an option a [`MemoryContainer`] accepts.
*/
#[derive(Clone, Debug)]
pub struct OptionSpec {
    name: String,
    requires_open: bool,
    validator: Option<fn(&str) -> bool>,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires_open: false,
            validator: None,
        }
    }

    /**
        The option can only be set once the resource is open.
    */
    pub fn requires_open(mut self) -> Self {
        self.requires_open = true;
        self
    }

    /**
        Reject values for which `validator` returns false.
    */
    pub fn with_validator(mut self, validator: fn(&str) -> bool) -> Self {
        self.validator = Some(validator);
        self
    }
}

/**
    A [`ContainerWriter`] that keeps everything in memory.

    Stream durations are the sum of the packet durations written to each
    stream. Failures of `open` and `write_header` can be injected.
*/
#[derive(Debug, Default)]
pub struct MemoryContainer {
    filename: String,
    format: Option<&'static FormatInfo>,
    streams: Vec<StreamParameters>,
    end_ticks: Vec<i64>,
    option_specs: Vec<OptionSpec>,
    options: Vec<(String, String)>,
    metadata: Vec<(String, String)>,
    events: Vec<ContainerEvent>,
    bytes_written: u64,
    is_open: bool,
    header_written: bool,
    trailer_written: bool,
    open_failure: Option<String>,
    header_failure: Option<String>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Declare an option the container accepts.
    */
    pub fn with_option(mut self, spec: OptionSpec) -> Self {
        self.option_specs.push(spec);
        self
    }

    /**
        Make `open` fail with the given message.
    */
    pub fn fail_open(mut self, message: impl Into<String>) -> Self {
        self.open_failure = Some(message.into());
        self
    }

    /**
        Make `write_header` fail with the given message.
    */
    pub fn fail_header(mut self, message: impl Into<String>) -> Self {
        self.header_failure = Some(message.into());
        self
    }

    /**
        Drop injected failures so the next `open` and `write_header` succeed.
    */
    pub fn clear_failures(&mut self) {
        self.open_failure = None;
        self.header_failure = None;
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn events(&self) -> &[ContainerEvent] {
        &self.events
    }

    pub fn streams(&self) -> &[StreamParameters] {
        &self.streams
    }

    /**
        Value an option was last set to.
    */
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /**
        Every `set_option` call, accepted or not, as `(name, value)`.
    */
    pub fn option_attempts(&self) -> Vec<(&str, &str)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ContainerEvent::OptionAttempted { name, value, .. } => {
                    Some((name.as_str(), value.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /**
        Number of packets written to the stream at `index`.
    */
    pub fn packet_count(&self, index: usize) -> usize {
        self.events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    ContainerEvent::Packet { stream_index, .. } if *stream_index == index
                )
            })
            .count()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    pub fn trailer_written(&self) -> bool {
        self.trailer_written
    }

    fn stream(&self, index: usize) -> Result<&StreamParameters> {
        self.streams
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.streams.len()))
    }
}

impl ContainerWriter for MemoryContainer {
    fn set_filename(&mut self, filename: &str) {
        self.filename = filename.to_string();
    }

    fn set_output_format(
        &mut self,
        filename: &str,
        format_name: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<()> {
        let format = guess_format(filename, format_name, mime_type).ok_or_else(|| {
            Error::unsupported_format(format!(
                "no output format for '{}' (format {:?}, mime type {:?})",
                filename, format_name, mime_type
            ))
        })?;
        self.format = Some(format);
        self.events.push(ContainerEvent::FormatSet { name: format.name });
        Ok(())
    }

    fn add_stream(&mut self, codec_id: CodecId) -> Result<&mut StreamParameters> {
        if self.header_written {
            return Err(Error::invalid_state("cannot add a stream after the header"));
        }

        let index = self.streams.len();
        self.streams.push(StreamParameters::new(index, codec_id));
        self.end_ticks.push(0);
        self.events.push(ContainerEvent::StreamAdded { index, codec_id });

        Ok(&mut self.streams[index])
    }

    fn stream_count(&self) -> usize {
        self.streams.len()
    }

    fn open(&mut self, filename: &str) -> Result<()> {
        if self.is_open {
            return Err(Error::resource_open(format!("'{}' is already open", filename)));
        }
        if let Some(message) = &self.open_failure {
            return Err(Error::resource_open(format!("{}: {}", filename, message)));
        }

        self.is_open = true;
        self.events.push(ContainerEvent::Opened {
            filename: filename.to_string(),
        });
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        if !self.is_open {
            return Err(Error::invalid_state("header written before open"));
        }
        if let Some(message) = &self.header_failure {
            return Err(Error::codec(format!("failed to write header: {}", message)));
        }

        self.header_written = true;
        self.events.push(ContainerEvent::HeaderWritten);
        Ok(())
    }

    fn write_packet(&mut self, packet: &PacketRef<'_>) -> Result<()> {
        if !self.header_written || self.trailer_written {
            return Err(Error::invalid_state("packet written outside of header and trailer"));
        }

        let params = self.stream(packet.stream_index)?;
        let duration = packet
            .duration
            .unwrap_or_else(|| params.default_packet_duration(packet.data.len()));

        self.end_ticks[packet.stream_index] += duration.max(0);
        self.bytes_written += packet.data.len() as u64;
        self.events.push(ContainerEvent::Packet {
            stream_index: packet.stream_index,
            size: packet.data.len(),
            duration,
        });
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<()> {
        if !self.header_written {
            return Err(Error::invalid_state("trailer written before header"));
        }

        self.trailer_written = true;
        self.events.push(ContainerEvent::TrailerWritten);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.is_open {
            self.is_open = false;
            self.events.push(ContainerEvent::Closed);
        }
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: &str) -> std::result::Result<(), OptionError> {
        let result = match self.option_specs.iter().find(|spec| spec.name == name) {
            None => Err(OptionError::NotFound),
            Some(spec) if spec.requires_open && !self.is_open => {
                Err(OptionError::RequiresOpenResource)
            }
            Some(spec) if spec.validator.is_some_and(|valid| !valid(value)) => {
                Err(OptionError::invalid_value(format!("'{}' rejected by {}", value, name)))
            }
            Some(_) => Ok(()),
        };

        if result.is_ok() {
            self.options.push((name.to_string(), value.to_string()));
        }
        self.events.push(ContainerEvent::OptionAttempted {
            name: name.to_string(),
            value: value.to_string(),
            accepted: result.is_ok(),
        });

        result
    }

    fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.push((key.to_string(), value.to_string()));
        self.events.push(ContainerEvent::Metadata {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    fn format_name(&self) -> Option<&str> {
        self.format.map(|f| f.name)
    }

    fn format_long_name(&self) -> Option<&str> {
        self.format.map(|f| f.long_name)
    }

    fn format_mime_type(&self) -> Option<&str> {
        self.format.and_then(|f| f.mime_type)
    }

    fn stream_duration(&self, index: usize) -> Result<f64> {
        let params = self.stream(index)?;
        Ok(self.end_ticks[index] as f64 * params.effective_time_base().to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_types::Rational;

    fn opened() -> MemoryContainer {
        let mut container = MemoryContainer::new();
        container.set_output_format("out.mkv", None, None).unwrap();
        let params = container.add_stream(CodecId::H264).unwrap();
        params.codec_time_base = Rational::new(1, 25);
        params.time_base = Some(Rational::new(1, 25));
        container.open("out.mkv").unwrap();
        container.write_header().unwrap();
        container
    }

    #[test]
    fn format_identity_from_table() {
        let mut container = MemoryContainer::new();
        assert_eq!(container.format_name(), None);
        container.set_output_format("out.mov", None, None).unwrap();
        assert_eq!(container.format_name(), Some("mov"));
        assert_eq!(container.format_mime_type(), Some("video/quicktime"));
        assert!(container.set_output_format("out.xyz", None, None).is_err());
    }

    #[test]
    fn durations_accumulate_per_stream() {
        let mut container = opened();
        for _ in 0..5 {
            container.write_packet(&PacketRef::new(0, &[0; 10])).unwrap();
        }
        assert!((container.stream_duration(0).unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(container.packet_count(0), 5);
        assert_eq!(container.bytes_written(), 50);
    }

    #[test]
    fn explicit_durations_win() {
        let mut container = opened();
        container
            .write_packet(&PacketRef::new(0, &[0; 10]).with_duration(25))
            .unwrap();
        assert!((container.stream_duration(0).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_stream_is_out_of_range() {
        let mut container = opened();
        let err = container.write_packet(&PacketRef::new(4, &[1])).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { index: 4, count: 1 }));
        assert!(container.stream_duration(4).is_err());
    }

    #[test]
    fn packets_need_a_header() {
        let mut container = MemoryContainer::new();
        container.add_stream(CodecId::Aac).unwrap();
        assert!(container.write_packet(&PacketRef::new(0, &[1])).is_err());
    }

    #[test]
    fn options_follow_their_declaration() {
        let mut container = MemoryContainer::new()
            .with_option(OptionSpec::new("late").requires_open())
            .with_option(OptionSpec::new("count").with_validator(|v| v.parse::<u8>().is_ok()));

        assert_eq!(container.set_option("nope", "1"), Err(OptionError::NotFound));
        assert_eq!(
            container.set_option("late", "1"),
            Err(OptionError::RequiresOpenResource)
        );
        assert!(matches!(
            container.set_option("count", "many"),
            Err(OptionError::InvalidValue { .. })
        ));
        assert_eq!(container.set_option("count", "3"), Ok(()));
        assert_eq!(container.option("count"), Some("3"));

        container.open("x.mp4").unwrap();
        assert_eq!(container.set_option("late", "1"), Ok(()));
        assert_eq!(container.option_attempts().len(), 5);
    }

    #[test]
    fn injected_failures() {
        let mut container = MemoryContainer::new().fail_open("disk full");
        assert!(matches!(
            container.open("out.mp4"),
            Err(Error::ResourceOpenFailed(_))
        ));
        assert!(!container.is_open());

        let mut container = MemoryContainer::new().fail_header("bad codec");
        container.open("out.mp4").unwrap();
        assert!(container.write_header().is_err());
        assert!(!container.header_written());
    }

    #[test]
    fn close_is_idempotent() {
        let mut container = opened();
        container.write_trailer().unwrap();
        container.close().unwrap();
        container.close().unwrap();
        let closes = container
            .events()
            .iter()
            .filter(|e| **e == ContainerEvent::Closed)
            .count();
        assert_eq!(closes, 1);
    }
}
