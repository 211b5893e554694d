/*!
    Two-phase application of format options.

    Options are first tried against the container before it is opened. Those
    that fail are kept and replayed once the resource is open.
*/

use tracing::{info, warn};

use ffmpeg_types::{Error, Result};

use crate::config::OptionPolicy;
use crate::container::{ContainerWriter, OptionError};
use crate::profile::{Profile, is_reserved_key};

/**
    Apply options to a container that is not open yet.

    Options that fail are added to `pending` for [`replay_options`]. Under
    [`OptionPolicy::Strict`] only options that need an open resource are
    deferred; unknown options and rejected values fail the whole call and
    leave `pending` untouched. Reserved profile keys are skipped.

    Returns the number of options applied immediately.
*/
pub fn apply_options<'a, C, I>(
    container: &mut C,
    options: I,
    policy: OptionPolicy,
    pending: &mut Profile,
) -> Result<usize>
where
    C: ContainerWriter + ?Sized,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut applied = 0;
    let mut deferred = Vec::new();

    for (name, value) in options {
        if is_reserved_key(name) {
            continue;
        }

        match container.set_option(name, value) {
            Ok(()) => applied += 1,
            Err(OptionError::RequiresOpenResource) => {
                info!(
                    option = name,
                    "option needs an open output, deferred until wrapping begins"
                );
                deferred.push((name, value));
            }
            Err(err) if policy == OptionPolicy::Strict => {
                return Err(Error::configuration(format!(
                    "can't set option {name} to {value}: {err}"
                )));
            }
            Err(err) => {
                info!(option = name, reason = %err, "option will be set when wrapping begins");
                deferred.push((name, value));
            }
        }
    }

    for (name, value) in deferred {
        pending.insert(name, value);
    }

    Ok(applied)
}

/**
    Replay deferred options against an open container.

    Every option is tried once, in insertion order. Failures are logged and
    returned; they never stop the remaining options from being applied.
*/
pub fn replay_options<C>(container: &mut C, pending: &Profile) -> Vec<Error>
where
    C: ContainerWriter + ?Sized,
{
    let mut failures = Vec::new();

    for (name, value) in pending.iter() {
        if is_reserved_key(name) {
            continue;
        }

        if let Err(err) = container.set_option(name, value) {
            warn!("can't set option {} to {}: {}", name, value, err);
            failures.push(Error::OptionApplicationFailed {
                name: name.to_string(),
                value: value.to_string(),
                reason: err.to_string(),
            });
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::memory::{MemoryContainer, OptionSpec};
    use crate::profile::PROFILE_FORMAT;

    fn container() -> MemoryContainer {
        MemoryContainer::new()
            .with_option(OptionSpec::new("movflags"))
            .with_option(OptionSpec::new("write_tmcd").requires_open())
            .with_option(OptionSpec::new("packetsize").with_validator(|v| v.parse::<u32>().is_ok()))
    }

    #[test]
    fn settable_options_apply_immediately() {
        let mut container = container();
        let mut pending = Profile::new();
        let applied = apply_options(
            &mut container,
            [("movflags", "+faststart")],
            OptionPolicy::Lenient,
            &mut pending,
        )
        .unwrap();
        assert_eq!(applied, 1);
        assert!(pending.is_empty());
        assert_eq!(container.option("movflags"), Some("+faststart"));
    }

    #[test]
    fn lenient_policy_defers_every_failure() {
        let mut container = container();
        let mut pending = Profile::new();
        let applied = apply_options(
            &mut container,
            [("write_tmcd", "1"), ("bogus", "x"), ("packetsize", "big")],
            OptionPolicy::Lenient,
            &mut pending,
        )
        .unwrap();
        assert_eq!(applied, 0);
        let names: Vec<_> = pending.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["write_tmcd", "bogus", "packetsize"]);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_deferral_is_logged() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut container = container();
        let mut pending = Profile::new();
        tracing::subscriber::with_default(subscriber, || {
            apply_options(
                &mut container,
                [("write_tmcd", "1"), ("bogus", "x")],
                OptionPolicy::Lenient,
                &mut pending,
            )
            .unwrap();
        });

        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = logs.lines().filter(|l| l.contains("INFO")).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("write_tmcd"));
        assert!(lines[1].contains("bogus"));
    }

    #[test]
    fn strict_policy_rejects_unknown_options() {
        let mut container = container();
        let mut pending = Profile::new();
        let err = apply_options(
            &mut container,
            [("write_tmcd", "1"), ("bogus", "x")],
            OptionPolicy::Strict,
            &mut pending,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigurationInvalid(_)));
        assert!(pending.is_empty());
    }

    #[test]
    fn strict_policy_still_defers_open_only_options() {
        let mut container = container();
        let mut pending = Profile::new();
        apply_options(
            &mut container,
            [("write_tmcd", "1")],
            OptionPolicy::Strict,
            &mut pending,
        )
        .unwrap();
        assert_eq!(pending.get("write_tmcd"), Some("1"));
    }

    #[test]
    fn reserved_keys_never_reach_the_container() {
        let mut container = container();
        let mut pending = Profile::new();
        apply_options(
            &mut container,
            [(PROFILE_FORMAT, "mp4")],
            OptionPolicy::Lenient,
            &mut pending,
        )
        .unwrap();
        assert!(pending.is_empty());
        assert!(container.option_attempts().is_empty());

        let pending = Profile::new().with(PROFILE_FORMAT, "mp4");
        assert!(replay_options(&mut container, &pending).is_empty());
        assert!(container.option_attempts().is_empty());
    }

    #[test]
    fn replay_reports_failures_and_continues() {
        let mut container = container();
        container.open("out.mp4").unwrap();
        let pending = Profile::new()
            .with("bogus", "x")
            .with("write_tmcd", "0");

        let failures = replay_options(&mut container, &pending);
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0],
            Error::OptionApplicationFailed { name, .. } if name == "bogus"
        ));
        assert_eq!(container.option("write_tmcd"), Some("0"));
    }
}
