//! Logs raised events to `tracing` and/or a file.

use std::{
    cell::RefCell,
    fmt,
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::Path,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

use bitflags::bitflags;
use tracing::{info, warn};

use crate::{
    bus::EventBus,
    event::{Event, EventTypeId},
    subscriber::SubscriptionId,
};

bitflags! {
    /// Where an event type gets logged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LogOutput: u8 {
        /// Emit an `info` event on the `mbe_event::log` target.
        const TRACING = 1 << 0;
        /// Append a timestamped line to the logger's file.
        const FILE = 1 << 1;
    }
}

type SharedWriter = Rc<RefCell<BufWriter<File>>>;

/// Subscribes to event types and writes every raised event's `Debug` form.
///
/// Dropping the logger removes all of its subscriptions.
///
/// ```ignore
/// let mut logger = EventLogger::with_file(&bus, "events.log")?;
/// logger.subscribe::<EntityCreated>(LogOutput::TRACING | LogOutput::FILE);
/// ```
pub struct EventLogger {
    bus: EventBus,
    file: Option<SharedWriter>,
    subscriptions: Vec<SubscriptionId>,
}

impl EventLogger {
    /// Logger without a file; only [`LogOutput::TRACING`] has an effect.
    #[must_use]
    pub fn new(bus: &EventBus) -> Self {
        Self {
            bus: bus.clone(),
            file: None,
            subscriptions: Vec::new(),
        }
    }

    /// Logger appending to the file at `path`, creating it if needed.
    pub fn with_file(bus: &EventBus, path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut logger = Self::new(bus);
        logger.file = Some(Rc::new(RefCell::new(BufWriter::new(file))));
        Ok(logger)
    }

    /// Start logging events of type `E` to `output`.
    pub fn subscribe<E: Event + fmt::Debug>(&mut self, output: LogOutput) {
        let event_type = EventTypeId::of::<E>();

        if output.contains(LogOutput::TRACING) {
            let id = self.bus.subscribe(move |event: &E| {
                info!(target: "mbe_event::log", event = event_type.name(), "{event:?}");
            });
            self.subscriptions.push(id);
        }

        if output.contains(LogOutput::FILE) {
            let Some(file) = self.file.clone() else {
                warn!(
                    event = event_type.name(),
                    "file output requested but logger has no file"
                );
                return;
            };
            let id = self.bus.subscribe(move |event: &E| {
                let line = format!("[{}] {event:?}", timestamp());
                if let Err(error) = writeln!(file.borrow_mut(), "{line}") {
                    warn!(%error, "failed to write event log line");
                }
            });
            self.subscriptions.push(id);
        }
    }

    /// Number of subscriptions held by this logger.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Flush buffered file output.
    pub fn flush(&self) -> io::Result<()> {
        match &self.file {
            Some(file) => file.borrow_mut().flush(),
            None => Ok(()),
        }
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe_any(id);
        }
        if let Err(error) = self.flush() {
            warn!(%error, "failed to flush event log on drop");
        }
    }
}

impl fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLogger")
            .field("subscriptions", &self.subscriptions.len())
            .field("has_file", &self.file.is_some())
            .finish()
    }
}

/// Seconds since the Unix epoch with millisecond precision.
fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[derive(Debug)]
    struct EntityCreated {
        entity: u64,
    }

    #[derive(Debug)]
    struct Tick;

    #[test]
    fn test_tracing_output_subscribes() {
        let bus = EventBus::new();
        let mut logger = EventLogger::new(&bus);

        logger.subscribe::<EntityCreated>(LogOutput::TRACING);
        assert_eq!(logger.subscription_count(), 1);
        assert_eq!(bus.raise(&EntityCreated { entity: 1 }), 1);
    }

    #[test]
    fn test_file_output_without_file_is_skipped() {
        let bus = EventBus::new();
        let mut logger = EventLogger::new(&bus);

        logger.subscribe::<Tick>(LogOutput::FILE);
        assert_eq!(logger.subscription_count(), 0);
        assert_eq!(bus.subscriber_count::<Tick>(), 0);
    }

    #[test]
    fn test_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let bus = EventBus::new();

        {
            let mut logger = EventLogger::with_file(&bus, &path).unwrap();
            logger.subscribe::<EntityCreated>(LogOutput::TRACING | LogOutput::FILE);
            assert_eq!(logger.subscription_count(), 2);

            bus.raise(&EntityCreated { entity: 42 });
            bus.raise(&Tick);
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("EntityCreated { entity: 42 }"));
    }

    #[test]
    fn test_with_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let bus = EventBus::new();

        for entity in [1, 2] {
            let mut logger = EventLogger::with_file(&bus, &path).unwrap();
            logger.subscribe::<EntityCreated>(LogOutput::FILE);
            bus.raise(&EntityCreated { entity });
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("EntityCreated { entity: 1 }"));
        assert!(lines[1].ends_with("EntityCreated { entity: 2 }"));
        assert!(bus.is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        {
            let mut logger = EventLogger::new(&bus);
            logger.subscribe::<EntityCreated>(LogOutput::TRACING);
            logger.subscribe::<Tick>(LogOutput::TRACING);
            assert_eq!(bus.len(), 2);
        }
        assert!(bus.is_empty());
    }
}
