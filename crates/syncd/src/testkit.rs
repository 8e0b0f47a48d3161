//! Test doubles shared across the daemon's unit tests
//!
//! Three fakes mirror the daemon's outward seams:
//! - `RecordingPort` stands in for one opened HID handle
//! - `FakePlatform` stands in for the HID bus with scriptable hot-plug
//! - `ScriptedTransport` stands in for the telemetry feed
//!
//! All of them are plain in-memory state machines; nothing here touches
//! hardware or sockets.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::test_utils::unsupported_descriptor;
use common::{Error, Result};
use protocol::{DeviceDescriptor, TelemetrySnapshot};

use crate::panel::{PanelPlatform, PanelPort};
use crate::sim::{SimSession, SimTransport};

pub use common::test_utils::warthog_descriptor;

/// Handle onto a [`RecordingPort`]'s captured writes
///
/// Clones share the same log, so tests keep one handle while the port
/// itself moves into the device under test.
#[derive(Clone, Default)]
pub struct WriteLog {
    inner: Arc<WriteLogInner>,
}

#[derive(Default)]
struct WriteLogInner {
    writes: Mutex<Vec<Vec<u8>>>,
    fail: AtomicBool,
}

impl WriteLog {
    /// Drain every report captured since the last call
    pub fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.inner.writes.lock().unwrap())
    }

    /// All captured reports, oldest first, without draining
    pub fn snapshot(&self) -> Vec<Vec<u8>> {
        self.inner.writes.lock().unwrap().clone()
    }

    /// Make subsequent writes fail (and go unrecorded) until cleared
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail.store(fail, Ordering::SeqCst);
    }

    fn record(&self, report: &[u8]) -> Result<usize> {
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(Error::Hid("injected write failure".to_string()));
        }
        self.inner.writes.lock().unwrap().push(report.to_vec());
        Ok(report.len())
    }
}

/// Port double that captures output reports instead of writing hardware
pub struct RecordingPort {
    log: WriteLog,
}

impl RecordingPort {
    pub fn new() -> (Box<dyn PanelPort>, WriteLog) {
        let log = WriteLog::default();
        (Box::new(Self { log: log.clone() }), log)
    }
}

impl PanelPort for RecordingPort {
    fn write_report(&self, report: &[u8]) -> Result<usize> {
        self.log.record(report)
    }

    fn read_report(&self, _buf: &mut [u8], _timeout_ms: i32) -> Result<usize> {
        Ok(0)
    }
}

#[derive(Default)]
struct FakeBus {
    descriptors: Vec<DeviceDescriptor>,
    // per-path logs survive detach so tests can inspect final writes
    logs: HashMap<String, WriteLog>,
    fail_enumeration: bool,
}

/// Platform double with scriptable attach/detach and failure injection
#[derive(Default)]
pub struct FakePlatform {
    bus: Mutex<FakeBus>,
    opens: AtomicUsize,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_warthog(&self, path: &str) {
        let mut bus = self.bus.lock().unwrap();
        bus.descriptors.push(warthog_descriptor(path));
        bus.logs.entry(path.to_string()).or_default();
    }

    /// Attach a HID device no panel model matches
    pub fn attach_unsupported(&self, path: &str) {
        let mut bus = self.bus.lock().unwrap();
        bus.descriptors.push(unsupported_descriptor(path));
        bus.logs.entry(path.to_string()).or_default();
    }

    pub fn detach(&self, path: &str) {
        self.bus
            .lock()
            .unwrap()
            .descriptors
            .retain(|descriptor| descriptor.path != path);
    }

    pub fn fail_enumeration(&self, fail: bool) {
        self.bus.lock().unwrap().fail_enumeration = fail;
    }

    /// Make writes through the port at `path` fail until cleared
    pub fn fail_writes_for(&self, path: &str, fail: bool) {
        if let Some(log) = self.bus.lock().unwrap().logs.get(path) {
            log.fail_writes(fail);
        }
    }

    /// Number of successful `open` calls across all paths
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Reports written through the port at `path`, oldest first
    pub fn writes_for(&self, path: &str) -> Vec<Vec<u8>> {
        self.bus
            .lock()
            .unwrap()
            .logs
            .get(path)
            .map(WriteLog::snapshot)
            .unwrap_or_default()
    }
}

impl PanelPlatform for FakePlatform {
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>> {
        let bus = self.bus.lock().unwrap();
        if bus.fail_enumeration {
            return Err(Error::Hid("injected enumeration failure".to_string()));
        }
        Ok(bus.descriptors.clone())
    }

    fn open(&self, descriptor: &DeviceDescriptor) -> Result<Box<dyn PanelPort>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let log = self
            .bus
            .lock()
            .unwrap()
            .logs
            .entry(descriptor.path.clone())
            .or_default()
            .clone();
        Ok(Box::new(RecordingPort { log }))
    }
}

/// Scripted behavior of one feed session, consumed front to back
pub enum FeedStep {
    Snapshot(TelemetrySnapshot),
    Wait(Duration),
    Fail,
}

/// Scripted outcome of one `open` call
pub enum OpenStep {
    Session(Vec<FeedStep>),
    Refuse,
    Hang,
}

/// Transport double driven by a queue of scripted open outcomes
///
/// Clones share the script and counters, so a test can keep one handle
/// while the other moves into the link under test. An `open` with an
/// empty queue behaves like `Refuse`.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<ScriptedInner>,
}

#[derive(Default)]
struct ScriptedInner {
    opens: Mutex<VecDeque<OpenStep>>,
    open_count: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_open(&self, step: OpenStep) {
        self.inner.opens.lock().unwrap().push_back(step);
    }

    pub fn open_count(&self) -> usize {
        self.inner.open_count.load(Ordering::SeqCst)
    }
}

impl SimTransport for ScriptedTransport {
    type Session = ScriptedSession;

    fn open(&self, _refresh_ms: u32) -> impl Future<Output = Result<Self::Session>> + Send {
        self.inner.open_count.fetch_add(1, Ordering::SeqCst);
        let step = self.inner.opens.lock().unwrap().pop_front();
        async move {
            match step {
                Some(OpenStep::Session(steps)) => Ok(ScriptedSession {
                    steps: steps.into(),
                }),
                Some(OpenStep::Refuse) | None => {
                    Err(Error::Other("connection refused".to_string()))
                }
                Some(OpenStep::Hang) => std::future::pending().await,
            }
        }
    }
}

/// Session double yielding its scripted steps in order
///
/// An exhausted script parks forever, like an idle feed with no traffic.
pub struct ScriptedSession {
    steps: VecDeque<FeedStep>,
}

impl SimSession for ScriptedSession {
    fn recv(&mut self) -> impl Future<Output = Result<TelemetrySnapshot>> + Send {
        async move {
            loop {
                match self.steps.pop_front() {
                    Some(FeedStep::Snapshot(snapshot)) => return Ok(snapshot),
                    Some(FeedStep::Wait(period)) => tokio::time::sleep(period).await,
                    Some(FeedStep::Fail) => return Err(Error::Other("feed lost".to_string())),
                    None => std::future::pending::<()>().await,
                }
            }
        }
    }
}
