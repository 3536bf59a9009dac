//! Recording sinks for tests.
//!
//! Each recorder is a cheap cloneable handle around shared state. Hand the core a sink
//! built from the recorder, keep the recorder, and inspect what the core did.

use anyhow::Result;
use std::sync::{Arc, Mutex};

use super::{AudioSink, BrightnessSink, GrantId, HostLifecycle, SinkResult};

#[derive(Default)]
struct BrightnessLog {
    writes: Vec<f64>,
    reading: Option<f64>,
    unavailable: bool,
}

/// Records every brightness write.
#[derive(Clone, Default)]
pub struct BrightnessRecorder {
    inner: Arc<Mutex<BrightnessLog>>,
}

impl BrightnessRecorder {
    /// A recorder whose device initially reads `initial`.
    pub fn new(initial: Option<f64>) -> Self {
        let recorder = Self::default();
        recorder.inner.lock().unwrap().reading = initial;
        recorder
    }

    pub fn sink(&self) -> Box<dyn BrightnessSink> {
        Box::new(RecordingBrightness {
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn writes(&self) -> Vec<f64> {
        self.inner.lock().unwrap().writes.clone()
    }

    pub fn last(&self) -> Option<f64> {
        self.inner.lock().unwrap().writes.last().copied()
    }

    /// Make subsequent writes and reads fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    /// Change what the device reports, as if the user moved a slider.
    pub fn set_reading(&self, value: Option<f64>) {
        self.inner.lock().unwrap().reading = value;
    }
}

struct RecordingBrightness {
    inner: Arc<Mutex<BrightnessLog>>,
}

impl BrightnessSink for RecordingBrightness {
    fn write(&mut self, value: f64) -> SinkResult {
        let mut log = self.inner.lock().unwrap();
        if log.unavailable {
            return SinkResult::Unavailable;
        }
        log.writes.push(value);
        log.reading = Some(value);
        SinkResult::Applied
    }

    fn read(&self) -> Option<f64> {
        let log = self.inner.lock().unwrap();
        if log.unavailable { None } else { log.reading }
    }

    fn name(&self) -> &'static str {
        "Recording"
    }
}

/// One call made on an audio sink.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Activate,
    Play,
    Pause,
    Stop,
    SetVolume(f64),
}

#[derive(Default)]
struct AudioLog {
    events: Vec<AudioEvent>,
    fail_activate: bool,
    fail_play: bool,
    playing: bool,
}

/// Records every audio call and can be told to fail activation or playback.
#[derive(Clone, Default)]
pub struct AudioRecorder {
    inner: Arc<Mutex<AudioLog>>,
}

impl AudioRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> Box<dyn AudioSink> {
        Box::new(RecordingAudio {
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Every volume that was set, in order.
    pub fn volumes(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                AudioEvent::SetVolume(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().unwrap().playing
    }

    pub fn count(&self, event: &AudioEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn set_fail_activate(&self, fail: bool) {
        self.inner.lock().unwrap().fail_activate = fail;
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.inner.lock().unwrap().fail_play = fail;
    }
}

struct RecordingAudio {
    inner: Arc<Mutex<AudioLog>>,
}

impl AudioSink for RecordingAudio {
    fn activate(&mut self) -> Result<()> {
        let mut log = self.inner.lock().unwrap();
        log.events.push(AudioEvent::Activate);
        if log.fail_activate {
            anyhow::bail!("audio session refused activation");
        }
        Ok(())
    }

    fn play(&mut self) -> bool {
        let mut log = self.inner.lock().unwrap();
        log.events.push(AudioEvent::Play);
        log.playing = !log.fail_play;
        log.playing
    }

    fn pause(&mut self) {
        let mut log = self.inner.lock().unwrap();
        log.events.push(AudioEvent::Pause);
        log.playing = false;
    }

    fn stop(&mut self) {
        let mut log = self.inner.lock().unwrap();
        log.events.push(AudioEvent::Stop);
        log.playing = false;
    }

    fn set_volume(&mut self, volume: f64) {
        self.inner
            .lock()
            .unwrap()
            .events
            .push(AudioEvent::SetVolume(volume));
    }

    fn name(&self) -> &'static str {
        "Recording"
    }
}

/// One call made on the host lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Begin(GrantId),
    End(GrantId),
    Refused,
}

#[derive(Default)]
struct HostLog {
    events: Vec<HostEvent>,
    active: Vec<GrantId>,
    next_id: u64,
    refuse: bool,
}

/// Records background grant requests and releases.
#[derive(Clone, Default)]
pub struct HostRecorder {
    inner: Arc<Mutex<HostLog>>,
}

impl HostRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(&self) -> Box<dyn HostLifecycle> {
        Box::new(RecordingHost {
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Grants begun and not yet ended.
    pub fn active_grants(&self) -> Vec<GrantId> {
        self.inner.lock().unwrap().active.clone()
    }

    pub fn set_refuse(&self, refuse: bool) {
        self.inner.lock().unwrap().refuse = refuse;
    }
}

struct RecordingHost {
    inner: Arc<Mutex<HostLog>>,
}

impl HostLifecycle for RecordingHost {
    fn begin_background_task(&mut self, _name: &str) -> Option<GrantId> {
        let mut log = self.inner.lock().unwrap();
        if log.refuse {
            log.events.push(HostEvent::Refused);
            return None;
        }
        log.next_id += 1;
        let id = GrantId(log.next_id);
        log.events.push(HostEvent::Begin(id));
        log.active.push(id);
        Some(id)
    }

    fn end_background_task(&mut self, id: GrantId) {
        let mut log = self.inner.lock().unwrap();
        log.events.push(HostEvent::End(id));
        log.active.retain(|active| *active != id);
    }
}
