//! The simulation thread and its command/event protocol.
//!
//! A [`Coordinator`] owns one background thread that runs a fixed-interval
//! timer. Commands are queued on a bounded channel and applied together at
//! the next tick boundary, before the pipeline runs; a tick in progress is
//! never interrupted.
//!
//! Lifecycle events are always delivered. At most [`MAX_QUEUED_FRAMES`]
//! `FrameReady` events wait in the queue at once; while the consumer is behind,
//! ticks still run but their frames are skipped and counted
//! ([`Coordinator::dropped_frames`]), so a stalled consumer pins no more than
//! that many frame buffers.
//!
//! ```no_run
//! use drape::{ClothConfig, Coordinator, Event, InstanceId};
//! use std::time::Duration;
//!
//! let mut sim = Coordinator::spawn()?;
//! sim.build(InstanceId(1), ClothConfig::default().with_spacing(0.1, 0.1))?;
//! sim.start()?;
//! while let Some(event) = sim.recv_event_timeout(Duration::from_millis(100)) {
//!     if let Event::FrameReady(frame) = event {
//!         println!("step {} has {} vertices", frame.step, frame.width * frame.height);
//!         break;
//!     }
//! }
//! sim.destroy()?;
//! # Ok::<(), drape::ClothError>(())
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::{ClothConfig, InstanceId};
use crate::error::{ClothError, Result};
use crate::observer::NoOpStepObserver;
use crate::protocol::{Command, Event, ForceUpdate};
use crate::simulation::ClothSimulation;

/// Commands that may be queued before `send` blocks.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// `FrameReady` events allowed to wait for the consumer at once.
pub const MAX_QUEUED_FRAMES: usize = 2;

/// Tick rate used before a cloth has been built.
const IDLE_FREQUENCY_HZ: f64 = 60.0;

/// Lifecycle of the simulation thread.
///
/// A successful build moves straight from `Uninitialized` to `Paused`; there
/// is no way back to `Uninitialized`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CoordinatorState {
    Uninitialized = 0,
    Paused = 1,
    Running = 2,
    Destroyed = 3,
}

impl CoordinatorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CoordinatorState::Uninitialized,
            1 => CoordinatorState::Paused,
            2 => CoordinatorState::Running,
            _ => CoordinatorState::Destroyed,
        }
    }
}

/// Counters shared between the handle and the worker.
#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    queued_frames: AtomicUsize,
    dropped_frames: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Shared {
            state: AtomicU8::new(CoordinatorState::Uninitialized as u8),
            queued_frames: AtomicUsize::new(0),
            dropped_frames: AtomicU64::new(0),
        }
    }

    fn state(&self) -> CoordinatorState {
        CoordinatorState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: CoordinatorState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Reserve a queue slot for one frame, or count it as dropped.
    fn reserve_frame(&self) -> bool {
        let reserved = self
            .queued_frames
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |queued| {
                (queued < MAX_QUEUED_FRAMES).then_some(queued + 1)
            })
            .is_ok();
        if !reserved {
            self.dropped_frames.fetch_add(1, Ordering::Relaxed);
        }
        reserved
    }

    fn release_frame(&self) {
        let _ = self
            .queued_frames
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |queued| queued.checked_sub(1));
    }
}

/// Consumer-side handle to a simulation thread.
///
/// Dropping the handle destroys the thread.
pub struct Coordinator {
    commands: Option<SyncSender<Command>>,
    events: Receiver<Event>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Coordinator {
    /// Start an idle simulation thread in the `Uninitialized` state.
    pub fn spawn() -> Result<Self> {
        let (command_tx, command_rx) = mpsc::sync_channel(COMMAND_QUEUE_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel();
        let shared = Arc::new(Shared::new());
        let interval = ClothConfig::default().with_frequency(IDLE_FREQUENCY_HZ).tick_interval()?;

        let worker = Worker {
            commands: command_rx,
            events: event_tx,
            shared: Arc::clone(&shared),
            pending: VecDeque::new(),
            sim: None,
            running: false,
            interval,
        };
        let handle = thread::Builder::new()
            .name("drape-sim".into())
            .spawn(move || worker.run())
            .map_err(|err| {
                log::error!("failed to spawn simulation thread: {}", err);
                ClothError::ThreadSpawn
            })?;

        Ok(Coordinator {
            commands: Some(command_tx),
            events: event_rx,
            shared,
            worker: Some(handle),
        })
    }

    /// Queue a command for the next tick boundary.
    ///
    /// Blocks while the queue is full. Fails with [`ClothError::Destroyed`]
    /// once the thread is gone.
    pub fn send(&self, command: Command) -> Result<()> {
        let sender = self.commands.as_ref().ok_or(ClothError::Destroyed)?;
        sender.send(command).map_err(|_| ClothError::Destroyed)
    }

    pub fn build(&self, instance: InstanceId, config: ClothConfig) -> Result<()> {
        self.send(Command::Build { instance, config })
    }

    pub fn update(&self, update: ForceUpdate) -> Result<()> {
        self.send(Command::Update(update))
    }

    pub fn set_running(&self, running: bool) -> Result<()> {
        self.send(Command::SetRunning(running))
    }

    pub fn start(&self) -> Result<()> {
        self.set_running(true)
    }

    pub fn stop(&self) -> Result<()> {
        self.set_running(false)
    }

    /// Stop the loop, join the thread and release its buffers.
    ///
    /// Any tick in flight finishes first. Calling this twice reports
    /// [`ClothError::Destroyed`].
    pub fn destroy(&mut self) -> Result<()> {
        let sender = self.commands.take().ok_or(ClothError::Destroyed)?;
        // The worker may already be gone; joining below is all that matters then.
        let _ = sender.send(Command::Destroy);
        drop(sender);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("simulation thread panicked");
            }
        }
        self.shared.set_state(CoordinatorState::Destroyed);
        Ok(())
    }

    pub fn state(&self) -> CoordinatorState {
        self.shared.state()
    }

    /// Frames skipped because [`MAX_QUEUED_FRAMES`] were already waiting.
    pub fn dropped_frames(&self) -> u64 {
        self.shared.dropped_frames.load(Ordering::Relaxed)
    }

    pub fn try_event(&self) -> Option<Event> {
        self.received(self.events.try_recv().ok())
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<Event> {
        self.received(self.events.recv_timeout(timeout).ok())
    }

    /// Every event already queued, without blocking.
    pub fn try_events(&self) -> impl Iterator<Item = Event> + '_ {
        std::iter::from_fn(move || self.try_event())
    }

    fn received(&self, event: Option<Event>) -> Option<Event> {
        if let Some(Event::FrameReady(_)) = event {
            self.shared.release_frame();
        }
        event
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if self.commands.is_some() {
            let _ = self.destroy();
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

struct Worker {
    commands: Receiver<Command>,
    events: Sender<Event>,
    shared: Arc<Shared>,
    pending: VecDeque<Command>,
    sim: Option<ClothSimulation>,
    running: bool,
    interval: Duration,
}

impl Worker {
    fn run(mut self) {
        let mut deadline = Instant::now() + self.interval;
        loop {
            let disconnected = self.collect_until(deadline);

            while let Some(command) = self.pending.pop_front() {
                if let Flow::Exit = self.handle(command) {
                    self.shutdown();
                    return;
                }
            }
            if disconnected {
                log::debug!("command channel closed without destroy");
                self.shutdown();
                return;
            }

            if self.running {
                if let Some(sim) = self.sim.as_mut() {
                    sim.step(&mut NoOpStepObserver);
                    if self.shared.reserve_frame() {
                        let frame = sim.publish();
                        log::trace!("published frame {} for {:?}", frame.step, frame.instance);
                        self.emit(Event::FrameReady(frame));
                    } else {
                        log::trace!("consumer behind; skipped frame {}", sim.step_count());
                    }
                }
            }

            let now = Instant::now();
            deadline += self.interval;
            if deadline < now {
                log::debug!("tick overran by {:?}; skipping missed ticks", now - deadline);
                deadline = now + self.interval;
            }
        }
    }

    /// Queue incoming commands until `deadline`. Returns true if the handle hung up.
    fn collect_until(&mut self, deadline: Instant) -> bool {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.commands.recv_timeout(deadline - now) {
                Ok(command) => self.pending.push_back(command),
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => return true,
            }
        }
    }

    fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Build { instance, config } => self.build(instance, &config),
            Command::Update(update) => match self.sim.as_mut() {
                Some(sim) => {
                    if let Err(error) = sim.apply(update) {
                        self.emit(Event::Rejected { error });
                    }
                }
                None => self.reject(ClothError::NotBuilt, "update"),
            },
            Command::SetRunning(running) => {
                if self.sim.is_none() {
                    self.reject(ClothError::NotBuilt, "set-running");
                } else {
                    if running != self.running {
                        log::info!("simulation {}", if running { "started" } else { "stopped" });
                    }
                    self.running = running;
                    self.shared
                        .set_state(if running { CoordinatorState::Running } else { CoordinatorState::Paused });
                }
            }
            Command::Destroy => return Flow::Exit,
        }
        Flow::Continue
    }

    fn build(&mut self, instance: InstanceId, config: &ClothConfig) {
        if self.sim.is_some() {
            self.reject(ClothError::AlreadyBuilt, "build");
            return;
        }
        let built = ClothSimulation::build_with_id(instance, config)
            .and_then(|sim| Ok((config.tick_interval()?, sim)));
        match built {
            Ok((interval, sim)) => {
                self.interval = interval;
                self.shared.set_state(CoordinatorState::Paused);
                self.emit(sim.built_event());
                self.sim = Some(sim);
            }
            Err(error) => {
                log::warn!("build of {:?} failed: {}", instance, error);
                self.emit(Event::BuildFailed { instance, error });
            }
        }
    }

    fn reject(&self, error: ClothError, command: &str) {
        log::warn!("ignoring {} command: {}", command, error);
        self.emit(Event::Rejected { error });
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            log::trace!("event receiver dropped");
        }
    }

    fn shutdown(&mut self) {
        let instance = self.sim.take().map(|sim| sim.instance());
        self.running = false;
        self.shared.set_state(CoordinatorState::Destroyed);
        log::info!("simulation {:?} destroyed", instance);
        self.emit(Event::Destroyed { instance });
    }
}
