use std::io::{self, Cursor, Read};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;

use anyhow::anyhow;
use reflex::errors::SignalError;
use reflex::exec::{
    ExitReport, GroupSignal, ProcessControl, ProcessWaiter, SpawnedProcess, TermSize,
    TerminalBackend,
};

/// How a fake child reacts to the termination ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehaviour {
    /// Exits as soon as the interrupt byte is written to its terminal.
    ExitOnInterruptByte,
    /// Ignores the interrupt byte; exits on the group SIGINT.
    ExitOnSignal,
    /// Ignores everything except SIGKILL.
    ExitOnKill,
    /// Exits right after being spawned.
    ExitImmediately { success: bool },
}

/// Something the fake observed, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeEvent {
    Spawned(u32),
    InterruptByte(u32),
    Signal(u32, GroupSignal),
    Resized(u32, TermSize),
    Exited(u32),
}

#[derive(Debug, Default)]
struct Log {
    spawns: Vec<Vec<String>>,
    events: Vec<(Instant, FakeEvent)>,
    live: usize,
    max_live: usize,
    children: Vec<Arc<FakeChild>>,
}

#[derive(Debug)]
struct FakeChild {
    pid: u32,
    behaviour: FakeBehaviour,
    fail_interrupt_signal: bool,
    exit: Mutex<Option<ExitReport>>,
    exited: Condvar,
    log: Arc<Mutex<Log>>,
}

impl FakeChild {
    fn exit(&self, report: ExitReport) {
        let mut exit = self.exit.lock().unwrap();
        if exit.is_none() {
            *exit = Some(report);
            self.exited.notify_all();
        }
    }

    fn has_exited(&self) -> bool {
        self.exit.lock().unwrap().is_some()
    }

    fn record(&self, event: FakeEvent) {
        lock(&self.log).events.push((Instant::now(), event));
    }
}

fn lock(log: &Mutex<Log>) -> MutexGuard<'_, Log> {
    log.lock().unwrap()
}

/// Scripted [`TerminalBackend`] that spawns no real processes.
///
/// Every spawn creates a fake child whose reaction to the interrupt byte and
/// group signals follows a [`FakeBehaviour`]. All interactions are recorded
/// with timestamps so tests can check ordering, escalation delays, and that
/// no two children were ever alive at once.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    behaviour: FakeBehaviour,
    fail_spawn: bool,
    fail_interrupt_signal: bool,
    terminal: bool,
    output: Vec<u8>,
    log: Arc<Mutex<Log>>,
}

impl FakeBackend {
    pub fn new(behaviour: FakeBehaviour) -> Self {
        Self {
            behaviour,
            fail_spawn: false,
            fail_interrupt_signal: false,
            terminal: false,
            output: Vec::new(),
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    /// Every spawn fails.
    pub fn failing_spawn(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    /// The group SIGINT fails with an OS error (not "no such process").
    pub fn failing_interrupt_signal(mut self) -> Self {
        self.fail_interrupt_signal = true;
        self
    }

    /// Children get a (pretend) terminal, so resizes are forwarded to them
    /// and recorded as [`FakeEvent::Resized`].
    pub fn with_terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// Output every child writes before anything else happens.
    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.as_bytes().to_vec();
        self
    }

    pub fn spawns(&self) -> Vec<Vec<String>> {
        lock(&self.log).spawns.clone()
    }

    pub fn spawn_count(&self) -> usize {
        lock(&self.log).spawns.len()
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        lock(&self.log).events.iter().map(|(_, e)| *e).collect()
    }

    /// When `event` was first recorded.
    pub fn time_of(&self, event: FakeEvent) -> Option<Instant> {
        lock(&self.log)
            .events
            .iter()
            .find(|(_, e)| *e == event)
            .map(|(at, _)| *at)
    }

    /// Every resize applied to `pid`, with its timestamp.
    pub fn resizes_of(&self, pid: u32) -> Vec<(Instant, TermSize)> {
        lock(&self.log)
            .events
            .iter()
            .filter_map(|(at, e)| match e {
                FakeEvent::Resized(p, size) if *p == pid => Some((*at, *size)),
                _ => None,
            })
            .collect()
    }

    pub fn live(&self) -> usize {
        lock(&self.log).live
    }

    /// Highest number of simultaneously live children seen so far.
    pub fn max_live(&self) -> usize {
        lock(&self.log).max_live
    }

    /// Make every live child exit on its own, as if it finished or crashed.
    pub fn exit_all(&self, success: bool) {
        let children = lock(&self.log).children.clone();
        for child in children {
            let report = if success {
                ExitReport::success()
            } else {
                ExitReport::failure("exit status: 1")
            };
            child.exit(report);
        }
    }
}

impl TerminalBackend for FakeBackend {
    fn spawn(&self, argv: &[String], _size: Option<TermSize>) -> anyhow::Result<SpawnedProcess> {
        if self.fail_spawn {
            return Err(anyhow!("fake spawn failure for {:?}", argv));
        }

        let child = {
            let mut log = lock(&self.log);
            let pid = 1000 + log.spawns.len() as u32;
            log.spawns.push(argv.to_vec());
            log.live += 1;
            log.max_live = log.max_live.max(log.live);
            log.events.push((Instant::now(), FakeEvent::Spawned(pid)));

            let child = Arc::new(FakeChild {
                pid,
                behaviour: self.behaviour,
                fail_interrupt_signal: self.fail_interrupt_signal,
                exit: Mutex::new(None),
                exited: Condvar::new(),
                log: Arc::clone(&self.log),
            });
            log.children.push(Arc::clone(&child));
            child
        };

        if let FakeBehaviour::ExitImmediately { success } = self.behaviour {
            child.exit(if success {
                ExitReport::success()
            } else {
                ExitReport::failure("exit status: 2")
            });
        }

        let output: Box<dyn Read + Send> = Box::new(Cursor::new(self.output.clone()));
        Ok(SpawnedProcess {
            control: Arc::new(FakeControl(Arc::clone(&child))),
            outputs: vec![output],
            waiter: Box::new(FakeWaiter(child)),
        })
    }

    fn has_terminal(&self) -> bool {
        self.terminal
    }
}

struct FakeControl(Arc<FakeChild>);

impl ProcessControl for FakeControl {
    fn pid(&self) -> Option<u32> {
        Some(self.0.pid)
    }

    fn write_interrupt(&self) -> io::Result<()> {
        if self.0.has_exited() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "child is gone"));
        }
        self.0.record(FakeEvent::InterruptByte(self.0.pid));
        if self.0.behaviour == FakeBehaviour::ExitOnInterruptByte {
            self.0.exit(ExitReport::failure("exit status: 130"));
        }
        Ok(())
    }

    fn resize(&self, size: TermSize) -> io::Result<()> {
        if self.0.has_exited() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "child is gone"));
        }
        self.0.record(FakeEvent::Resized(self.0.pid, size));
        Ok(())
    }

    fn signal_group(&self, signal: GroupSignal) -> Result<(), SignalError> {
        if self.0.has_exited() {
            return Err(SignalError::Gone);
        }
        self.0.record(FakeEvent::Signal(self.0.pid, signal));

        match (signal, self.0.behaviour) {
            (GroupSignal::Interrupt, _) if self.0.fail_interrupt_signal => {
                Err(SignalError::Os("EPERM: operation not permitted".to_string()))
            }
            (GroupSignal::Interrupt, FakeBehaviour::ExitOnSignal)
            | (GroupSignal::Interrupt, FakeBehaviour::ExitOnInterruptByte) => {
                self.0.exit(ExitReport::failure("signal: 2 (SIGINT)"));
                Ok(())
            }
            (GroupSignal::Kill, _) => {
                self.0.exit(ExitReport::failure("signal: 9 (SIGKILL)"));
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

struct FakeWaiter(Arc<FakeChild>);

impl ProcessWaiter for FakeWaiter {
    fn wait(self: Box<Self>) -> io::Result<ExitReport> {
        let report = {
            let mut exit = self.0.exit.lock().unwrap();
            while exit.is_none() {
                exit = self.0.exited.wait(exit).unwrap();
            }
            exit.clone().unwrap()
        };

        let mut log = lock(&self.0.log);
        log.live -= 1;
        log.events.push((Instant::now(), FakeEvent::Exited(self.0.pid)));
        log.children.retain(|c| c.pid != self.0.pid);
        Ok(report)
    }
}
