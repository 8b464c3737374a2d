//! Observer capability for solve instrumentation.
//!
//! The solver never touches process-wide state: the orchestrator threads an
//! `Observer` through both subsystems, which accumulates typed counters and
//! forwards human-readable notes to a pluggable sink. The default sink is
//! the `log` facade; tests use the silent sink.

/// Destination for solve progress notes.
pub trait LogSink {
    fn log(&self, level: log::Level, message: &str);
}

/// Forwards to the `log` crate facade.
#[derive(Debug, Default)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn log(&self, level: log::Level, message: &str) {
        log::log!(level, "{message}");
    }
}

/// Swallows everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: log::Level, _message: &str) {}
}

/// Typed counters accumulated over one solve.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolveCounters {
    pub placer_iterations: u32,
    pub refiner_iterations: u32,
    pub accepted_moves: u32,
    pub rejected_moves: u32,
    pub repair_passes: u32,
    pub overlap_sweeps: u32,
    /// Best refiner energy seen, NaN until the refiner runs.
    pub best_energy: f64,
}

/// Counters plus a log sink, owned by one solve call.
pub struct Observer {
    pub counters: SolveCounters,
    sink: Box<dyn LogSink>,
}

impl Observer {
    pub fn new(sink: Box<dyn LogSink>) -> Observer {
        Observer {
            counters: SolveCounters {
                best_energy: f64::NAN,
                ..SolveCounters::default()
            },
            sink,
        }
    }

    /// Observer that logs through the `log` facade.
    pub fn logging() -> Observer {
        Observer::new(Box::new(FacadeSink))
    }

    /// Observer that records counters but emits nothing.
    pub fn silent() -> Observer {
        Observer::new(Box::new(NullSink))
    }

    pub fn info(&self, message: &str) {
        self.sink.log(log::Level::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.sink.log(log::Level::Debug, message);
    }
}

impl Default for Observer {
    fn default() -> Self {
        Observer::logging()
    }
}
