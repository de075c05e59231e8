//! Shared test infrastructure.
//!
//! Provides a [`TestBench`] that owns a [`SimContext`] and drives ops
//! through realistic lifecycles (checkpointed rename windows, in-order
//! commit, young-to-old flush), plus terse op constructors.

use specsim_core::checkpoint::CheckpointId;
use specsim_core::common::{LogReg, RenameError};
use specsim_core::config::{Config, MemDepPredictorKind};
use specsim_core::op::{Op, OpClass};
use specsim_core::SimContext;

/// A store op at `pc`.
pub fn store(serial: u64, pc: u64) -> Op {
    Op::new(serial, pc, OpClass::Store)
}

/// A load op at `pc`.
pub fn load(serial: u64, pc: u64) -> Op {
    Op::new(serial, pc, OpClass::Load)
}

/// An integer ALU op reading `src` and writing `dst`.
pub fn alu(serial: u64, pc: u64, src: u16, dst: u16) -> Op {
    Op::new(serial, pc, OpClass::IntAlu)
        .with_srcs(&[LogReg(src)])
        .with_dsts(&[LogReg(dst)])
}

/// One in-flight instruction with its covering checkpoint.
pub struct Inflight {
    /// The op itself.
    pub op: Op,
    /// The rename checkpoint opened for its window.
    pub cp: CheckpointId,
}

/// A context plus an in-flight window, oldest first.
pub struct TestBench {
    /// The simulated core state.
    pub ctx: SimContext,
    /// In-flight (renamed, not yet committed/flushed) ops.
    pub window: Vec<Inflight>,
}

impl TestBench {
    /// Builds a bench around the given predictor variant with small
    /// register segments so exhaustion is easy to reach.
    pub fn new(kind: MemDepPredictorKind) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let mut config = Config::default();
        config.mem_dep.predictor = kind;
        let ctx = SimContext::build(&config).expect("default config must build");
        Self {
            ctx,
            window: Vec::new(),
        }
    }

    /// Renames `op` under a fresh checkpoint and adds it to the window.
    ///
    /// # Errors
    ///
    /// Propagates free-list exhaustion.
    pub fn rename(&mut self, mut op: Op) -> Result<(), RenameError> {
        let cp = self.ctx.open_window();
        self.ctx.rename_op(&mut op)?;
        self.window.push(Inflight { op, cp });
        Ok(())
    }

    /// Commits the oldest in-flight op, returning it.
    ///
    /// # Panics
    ///
    /// Panics if the window is empty.
    pub fn commit_oldest(&mut self) -> Op {
        assert!(!self.window.is_empty(), "commit with an empty window");
        let mut inflight = self.window.remove(0);
        self.ctx.commit_op(&mut inflight.op);
        self.ctx.master.commit(inflight.cp);
        inflight.op
    }

    /// Flushes the youngest in-flight op and rewinds its checkpoint,
    /// returning it.
    ///
    /// # Panics
    ///
    /// Panics if the window is empty.
    pub fn flush_youngest(&mut self) -> Op {
        let Some(mut inflight) = self.window.pop() else {
            panic!("flush with an empty window")
        };
        self.ctx.flush_op(&mut inflight.op);
        self.ctx.master.recover(inflight.cp);
        self.ctx.master.flush(inflight.cp);
        inflight.op
    }

    /// Drains the window: commits everything still in flight, oldest
    /// first.
    pub fn commit_all(&mut self) {
        while !self.window.is_empty() {
            let _ = self.commit_oldest();
        }
    }
}
