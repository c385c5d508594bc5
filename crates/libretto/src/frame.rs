//! Call frames.
//!
//! A frame is one activation of a module. It owns a *working* copy of the
//! module's instructions that disposable execution and embedded-code
//! injection mutate freely, while the module behind the shared `Arc` stays
//! pristine — a same-module call re-seeds from it. Because the working list
//! shifts under the program counter, label resolution rescans it on every
//! jump instead of trusting a precomputed table.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::instruction::{Instruction, InstructionKind, Module};
use crate::node::Node;

pub struct Frame {
    /// The pristine program. Never mutated.
    module: Arc<Module>,
    /// This activation's program, spliced and shrunk as it runs.
    working: Vec<Instruction>,
    /// Index of the next instruction to fetch.
    pc: usize,
}

impl Frame {
    pub fn new(module: Arc<Module>) -> Self {
        let working = module.instructions.clone();
        Self {
            module,
            working,
            pc: 0,
        }
    }

    /// A fresh frame over the same module, seeded from the pristine
    /// instruction list rather than `other`'s possibly-mutated working list.
    pub fn from_same_module(other: &Frame) -> Self {
        Self::new(Arc::clone(&other.module))
    }

    pub fn module_path(&self) -> &str {
        &self.module.path
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn is_ended(&self) -> bool {
        self.pc >= self.working.len()
    }

    /// The instruction at the program counter. Callers check `is_ended`
    /// first.
    pub fn current(&self) -> &Instruction {
        &self.working[self.pc]
    }

    /// Step past the current instruction. Disposable instructions are
    /// removed in place, which leaves the counter pointing at their
    /// successor; anything else just bumps the counter.
    pub fn advance(&mut self) {
        if self.working[self.pc].disposable {
            self.working.remove(self.pc);
        } else {
            self.pc += 1;
        }
    }

    /// Move the program counter: to the module start for `None`, otherwise
    /// to the first jump point carrying `tag` in the *current* working list.
    pub fn jump(&mut self, tag: Option<&str>) -> Result<()> {
        let Some(tag) = tag else {
            self.pc = 0;
            return Ok(());
        };
        let target = self.working.iter().position(|instruction| {
            matches!(
                &instruction.kind,
                InstructionKind::Statement(Node::JumpPoint { label }) if label == tag
            )
        });
        match target {
            Some(index) => {
                self.pc = index;
                Ok(())
            }
            None => Err(Error::JumpNotFound(tag.to_string())),
        }
    }

    /// Splice instructions into the working list at the program counter,
    /// shifting what was there to the right.
    pub fn insert(&mut self, instructions: Vec<Instruction>) {
        let at = self.pc.min(self.working.len());
        self.working.splice(at..at, instructions);
    }
}
