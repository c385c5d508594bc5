//! Instructions and compiled modules.
//!
//! This module defines what the VM executes. Instructions are produced three
//! ways: by the compiler from parsed nodes, by consuming a user choice, and
//! by embedded code through the [`crate::Emitter`] primitives. A compiled
//! script is a [`Module`]: an immutable instruction list plus the opaque
//! path the environment knows it by.

use crate::error::Result;
use crate::node::Node;

/// A single VM instruction.
///
/// `disposable` instructions are removed from their frame's working list the
/// moment they execute, so they run at most once per frame; everything else
/// stays in place and runs again when control re-enters it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    pub kind: InstructionKind,
    pub disposable: bool,
}

/// The instruction variants.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstructionKind {
    /// A parsed statement node executed for its output effect. Option and
    /// comment nodes are not statements; the VM rejects them here.
    Statement(Node),

    /// A user decision point. `embedded` marks choices synthesised by
    /// embedded code; dispatch never consults it, but hosts may.
    Choice {
        options: Vec<ChoiceOption>,
        embedded: bool,
    },

    /// Push a new frame for the target module (or a pristine copy of the
    /// current one) and jump to `tag`.
    Call {
        path: Option<String>,
        tag: Option<String>,
    },

    /// Jump within the current frame, or replace it when `path` names
    /// another module.
    Goto {
        path: Option<String>,
        tag: Option<String>,
    },

    /// Terminate the entire script.
    AdvEnd,
}

/// One selectable option of a choice instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChoiceOption {
    /// The label shown to the user.
    pub name: String,
    pub target: ChoiceTarget,
}

/// Where a selected option sends control.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChoiceTarget {
    /// Call into `path` (`None` = current module) at label `tag` (`None` =
    /// module start).
    Jump {
        path: Option<String>,
        tag: Option<String>,
    },
    /// Evaluate an embedded code snippet. Only produced by the `choice`
    /// primitive of the embedded-code bridge.
    Code { code_type: String, content: String },
}

impl Instruction {
    pub fn statement(node: Node, disposable: bool) -> Self {
        Self {
            kind: InstructionKind::Statement(node),
            disposable,
        }
    }

    pub fn choice(options: Vec<ChoiceOption>, embedded: bool, disposable: bool) -> Self {
        Self {
            kind: InstructionKind::Choice { options, embedded },
            disposable,
        }
    }

    pub fn call(path: Option<String>, tag: Option<String>, disposable: bool) -> Self {
        Self {
            kind: InstructionKind::Call { path, tag },
            disposable,
        }
    }

    pub fn goto(path: Option<String>, tag: Option<String>, disposable: bool) -> Self {
        Self {
            kind: InstructionKind::Goto { path, tag },
            disposable,
        }
    }

    pub fn adv_end(disposable: bool) -> Self {
        Self {
            kind: InstructionKind::AdvEnd,
            disposable,
        }
    }
}

/// A compiled script, ready to be instantiated into frames.
///
/// The instruction list is never mutated after construction; frames copy it
/// into a private working buffer and mutate that. The path is opaque to the
/// VM — only the [`crate::Environment`] interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Module {
    pub path: String,
    pub instructions: Vec<Instruction>,
}

impl Module {
    pub fn new(path: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            path: path.into(),
            instructions,
        }
    }

    /// Parse and compile script text into a module in one step.
    pub fn compile(path: impl Into<String>, source: &str) -> Result<Self> {
        let instructions = crate::compiler::Compiler::compile_source(source, false)?;
        Ok(Self::new(path, instructions))
    }
}
