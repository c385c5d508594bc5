//! Libretto - an embeddable virtual machine for visual-novel scripts
//!
//! Libretto executes a line-oriented "adventure" scripting language: plain
//! text where each line is narration, character dialogue, a stage
//! direction, a branch option, a label, a host function call, or a fenced
//! block of host-embedded code. The engine turns a script into a stream of
//! *outputs* — pause points plus accumulated side effects — that a renderer
//! consumes one step at a time, feeding back the user's choices.
//!
//! # Features
//!
//! - **Single-stepped**: the host drives the VM with [`Vm::next_output`];
//!   nothing happens between calls
//! - **Option fusion**: consecutive option lines compile into one choice
//!   point
//! - **Cross-module flow**: calls and gotos across scripts, resolved by a
//!   host-provided [`Environment`]
//! - **Self-modifying programs**: embedded code injects instructions into
//!   the running frame through five fixed primitives
//!
//! # Quick Start
//!
//! ```
//! use libretto::{Input, MemoryEnvironment, Module, NoEvaluator, PausePoint, Vm};
//!
//! let module = Module::compile(
//!     "intro",
//!     r#"
//! The rain had only just stopped.
//! alice "Did you hear that?"
//! ? Listen # listen
//! ? Keep walking # walk
//! * listen
//! Something moves in the hedge.
//! * walk
//! You hurry on.
//! "#,
//! )
//! .unwrap();
//!
//! // No other scripts, no embedded code.
//! let mut vm = Vm::new(module, MemoryEnvironment::new(), NoEvaluator);
//!
//! let out = vm.next_output(None).unwrap().unwrap();
//! assert_eq!(
//!     out.pause_point,
//!     PausePoint::Aside { text: "The rain had only just stopped.".to_string() }
//! );
//!
//! let out = vm.next_output(None).unwrap().unwrap();
//! assert!(matches!(out.pause_point, PausePoint::RoleDialog(_)));
//!
//! let out = vm.next_output(None).unwrap().unwrap();
//! assert_eq!(
//!     out.pause_point,
//!     PausePoint::Options { names: vec!["Listen".to_string(), "Keep walking".to_string()] }
//! );
//!
//! // Pick the second option; the branch under `walk` plays next.
//! let out = vm.next_output(Some(Input::choose(1))).unwrap().unwrap();
//! assert_eq!(
//!     out.pause_point,
//!     PausePoint::Aside { text: "You hurry on.".to_string() }
//! );
//! ```
//!
//! # Script grammar
//!
//! One node per line; blank lines are skipped:
//!
//! ```text
//! // text                           comment
//! * label                           jump point
//! ? name -> file # tag              option (arrow and tag optional)
//! @func(a, b)                       host function call
//! [path]                            inserted image
//! + content   /  - content          scene add / remove
//! name=alias.expr ~effect "dialog"  role dialog (alias/expr/effect optional)
//! name=alias.expr ~effect           role expression
//! name + target  /  name | target   role operation
//! anything else                     aside (narration)
//! ```
//!
//! plus triple-backtick fences for embedded code. Dialog quotes may be
//! `"..."` or `「...」`.
//!
//! # Host integration
//!
//! Three seams, all traits:
//!
//! - [`Environment`] — loads modules by path and decides path equivalence.
//!   [`MemoryEnvironment`] preloads everything from memory.
//! - [`Evaluator`] — runs embedded code blocks against an [`Emitter`] of
//!   exactly five instruction-generating primitives. Closures implement it;
//!   [`NoEvaluator`] rejects all embedded code.
//! - The renderer — whatever consumes [`Output`]s and supplies [`Input`]s.
//!
//! # Not Supported
//!
//! - Rendering and audio
//! - Persisting VM state
//! - Script type-checking
//! - Sandboxing of embedded code
//! - Concurrency between scripts

mod compiler;
mod env;
mod error;
mod eval;
mod frame;
mod instruction;
mod node;
mod parser;
mod vm;

pub use compiler::Compiler;
pub use env::{Environment, MemoryEnvironment};
pub use error::{Error, Result};
pub use eval::{Emitter, Evaluator, NoEvaluator};
pub use instruction::{ChoiceOption, ChoiceTarget, Instruction, InstructionKind, Module};
pub use node::{
    FunctionCall, Node, OptionNode, RoleDialog, RoleExpression, RoleOperation, RoleOperator,
    Scene, SceneOperator,
};
pub use parser::parse;
pub use vm::{Input, Limits, Output, PausePoint, Vm};
