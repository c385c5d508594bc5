//! The virtual machine.
//!
//! A [`Vm`] executes a module over a stack of [`Frame`]s, one instruction at
//! a time, until something worth showing happens. The host drives it by
//! calling [`Vm::next_output`] in a loop: each call runs instructions until
//! the first *pause point* (narration, dialogue, an inserted image, or a
//! choice) and returns it together with the side effects that accumulated on
//! the way — scene changes, expression changes, host function calls. `None`
//! means the script is over.
//!
//! After an options pause the VM holds the choice until the next call
//! supplies the selected index; consuming it splices a disposable
//! instruction into the current frame, so a choice is acted on exactly once.
//!
//! The VM mutates its state only inside `next_output`, which takes `&mut
//! self` — the borrow checker enforces that steps are serialised.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use crate::env::Environment;
use crate::error::{Error, Result};
use crate::eval::{Emitter, Evaluator};
use crate::frame::Frame;
use crate::instruction::{ChoiceOption, ChoiceTarget, Instruction, InstructionKind, Module};
use crate::node::{FunctionCall, Node, RoleDialog, RoleExpression, RoleOperation, Scene};

/// The host's answer to an options pause.
///
/// Modelled with an inner `Option` so that "input was supplied but carries
/// no index" is distinguishable from "no input at all" — the two produce
/// different errors.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Input {
    pub option_index: Option<usize>,
}

impl Input {
    /// Input selecting the option at `option_index`.
    pub fn choose(option_index: usize) -> Self {
        Self {
            option_index: Some(option_index),
        }
    }
}

/// Why `next_output` returned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PausePoint {
    /// Narration to display.
    Aside { text: String },
    /// A character speaking.
    RoleDialog(RoleDialog),
    /// A full-screen image to display.
    InsertedImage { path: String },
    /// A decision: the next `next_output` call must carry an
    /// [`Input::choose`] index into `names`.
    Options { names: Vec<String> },
}

/// One step's worth of output.
///
/// Singleton fields hold the step's *latest* occurrence; function calls
/// accumulate per name, later calls overwriting earlier ones with the same
/// name. The host observes the whole record atomically when `next_output`
/// returns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Output {
    pub pause_point: PausePoint,
    pub function_callings: HashMap<String, FunctionCall>,
    pub role_operation: Option<RoleOperation>,
    pub role_expression: Option<RoleExpression>,
    pub scene: Option<Scene>,
}

/// Optional resource bounds, all unlimited by default.
///
/// A script with a pause-free loop (`goto` straight back to a label) would
/// otherwise spin `next_output` forever, and unbounded self-calls would grow
/// the frame stack without limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    /// Maximum instructions dispatched in a single `next_output` call.
    pub step_instructions: Option<u64>,
    /// Maximum frame-stack depth, checked on every call.
    pub frame_depth: Option<usize>,
}

/// Accumulates one step's effects; torn down into an [`Output`] at the end.
#[derive(Default)]
struct OutputBuilder {
    pause_point: Option<PausePoint>,
    function_callings: HashMap<String, FunctionCall>,
    role_operation: Option<RoleOperation>,
    role_expression: Option<RoleExpression>,
    scene: Option<Scene>,
}

impl OutputBuilder {
    fn finish(self) -> Option<Output> {
        let pause_point = self.pause_point?;
        Some(Output {
            pause_point,
            function_callings: self.function_callings,
            role_operation: self.role_operation,
            role_expression: self.role_expression,
            scene: self.scene,
        })
    }
}

/// The script virtual machine.
pub struct Vm<E, V> {
    frames: Vec<Frame>,
    /// The options of a choice waiting for user input.
    pending: Option<Vec<ChoiceOption>>,
    env: E,
    evaluator: V,
    limits: Limits,
}

impl<E: Environment, V: Evaluator> Vm<E, V> {
    /// Create a VM positioned at the start of `module`.
    pub fn new(module: Module, env: E, evaluator: V) -> Self {
        Self {
            frames: vec![Frame::new(Arc::new(module))],
            pending: None,
            env,
            evaluator,
            limits: Limits::default(),
        }
    }

    /// Set resource limits for subsequent steps.
    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Run until the next pause point.
    ///
    /// `input` is required exactly when the previous call paused on
    /// [`PausePoint::Options`]; it is ignored otherwise. Returns `None`
    /// once the script has ended (and on every call thereafter).
    pub fn next_output(&mut self, input: Option<Input>) -> Result<Option<Output>> {
        self.consume_pending(input)?;

        // Frames that ran off the end of their program are done.
        while self.frames.last().is_some_and(Frame::is_ended) {
            self.frames.pop();
            debug!("frame ended, {} remaining", self.frames.len());
        }
        if self.frames.is_empty() {
            return Ok(None);
        }

        let mut out = OutputBuilder::default();
        let mut executed: u64 = 0;
        loop {
            let Some(frame) = self.frames.last_mut() else {
                break;
            };
            if frame.is_ended() {
                self.frames.pop();
                debug!("frame ended, {} remaining", self.frames.len());
                continue;
            }

            // Advance before executing: disposable removal and PC bumps must
            // be visible to jumps and splices triggered by the instruction.
            let instruction = frame.current().clone();
            frame.advance();

            executed += 1;
            if let Some(limit) = self.limits.step_instructions
                && executed > limit
            {
                return Err(Error::InstructionLimitExceeded(limit));
            }

            self.execute(instruction, &mut out)?;
            if out.pause_point.is_some() {
                break;
            }
        }

        Ok(out.finish())
    }

    /// Callback-style surface over [`Vm::next_output`], for callers that
    /// cannot consume the return value directly.
    pub fn next_output_callback<F>(&mut self, input: Option<Input>, callback: F)
    where
        F: FnOnce(Result<Option<Output>>),
    {
        callback(self.next_output(input));
    }

    /// Phase one: turn a pending choice plus the host's input into a
    /// disposable instruction spliced at the current frame's PC.
    ///
    /// Input-validation errors return before anything is consumed, so the
    /// host may retry with a corrected input.
    fn consume_pending(&mut self, input: Option<Input>) -> Result<()> {
        let Some(options) = &self.pending else {
            return Ok(());
        };
        let input = input.ok_or(Error::MissingInput)?;
        let index = input.option_index.ok_or(Error::NullOptionIndex)?;
        let selected = options.get(index).ok_or(Error::OptionIndexOutOfRange {
            index,
            len: options.len(),
        })?;

        let instruction = match &selected.target {
            ChoiceTarget::Jump { path, tag } => {
                Instruction::call(path.clone(), tag.clone(), true)
            }
            ChoiceTarget::Code { code_type, content } => Instruction::statement(
                Node::EmbeddedCode {
                    code_type: code_type.clone(),
                    code_content: content.clone(),
                },
                true,
            ),
        };
        debug!("choice consumed: option {index} '{}'", selected.name);

        if let Some(frame) = self.frames.last_mut() {
            frame.insert(vec![instruction]);
        }
        self.pending = None;
        Ok(())
    }

    fn execute(&mut self, instruction: Instruction, out: &mut OutputBuilder) -> Result<()> {
        match instruction.kind {
            InstructionKind::Statement(node) => self.execute_statement(node, out),

            InstructionKind::Choice { options, .. } => {
                trace!("choice with {} options", options.len());
                out.pause_point = Some(PausePoint::Options {
                    names: options.iter().map(|o| o.name.clone()).collect(),
                });
                self.pending = Some(options);
                Ok(())
            }

            InstructionKind::Call { path, tag } => {
                self.perform_call(path.as_deref(), tag.as_deref())
            }

            InstructionKind::Goto { path, tag } => {
                self.perform_goto(path.as_deref(), tag.as_deref())
            }

            InstructionKind::AdvEnd => {
                debug!("adv_end: clearing {} frames", self.frames.len());
                self.frames.clear();
                Ok(())
            }
        }
    }

    fn execute_statement(&mut self, node: Node, out: &mut OutputBuilder) -> Result<()> {
        trace!("statement: {}", node.type_name());
        match node {
            Node::Aside { text } => out.pause_point = Some(PausePoint::Aside { text }),
            Node::RoleDialog(dialog) => out.pause_point = Some(PausePoint::RoleDialog(dialog)),
            Node::InsertedImage { path } => {
                out.pause_point = Some(PausePoint::InsertedImage { path });
            }

            // Latest occurrence wins within one step.
            Node::RoleOperation(operation) => out.role_operation = Some(operation),
            Node::RoleExpression(expression) => out.role_expression = Some(expression),
            Node::Scene(scene) => out.scene = Some(scene),
            Node::FunctionCalling(call) => {
                out.function_callings.insert(call.function.clone(), call);
            }

            Node::EmbeddedCode {
                code_type,
                code_content,
            } => {
                let mut emitter = Emitter::new();
                self.evaluator.eval(&code_type, &code_content, &mut emitter)?;
                let generated = emitter.into_instructions();
                trace!("embedded code generated {} instructions", generated.len());
                if let Some(frame) = self.frames.last_mut() {
                    frame.insert(generated);
                }
            }

            // Labels are inert during linear execution.
            Node::JumpPoint { .. } => {}

            other => return Err(Error::UnknownInstruction(other.type_name())),
        }
        Ok(())
    }

    /// Resolve `path` to a module to load, or `None` when it denotes the
    /// current module.
    fn target_module(&mut self, path: Option<&str>) -> Result<Option<Arc<Module>>> {
        let Some(path) = path else {
            return Ok(None);
        };
        if path.is_empty() {
            return Ok(None);
        }
        let current = self.frames.last().unwrap().module_path().to_string();
        if self.env.module_path_equals(path, &current)? {
            return Ok(None);
        }
        Ok(Some(self.env.load_module(path, &current)?))
    }

    fn perform_call(&mut self, path: Option<&str>, tag: Option<&str>) -> Result<()> {
        if let Some(limit) = self.limits.frame_depth
            && self.frames.len() >= limit
        {
            return Err(Error::FrameDepthExceeded(limit));
        }

        let callee = match self.target_module(path)? {
            Some(module) => {
                debug!("call into module '{}'", module.path);
                Frame::new(module)
            }
            // A same-module call gets the pristine program, not the caller's
            // mutated working list.
            None => Frame::from_same_module(self.frames.last().unwrap()),
        };
        self.frames.push(callee);
        self.frames.last_mut().unwrap().jump(tag)
    }

    fn perform_goto(&mut self, path: Option<&str>, tag: Option<&str>) -> Result<()> {
        if let Some(module) = self.target_module(path)? {
            debug!("goto replaces top frame with module '{}'", module.path);
            self.frames.pop();
            self.frames.push(Frame::new(module));
        }
        self.frames.last_mut().unwrap().jump(tag)
    }
}
