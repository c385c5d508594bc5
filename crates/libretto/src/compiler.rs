//! Compiler: folds a node sequence into a linear instruction program.
//!
//! The interesting rule is option fusion. Option lines are contiguous in
//! source but the user sees one decision point, so a maximal run of option
//! nodes becomes a single choice instruction. A comment terminates a run
//! without producing anything itself, which also makes comments usable as a
//! separator between two adjacent choices. The compiler accepts any node
//! sequence and never fails; nodes it has no rule for are wrapped as
//! statements and rejected by the VM at execution time.

use crate::instruction::{ChoiceOption, ChoiceTarget, Instruction, InstructionKind};
use crate::node::{Node, OptionNode};

/// Folds nodes into instructions.
///
/// The `disposable` flag given at construction propagates to every emitted
/// instruction; the embedded-code `fusion` primitive compiles with it set so
/// that injected programs run exactly once.
pub struct Compiler {
    out: Vec<Instruction>,
    pending: Vec<OptionNode>,
    disposable: bool,
}

impl Compiler {
    /// Compile a node sequence.
    pub fn compile(nodes: &[Node], disposable: bool) -> Vec<Instruction> {
        let mut compiler = Compiler {
            out: Vec::with_capacity(nodes.len()),
            pending: Vec::new(),
            disposable,
        };
        for node in nodes {
            compiler.push_node(node);
        }
        compiler.finish()
    }

    /// Parse script text and compile it in one step.
    pub fn compile_source(source: &str, disposable: bool) -> crate::Result<Vec<Instruction>> {
        let nodes = crate::parser::parse(source)?;
        Ok(Self::compile(&nodes, disposable))
    }

    fn push_node(&mut self, node: &Node) {
        match node {
            Node::Option(option) => self.pending.push(option.clone()),
            Node::Comment { .. } => self.flush_options(),
            _ => {
                self.flush_options();
                self.out
                    .push(Instruction::statement(node.clone(), self.disposable));
            }
        }
    }

    /// Emit the pending option run as one choice instruction.
    fn flush_options(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let options = self
            .pending
            .drain(..)
            .map(|option| ChoiceOption {
                name: option.name,
                target: ChoiceTarget::Jump {
                    path: option.path,
                    tag: option.tag,
                },
            })
            .collect();
        self.out
            .push(Instruction::choice(options, false, self.disposable));
    }

    fn finish(mut self) -> Vec<Instruction> {
        self.flush_options();
        self.out
    }
}
