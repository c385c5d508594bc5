//! The embedded-code bridge.
//!
//! Scripts can carry fenced blocks of host-language code. When the VM
//! executes one it hands the code to the host's [`Evaluator`] together with
//! an [`Emitter`] — the only way embedded code can influence the VM. The
//! emitter exposes five primitives, each appending to a buffer of generated
//! instructions that the VM splices into the current frame at the program
//! counter once evaluation returns. There is no implicit pause: execution
//! continues straight into the injected instructions.
//!
//! Every generated instruction is disposable — it represents a one-shot
//! computed effect, while the embedded-code block itself re-evaluates if
//! control re-enters it.
//!
//! The evaluator is deliberately opaque: production hosts embed a scripting
//! runtime, tests use a closure. The VM makes no sandboxing guarantees.

use crate::error::{Error, Result};
use crate::instruction::{ChoiceOption, ChoiceTarget, Instruction};

/// Host-provided evaluator for embedded code blocks.
///
/// Any `FnMut(&str, &str, &mut Emitter) -> Result<()>` closure qualifies,
/// which is the convenient form for tests:
///
/// ```
/// use libretto::{Emitter, Result};
///
/// let mut evaluator = |_code_type: &str, code: &str, emitter: &mut Emitter| -> Result<()> {
///     if code == "bail" {
///         emitter.adv_end();
///     }
///     Ok(())
/// };
/// # let _ = &mut evaluator;
/// ```
///
/// [`NoEvaluator`] rejects all embedded code, for hosts whose scripts
/// contain none.
pub trait Evaluator {
    /// Evaluate one code block. `code_type` is the fence's language marker
    /// (possibly empty); instructions appended to `emitter` are spliced
    /// into the current frame after this returns.
    fn eval(&mut self, code_type: &str, code: &str, emitter: &mut Emitter) -> Result<()>;
}

impl<F> Evaluator for F
where
    F: FnMut(&str, &str, &mut Emitter) -> Result<()>,
{
    fn eval(&mut self, code_type: &str, code: &str, emitter: &mut Emitter) -> Result<()> {
        self(code_type, code, emitter)
    }
}

/// An evaluator for hosts whose scripts carry no embedded code; it fails on
/// any code block it is handed.
pub struct NoEvaluator;

impl Evaluator for NoEvaluator {
    fn eval(&mut self, code_type: &str, _code: &str, _emitter: &mut Emitter) -> Result<()> {
        Err(Error::Eval(format!(
            "this host does not evaluate embedded code (code type '{code_type}')"
        )))
    }
}

/// The five instruction-emitting primitives exposed to embedded code.
#[derive(Default)]
pub struct Emitter {
    generated: Vec<Instruction>,
}

impl Emitter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Compile script text and append the resulting instructions.
    pub fn fusion(&mut self, source: &str) -> Result<()> {
        let compiled = crate::compiler::Compiler::compile_source(source, true)?;
        self.generated.extend(compiled);
        Ok(())
    }

    /// Append a jump to `tag` in `path` (`None` = current module / module
    /// start).
    pub fn goto(&mut self, path: Option<&str>, tag: Option<&str>) {
        self.generated.push(Instruction::goto(
            path.map(str::to_string),
            tag.map(str::to_string),
            true,
        ));
    }

    /// Append a call to `tag` in `path` (`None` = current module / module
    /// start).
    pub fn call(&mut self, path: Option<&str>, tag: Option<&str>) {
        self.generated.push(Instruction::call(
            path.map(str::to_string),
            tag.map(str::to_string),
            true,
        ));
    }

    /// Append a choice whose options each carry a `(name, content,
    /// code_type)` snippet; the snippet of the selected option is evaluated
    /// when the user picks it.
    pub fn choice<I, S>(&mut self, options: I)
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(name, content, code_type)| ChoiceOption {
                name: name.into(),
                target: ChoiceTarget::Code {
                    code_type: code_type.into(),
                    content: content.into(),
                },
            })
            .collect();
        self.generated.push(Instruction::choice(options, true, true));
    }

    /// Append a terminate-script instruction.
    pub fn adv_end(&mut self) {
        self.generated.push(Instruction::adv_end(true));
    }

    pub(crate) fn into_instructions(self) -> Vec<Instruction> {
        self.generated
    }
}
