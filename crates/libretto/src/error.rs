use thiserror::Error;

/// Everything that can go wrong while parsing or running a script.
///
/// All VM failures are fatal for the `next_output` call that raised them.
/// The input-validation variants (`MissingInput`, `NullOptionIndex`,
/// `OptionIndexOutOfRange`) leave the pending choice in place, so the host
/// may call `next_output` again with a corrected input.
#[derive(Debug, Error)]
pub enum Error {
    /// The script text could not be parsed (mismatched quotation marks or
    /// an unterminated code fence).
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A choice is pending but `next_output` was called without input.
    #[error("a choice is pending but no input was supplied")]
    MissingInput,

    /// Input was supplied for a pending choice but carried no option index.
    #[error("input for a pending choice carries no option index")]
    NullOptionIndex,

    /// The supplied option index does not select any option of the pending
    /// choice.
    #[error("option index {index} is out of range for a choice with {len} options")]
    OptionIndexOutOfRange { index: usize, len: usize },

    /// `jump` was asked for a label that no jump point in the current
    /// frame's working list carries.
    #[error("jump point '{0}' not found in the current frame")]
    JumpNotFound(String),

    /// The VM fetched an instruction it has no dispatch rule for, such as a
    /// raw option or comment node smuggled into a program.
    #[error("instruction '{0}' cannot be executed")]
    UnknownInstruction(&'static str),

    /// The host environment failed to load a module or compare paths.
    #[error("environment error: {0}")]
    Environment(String),

    /// The host evaluator failed to run an embedded code block.
    #[error("embedded code error: {0}")]
    Eval(String),

    /// A single `next_output` call dispatched more instructions than the
    /// configured limit allows.
    #[error("instruction limit of {0} exceeded in a single step")]
    InstructionLimitExceeded(u64),

    /// A call would have pushed the frame stack past the configured depth.
    #[error("frame depth limit of {0} exceeded")]
    FrameDepthExceeded(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
