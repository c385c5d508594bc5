//! Parsed line nodes.
//!
//! One script line parses to exactly one [`Node`]. The set of cases is
//! closed: the parser produces them, the compiler folds them into
//! instructions, and the VM consumes the payload fields listed here. Nodes
//! are immutable once parsed; the VM never mutates them.

// ---------------------------------------------------------------------------
// Payload structs
// ---------------------------------------------------------------------------

/// A spoken line: who says it, how, and what.
///
/// Every field except `dialog` may be empty — `alice "hi"` parses with an
/// empty alias, effect, and expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleDialog {
    pub name: String,
    pub alias: String,
    pub effect: String,
    pub expression: String,
    pub dialog: String,
}

/// A change of a character's expression without dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleExpression {
    pub name: String,
    pub alias: String,
    pub effect: String,
    pub expression: String,
}

/// Stage direction for a character: `name + target` or `name | target`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleOperation {
    pub role_name: String,
    pub operator: RoleOperator,
    pub target: String,
}

/// The two role operators the script language knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoleOperator {
    /// `+` — bring the role on stage with the given target.
    Enter,
    /// `|` — swap the role's current target for another.
    Swap,
}

/// A scene layer change: `+ content` adds a layer, `- content` removes one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scene {
    pub operator: SceneOperator,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SceneOperator {
    /// `+` — add the content to the scene.
    Add,
    /// `-` — remove the content from the scene.
    Remove,
}

/// A host function call: `@func(a, b)`.
///
/// Arguments are passed through as raw trimmed strings; interpreting them is
/// the host's business. `original_text` keeps the full source line so hosts
/// can re-parse richer argument syntax if they want to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionCall {
    pub original_text: String,
    pub function: String,
    pub parameters: Vec<String>,
}

/// One option line: `? name -> file # tag`.
///
/// `path` is the target module (`None` means the current module) and `tag`
/// the target label (`None` means the module start).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionNode {
    pub name: String,
    pub path: Option<String>,
    pub tag: Option<String>,
}

// ---------------------------------------------------------------------------
// The node sum
// ---------------------------------------------------------------------------

/// One parsed line of script.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// Narration shown without a speaker.
    Aside { text: String },
    RoleDialog(RoleDialog),
    RoleExpression(RoleExpression),
    RoleOperation(RoleOperation),
    Scene(Scene),
    /// A full-screen inserted image.
    InsertedImage { path: String },
    FunctionCalling(FunctionCall),
    /// A fenced block of host-language code, evaluated by the embedded-code
    /// bridge when executed.
    EmbeddedCode {
        code_type: String,
        code_content: String,
    },
    /// A branch the user can pick. Only meaningful to the compiler, which
    /// fuses runs of options into a single choice instruction.
    Option(OptionNode),
    /// Dropped by the compiler; also terminates an option run.
    Comment { text: String },
    /// An inert label that `jump` resolves against.
    JumpPoint { label: String },
}

impl Node {
    /// The node's type name, used in error messages and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Aside { .. } => "aside",
            Node::RoleDialog(_) => "role_dialog",
            Node::RoleExpression(_) => "role_expression",
            Node::RoleOperation(_) => "role_operation",
            Node::Scene(_) => "scene",
            Node::InsertedImage { .. } => "inserted_image",
            Node::FunctionCalling(_) => "function_calling",
            Node::EmbeddedCode { .. } => "embedded_code",
            Node::Option(_) => "option",
            Node::Comment { .. } => "comment",
            Node::JumpPoint { .. } => "jump_point",
        }
    }
}
