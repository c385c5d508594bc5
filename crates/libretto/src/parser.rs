//! Line parser: script text to nodes.
//!
//! This is the only module that touches raw script text. Each non-blank line
//! is classified by trying a fixed sequence of regexes and falls back to an
//! aside when nothing matches, so the parser is total except for two error
//! cases: mismatched quotation marks and an unterminated code fence.
//!
//! The grammar, in classification order:
//!
//! ```text
//! // text                           comment
//! ```type ... ```                   embedded code (fenced)
//! * label                           jump point
//! ? name -> file # tag              option (arrow and tag optional)
//! @func(a, b)                       function calling
//! [path]                            inserted image
//! + content   /  - content          scene add / remove
//! name=alias.expr ~effect "dialog"  role dialog (alias/expr/effect optional)
//! name=alias.expr ~effect           role expression (.expr required)
//! name + target  /  name | target   role operation (spaced operator)
//! anything else                     aside
//! ```
//!
//! Dialog accepts either `"..."` or `「...」` quotes.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::node::{
    FunctionCall, Node, OptionNode, RoleDialog, RoleExpression, RoleOperation, RoleOperator,
    Scene, SceneOperator,
};

static JUMP_POINT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*\s*(\S+)$").unwrap());

static OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\?\s*(.+?)(?:\s*->\s*([^\s#]+))?(?:\s*#\s*(\S+))?$").unwrap());

static FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)$").unwrap());

static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]$").unwrap());

static SCENE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([+-])\s*(\S.*)$").unwrap());

static DIALOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^([^\s「」"=.~]+)(?:=([^\s「」".~]+))?(?:\.([^\s「」"~]+))?(?:\s*~([^\s「」"]+))?\s*(?:"([^"]*)"|「([^」]*)」)$"#,
    )
    .unwrap()
});

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\s=.~]+)(?:=([^\s.~]+))?\.([^\s~]+)(?:\s*~(\S+))?$").unwrap());

static ROLE_OP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+([+|])\s+(\S+)$").unwrap());

/// Parse a whole script into its node sequence.
pub fn parse(source: &str) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut lines = source.lines().enumerate();

    while let Some((index, raw)) = lines.next() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        // Fenced embedded code swallows lines until the closing fence.
        if let Some(rest) = line.strip_prefix("```") {
            let code_type = rest.trim().to_string();
            let mut body: Vec<&str> = Vec::new();
            let mut closed = false;
            for (_, raw) in lines.by_ref() {
                if raw.trim() == "```" {
                    closed = true;
                    break;
                }
                body.push(raw);
            }
            if !closed {
                return Err(Error::Syntax {
                    line: index + 1,
                    message: "unterminated code fence".to_string(),
                });
            }
            nodes.push(Node::EmbeddedCode {
                code_type,
                code_content: body.join("\n"),
            });
            continue;
        }

        nodes.push(classify(line, index + 1)?);
    }

    Ok(nodes)
}

/// Classify a single trimmed, non-blank, non-fence line.
fn classify(line: &str, line_number: usize) -> Result<Node> {
    if let Some(text) = line.strip_prefix("//") {
        return Ok(Node::Comment {
            text: text.trim().to_string(),
        });
    }

    if let Some(caps) = JUMP_POINT.captures(line) {
        return Ok(Node::JumpPoint {
            label: caps[1].to_string(),
        });
    }

    if let Some(caps) = OPTION.captures(line) {
        return Ok(Node::Option(OptionNode {
            name: caps[1].to_string(),
            path: caps.get(2).map(|m| m.as_str().to_string()),
            tag: caps.get(3).map(|m| m.as_str().to_string()),
        }));
    }

    if let Some(caps) = FUNCTION.captures(line) {
        let inner = caps[2].trim();
        let parameters = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|p| p.trim().to_string()).collect()
        };
        return Ok(Node::FunctionCalling(FunctionCall {
            original_text: line.to_string(),
            function: caps[1].to_string(),
            parameters,
        }));
    }

    if let Some(caps) = IMAGE.captures(line) {
        return Ok(Node::InsertedImage {
            path: caps[1].to_string(),
        });
    }

    if let Some(caps) = SCENE.captures(line) {
        let operator = match &caps[1] {
            "+" => SceneOperator::Add,
            _ => SceneOperator::Remove,
        };
        return Ok(Node::Scene(Scene {
            operator,
            content: caps[2].to_string(),
        }));
    }

    if let Some(caps) = DIALOG.captures(line) {
        let dialog = caps
            .get(5)
            .or_else(|| caps.get(6))
            .map(|m| m.as_str())
            .unwrap_or_default();
        return Ok(Node::RoleDialog(RoleDialog {
            name: caps[1].to_string(),
            alias: group(&caps, 2),
            expression: group(&caps, 3),
            effect: group(&caps, 4),
            dialog: dialog.to_string(),
        }));
    }

    if let Some(caps) = EXPRESSION.captures(line) {
        return Ok(Node::RoleExpression(RoleExpression {
            name: caps[1].to_string(),
            alias: group(&caps, 2),
            expression: caps[3].to_string(),
            effect: group(&caps, 4),
        }));
    }

    if let Some(caps) = ROLE_OP.captures(line) {
        let operator = match &caps[2] {
            "+" => RoleOperator::Enter,
            _ => RoleOperator::Swap,
        };
        return Ok(Node::RoleOperation(RoleOperation {
            role_name: caps[1].to_string(),
            operator,
            target: caps[3].to_string(),
        }));
    }

    // A quote that opens but never closes is an authoring mistake, not an
    // aside.
    let double = line.matches('"').count();
    let open = line.matches('「').count();
    let close = line.matches('」').count();
    if double % 2 != 0 || open != close {
        return Err(Error::Syntax {
            line: line_number,
            message: "mismatched quotation marks".to_string(),
        });
    }

    Ok(Node::Aside {
        text: line.to_string(),
    })
}

fn group(caps: &regex::Captures<'_>, index: usize) -> String {
    caps.get(index).map(|m| m.as_str().to_string()).unwrap_or_default()
}
