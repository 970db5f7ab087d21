use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("command template is empty")]
    EmptyTemplate,
    #[error("unterminated quote in command template")]
    UnterminatedQuote,
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        source: io::Error,
    },
}

/// Captured result of one external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A caller-supplied command template, parsed into an argument vector.
///
/// `{dir}` and `{json}` placeholders are substituted at build time; when no
/// `{dir}` placeholder is present the target directory is appended as the
/// final argument. The tool is always invoked with an argument array, never
/// through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    tokens: Vec<String>,
}

impl CommandTemplate {
    pub fn parse(raw: &str) -> Result<Self, ToolError> {
        let tokens = split_tokens(raw)?;
        if tokens.is_empty() {
            return Err(ToolError::EmptyTemplate);
        }
        Ok(Self { tokens })
    }

    /// Resolves placeholders against a target directory and optional JSON path.
    pub fn build(&self, dir: &Path, json: Option<&Path>) -> (String, Vec<String>) {
        let dir_str = dir.display().to_string();
        let json_str = json.map(|p| p.display().to_string());

        let mut resolved: Vec<String> = Vec::with_capacity(self.tokens.len() + 1);
        let mut saw_dir = false;
        for token in &self.tokens {
            let mut value = token.replace("{dir}", &dir_str);
            if let Some(json_str) = json_str.as_deref() {
                value = value.replace("{json}", json_str);
            }
            if token.contains("{dir}") {
                saw_dir = true;
            }
            resolved.push(value);
        }
        if !saw_dir {
            resolved.push(dir_str);
        }

        let program = resolved.remove(0);
        (program, resolved)
    }
}

/// Splits a template into whitespace-separated tokens, honoring single and
/// double quotes so paths with spaces survive.
fn split_tokens(raw: &str) -> Result<Vec<String>, ToolError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in raw.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quote.is_some() {
        return Err(ToolError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Capability interface for the external metadata tool: run it with an
/// argument array inside a working directory, capture stdout, stderr and the
/// exit code. The tool itself is an opaque collaborator.
pub trait ToolInvoker: Send + Sync {
    fn invoke(&self, program: &str, args: &[String], cwd: &Path) -> Result<ToolOutput, ToolError>;
}

/// Invokes the tool as a real child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemToolInvoker;

impl ToolInvoker for SystemToolInvoker {
    fn invoke(&self, program: &str, args: &[String], cwd: &Path) -> Result<ToolOutput, ToolError> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ToolError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
