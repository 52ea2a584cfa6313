//! Verification helpers for testing configuration managers
//!
//! Assertion helpers over issued commands and rendered configuration text.

use thiserror::Error;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected a command containing '{expected}', got {actual:?}")]
    CommandMissing { expected: String, actual: Vec<String> },

    #[error("Command containing '{unexpected}' was executed: '{command}'")]
    UnexpectedCommand { unexpected: String, command: String },

    #[error("Expected {expected} commands matching '{pattern}', found {actual}")]
    CountMismatch {
        pattern: String,
        expected: usize,
        actual: usize,
    },

    #[error("Expected line '{line}' not found in rendered config")]
    LineMissing { line: String },

    #[error("Line '{line}' must not appear in rendered config")]
    UnexpectedLine { line: String },

    #[error("Line '{later}' appears before '{earlier}'")]
    OutOfOrder { earlier: String, later: String },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Command execution verifier
pub struct CommandVerifier {
    captured_commands: Vec<String>,
}

impl CommandVerifier {
    /// Create a new command verifier
    pub fn new(captured_commands: Vec<String>) -> Self {
        Self { captured_commands }
    }

    /// Verify that a command containing `expected` was executed
    pub fn assert_command_executed(&self, expected: &str) -> VerifyResult<()> {
        if self
            .captured_commands
            .iter()
            .any(|cmd| cmd.contains(expected))
        {
            Ok(())
        } else {
            Err(VerificationError::CommandMissing {
                expected: expected.to_string(),
                actual: self.captured_commands.clone(),
            })
        }
    }

    /// Verify that no command containing `unexpected` was executed
    pub fn assert_command_not_executed(&self, unexpected: &str) -> VerifyResult<()> {
        match self
            .captured_commands
            .iter()
            .find(|cmd| cmd.contains(unexpected))
        {
            Some(cmd) => Err(VerificationError::UnexpectedCommand {
                unexpected: unexpected.to_string(),
                command: cmd.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Verify how many commands contain `pattern`
    pub fn assert_matching_count(&self, pattern: &str, expected: usize) -> VerifyResult<()> {
        let actual = self.count_matching(pattern);
        if actual != expected {
            return Err(VerificationError::CountMismatch {
                pattern: pattern.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Verify the total number of commands executed
    pub fn assert_command_count(&self, expected: usize) -> VerifyResult<()> {
        let actual = self.captured_commands.len();
        if actual != expected {
            Err(VerificationError::CountMismatch {
                pattern: "*".to_string(),
                expected,
                actual,
            })
        } else {
            Ok(())
        }
    }

    /// Number of commands containing `pattern`
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.captured_commands
            .iter()
            .filter(|cmd| cmd.contains(pattern))
            .count()
    }
}

/// Line-oriented checks over rendered configuration text.
///
/// Lines are compared after trimming indentation.
pub struct ConfigVerifier<'a> {
    lines: Vec<&'a str>,
}

impl<'a> ConfigVerifier<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().map(str::trim).collect(),
        }
    }

    /// Verify that `line` appears exactly (ignoring indentation)
    pub fn assert_line(&self, line: &str) -> VerifyResult<()> {
        self.position(line, 0)
            .map(|_| ())
            .ok_or_else(|| VerificationError::LineMissing {
                line: line.to_string(),
            })
    }

    /// Verify that no line contains `fragment`
    pub fn assert_no_line_containing(&self, fragment: &str) -> VerifyResult<()> {
        match self.lines.iter().find(|l| l.contains(fragment)) {
            Some(line) => Err(VerificationError::UnexpectedLine {
                line: line.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Verify that every entry of `expected` appears, in that order
    pub fn assert_in_order(&self, expected: &[&str]) -> VerifyResult<()> {
        let mut from = 0;
        let mut previous = "";
        for &line in expected {
            match self.position(line, from) {
                Some(idx) => {
                    from = idx + 1;
                    previous = line;
                }
                None if self.position(line, 0).is_some() => {
                    return Err(VerificationError::OutOfOrder {
                        earlier: previous.to_string(),
                        later: line.to_string(),
                    })
                }
                None => {
                    return Err(VerificationError::LineMissing {
                        line: line.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Number of lines equal to `line`
    pub fn count(&self, line: &str) -> usize {
        self.lines.iter().filter(|l| **l == line).count()
    }

    fn position(&self, line: &str, from: usize) -> Option<usize> {
        self.lines
            .iter()
            .skip(from)
            .position(|l| *l == line)
            .map(|idx| idx + from)
    }
}
