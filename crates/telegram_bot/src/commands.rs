//! Command-line splitting for inbound messages.

/// A message split into a command token and its arguments.
///
/// The command token is lowercased; arguments keep their case. Dispatch is
/// by exact token, so `/list` never shadows `/list_tables`. Text that
/// matches no known command falls through to the state and transaction
/// handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CommandLine {
    pub command: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub(crate) fn parse(text: &str) -> Self {
        let mut tokens = text.split_whitespace();
        let command = tokens.next().unwrap_or("").to_lowercase();
        let args = tokens.map(str::to_string).collect();
        Self { command, args }
    }

    pub(crate) fn is_command(&self) -> bool {
        self.command.starts_with('/')
    }

    /// Arguments re-joined, for commands that take free text.
    pub(crate) fn tail(&self) -> String {
        self.args.join(" ")
    }
}
