//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

use crate::Cli;

/// Generate shell completions to stdout.
pub(crate) fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd
        .get_name()
        .to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_to_string(shell: Shell) -> String {
        let mut buf = Vec::new();
        let mut cmd = Cli::command();
        let name = cmd
            .get_name()
            .to_string();
        generate(shell, &mut cmd, name, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_completions_bash_mentions_binary() {
        let output = generate_to_string(Shell::Bash);
        assert!(!output.is_empty());
        assert!(output.contains("mojoflash"));
    }

    #[test]
    fn test_completions_zsh_mentions_binary() {
        let output = generate_to_string(Shell::Zsh);
        assert!(!output.is_empty());
        assert!(output.contains("mojoflash"));
    }

    #[test]
    fn test_completions_fish_mentions_binary() {
        let output = generate_to_string(Shell::Fish);
        assert!(!output.is_empty());
        assert!(output.contains("mojoflash"));
    }
}
