// Terminal prompting
//
// Prompter is the input seam: production reads the terminal, tests feed a
// scripted answer queue. The ask_* helpers wrap it with bounded retry loops
// so a confused operator gets a clean abort instead of an endless prompt.

use std::io::{self, Write};

use crate::error::InstallError;

/// How many bad answers a single prompt tolerates before aborting.
pub const MAX_ATTEMPTS: u32 = 5;

/// Source of operator input.
pub trait Prompter {
    /// Show `prompt` and read one line, trimmed.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Show `prompt` and read a line without echoing it, trimmed.
    fn read_password(&mut self, prompt: &str) -> io::Result<String>;
}

/// Reads from the controlling terminal.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{} ", prompt)?;
        stdout.flush()?;

        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_string())
    }

    fn read_password(&mut self, prompt: &str) -> io::Result<String> {
        let answer = rpassword::prompt_password(format!("{} ", prompt))?;
        Ok(answer.trim().to_string())
    }
}

/// Prompt until a non-empty answer arrives.
pub fn ask_nonempty(
    prompter: &mut dyn Prompter,
    prompt: &str,
    empty_message: &str,
) -> Result<String, InstallError> {
    for _ in 0..MAX_ATTEMPTS {
        let answer = prompter.read_line(prompt)?;
        if answer.is_empty() {
            println!("{}", empty_message);
            continue;
        }
        return Ok(answer);
    }
    Err(InstallError::AttemptsExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

/// Prompt for a password (no echo) until a non-empty answer arrives.
pub fn ask_password(
    prompter: &mut dyn Prompter,
    prompt: &str,
    empty_message: &str,
) -> Result<String, InstallError> {
    for _ in 0..MAX_ATTEMPTS {
        let answer = prompter.read_password(prompt)?;
        if answer.is_empty() {
            println!("{}", empty_message);
            continue;
        }
        return Ok(answer);
    }
    Err(InstallError::AttemptsExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

/// Prompt until the answer is exactly one of the given letters
/// (case-insensitive). The choices are rendered as `[c/e]` after the prompt.
pub fn ask_choice(
    prompter: &mut dyn Prompter,
    prompt: &str,
    choices: &[char],
) -> Result<char, InstallError> {
    let rendered = format!(
        "{} [{}]",
        prompt,
        choices
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join("/")
    );

    for _ in 0..MAX_ATTEMPTS {
        let answer = prompter.read_line(&rendered)?.to_ascii_lowercase();
        let mut chars = answer.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if choices.contains(&c) {
                return Ok(c);
            }
        }
        println!(
            "Please answer with one of: {}",
            choices
                .iter()
                .map(char::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Err(InstallError::AttemptsExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

#[cfg(test)]
pub mod testing {
    use super::Prompter;
    use std::collections::VecDeque;
    use std::io;

    /// Feeds a fixed queue of answers; errors once the script runs dry.
    pub struct ScriptedPrompter {
        answers: VecDeque<String>,
    }

    impl ScriptedPrompter {
        pub fn new<I>(answers: I) -> Self
        where
            I: IntoIterator,
            I::Item: Into<String>,
        {
            Self {
                answers: answers.into_iter().map(Into::into).collect(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn read_line(&mut self, _prompt: &str) -> io::Result<String> {
            self.answers
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }

        fn read_password(&mut self, prompt: &str) -> io::Result<String> {
            self.read_line(prompt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedPrompter;
    use super::*;
    use crate::error::InstallError;

    #[test]
    fn test_ask_nonempty_skips_blank_answers() {
        let mut prompter = ScriptedPrompter::new(["", "", "users"]);
        let answer = ask_nonempty(&mut prompter, "Table?", "Please provide a table.").unwrap();
        assert_eq!(answer, "users");
    }

    #[test]
    fn test_ask_nonempty_gives_up_after_max_attempts() {
        let mut prompter = ScriptedPrompter::new(["", "", "", "", ""]);
        let err = ask_nonempty(&mut prompter, "Table?", "Please provide a table.").unwrap_err();
        assert!(matches!(err, InstallError::AttemptsExhausted { attempts: 5 }));
    }

    #[test]
    fn test_ask_choice_is_case_insensitive() {
        let mut prompter = ScriptedPrompter::new(["C"]);
        assert_eq!(ask_choice(&mut prompter, "Mode?", &['c', 'e']).unwrap(), 'c');
    }

    #[test]
    fn test_ask_choice_rejects_unknown_and_multichar_answers() {
        let mut prompter = ScriptedPrompter::new(["x", "create", "e"]);
        assert_eq!(ask_choice(&mut prompter, "Mode?", &['c', 'e']).unwrap(), 'e');
    }

    #[test]
    fn test_exhausted_script_surfaces_prompt_error() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = ask_nonempty(&mut prompter, "Table?", "Please provide a table.").unwrap_err();
        assert!(matches!(err, InstallError::Prompt(_)));
    }
}
