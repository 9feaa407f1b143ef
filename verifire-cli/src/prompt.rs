//! Line-oriented prompts for fields not supplied on the command line.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};

/// Reads prompts from any line source, writing the questions to `out`.
pub struct Prompter<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub const fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Returns `given` if present, otherwise asks for a line.
    pub fn text(&mut self, given: Option<String>, question: &str) -> Result<String> {
        match given {
            Some(value) => Ok(value),
            None => self.ask(question),
        }
    }

    /// Like [`Prompter::text`], but an empty answer means "absent".
    pub fn optional(&mut self, given: Option<String>, question: &str) -> Result<Option<String>> {
        if given.is_some() {
            return Ok(given);
        }
        let answer = self.ask(question)?;
        Ok(if answer.is_empty() { None } else { Some(answer) })
    }

    /// Asks until the answer parses as a non-negative whole number.
    pub fn age(&mut self, given: Option<u32>, question: &str) -> Result<u32> {
        if let Some(age) = given {
            return Ok(age);
        }
        loop {
            let answer = self.ask(question)?;
            match answer.parse::<u32>() {
                Ok(age) => return Ok(age),
                Err(_) => {
                    writeln!(self.out, "Invalid age. Please enter a positive whole number.")?;
                }
            }
        }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.out, "{question}: ")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed while waiting for: {question}");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}
