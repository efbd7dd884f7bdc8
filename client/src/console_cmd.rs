use anyhow::{bail, Context};

pub enum ConsoleCmd {
    Change { row: u32, col: u32, code: char },
    Quit,
}

impl ConsoleCmd {
    /// Commands are `row col colorcode`, or `quit`.
    pub fn parse(input: &str) -> anyhow::Result<ConsoleCmd> {
        if input == "quit" {
            return Ok(ConsoleCmd::Quit);
        }

        let mut parts = input.split_whitespace();
        let (Some(row), Some(col), Some(code)) = (parts.next(), parts.next(), parts.next()) else {
            bail!("expected: row col colorcode");
        };
        if parts.next().is_some() {
            bail!("expected: row col colorcode");
        }

        let row = row.parse().context("row is not a number")?;
        let col = col.parse().context("col is not a number")?;
        let mut chars = code.chars();
        let (Some(code), None) = (chars.next(), chars.next()) else {
            bail!("the color code is a single hex digit");
        };

        Ok(ConsoleCmd::Change { row, col, code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_commands_parse() {
        match ConsoleCmd::parse("1 2 5").unwrap() {
            ConsoleCmd::Change { row, col, code } => {
                assert_eq!((row, col, code), (1, 2, '5'));
            }
            ConsoleCmd::Quit => panic!("unexpected quit"),
        }
        assert!(matches!(ConsoleCmd::parse("quit").unwrap(), ConsoleCmd::Quit));
    }

    #[test]
    fn malformed_commands_are_rejected() {
        assert!(ConsoleCmd::parse("").is_err());
        assert!(ConsoleCmd::parse("1 2").is_err());
        assert!(ConsoleCmd::parse("1 2 5 6").is_err());
        assert!(ConsoleCmd::parse("x 2 5").is_err());
        assert!(ConsoleCmd::parse("1 y 5").is_err());
        assert!(ConsoleCmd::parse("1 2 55").is_err());
    }
}
