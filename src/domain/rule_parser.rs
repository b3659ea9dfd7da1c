//! Condition DSL parser.
//!
//! Recursive descent parser for trigger conditions such as
//! `AND(ABOVE(TNX, 4.5), NOT(BELOW(DXY, 95)))`. Errors carry the character
//! offset so callers can point at the problem.

use crate::domain::error::ParseError;
use crate::domain::indicator::Indicator;
use crate::domain::rule::Condition;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, ch),
                position: self.pos,
            }),
            None => Err(ParseError {
                message: format!("expected '{}', found end of input", expected),
                position: self.pos,
            }),
        }
    }

    fn peek_word(&self) -> String {
        let mut word = String::new();
        for ch in self.remaining().chars() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
            } else {
                break;
            }
        }
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str: String = self.input[start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_indicator(&mut self) -> Result<Indicator, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let word = self.peek_word();
        let indicator = word.parse::<Indicator>().map_err(|_| ParseError {
            message: format!("expected indicator, found '{}'", word),
            position: start,
        })?;
        self.pos += word.len();
        Ok(indicator)
    }

    fn parse_comparison(&mut self, keyword: &str) -> Result<Condition, ParseError> {
        self.pos += keyword.len();
        self.expect_char('(')?;
        let indicator = self.parse_indicator()?;
        self.expect_char(',')?;
        let threshold = self.parse_number()?;
        self.expect_char(')')?;

        Ok(match keyword {
            "ABOVE" => Condition::Above {
                indicator,
                threshold,
            },
            _ => Condition::Below {
                indicator,
                threshold,
            },
        })
    }

    fn parse_between(&mut self) -> Result<Condition, ParseError> {
        self.pos += "BETWEEN".len();
        self.expect_char('(')?;
        let indicator = self.parse_indicator()?;
        self.expect_char(',')?;
        let lower_pos = self.pos;
        let lower = self.parse_number()?;
        self.expect_char(',')?;
        let upper = self.parse_number()?;
        self.expect_char(')')?;

        if lower > upper {
            return Err(ParseError {
                message: format!("BETWEEN lower bound {} exceeds upper bound {}", lower, upper),
                position: lower_pos,
            });
        }

        Ok(Condition::Between {
            indicator,
            lower,
            upper,
        })
    }

    fn parse_list(&mut self, keyword: &str) -> Result<Vec<Condition>, ParseError> {
        let start = self.pos;
        self.pos += keyword.len();
        self.expect_char('(')?;

        let mut children = vec![self.parse_condition()?];
        loop {
            self.skip_whitespace();
            if self.peek() == Some(')') {
                self.advance();
                break;
            }
            self.expect_char(',')?;
            children.push(self.parse_condition()?);
        }

        if children.len() < 2 {
            return Err(ParseError {
                message: format!("{} requires at least 2 conditions", keyword),
                position: start,
            });
        }
        Ok(children)
    }

    fn parse_not(&mut self) -> Result<Condition, ParseError> {
        self.pos += "NOT".len();
        self.expect_char('(')?;
        let child = self.parse_condition()?;
        self.expect_char(')')?;
        Ok(Condition::Not(Box::new(child)))
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        self.skip_whitespace();

        match self.peek_word().as_str() {
            "ABOVE" => self.parse_comparison("ABOVE"),
            "BELOW" => self.parse_comparison("BELOW"),
            "BETWEEN" => self.parse_between(),
            "AND" => Ok(Condition::And(self.parse_list("AND")?)),
            "OR" => Ok(Condition::Or(self.parse_list("OR")?)),
            "NOT" => self.parse_not(),
            word => Err(ParseError {
                message: format!("expected condition, found '{}'", word),
                position: self.pos,
            }),
        }
    }

    fn parse(&mut self) -> Result<Condition, ParseError> {
        let condition = self.parse_condition()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(ParseError {
                message: format!("unexpected input after condition: '{}'", self.remaining()),
                position: self.pos,
            });
        }
        Ok(condition)
    }
}

pub fn parse(input: &str) -> Result<Condition, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_above() {
        let cond = parse("ABOVE(TNX, 4.5)").unwrap();
        assert_eq!(cond, Condition::above(Indicator::TreasuryYield10y, 4.5));
    }

    #[test]
    fn parse_below_negative_threshold() {
        let cond = parse("BELOW(TIC_MOM, -2.5)").unwrap();
        assert_eq!(cond, Condition::below(Indicator::ForeignHoldingsChange, -2.5));
    }

    #[test]
    fn parse_indicator_is_case_insensitive() {
        let cond = parse("ABOVE(gold, 3200)").unwrap();
        assert_eq!(cond, Condition::above(Indicator::Gold, 3200.0));
    }

    #[test]
    fn parse_number_with_underscores() {
        let cond = parse("ABOVE(BTC, 400_000)").unwrap();
        assert_eq!(cond, Condition::above(Indicator::Bitcoin, 400_000.0));
    }

    #[test]
    fn parse_between() {
        let cond = parse("BETWEEN(DXY, 90, 95.5)").unwrap();
        assert_eq!(
            cond,
            Condition::Between {
                indicator: Indicator::Dxy,
                lower: 90.0,
                upper: 95.5
            }
        );
    }

    #[test]
    fn parse_between_rejects_inverted_bounds() {
        let err = parse("BETWEEN(DXY, 95, 90)").unwrap_err();
        assert!(err.message.contains("exceeds"));
    }

    #[test]
    fn parse_nested_composites() {
        let cond = parse("AND(ABOVE(GOLD, 3200), OR(BELOW(DXY, 95), NOT(ABOVE(TNX, 7))))").unwrap();
        match cond {
            Condition::And(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[1], Condition::Or(_)));
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn display_output_reparses_to_same_condition() {
        let text = "OR(BETWEEN(GOLD, 3000, 3500), NOT(BELOW(TIC_MOM, 0)))";
        let cond = parse(text).unwrap();
        assert_eq!(cond.to_string(), text);
        assert_eq!(parse(&cond.to_string()).unwrap(), cond);
    }

    #[test]
    fn and_requires_two_children() {
        let err = parse("AND(ABOVE(GOLD, 1))").unwrap_err();
        assert!(err.message.contains("at least 2"));
        assert_eq!(err.position, 0);
    }

    #[test]
    fn unknown_indicator_reports_position() {
        let err = parse("ABOVE(SPX, 5000)").unwrap_err();
        assert_eq!(err.position, 6);
        assert!(err.message.contains("SPX"));
    }

    #[test]
    fn missing_comma() {
        let err = parse("ABOVE(TNX 4.5)").unwrap_err();
        assert!(err.message.contains("expected ','"));
        assert_eq!(err.position, 10);
    }

    #[test]
    fn unknown_keyword() {
        let err = parse("CROSS_ABOVE(TNX, 4)").unwrap_err();
        assert!(err.message.contains("CROSS_ABOVE"));
    }

    #[test]
    fn trailing_input_rejected() {
        let err = parse("ABOVE(TNX, 4.5) junk").unwrap_err();
        assert!(err.message.contains("junk"));
        assert_eq!(err.position, 16);
    }

    #[test]
    fn empty_input() {
        let err = parse("   ").unwrap_err();
        assert!(err.message.contains("end of input"));
    }
}
