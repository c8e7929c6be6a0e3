// Request tokens: "12", "12h", "12hv", "v12" or the wildcard "?"
use crate::item::ItemId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const WILDCARD: &str = "?";

/// An explicit item reference with orientation markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: ItemId,
    #[serde(default)]
    pub flip_horizontal: bool,
    #[serde(default)]
    pub flip_vertical: bool,
}

impl ItemRef {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            flip_horizontal: false,
            flip_vertical: false,
        }
    }

    #[must_use]
    pub fn flipped(mut self) -> Self {
        self.flip_horizontal = true;
        self
    }

    #[must_use]
    pub fn upside_down(mut self) -> Self {
        self.flip_vertical = true;
        self
    }
}

/// One element of a completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Explicit(ItemRef),
    Wildcard,
}

impl Token {
    pub fn explicit(id: ItemId) -> Self {
        Token::Explicit(ItemRef::new(id))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Token::Wildcard)
    }

    pub fn item_ref(&self) -> Option<&ItemRef> {
        match self {
            Token::Explicit(r) => Some(r),
            Token::Wildcard => None,
        }
    }
}

impl From<ItemRef> for Token {
    fn from(r: ItemRef) -> Self {
        Token::Explicit(r)
    }
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == WILDCARD {
            return Ok(Token::Wildcard);
        }

        let mut digits = String::new();
        let mut runs = 0;
        let mut in_run = false;
        let mut item = ItemRef::new(0);
        for c in s.chars() {
            match c {
                '0'..='9' => {
                    if !in_run {
                        runs += 1;
                        in_run = true;
                    }
                    digits.push(c);
                }
                'h' | 'H' => {
                    in_run = false;
                    item.flip_horizontal = true;
                }
                'v' | 'V' => {
                    in_run = false;
                    item.flip_vertical = true;
                }
                _ => {
                    return Err(Error::InvalidToken(format!(
                        "'{}' contains unexpected character '{}'",
                        s, c
                    )))
                }
            }
        }

        if runs != 1 {
            return Err(Error::InvalidToken(format!(
                "'{}' must contain exactly one number",
                s
            )));
        }
        item.id = digits
            .parse()
            .map_err(|_| Error::InvalidToken(format!("'{}' is not a valid id", s)))?;
        Ok(Token::Explicit(item))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Wildcard => write!(f, "{}", WILDCARD),
            Token::Explicit(r) => {
                write!(f, "{}", r.id)?;
                if r.flip_horizontal {
                    write!(f, "h")?;
                }
                if r.flip_vertical {
                    write!(f, "v")?;
                }
                Ok(())
            }
        }
    }
}

/// Parse every token of a request, failing on the first bad one
pub fn parse_tokens<I, S>(tokens: I) -> Result<Vec<Token>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens.into_iter().map(|t| t.as_ref().parse()).collect()
}
