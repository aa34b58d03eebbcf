use std::{fmt, fs, path::Path};

use crate::error::{FingerspellErr, Result};

/// Label of the control token that types a space.
pub const SPACE: &str = "space";
/// Label of the control token that deletes the last character.
pub const BACK: &str = "back";

/// One class of the classifier, typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Letter(char),
    Space,
    Back,
}

impl Token {
    /// Parses a label string.
    ///
    /// # Returns
    /// The token, or `None` if the label is neither a reserved token nor a single character.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            SPACE => Some(Self::Space),
            BACK => Some(Self::Back),
            _ => {
                let mut chars = label.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() => Some(Self::Letter(c)),
                    _ => None,
                }
            }
        }
    }

    pub fn is_back(&self) -> bool {
        matches!(self, Self::Back)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Letter(c) => write!(f, "{c}"),
            Self::Space => f.write_str(SPACE),
            Self::Back => f.write_str(BACK),
        }
    }
}

/// The classifier's class names, index aligned with its output layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    tokens: Vec<Token>,
}

impl Labels {
    /// Parses the labels document, a JSON array of strings.
    ///
    /// # Errors
    /// `ModelLoad` if the document is not an array of strings or one label is not a valid
    /// token.
    pub fn from_json(doc: &str) -> Result<Self> {
        let raw: Vec<String> = serde_json::from_str(doc)
            .map_err(|e| FingerspellErr::ModelLoad(format!("invalid labels: {e}")))?;

        raw.iter()
            .map(|label| {
                Token::parse(label).ok_or_else(|| {
                    FingerspellErr::ModelLoad(format!("invalid label {label:?}"))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(|tokens| Self { tokens })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let doc = fs::read_to_string(path).map_err(|e| {
            FingerspellErr::ModelLoad(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json(&doc)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).copied()
    }
}

impl FromIterator<Token> for Labels {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}
