use std::{error::Error, fmt, time::Duration};

use crate::labels::{BACK, SPACE, Token};

/// Length of the haptic pulse fired on every text mutation.
pub const PULSE: Duration = Duration::from_millis(50);

/// Reasons the text buffer refuses a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeErr {
    /// `append` was given one of the control token labels.
    ReservedToken(String),
    /// `append` was given something other than a single character.
    InvalidLetter(String),
    /// The buffer was closed together with its session.
    Closed,
}

impl fmt::Display for ComposeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedToken(t) => write!(f, "{t:?} is a control token, not a letter"),
            Self::InvalidLetter(l) => write!(f, "{l:?} is not a single letter"),
            Self::Closed => write!(f, "text buffer is closed"),
        }
    }
}

impl Error for ComposeErr {}

/// A haptic actuator. Implementations must return immediately and never fail.
pub trait Feedback {
    fn pulse(&self, duration: Duration);
}

/// Feedback that only leaves a trace in the log, for hosts without a vibration motor.
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn pulse(&self, duration: Duration) {
        log::trace!("haptic pulse {}ms", duration.as_millis());
    }
}

/// Where committed tokens go.
pub trait TextSink {
    fn commit(&mut self, token: Token) -> Result<(), ComposeErr>;
}

/// The editable output text of a session.
#[derive(Default)]
pub struct TextComposer {
    text: String,
    feedback: Option<Box<dyn Feedback>>,
    closed: bool,
}

impl TextComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a composer that pulses `feedback` after every mutation.
    pub fn with_feedback(feedback: Box<dyn Feedback>) -> Self {
        Self {
            feedback: Some(feedback),
            ..Self::default()
        }
    }

    pub fn set_feedback(&mut self, feedback: Option<Box<dyn Feedback>>) {
        self.feedback = feedback;
    }

    /// Detaches the actuator, later mutations no longer pulse.
    pub fn take_feedback(&mut self) -> Option<Box<dyn Feedback>> {
        self.feedback.take()
    }

    /// Appends one letter.
    ///
    /// # Errors
    /// `ReservedToken` for `"space"` and `"back"`, `InvalidLetter` for anything that is not
    /// exactly one character.
    pub fn append(&mut self, letter: &str) -> Result<(), ComposeErr> {
        if letter == SPACE || letter == BACK {
            return Err(ComposeErr::ReservedToken(letter.to_string()));
        }

        let mut chars = letter.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(ComposeErr::InvalidLetter(letter.to_string()));
        };

        self.mutate(|text| text.push(c))
    }

    /// Applies a classifier token: letters append, `space` appends one space and `back`
    /// removes the last character if there is one.
    pub fn commit_token(&mut self, token: Token) -> Result<(), ComposeErr> {
        match token {
            Token::Letter(c) => self.mutate(|text| text.push(c)),
            Token::Space => self.space(),
            Token::Back => self.backspace(),
        }
    }

    pub fn space(&mut self) -> Result<(), ComposeErr> {
        self.mutate(|text| text.push(' '))
    }

    pub fn backspace(&mut self) -> Result<(), ComposeErr> {
        self.mutate(|text| {
            text.pop();
        })
    }

    pub fn clear(&mut self) -> Result<(), ComposeErr> {
        self.mutate(String::clear)
    }

    pub fn read(&self) -> &str {
        &self.text
    }

    /// Returns an owned snapshot of the text, for the clipboard.
    pub fn copy(&self) -> String {
        self.text.clone()
    }

    /// Refuses every later mutation, the text stays readable.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn mutate<F: FnOnce(&mut String)>(&mut self, f: F) -> Result<(), ComposeErr> {
        if self.closed {
            return Err(ComposeErr::Closed);
        }

        f(&mut self.text);

        if let Some(feedback) = &self.feedback {
            feedback.pulse(PULSE);
        }
        Ok(())
    }
}

impl TextSink for TextComposer {
    fn commit(&mut self, token: Token) -> Result<(), ComposeErr> {
        self.commit_token(token)
    }
}
