//! Keyboard shortcuts for the editor.
//!
//! Ctrl and Cmd (`meta`) are interchangeable for every binding except
//! Ctrl+Y, which has no Cmd equivalent.

use crate::errors::EditorError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyChord {
    /// Lowercase key name, e.g. `"z"` or `"enter"`
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().to_lowercase(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Parse `"Ctrl+Shift+Z"` style notation
    pub fn parse(input: &str) -> Result<Self, EditorError> {
        let mut chord = KeyChord::default();
        let parts: Vec<&str> = input.split('+').map(str::trim).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(EditorError::InvalidShortcut(input.to_string()));
        };
        if key.is_empty() {
            return Err(EditorError::InvalidShortcut(input.to_string()));
        }

        for modifier in modifiers {
            match modifier.to_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "cmd" | "meta" | "super" => chord.meta = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                _ => return Err(EditorError::InvalidShortcut(input.to_string())),
            }
        }
        chord.key = key.to_lowercase();
        Ok(chord)
    }

    fn primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

impl FromStr for KeyChord {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyChord::parse(s)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.meta {
            write!(f, "Cmd+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        write!(f, "{}", self.key.to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Undo,
    Redo,
    Save,
}

/// Maps key chords to editor commands
#[derive(Debug, Clone, Copy, Default)]
pub struct Keymap;

impl Keymap {
    pub fn new() -> Self {
        Keymap
    }

    pub fn resolve(&self, chord: &KeyChord) -> Option<EditorCommand> {
        if chord.alt || !chord.primary() {
            return None;
        }
        match (chord.key.as_str(), chord.shift) {
            ("z", false) => Some(EditorCommand::Undo),
            ("z", true) => Some(EditorCommand::Redo),
            ("y", false) if chord.ctrl => Some(EditorCommand::Redo),
            ("s", false) => Some(EditorCommand::Save),
            _ => None,
        }
    }
}
