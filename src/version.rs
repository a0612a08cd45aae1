use crate::engine::{Engine, EngineError};
use std::fmt;

/// One component's version in both of the forms the engine reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentVersion {
    pub number: i32,
    pub text: String,
}

impl ComponentVersion {
    pub fn new(number: i32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// True when the digits of the text form spell the integer form,
    /// e.g. `"3.2.0"` and `320`.
    pub fn is_consistent(&self) -> bool {
        let digits: String = self.text.chars().filter(|c| c.is_ascii_digit()).collect();
        match digits.parse::<i32>() {
            Ok(value) => value == self.number,
            Err(_) => false,
        }
    }
}

impl fmt::Display for ComponentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.text, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVersions {
    pub libmusicxml: ComponentVersion,
    pub musicxml2guido: ComponentVersion,
}

impl EngineVersions {
    /// Query all four versions, in the order the metadata report uses.
    pub fn query(engine: &dyn Engine) -> Result<Self, EngineError> {
        let lib_number = engine.lib_version()?;
        let lib_text = engine.lib_version_str()?;
        let conv_number = engine.musicxml2guido_version()?;
        let conv_text = engine.musicxml2guido_version_str()?;

        Ok(Self {
            libmusicxml: ComponentVersion::new(lib_number, lib_text),
            musicxml2guido: ComponentVersion::new(conv_number, conv_text),
        })
    }

    pub fn is_consistent(&self) -> bool {
        self.libmusicxml.is_consistent() && self.musicxml2guido.is_consistent()
    }
}

impl fmt::Display for EngineVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "libmusicxml {}, musicxml2guido {}",
            self.libmusicxml, self.musicxml2guido
        )
    }
}
