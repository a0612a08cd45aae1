//! In-memory engine for smoke tests.
//!
//! `StubEngine` accepts any document with a `score-partwise` or
//! `score-timewise` root and converts it to a single one-note Guido voice.
//! Transpositions are recorded in the document as processing instructions,
//! so the pitch of the emitted note reflects every interval applied so far.

use crate::engine::{Engine, EngineError};
use crate::version::ComponentVersion;
use std::cell::RefCell;

const TRANSPOSE_PI: &str = "<?mxml2gmn-transpose ";
const PI_END: &str = "?>";
const MAX_INTERVAL: i32 = 127;

const PITCH_NAMES: [&str; 12] = [
    "c", "c#", "d", "e&", "e", "f", "f#", "g", "g#", "a", "b&", "b",
];

const ROOTS: [&str; 2] = ["score-partwise", "score-timewise"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubCall {
    LibVersion,
    LibVersionStr,
    Musicxml2guidoVersion,
    Musicxml2guidoVersionStr,
    Convert { generate_bars: bool },
    Transpose { semitones: i32 },
}

impl StubCall {
    pub fn is_conversion(&self) -> bool {
        matches!(self, StubCall::Convert { .. } | StubCall::Transpose { .. })
    }
}

#[derive(Debug)]
pub struct StubEngine {
    libmusicxml: ComponentVersion,
    musicxml2guido: ComponentVersion,
    converter_available: bool,
    calls: RefCell<Vec<StubCall>>,
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            libmusicxml: ComponentVersion::new(320, "3.2.0"),
            musicxml2guido: ComponentVersion::new(210, "2.1.0"),
            converter_available: true,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_lib_version(mut self, number: i32, text: &str) -> Self {
        self.libmusicxml = ComponentVersion::new(number, text);
        self
    }

    pub fn with_musicxml2guido_version(mut self, number: i32, text: &str) -> Self {
        self.musicxml2guido = ComponentVersion::new(number, text);
        self
    }

    /// Make every musicxml2guido query and conversion fail with
    /// [`EngineError::Unavailable`].
    pub fn without_converter(mut self) -> Self {
        self.converter_available = false;
        self
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<StubCall> {
        self.calls.borrow().clone()
    }

    pub fn conversion_calls(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.is_conversion()).count()
    }

    fn record(&self, call: StubCall) {
        self.calls.borrow_mut().push(call);
    }

    fn require_converter(&self) -> Result<(), EngineError> {
        if self.converter_available {
            Ok(())
        } else {
            Err(EngineError::Unavailable("musicxml2guido".to_string()))
        }
    }
}

impl Engine for StubEngine {
    fn lib_version(&self) -> Result<i32, EngineError> {
        self.record(StubCall::LibVersion);
        Ok(self.libmusicxml.number)
    }

    fn lib_version_str(&self) -> Result<String, EngineError> {
        self.record(StubCall::LibVersionStr);
        Ok(self.libmusicxml.text.clone())
    }

    fn musicxml2guido_version(&self) -> Result<i32, EngineError> {
        self.record(StubCall::Musicxml2guidoVersion);
        self.require_converter()?;
        Ok(self.musicxml2guido.number)
    }

    fn musicxml2guido_version_str(&self) -> Result<String, EngineError> {
        self.record(StubCall::Musicxml2guidoVersionStr);
        self.require_converter()?;
        Ok(self.musicxml2guido.text.clone())
    }

    fn convert(&self, doc: &str, generate_bars: bool) -> Result<String, EngineError> {
        self.record(StubCall::Convert { generate_bars });
        self.require_converter()?;
        check_document(doc)?;

        let offset = accumulated_transposition(doc)?;
        let pitch = PITCH_NAMES[offset.rem_euclid(12) as usize];
        let octave = 1 + offset.div_euclid(12);

        let mut gmn = format!("[ \\meter<\"4/4\"> {}{}/4", pitch, octave);
        if generate_bars {
            gmn.push_str(" \\bar");
        }
        gmn.push_str(" ]");
        Ok(gmn)
    }

    fn transpose(&self, doc: &str, semitones: i32) -> Result<String, EngineError> {
        self.record(StubCall::Transpose { semitones });
        check_document(doc)?;

        if !(-MAX_INTERVAL..=MAX_INTERVAL).contains(&semitones) {
            return Err(EngineError::InvalidInterval(semitones));
        }
        if semitones == 0 {
            return Ok(doc.to_string());
        }

        let pi = format!("{}{}{}", TRANSPOSE_PI, semitones, PI_END);
        let insert_at = declaration_end(doc).unwrap_or(0);
        let mut out = String::with_capacity(doc.len() + pi.len());
        out.push_str(&doc[..insert_at]);
        out.push_str(&pi);
        out.push_str(&doc[insert_at..]);
        Ok(out)
    }
}

fn check_document(doc: &str) -> Result<(), EngineError> {
    for root in ROOTS {
        let open = format!("<{}", root);
        let close = format!("</{}>", root);
        if let (Some(start), Some(end)) = (doc.find(&open), doc.rfind(&close)) {
            if start < end {
                return Ok(());
            }
        }
    }
    Err(EngineError::MalformedDocument(
        "expected a score-partwise or score-timewise root element".to_string(),
    ))
}

// Byte offset just past a leading `<?xml ... ?>` declaration.
fn declaration_end(doc: &str) -> Option<usize> {
    let start = doc.len() - doc.trim_start().len();
    if !doc[start..].starts_with("<?xml") {
        return None;
    }
    doc[start..].find(PI_END).map(|idx| start + idx + PI_END.len())
}

fn accumulated_transposition(doc: &str) -> Result<i32, EngineError> {
    let mut total = 0i32;
    for (idx, _) in doc.match_indices(TRANSPOSE_PI) {
        let rest = &doc[idx + TRANSPOSE_PI.len()..];
        let end = rest.find(PI_END).ok_or_else(|| {
            EngineError::MalformedDocument("unterminated processing instruction".to_string())
        })?;
        let amount: i32 = rest[..end].trim().parse().map_err(|_| {
            EngineError::MalformedDocument(format!(
                "invalid transposition value: {}",
                &rest[..end]
            ))
        })?;
        total = total.checked_add(amount).ok_or_else(|| {
            EngineError::MalformedDocument("accumulated transposition overflows".to_string())
        })?;
    }
    Ok(total)
}
