use crate::sink::SinkFailure;
use thiserror::Error;

/// Failures raised by a conversion engine.
///
/// The harness never inspects or rewraps these; whatever the engine returns
/// is what the caller of [`crate::run`] receives.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed MusicXML document: {0}")]
    MalformedDocument(String),

    #[error("invalid transposition interval: {0} semitones")]
    InvalidInterval(i32),

    #[error("conversion engine unavailable: {0}")]
    Unavailable(String),

    /// Failure raised by the host side of a binding (a Python exception, for
    /// instance), carried as is.
    #[error(transparent)]
    Host(Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    pub fn host<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EngineError::Host(Box::new(err))
    }
}

/// MusicXML to Guido conversion engine.
///
/// Method names follow the engine's own vocabulary: `libmusicxml` is the
/// library as a whole, `musicxml2guido` the embedded converter.
pub trait Engine {
    /// Integer library version, e.g. `320`.
    fn lib_version(&self) -> Result<i32, EngineError>;

    /// Human readable library version, e.g. `"3.2.0"`.
    fn lib_version_str(&self) -> Result<String, EngineError>;

    fn musicxml2guido_version(&self) -> Result<i32, EngineError>;

    fn musicxml2guido_version_str(&self) -> Result<String, EngineError>;

    /// Translate a MusicXML document into Guido Music Notation text.
    ///
    /// Fails with [`EngineError::MalformedDocument`] when `doc` is not
    /// well-formed MusicXML.
    fn convert(&self, doc: &str, generate_bars: bool) -> Result<String, EngineError>;

    /// Return `doc` with every pitch shifted by `semitones`.
    ///
    /// `semitones == 0` must leave the document semantically unchanged, and
    /// the output must be accepted by [`Engine::convert`].
    fn transpose(&self, doc: &str, semitones: i32) -> Result<String, EngineError>;
}

/// Engine wrapper that refuses every call once `failure` holds a sink
/// error, so a run stops at the first line its sink could not deliver.
pub struct HaltOnSinkFailure<'a, F> {
    inner: &'a dyn Engine,
    failure: SinkFailure<F>,
}

impl<'a, F> HaltOnSinkFailure<'a, F> {
    pub fn new(inner: &'a dyn Engine, failure: SinkFailure<F>) -> Self {
        Self { inner, failure }
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.failure.is_set() {
            Err(EngineError::Unavailable(
                "log sink failed, run halted".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl<F> Engine for HaltOnSinkFailure<'_, F> {
    fn lib_version(&self) -> Result<i32, EngineError> {
        self.check()?;
        self.inner.lib_version()
    }

    fn lib_version_str(&self) -> Result<String, EngineError> {
        self.check()?;
        self.inner.lib_version_str()
    }

    fn musicxml2guido_version(&self) -> Result<i32, EngineError> {
        self.check()?;
        self.inner.musicxml2guido_version()
    }

    fn musicxml2guido_version_str(&self) -> Result<String, EngineError> {
        self.check()?;
        self.inner.musicxml2guido_version_str()
    }

    fn convert(&self, doc: &str, generate_bars: bool) -> Result<String, EngineError> {
        self.check()?;
        self.inner.convert(doc, generate_bars)
    }

    fn transpose(&self, doc: &str, semitones: i32) -> Result<String, EngineError> {
        self.check()?;
        self.inner.transpose(doc, semitones)
    }
}
