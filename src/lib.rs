//! mxml2gmn - MusicXML to Guido conversion harness
//!
//! Drives a MusicXML to Guido Music Notation engine through a fixed
//! reporting sequence: library versions first, then a direct conversion and
//! a transposed conversion, every line going to a caller supplied sink.

pub mod conformance;
pub mod engine;
pub mod guido;
pub mod harness;
pub mod host;
pub mod sink;
pub mod stub;
pub mod version;

#[cfg(test)]
mod testing;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use conformance::{ConformanceReport, verify_engine};
pub use engine::{Engine, EngineError, HaltOnSinkFailure};
pub use guido::{GuidoError, GuidoSummary, check_guido};
pub use harness::{HarnessConfig, report_conversion, report_metadata, run, run_with};
pub use host::{Entry, Exports, HostConfig, bootstrap};
pub use sink::{LogFacadeSink, LogSink, SinkFailure, StdoutSink};
pub use stub::{StubCall, StubEngine};
pub use version::{ComponentVersion, EngineVersions};

pub type Result<T> = std::result::Result<T, EngineError>;
