//! The reporting sequence: engine versions, then (given a document) a direct
//! and a transposed conversion.
//!
//! Nothing here recovers from engine failures. An error stops the sequence
//! where it happened and is handed back untouched; lines logged before the
//! failure stay logged.

use crate::engine::{Engine, EngineError};
use crate::sink::LogSink;

/// Interval used for the transposed conversion.
pub const DEFAULT_TRANSPOSE_SEMITONES: i32 = 7;

pub const VERSION_HEADER: &str = "Version :";
pub const CONVERSION_HEADER: &str = "\nMusicXML -> GMN :";
pub const DIRECT_HEADER: &str = "  string2guido  :";
pub const TRANSPOSED_HEADER: &str = "  xmlStringTranspose :";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    pub transpose_semitones: i32,
    pub generate_bars: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            transpose_semitones: DEFAULT_TRANSPOSE_SEMITONES,
            generate_bars: false,
        }
    }
}

/// Log the library and converter versions, five lines.
pub fn report_metadata(engine: &dyn Engine, log: &mut dyn LogSink) -> Result<(), EngineError> {
    log.log(VERSION_HEADER);
    log.log(&format!(
        "  libmusicxml version        {}",
        engine.lib_version()?
    ));
    log.log(&format!(
        "  libmusicxml version str    {}",
        engine.lib_version_str()?
    ));
    log.log(&format!(
        "  musicxml2guido version     {}",
        engine.musicxml2guido_version()?
    ));
    log.log(&format!(
        "  musicxml2guido version str {}",
        engine.musicxml2guido_version_str()?
    ));
    Ok(())
}

/// Convert `doc` as is and transposed by a fifth, logging both results.
///
/// An empty document logs nothing and never reaches the engine.
pub fn report_conversion(
    engine: &dyn Engine,
    log: &mut dyn LogSink,
    doc: &str,
) -> Result<(), EngineError> {
    report_conversion_with(&HarnessConfig::default(), engine, log, doc)
}

pub fn report_conversion_with(
    config: &HarnessConfig,
    engine: &dyn Engine,
    log: &mut dyn LogSink,
    doc: &str,
) -> Result<(), EngineError> {
    if doc.is_empty() {
        return Ok(());
    }

    log.log(CONVERSION_HEADER);

    log.log(DIRECT_HEADER);
    let direct = engine.convert(doc, config.generate_bars)?;
    log.log(&direct);

    log.log(TRANSPOSED_HEADER);
    let transposed = engine.transpose(doc, config.transpose_semitones)?;
    let converted = engine.convert(&transposed, config.generate_bars)?;
    log.log(&converted);

    Ok(())
}

/// Run the full report with the default configuration.
pub fn run(engine: &dyn Engine, log: &mut dyn LogSink, doc: Option<&str>) -> Result<(), EngineError> {
    run_with(&HarnessConfig::default(), engine, log, doc)
}

pub fn run_with(
    config: &HarnessConfig,
    engine: &dyn Engine,
    log: &mut dyn LogSink,
    doc: Option<&str>,
) -> Result<(), EngineError> {
    let doc = doc.filter(|d| !d.is_empty());
    log::trace!(
        "harness run: document={} interval={} bars={}",
        doc.map_or(0, str::len),
        config.transpose_semitones,
        config.generate_bars
    );

    report_metadata(engine, log)?;
    if let Some(doc) = doc {
        report_conversion_with(config, engine, log, doc)?;
    }

    log::trace!("harness run finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guido::check_guido;
    use crate::stub::{StubCall, StubEngine};
    use crate::testing::{install_logger, records_for};
    use pretty_assertions::assert_eq;

    const VALID_DOC: &str = "<score-partwise version=\"4.0\"><part-list/></score-partwise>";

    fn metadata_lines() -> Vec<String> {
        vec![
            "Version :".to_string(),
            "  libmusicxml version        320".to_string(),
            "  libmusicxml version str    3.2.0".to_string(),
            "  musicxml2guido version     210".to_string(),
            "  musicxml2guido version str 2.1.0".to_string(),
        ]
    }

    #[test]
    fn test_absent_document_logs_metadata_only() {
        for doc in [None, Some("")] {
            let engine = StubEngine::new();
            let mut lines: Vec<String> = Vec::new();
            run(&engine, &mut lines, doc).unwrap();

            assert_eq!(lines, metadata_lines());
            assert_eq!(engine.conversion_calls(), 0);
        }
    }

    #[test]
    fn test_end_to_end() {
        let engine = StubEngine::new();
        let mut lines: Vec<String> = Vec::new();
        run(&engine, &mut lines, Some(VALID_DOC)).unwrap();

        let direct = engine.convert(VALID_DOC, false).unwrap();
        let transposed = engine
            .convert(&engine.transpose(VALID_DOC, 7).unwrap(), false)
            .unwrap();

        let mut expected = metadata_lines();
        expected.extend([
            "\nMusicXML -> GMN :".to_string(),
            "  string2guido  :".to_string(),
            direct.clone(),
            "  xmlStringTranspose :".to_string(),
            transposed.clone(),
        ]);
        assert_eq!(lines, expected);
        assert_eq!(lines.len(), 10);

        assert!(check_guido(&lines[7]).is_ok());
        assert!(check_guido(&lines[9]).is_ok());
        assert_ne!(direct, transposed);
    }

    #[test]
    fn test_call_order() {
        let engine = StubEngine::new();
        let mut lines: Vec<String> = Vec::new();
        run(&engine, &mut lines, Some(VALID_DOC)).unwrap();

        assert_eq!(
            engine.calls(),
            vec![
                StubCall::LibVersion,
                StubCall::LibVersionStr,
                StubCall::Musicxml2guidoVersion,
                StubCall::Musicxml2guidoVersionStr,
                StubCall::Convert {
                    generate_bars: false
                },
                StubCall::Transpose { semitones: 7 },
                StubCall::Convert {
                    generate_bars: false
                },
            ]
        );
    }

    #[test]
    fn test_closure_sink() {
        let engine = StubEngine::new();
        let mut count = 0;
        run(&engine, &mut |_: &str| count += 1, Some(VALID_DOC)).unwrap();
        assert_eq!(count, 10);
    }

    #[test]
    fn test_malformed_document_propagates() {
        let engine = StubEngine::new();
        let mut lines: Vec<String> = Vec::new();
        let err = run(&engine, &mut lines, Some("<score-partwise>")).unwrap_err();

        assert!(matches!(err, EngineError::MalformedDocument(_)));
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[6], DIRECT_HEADER);
    }

    #[test]
    fn test_version_failure_stops_report() {
        let engine = StubEngine::new().without_converter();
        let mut lines: Vec<String> = Vec::new();
        let err = run(&engine, &mut lines, Some(VALID_DOC)).unwrap_err();

        assert!(matches!(err, EngineError::Unavailable(_)));
        assert_eq!(lines, metadata_lines()[..3].to_vec());
        assert_eq!(engine.conversion_calls(), 0);
    }

    #[test]
    fn test_custom_config() {
        let engine = StubEngine::new();
        let mut lines: Vec<String> = Vec::new();
        let config = HarnessConfig {
            transpose_semitones: -12,
            generate_bars: true,
        };
        run_with(&config, &engine, &mut lines, Some(VALID_DOC)).unwrap();

        assert_eq!(lines[7], "[ \\meter<\"4/4\"> c1/4 \\bar ]");
        assert_eq!(lines[9], "[ \\meter<\"4/4\"> c0/4 \\bar ]");
    }

    #[test]
    fn test_report_conversion_skips_empty() {
        let engine = StubEngine::new();
        let mut lines: Vec<String> = Vec::new();
        report_conversion(&engine, &mut lines, "").unwrap();
        assert!(lines.is_empty());
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_trace_records() {
        install_logger();

        let engine = StubEngine::new();
        let mut lines: Vec<String> = Vec::new();
        let config = HarnessConfig {
            transpose_semitones: 5,
            generate_bars: true,
        };
        run_with(&config, &engine, &mut lines, Some(VALID_DOC)).unwrap();

        let records = records_for("mxml2gmn::harness");
        let start = format!(
            "harness run: document={} interval=5 bars=true",
            VALID_DOC.len()
        );
        let start_idx = records
            .iter()
            .position(|(level, message)| *level == log::Level::Trace && *message == start)
            .unwrap();
        assert!(
            records[start_idx..]
                .iter()
                .any(|(level, message)| *level == log::Level::Trace
                    && message == "harness run finished")
        );
    }
}
