//! Python host for the harness using PyO3

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::engine::{Engine, EngineError, HaltOnSinkFailure};
use crate::guido::check_guido as rust_check_guido;
use crate::host::{Entry, HostConfig, bootstrap};
use crate::sink::{LogSink, SinkFailure};

pyo3::create_exception!(mxml2gmn, GuidoError, PyValueError);
pyo3::create_exception!(mxml2gmn, EngineFailure, PyRuntimeError);

/// Engine implemented by a Python object exposing the libmusicxml binding
/// methods.
struct PyEngine<'py> {
    inner: Bound<'py, PyAny>,
}

impl<'py> PyEngine<'py> {
    fn call0<T>(&self, method: &str) -> Result<T, EngineError>
    where
        T: for<'a> FromPyObject<'a>,
    {
        self.inner
            .call_method0(method)
            .and_then(|value| value.extract::<T>())
            .map_err(EngineError::host)
    }
}

impl Engine for PyEngine<'_> {
    fn lib_version(&self) -> Result<i32, EngineError> {
        self.call0("libVersion")
    }

    fn lib_version_str(&self) -> Result<String, EngineError> {
        self.call0("libVersionStr")
    }

    fn musicxml2guido_version(&self) -> Result<i32, EngineError> {
        self.call0("musicxml2guidoVersion")
    }

    fn musicxml2guido_version_str(&self) -> Result<String, EngineError> {
        self.call0("musicxml2guidoVersionStr")
    }

    fn convert(&self, doc: &str, generate_bars: bool) -> Result<String, EngineError> {
        self.inner
            .call_method1("string2guido", (doc, generate_bars))
            .and_then(|value| value.extract::<String>())
            .map_err(EngineError::host)
    }

    fn transpose(&self, doc: &str, semitones: i32) -> Result<String, EngineError> {
        self.inner
            .call_method1("xmlStringTranspose", (doc, semitones))
            .and_then(|value| value.extract::<String>())
            .map_err(EngineError::host)
    }
}

/// Sink calling a Python callable. The first exception raised by the
/// callable is recorded in `failure`, which halts the engine.
struct PyLogSink<'py> {
    callback: Bound<'py, PyAny>,
    failure: SinkFailure<PyErr>,
}

impl LogSink for PyLogSink<'_> {
    fn log(&mut self, text: &str) {
        if self.failure.is_set() {
            return;
        }
        if let Err(e) = self.callback.call1((text,)) {
            self.failure.record(e);
        }
    }
}

fn into_py_err(err: EngineError) -> PyErr {
    match err {
        EngineError::Host(inner) => match inner.downcast::<PyErr>() {
            Ok(py_err) => *py_err,
            Err(other) => EngineFailure::new_err(other.to_string()),
        },
        other => EngineFailure::new_err(other.to_string()),
    }
}

fn registered_entry() -> PyResult<Entry> {
    bootstrap(&HostConfig::module())
        .registered()
        .ok_or_else(|| PyRuntimeError::new_err("harness entry point is not registered"))
}

/// Print engine versions and, when `xml` is given, its Guido conversions
///
/// Example:
///     mxml2gmn.run(lib, print, open("score.xml").read())
#[pyfunction]
#[pyo3(signature = (engine, log, xml=None))]
fn run(engine: Bound<'_, PyAny>, log: Bound<'_, PyAny>, xml: Option<&str>) -> PyResult<()> {
    let entry = registered_entry()?;
    let failure = SinkFailure::new();
    let py_engine = PyEngine { inner: engine };
    let engine = HaltOnSinkFailure::new(&py_engine, failure.clone());
    let mut sink = PyLogSink {
        callback: log,
        failure: failure.clone(),
    };

    let result = entry(&engine, &mut sink, xml);
    if let Some(e) = failure.take() {
        return Err(e);
    }
    result.map_err(into_py_err)
}

/// Check Guido text structure
///
/// Returns (voices, events, tags). Raises GuidoError if malformed.
#[pyfunction]
fn check_guido(text: &str) -> PyResult<(usize, usize, usize)> {
    match rust_check_guido(text) {
        Ok(summary) => Ok((summary.voices, summary.events, summary.tags)),
        Err(e) => Err(GuidoError::new_err(format!("Malformed Guido text: {}", e))),
    }
}

/// MusicXML to Guido conversion harness
///
/// Example:
///     import mxml2gmn
///     mxml2gmn.run(libmusicxml_instance, print, xml)
#[pymodule]
fn mxml2gmn(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(run, m)?)?;
    m.add_function(wrap_pyfunction!(check_guido, m)?)?;

    m.add("GuidoError", m.py().get_type::<GuidoError>())?;
    m.add("EngineFailure", m.py().get_type::<EngineFailure>())?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
