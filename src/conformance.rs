//! Engine contract checks.
//!
//! `verify_engine` exercises the behaviour the harness relies on against a
//! sample document: conversion output is well-formed Guido, transposing by
//! zero changes nothing, and transposed documents convert again.

use crate::engine::Engine;
use crate::guido::{GuidoSummary, check_guido};
use crate::harness::DEFAULT_TRANSPOSE_SEMITONES;
use crate::version::EngineVersions;
use anyhow::{Context, Result, bail};

#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub versions: EngineVersions,
    pub direct: GuidoSummary,
    pub transposed: GuidoSummary,
}

impl ConformanceReport {
    pub fn versions_consistent(&self) -> bool {
        self.versions.is_consistent()
    }
}

pub fn verify_engine(engine: &dyn Engine, doc: &str) -> Result<ConformanceReport> {
    if doc.is_empty() {
        bail!("Cannot verify an engine against an empty document");
    }

    let versions = EngineVersions::query(engine).context("Failed to query engine versions")?;
    if !versions.is_consistent() {
        log::warn!("engine version numbers and strings disagree: {}", versions);
    }

    let direct_gmn = engine
        .convert(doc, false)
        .context("Failed to convert document")?;
    if direct_gmn.trim().is_empty() {
        bail!("Conversion returned empty Guido text");
    }
    let direct = check_guido(&direct_gmn)
        .with_context(|| format!("Conversion returned malformed Guido: {}", direct_gmn))?;

    let unchanged = engine
        .transpose(doc, 0)
        .context("Failed to transpose document by 0 semitones")?;
    let unchanged_gmn = engine
        .convert(&unchanged, false)
        .context("Failed to convert document transposed by 0 semitones")?;
    if unchanged_gmn != direct_gmn {
        bail!(
            "Transposing by 0 semitones changed the conversion: {:?} != {:?}",
            unchanged_gmn,
            direct_gmn
        );
    }

    let transposed_doc = engine
        .transpose(doc, DEFAULT_TRANSPOSE_SEMITONES)
        .with_context(|| {
            format!(
                "Failed to transpose document by {} semitones",
                DEFAULT_TRANSPOSE_SEMITONES
            )
        })?;
    let transposed_gmn = engine
        .convert(&transposed_doc, false)
        .context("Failed to convert transposed document")?;
    let transposed = check_guido(&transposed_gmn).with_context(|| {
        format!(
            "Transposed conversion returned malformed Guido: {}",
            transposed_gmn
        )
    })?;

    log::debug!(
        "engine conforms: {} ({} events direct, {} events transposed)",
        versions,
        direct.events,
        transposed.events
    );

    Ok(ConformanceReport {
        versions,
        direct,
        transposed,
    })
}
