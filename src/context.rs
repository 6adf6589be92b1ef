//! Per-run context handed to every component.

use crate::config::{CompilerProfile, GenConfig};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};

/// Everything a run shares: target profile, naming configuration and the
/// diagnostics collector. Built once, passed by reference.
#[derive(Debug, Default)]
pub struct Context {
    pub profile: CompilerProfile,
    pub config: GenConfig,
    pub diagnostics: Diagnostics,
}

impl Context {
    /// Create a context after validating both configuration halves.
    pub fn new(profile: CompilerProfile, config: GenConfig) -> Result<Self> {
        profile.validate()?;
        config.validate()?;
        Ok(Self {
            profile,
            config,
            diagnostics: Diagnostics::new(),
        })
    }

    /// Log an error at its own severity.
    pub fn report(&self, scope: &str, err: &Error) {
        self.diagnostics.log(err.severity(), scope, err.to_string());
    }

    /// Report the error of a failed operation and turn it into `None`.
    pub fn check<T>(&self, scope: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.report(scope, &err);
                None
            }
        }
    }
}
