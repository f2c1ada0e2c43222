//! Mock rate source for testing without network or storage.

use super::{RateSource, RateSourceError};
use crate::domain::{FactorSheet, ScalesPayload, Section};
use async_trait::async_trait;

/// Rate source that returns predefined tables, or a fixed error.
#[derive(Debug, Clone, Default)]
pub struct MockRateSource {
    sections: Vec<Section>,
    scales: ScalesPayload,
    factors: FactorSheet,
    failure: Option<RateSourceError>,
}

impl MockRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_scales(mut self, scales: ScalesPayload) -> Self {
        self.scales = scales;
        self
    }

    pub fn with_factors(mut self, factors: FactorSheet) -> Self {
        self.factors = factors;
        self
    }

    /// Make every fetch fail with `error`.
    pub fn failing(mut self, error: RateSourceError) -> Self {
        self.failure = Some(error);
        self
    }

    fn check(&self) -> Result<(), RateSourceError> {
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RateSource for MockRateSource {
    async fn fetch_sections(&self) -> Result<Vec<Section>, RateSourceError> {
        self.check()?;
        Ok(self.sections.clone())
    }

    async fn fetch_scales(&self) -> Result<ScalesPayload, RateSourceError> {
        self.check()?;
        Ok(self.scales.clone())
    }

    async fn fetch_factors(&self) -> Result<FactorSheet, RateSourceError> {
        self.check()?;
        Ok(self.factors.clone())
    }
}
