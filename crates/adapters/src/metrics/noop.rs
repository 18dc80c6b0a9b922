use super::validate_instrument_name;
use scantel_ports::{
    Attribute, CounterInstrument, HistogramInstrument, InstrumentSpec, MeterProviderPort,
};
use scantel_shared::Result;
use std::sync::Arc;

/// Provider whose instruments discard every sample.
///
/// Names are still validated so misconfigured call sites fail the same way
/// they would against a real backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMeterProvider;

struct NoopInstrument;

impl CounterInstrument for NoopInstrument {
    fn add(&self, _value: u64, _attributes: &[Attribute]) {}
}

impl HistogramInstrument for NoopInstrument {
    fn record(&self, _value: f64, _attributes: &[Attribute]) {}
}

impl MeterProviderPort for NoopMeterProvider {
    fn provider_id(&self) -> &str {
        "noop"
    }

    fn counter(&self, spec: &InstrumentSpec) -> Result<Arc<dyn CounterInstrument>> {
        validate_instrument_name(spec)?;
        Ok(Arc::new(NoopInstrument))
    }

    fn histogram(&self, spec: &InstrumentSpec) -> Result<Arc<dyn HistogramInstrument>> {
        validate_instrument_name(spec)?;
        Ok(Arc::new(NoopInstrument))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scantel_domain::InstrumentName;

    #[test]
    fn accepts_valid_and_rejects_invalid_names() -> Result<()> {
        let provider = NoopMeterProvider;
        provider
            .counter(&InstrumentSpec::counter(InstrumentName::parse("scan.rows")?))?
            .add(1, &[]);
        assert!(provider
            .histogram(&InstrumentSpec::histogram(InstrumentName::parse("-bad")?))
            .is_err());
        provider.shutdown()?;
        Ok(())
    }
}
