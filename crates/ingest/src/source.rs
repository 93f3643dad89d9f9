use carwatch_core::Reading;

/// Produces the reading for each tick.
///
/// Sources own error-code history trimming: every reading they hand out
/// carries at most [`ERROR_CODE_CAPACITY`](carwatch_core::ERROR_CODE_CAPACITY)
/// codes. `None` means the source is exhausted.
pub trait TelemetrySource {
    fn next_reading(&mut self) -> Option<Reading>;
}

impl<S: TelemetrySource + ?Sized> TelemetrySource for Box<S> {
    fn next_reading(&mut self) -> Option<Reading> {
        (**self).next_reading()
    }
}
