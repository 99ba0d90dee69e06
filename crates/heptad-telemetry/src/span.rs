//! Per-operation span recording, eliminated entirely when the `spans`
//! feature is off.
//!
//! Two parallel implementations share one public name apiece: with `spans`
//! enabled, [`SpanRecorder`] and [`ScopedSpan`] actually read the cycle
//! counter and push records; with it disabled, both are zero-sized types
//! whose methods do nothing, so the compiler removes every call site and no
//! cycle read ever happens on the disabled build. No runtime toggle exists
//! between the two — the choice is made once, at build time.

/// One recorded span: a named operation's cycle window and attributes.
#[derive(Debug, Clone)]
pub struct Span {
    pub name: &'static str,
    pub start_cycles: u64,
    pub end_cycles: u64,
    pub cycles: u64,
    pub attributes: Vec<(&'static str, String)>,
}

#[cfg(feature = "spans")]
mod enabled {
    use super::Span;
    use heptad_timer::read_cycles;

    #[derive(Debug, Default)]
    pub struct SpanRecorder {
        spans: Vec<Span>,
    }

    impl SpanRecorder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn record(&mut self, name: &'static str, start_cycles: u64, end_cycles: u64, attributes: Vec<(&'static str, String)>) {
            self.spans.push(Span {
                name,
                start_cycles,
                end_cycles,
                cycles: end_cycles.saturating_sub(start_cycles),
                attributes,
            });
        }

        pub fn spans(&self) -> &[Span] {
            &self.spans
        }

        pub fn clear(&mut self) {
            self.spans.clear();
        }
    }

    pub struct ScopedSpan<'a> {
        recorder: &'a mut SpanRecorder,
        name: &'static str,
        start: u64,
    }

    impl<'a> ScopedSpan<'a> {
        #[inline]
        pub fn new(recorder: &'a mut SpanRecorder, name: &'static str) -> Self {
            Self {
                recorder,
                name,
                start: read_cycles(),
            }
        }
    }

    impl<'a> Drop for ScopedSpan<'a> {
        #[inline]
        fn drop(&mut self) {
            let end = read_cycles();
            self.recorder.record(self.name, self.start, end, Vec::new());
        }
    }
}

#[cfg(not(feature = "spans"))]
mod disabled {
    use super::Span;
    use core::marker::PhantomData;

    #[derive(Debug, Default)]
    pub struct SpanRecorder;

    impl SpanRecorder {
        #[inline(always)]
        pub fn new() -> Self {
            Self
        }

        #[inline(always)]
        pub fn record(&mut self, _name: &'static str, _start_cycles: u64, _end_cycles: u64, _attributes: Vec<(&'static str, String)>) {}

        #[inline(always)]
        pub fn spans(&self) -> &[Span] {
            &[]
        }

        #[inline(always)]
        pub fn clear(&mut self) {}
    }

    pub struct ScopedSpan<'a>(PhantomData<&'a ()>);

    impl<'a> ScopedSpan<'a> {
        #[inline(always)]
        pub fn new(_recorder: &'a mut SpanRecorder, _name: &'static str) -> Self {
            Self(PhantomData)
        }
    }
}

#[cfg(feature = "spans")]
pub use enabled::{ScopedSpan, SpanRecorder};
#[cfg(not(feature = "spans"))]
pub use disabled::{ScopedSpan, SpanRecorder};

/// Wrap `$code` in a span named `$name`, recorded on `$recorder`. A no-op
/// when the `spans` feature is off.
#[macro_export]
macro_rules! traced_span {
    ($recorder:expr, $name:literal, $code:block) => {{
        let _span = $crate::span::ScopedSpan::new($recorder, $name);
        $code
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_recorder_starts_empty() {
        let recorder = SpanRecorder::new();
        assert!(recorder.spans().is_empty());
    }

    #[cfg(feature = "spans")]
    #[test]
    fn scoped_span_records_on_drop() {
        let mut recorder = SpanRecorder::new();
        {
            let _span = ScopedSpan::new(&mut recorder, "unit");
        }
        assert_eq!(recorder.spans().len(), 1);
        assert_eq!(recorder.spans()[0].name, "unit");
    }

    #[cfg(not(feature = "spans"))]
    #[test]
    fn scoped_span_is_a_no_op_when_disabled() {
        let mut recorder = SpanRecorder::new();
        {
            let _span = ScopedSpan::new(&mut recorder, "unit");
        }
        assert!(recorder.spans().is_empty());
    }
}
