/// Frame scanning over elementary streams.
///
/// Provides the [`Scanner`](scan::Scanner) for locating ADTS and AC-3 sync
/// words and splitting continuous input into [`Frame`](scan::Frame) objects.
pub mod scan;
