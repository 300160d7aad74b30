use crate::subscribe::ObservableError;

/// A full observer: a sink for the three kinds of notifications an observable
/// delivers.
///
/// Implement this when a plain set of closures is not convenient, then wrap the
/// implementation with [`Subscriber::from_observer`] to subscribe it.
///
/// [`Subscriber::from_observer`]: crate::subscribe::Subscriber::from_observer
pub trait Observer {
    type NextFnType;

    fn next(&mut self, _: Self::NextFnType);
    fn complete(&mut self);
    fn error(&mut self, _: ObservableError);
}
