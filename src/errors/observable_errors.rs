use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use thiserror::Error;

use crate::subscribe::ObservableError;

/// Errors raised by the library itself and delivered through an observer's
/// `error` channel.
///
/// Errors produced by user code (a producer returning `Err`, a `try_map`
/// closure returning `Err`) are forwarded as they are; these variants cover
/// panics the library turned into notifications.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RxError {
    /// The producer panicked while the observable was being subscribed.
    #[error("producer panicked during subscribe: {message}")]
    ProducerPanicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// An operator's user supplied function panicked while handling a value.
    #[error("`{operator}` function panicked: {message}")]
    TransformPanicked {
        /// Name of the operator whose function panicked.
        operator: &'static str,
        /// Panic payload rendered as text.
        message: String,
    },
}

impl RxError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// ```
    /// use rxlite::RxError;
    ///
    /// let err = RxError::ProducerPanicked { message: "boom".into() };
    /// assert_eq!(err.as_label(), "producer_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RxError::ProducerPanicked { .. } => "producer_panicked",
            RxError::TransformPanicked { .. } => "transform_panicked",
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// Runs an operator's user function, turning a panic into an error notification.
pub(crate) fn catch_transform<R>(
    operator: &'static str,
    f: impl FnOnce() -> R,
) -> Result<R, ObservableError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let err: ObservableError = Rc::new(RxError::TransformPanicked {
            operator,
            message: panic_message(payload.as_ref()),
        });
        err
    })
}
