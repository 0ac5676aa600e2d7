use crate::Emission;

/// Decides what [`Emitter::emit()`][crate::Emitter::emit] returns.
///
/// The emitter dispatches every event the same way; the transform only post-processes the
/// [`Emission`] before it is handed to the caller. Configure it via
/// [`EmitterBuilder::returns()`][crate::EmitterBuilder::returns].
///
/// Any `Fn(Emission) -> T` closure is a transform.
///
/// # Example
///
/// ```
/// use emit_chain::{Control, Emitter};
///
/// let emitter = Emitter::<()>::builder()
///     .returns(|emission: emit_chain::Emission| emission.executed())
///     .build();
///
/// emitter.on("count", |_: &(), _: &Control| {});
/// emitter.on("count", |_: &(), _: &Control| {});
///
/// assert_eq!(emitter.emit("count", ()).unwrap(), 2);
/// ```
pub trait ResultTransform {
    /// The type returned by [`Emitter::emit()`][crate::Emitter::emit].
    type Output;

    /// Turns the emission of an event into the value returned to the caller.
    fn transform(&self, emission: Emission) -> Self::Output;
}

/// Returns the [`Emission`] itself. This is the default transform.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl ResultTransform for PassThrough {
    type Output = Emission;

    #[inline]
    fn transform(&self, emission: Emission) -> Self::Output {
        emission
    }
}

/// Returns whether any listener was invoked by the time the emit call returned.
///
/// This mirrors the return value of a conventional fire-and-forget event emitter, just like
/// [`Emitter::emit_bool()`][crate::Emitter::emit_bool].
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecutedAny;

impl ResultTransform for ExecutedAny {
    type Output = bool;

    #[inline]
    fn transform(&self, emission: Emission) -> Self::Output {
        emission.executed() > 0
    }
}

impl<F, T> ResultTransform for F
where
    F: Fn(Emission) -> T,
{
    type Output = T;

    #[inline]
    fn transform(&self, emission: Emission) -> Self::Output {
        self(emission)
    }
}
