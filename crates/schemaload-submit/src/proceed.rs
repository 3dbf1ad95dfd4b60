/// Continuation invoked once per successful submission, e.g. a hand-off to
/// the editing workflow.
pub trait Proceed: Send {
    fn proceed(&mut self);
}

impl<F> Proceed for F
where
    F: FnMut() + Send,
{
    fn proceed(&mut self) {
        self()
    }
}
