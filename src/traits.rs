use crate::osc::dispatcher::{MethodCall, Verdict};

/// A method registered with the dispatcher.
///
/// Return [`Verdict::Handled`] to claim the message and stop the dispatcher from trying
/// further candidates, or [`Verdict::Unhandled`] to pass it on.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, call: &MethodCall<'_>) -> Verdict;
}

impl<F> Handler for F
where
    F: Fn(&MethodCall<'_>) -> Verdict + Send + Sync + 'static,
{
    fn handle(&self, call: &MethodCall<'_>) -> Verdict {
        self(call)
    }
}

/// Pairs a handler with the user data it was registered with. The data is owned by the
/// registration and lent to the handler on every call.
pub struct WithUserData<U, F> {
    user_data: U,
    handler: F,
}

impl<U, F> WithUserData<U, F> {
    pub fn new(user_data: U, handler: F) -> Self {
        Self { user_data, handler }
    }
}

impl<U, F> Handler for WithUserData<U, F>
where
    U: Send + Sync + 'static,
    F: Fn(&MethodCall<'_>, &U) -> Verdict + Send + Sync + 'static,
{
    fn handle(&self, call: &MethodCall<'_>) -> Verdict {
        (self.handler)(call, &self.user_data)
    }
}

/// Receives error reports from a dispatcher or server.
///
/// `code` is one of [`crate::error::codes`], `context` is usually the OSC path involved.
pub trait ErrorHandler: Send + Sync {
    fn report(&self, code: i32, msg: &str, context: &str);
}

impl<F> ErrorHandler for F
where
    F: Fn(i32, &str, &str) + Send + Sync,
{
    fn report(&self, code: i32, msg: &str, context: &str) {
        self(code, msg, context)
    }
}
