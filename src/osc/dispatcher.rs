use std::borrow::Cow;
use std::sync::Arc;

use rosc::OscType;
use tracing::{debug, trace};

use crate::error::codes;
use crate::osc::coerce::{Coercion, coerce_args};
use crate::osc::message::Message;
use crate::osc::pattern::{Pattern, has_wildcards};
use crate::osc::registry::{Candidates, Registry};
use crate::traits::ErrorHandler;

/// What a handler says about a message it was offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The message is dealt with; no further candidates are tried.
    Handled,
    /// Pass the message on to the next matching method.
    Unhandled,
}

impl Verdict {
    /// Maps the integer convention of C-style handlers: 0 claims the message, anything else
    /// declines it.
    pub fn from_code(code: i32) -> Verdict {
        match code {
            0 => Verdict::Handled,
            _ => Verdict::Unhandled,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Verdict::Handled => 0,
            Verdict::Unhandled => 1,
        }
    }
}

/// Terminal state of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    NoMatch,
}

/// Everything a handler gets to see for one invocation. Borrowed for the duration of the
/// call only.
#[derive(Debug)]
pub struct MethodCall<'a> {
    pub path: &'a str,
    /// The method's declared signature when it has one (arguments are already coerced to
    /// it), otherwise the message's own type tag.
    pub types: &'a str,
    pub args: &'a [OscType],
    /// The message as received, before any coercion.
    pub message: &'a Message,
}

impl MethodCall<'_> {
    pub fn argc(&self) -> usize {
        self.args.len()
    }
}

/// Routes decoded messages to registered methods.
///
/// Candidates are tried in registration order. A candidate whose signature can't be coerced
/// from the message is skipped; otherwise its handler runs and its [`Verdict`] decides
/// whether the next candidate is tried. If nobody claims the message the error handler
/// receives a [`codes::NO_MATCH`] report.
///
/// The dispatcher holds no per-message state, so one instance can be shared between a
/// receive thread and the rest of the application.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    errors: Arc<dyn ErrorHandler>,
    coercion: Coercion,
    incoming_patterns: bool,
}

impl Dispatcher {
    pub fn new<E>(registry: Arc<Registry>, errors: E) -> Self
    where
        E: ErrorHandler + 'static,
    {
        Self {
            registry,
            errors: Arc::new(errors),
            coercion: Coercion::default(),
            incoming_patterns: false,
        }
    }

    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    /// Treat incoming addresses containing wildcard syntax as patterns to be matched against
    /// literal method paths.
    pub fn with_incoming_patterns(mut self, enabled: bool) -> Self {
        self.incoming_patterns = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn report(&self, code: i32, msg: &str, context: &str) {
        self.errors.report(code, msg, context);
    }

    pub fn dispatch(&self, msg: &Message) -> DispatchOutcome {
        if self.incoming_patterns && has_wildcards(msg.path()) {
            return match Pattern::parse(msg.path()) {
                Ok(pattern) => {
                    self.run(msg, self.registry.candidates_for_pattern(&pattern), true)
                }
                Err(err) => {
                    self.errors
                        .report(codes::INVALID_PATH, &err.to_string(), msg.path());
                    DispatchOutcome::NoMatch
                }
            };
        }
        self.run(msg, self.registry.candidates_for(msg.path()), false)
    }

    fn run(&self, msg: &Message, candidates: Candidates<'_>, by_pattern: bool) -> DispatchOutcome {
        for candidate in candidates {
            let (types, args) = match candidate.types() {
                None => (msg.types(), Cow::Borrowed(msg.args())),
                Some(signature) => {
                    match coerce_args(signature, msg.types(), msg.args(), self.coercion) {
                        Ok(args) => (signature, args),
                        Err(err) => {
                            debug!(id = %candidate.id(), path = msg.path(), %err, "candidate skipped");
                            continue;
                        }
                    }
                }
            };

            // A pattern address is delivered under the concrete path of the method it hit.
            let path = match candidate.pattern() {
                Some(own) if by_pattern && own.is_literal() => own.as_str(),
                _ => msg.path(),
            };

            let call = MethodCall {
                path,
                types,
                args: &args,
                message: msg,
            };
            let verdict = candidate.handler().handle(&call);
            trace!(id = %candidate.id(), path, ?verdict, "handler ran");

            if verdict == Verdict::Handled {
                return DispatchOutcome::Handled;
            }
        }

        self.errors.report(
            codes::NO_MATCH,
            &format!(
                "no handler matched path {} with types '{}'",
                msg.path(),
                msg.types()
            ),
            msg.path(),
        );
        DispatchOutcome::NoMatch
    }
}
