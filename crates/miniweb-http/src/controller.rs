//! The controller contract.

use crate::Context;
use miniweb_core::Result;

/// What an action did about output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Render the conventional template for the controller and action.
    Rendered,
    /// The action wrote the response itself; skip template rendering.
    NoView,
}

/// A controller groups related actions under one name.
///
/// `init` runs before every action of the controller and can fail the
/// whole request; `call` dispatches the named action. Unknown actions
/// must return [`miniweb_core::Error::NotFound`] so the dispatcher can
/// answer 404.
pub trait Controller {
    fn init(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn call(&mut self, action: &str, ctx: &mut Context, params: &[String]) -> Result<Outcome>;
}

/// Builds a fresh controller instance per request.
pub type ControllerFactory = Box<dyn Fn() -> Box<dyn Controller> + Send + Sync>;
