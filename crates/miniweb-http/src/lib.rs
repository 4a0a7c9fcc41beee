//! HTTP front for miniweb.
//!
//! A [`Request`] routes to a controller and action, the controller runs
//! against a [`Context`] (view variables, session, ORM handle), and the
//! dispatcher turns the outcome into a [`Response`], rendering the
//! conventional template unless the action said otherwise and sending
//! every failure through the error controller.

pub mod app;
pub mod context;
pub mod controller;
pub mod request;
pub mod response;
pub mod router;
pub mod view;

pub use app::App;
pub use context::Context;
pub use controller::{Controller, Outcome};
pub use request::Request;
pub use response::Response;
pub use router::{Route, route};
pub use view::View;
