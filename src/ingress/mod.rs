//! The `ingress` module turns a raw form submission into a stored, broadcast
//! chat message.

pub mod escape;
pub mod handler;

pub use escape::escape_html;
pub use handler::{DATE_FORMAT, Ingress, Submission};
