//! # form-engine-html
//!
//! Renders a [`form_engine::FormView`] as an HTML form: one control per
//! visible field, Bootstrap-style grid columns, feedback lines for fields
//! whose feedback the view surfaces, and a submit button that is disabled
//! while a save is in flight.
//!
//! ```rust,ignore
//! use form_engine_html::{HtmlOptions, to_html};
//!
//! let html = to_html(&form.view(), &HtmlOptions::new().with_title("Anagrafica cliente"));
//! ```

mod generator;

pub use generator::{HtmlOptions, to_html};
