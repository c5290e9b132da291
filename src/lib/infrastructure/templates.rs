//! Template rendering

mod handlebars_renderer;

pub use handlebars_renderer::{HandlebarsRenderer, TEMPLATE_EXTENSION};
