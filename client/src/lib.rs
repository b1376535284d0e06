mod app;
mod dom;
mod persistence;
mod render;
mod slices;
mod state;

pub use app::run;
