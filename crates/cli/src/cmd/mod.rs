mod build;
mod help;
mod project;

pub use build::cmd_build;
pub use help::cmd_help;
pub use project::{Project, load_project};
