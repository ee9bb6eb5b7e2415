// Bicolor LED controller host tool - shared library
// Interactive shell used by the CLI and its tests

pub mod shell;

pub use shell::{render_panel, Flow, Shell, ShellCommand, ShellError};
