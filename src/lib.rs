pub mod buffer;
pub mod script;

pub use buffer::{BufferError, CowBuffer};
pub use script::{run_script, run_script_file, Op, Report, ScriptEngine, ScriptError};
