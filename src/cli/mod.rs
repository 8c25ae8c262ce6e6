//! Interactive front end: prompts, line input and the query loop

pub mod input;
pub mod session;

pub use input::{parse_counter, LineReader, Prompter, Terminal};
pub use session::{connect_agent, run};
