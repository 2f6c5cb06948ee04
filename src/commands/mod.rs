pub mod evaluate;
pub mod repl;
pub mod serve;
