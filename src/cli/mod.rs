mod args;

pub use args::{Cli, Mode};

pub use args::parse;
