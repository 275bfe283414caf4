mod common;
mod project;
