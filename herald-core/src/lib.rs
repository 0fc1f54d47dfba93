// src/lib.rs

pub mod checks;
pub mod client;
pub mod command;
pub mod component;
pub mod context;
pub mod hooks;

pub use client::{Client, ClientBuilder, ClientConfig, ClientHandle};
pub use command::{Command, CommandExec};
pub use component::{Component, DefaultComponent, FoundCommand};
pub use context::Context;
pub use herald_common::error::Error;
