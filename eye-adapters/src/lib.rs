//! External collaborators of the configuration workflow.
//!
//! The workflow talks to a [`deploy::Deployer`] and a [`clipboard::Clipboard`]
//! through traits so sessions can run against the live server, a simulated
//! backend, or in-memory doubles.

#![warn(missing_docs, clippy::pedantic)]

pub mod clipboard;
pub mod deploy;
pub mod http;

mod http_client;

pub use clipboard::{Clipboard, ClipboardError, ClipboardResult, CommandClipboard, MemoryClipboard};
pub use deploy::{
    DeployError, DeployReceipt, DeployRequest, DeployResult, Deployer, SimulatedDeployer,
};
pub use http::{HttpDeployer, HttpDeployerConfig};
