//! ComfyUI plumbing: REST client, job graph, history parsing and the
//! completion waiter.
pub mod client;
pub mod graph;
pub mod history;
pub mod waiter;

pub use client::ComfyUIClient;
pub use waiter::JobWaiter;
