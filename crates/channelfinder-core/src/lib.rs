pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod request;
pub mod transport;

pub use client::{ChannelFinderClient, DEFAULT_BASE_PATH};
pub use config::Config;
pub use error::{ChannelFinderError, Result};
pub use model::{Channel, ChannelSpec, Property, ServiceInfo, Tag};
pub use query::ChannelQuery;
pub use request::{
    ApplyArgs, ApplyRequest, CreateArgs, CreateRequest, DeleteArgs, DeleteRequest, RemoveArgs,
    RemoveRequest,
};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
