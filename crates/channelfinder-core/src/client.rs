//! ChannelFinder directory client
//!
//! Every operation is one stateless request/response exchange against the
//! configured base URL, except the bulk detach/delete calls which walk their
//! channel list one request at a time.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::{ChannelFinderError, Result};
use crate::model::{Channel, Property, ServiceInfo, Tag};
use crate::query::ChannelQuery;
use crate::request::{
    ApplyArgs, ApplyRequest, CreateArgs, CreateRequest, DeleteArgs, DeleteRequest, RemoveArgs,
    RemoveRequest,
};
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

/// Base path the service is deployed under
pub const DEFAULT_BASE_PATH: &str = "/ChannelFinder";

/// Error body the service sends with failing statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct ChannelFinderClient<T = ReqwestTransport> {
    base_url: Url,
    transport: T,
}

impl ChannelFinderClient<ReqwestTransport> {
    /// Create a client for `base_url`, e.g. `http://localhost:8080/ChannelFinder`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_transport(base_url, ReqwestTransport::new()?)
    }
}

impl<T: Transport> ChannelFinderClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ChannelFinderError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ChannelFinderError::InvalidUrl {
                url: base_url.to_string(),
                message: "not a hierarchical URL".to_string(),
            });
        }

        Ok(Self {
            base_url,
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ========== Reads ==========

    /// Fetch service metadata
    #[tracing::instrument(skip(self), err)]
    pub async fn info(&self) -> Result<ServiceInfo> {
        self.get_json(self.base_url.clone()).await
    }

    /// List all tags
    #[tracing::instrument(skip(self), err)]
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        self.get_json(self.resource_url(&["resources", "tags"])?)
            .await
    }

    /// List all properties
    #[tracing::instrument(skip(self), err)]
    pub async fn properties(&self) -> Result<Vec<Property>> {
        self.get_json(self.resource_url(&["resources", "properties"])?)
            .await
    }

    /// Search channels
    #[tracing::instrument(skip(self), err)]
    pub async fn query(&self, query: &ChannelQuery) -> Result<Vec<Channel>> {
        let mut url = self.resource_url(&["resources", "channels"])?;
        url.set_query(Some(&query.to_query_string()));
        self.get_json(url).await
    }

    /// Count channels matching a search
    #[tracing::instrument(skip(self), err)]
    pub async fn count(&self, query: &ChannelQuery) -> Result<u64> {
        let mut url = self.resource_url(&["resources", "channels", "count"])?;
        url.set_query(Some(&query.to_query_string()));
        self.get_json(url).await
    }

    /// Fetch one channel by name
    #[tracing::instrument(skip(self), err)]
    pub async fn channel(&self, name: &str) -> Result<Channel> {
        self.get_json(self.resource_url(&["resources", "channels", name])?)
            .await
    }

    /// Fetch one tag, optionally with the channels carrying it
    #[tracing::instrument(skip(self), err)]
    pub async fn tag(&self, name: &str, with_channels: bool) -> Result<Tag> {
        let mut url = self.resource_url(&["resources", "tags", name])?;
        url.query_pairs_mut()
            .append_pair("withChannels", &with_channels.to_string());
        self.get_json(url).await
    }

    /// Fetch one property, optionally with the channels carrying it
    #[tracing::instrument(skip(self), err)]
    pub async fn property(&self, name: &str, with_channels: bool) -> Result<Property> {
        let mut url = self.resource_url(&["resources", "properties", name])?;
        url.query_pairs_mut()
            .append_pair("withChannels", &with_channels.to_string());
        self.get_json(url).await
    }

    // ========== Writes ==========

    /// Create or overwrite a tag, a property, or a batch of channels
    #[tracing::instrument(skip(self), err)]
    pub async fn create(&self, request: &CreateRequest) -> Result<()> {
        let url = self.resource_url(&request.segments())?;
        let body = request.body()?;
        self.send(Method::Put, url, Some(body)).await?;
        Ok(())
    }

    /// Validate loose arguments, then [`create`](Self::create)
    pub async fn create_args(&self, args: CreateArgs) -> Result<()> {
        let request = CreateRequest::try_from(args)?;
        self.create(&request).await
    }

    /// Delete a tag, property or channel
    #[tracing::instrument(skip(self), err)]
    pub async fn delete(&self, request: &DeleteRequest) -> Result<()> {
        let url = self.resource_url(&request.segments())?;
        self.send(Method::Delete, url, None).await?;
        Ok(())
    }

    pub async fn delete_args(&self, args: DeleteArgs) -> Result<()> {
        let request = DeleteRequest::try_from(args)?;
        self.delete(&request).await
    }

    /// Delete channels one at a time, in order
    ///
    /// Every name is checked before the first request. Stops at the first
    /// failure; later channels are left untouched.
    #[tracing::instrument(skip(self, names), fields(count = names.len()), err)]
    pub async fn delete_all<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        let urls = names
            .iter()
            .map(|name| self.resource_url(&["resources", "channels", name.as_ref()]))
            .collect::<Result<Vec<_>>>()?;

        for url in urls {
            self.send(Method::Delete, url, None).await?;
        }
        Ok(())
    }

    /// Attach a tag or property to channels in a single request
    #[tracing::instrument(skip(self), err)]
    pub async fn apply(&self, request: &ApplyRequest) -> Result<()> {
        let url = self.resource_url(&request.segments())?;
        let body = request.body()?;
        self.send(Method::Post, url, Some(body)).await?;
        Ok(())
    }

    pub async fn apply_args(&self, args: ApplyArgs) -> Result<()> {
        let request = ApplyRequest::try_from(args)?;
        self.apply(&request).await
    }

    /// Detach a tag or property, one channel per request
    ///
    /// Request N+1 is only sent after request N has settled. The first
    /// failure ends the walk and is returned.
    #[tracing::instrument(skip(self), err)]
    pub async fn remove(&self, request: &RemoveRequest) -> Result<()> {
        let urls = request
            .channels()
            .iter()
            .map(|channel| self.resource_url(&request.segments_for(channel)))
            .collect::<Result<Vec<_>>>()?;

        for url in urls {
            self.send(Method::Delete, url, None).await?;
        }
        Ok(())
    }

    pub async fn remove_args(&self, args: RemoveArgs) -> Result<()> {
        let request = RemoveRequest::try_from(args)?;
        self.remove(&request).await
    }

    // ========== Plumbing ==========

    /// Base URL with `segments` appended, each percent-encoded
    ///
    /// Empty, `.` and `..` segments are refused: URL normalization would route
    /// them to another resource, even when written as `%2E`.
    fn resource_url(&self, segments: &[&str]) -> Result<Url> {
        for segment in segments {
            match *segment {
                "" => return Err(ChannelFinderError::MissingArgument { name: "name" }),
                "." | ".." => {
                    return Err(ChannelFinderError::InvalidName {
                        name: segment.to_string(),
                    })
                }
                _ => {}
            }
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ChannelFinderError::InvalidUrl {
                url: self.base_url.to_string(),
                message: "not a hierarchical URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<R: DeserializeOwned>(&self, url: Url) -> Result<R> {
        let response = self.send(Method::Get, url, None).await?;
        serde_json::from_slice(&response.body).map_err(ChannelFinderError::Decode)
    }

    async fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(method, url);
        request
            .headers
            .push(("Cache-Control", "no-cache".to_string()));
        request.headers.push(("Pragma", "no-cache".to_string()));
        if let Some(body) = body {
            request
                .headers
                .push(("Content-Type", "application/json".to_string()));
            request.body = Some(body);
        }

        let url = request.url.to_string();
        let response = self.transport.send(request).await?;
        tracing::debug!(%method, %url, status = response.status, "channelfinder request");

        if response.is_success() {
            return Ok(response);
        }

        if response.is_json() {
            if let Ok(err) = serde_json::from_slice::<ErrorBody>(&response.body) {
                return Err(ChannelFinderError::Server {
                    error: err.error,
                    message: err.message,
                });
            }
        }

        let url = if response.url.is_empty() {
            url
        } else {
            response.url
        };
        Err(ChannelFinderError::Status {
            status: response.status,
            url,
        })
    }
}
