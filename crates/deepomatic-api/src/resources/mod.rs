//! REST resources
//!
//! A resource type declares where it lives ([`Resource`]) and which
//! operations the server supports through capability traits. Operations are
//! only available on [`Resources`] managers and [`Object`]s whose resource
//! type implements the matching capability.

mod args;
mod network;
mod page;
mod recognition;
mod task;

pub use args::{check_create, check_update, Arg, Template};
pub use network::Network;
pub use page::ResourcePage;
pub use recognition::{RecognitionSpec, RecognitionVersion};
pub use task::Tasks;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use deepomatic_core::task::wait;
use deepomatic_core::{Task, TaskId};

use crate::error::{Error, Result};
use crate::http::{HttpHelper, RequestOptions};
use crate::inputs::{format_inputs, ImageInput, InferenceOptions};

/// Resource primary key
///
/// Private resources use numeric ids; public ones are addressed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(u64),
    Text(String),
}

impl ResourceId {
    /// Textual ids designate public resources
    pub fn is_public(&self) -> bool {
        matches!(self, ResourceId::Text(_))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{}", n),
            ResourceId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        ResourceId::Number(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        ResourceId::Text(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        ResourceId::Text(id)
    }
}

/// A REST resource type
pub trait Resource {
    /// Human readable name used in logs
    const NAME: &'static str;

    /// Collection path, e.g. `/networks/`
    fn base_uri(public: bool) -> &'static str;

    /// Arguments accepted on create and update
    fn template() -> Template {
        &[]
    }

    /// Path of the collection, of one object, or of a sub-resource of it
    fn uri(pk: Option<&ResourceId>, public: bool, suffix: Option<&str>) -> String {
        let public = public || pk.is_some_and(ResourceId::is_public);
        let mut uri = Self::base_uri(public).to_string();
        if !uri.ends_with('/') {
            uri.push('/');
        }
        if let Some(pk) = pk {
            uri.push_str(&format!("{}/", pk));
        }
        if let Some(suffix) = suffix {
            uri.push_str(suffix.trim_start_matches('/'));
        }
        uri
    }
}

/// Resources supporting paged listing
pub trait Listable: Resource {}

/// Resources supporting creation
pub trait Creatable: Resource {
    /// Request options used by `create`
    fn create_options() -> RequestOptions {
        RequestOptions::default()
    }
}

/// Resources supporting partial and full update
pub trait Updatable: Resource {}

pub trait Deletable: Resource {}

/// Resources exposing an `inference` endpoint
pub trait Inferable: Resource {}

/// Entry point for one resource type
pub struct Resources<R> {
    http: Arc<HttpHelper>,
    public: bool,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for Resources<R> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
            public: self.public,
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> Resources<R> {
    pub(crate) fn new(http: Arc<HttpHelper>) -> Self {
        Self {
            http,
            public: false,
            _resource: PhantomData,
        }
    }

    /// Address the public collection instead of the account's own
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Handle on an object, without fetching it
    pub fn object(&self, pk: impl Into<ResourceId>) -> Object<R> {
        Object::new(Arc::clone(&self.http), pk.into(), None)
    }

    /// Fetch one object
    pub fn retrieve(&self, pk: impl Into<ResourceId>) -> Result<Object<R>> {
        let mut object = self.object(pk);
        object.refresh()?;
        Ok(object)
    }
}

impl<R: Listable> Resources<R> {
    /// First page of the collection; `params` are sent as query parameters
    pub fn list(&self, params: &Map<String, Value>) -> Result<ResourcePage<R>> {
        let uri = R::uri(None, self.public, None);
        ResourcePage::fetch(Arc::clone(&self.http), &uri, params)
    }
}

impl<R: Creatable> Resources<R> {
    /// Create an object from its field values
    pub fn create(&self, data: Map<String, Value>) -> Result<Object<R>> {
        self.create_with(data, &R::create_options())
    }

    /// Create an object with explicit request options
    pub fn create_with(
        &self,
        data: Map<String, Value>,
        options: &RequestOptions,
    ) -> Result<Object<R>> {
        if self.http.check_query_parameters() {
            check_create(R::template(), &data)?;
        }
        debug!(resource = R::NAME, "creating object");
        let uri = R::uri(None, self.public, None);
        let body = self.http.post(&uri, &Value::Object(data), options)?;
        Object::from_value(Arc::clone(&self.http), body.into_json()?)
    }
}

/// What an inference call produced
#[derive(Debug, Clone, PartialEq)]
pub enum Inference {
    /// Task handle, when the caller did not wait
    Submitted(Task),
    /// Result data of the completed task
    Completed(Value),
}

/// One API object, with its last fetched data
pub struct Object<R> {
    http: Arc<HttpHelper>,
    pk: ResourceId,
    data: Option<Map<String, Value>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> fmt::Debug for Object<R>
where
    R: Resource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(R::NAME)
            .field("pk", &self.pk)
            .field("data", &self.data)
            .finish()
    }
}

impl<R: Resource> Object<R> {
    pub(crate) fn new(
        http: Arc<HttpHelper>,
        pk: ResourceId,
        data: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            http,
            pk,
            data,
            _resource: PhantomData,
        }
    }

    /// Build an object from a response document carrying its `id`
    pub(crate) fn from_value(http: Arc<HttpHelper>, value: Value) -> Result<Self> {
        let Value::Object(data) = value else {
            return Err(Error::invalid_input(format!(
                "expected a {} object in response",
                R::NAME
            )));
        };
        let pk = data
            .get("id")
            .cloned()
            .ok_or_else(|| Error::missing_field("id"))?;
        let pk: ResourceId = serde_json::from_value(pk)?;
        Ok(Self::new(http, pk, Some(data)))
    }

    pub fn pk(&self) -> &ResourceId {
        &self.pk
    }

    /// Last fetched data, `None` before the first fetch
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Map<String, Value>> {
        self.data
    }

    /// One field of the last fetched data
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }

    pub fn uri(&self, suffix: Option<&str>) -> String {
        R::uri(Some(&self.pk), false, suffix)
    }

    /// Re-fetch the object data
    pub fn refresh(&mut self) -> Result<&Map<String, Value>> {
        let body = self.http.get(&self.uri(None), &Map::new())?;
        match body.into_json()? {
            Value::Object(data) => Ok(self.data.insert(data)),
            _ => Err(Error::invalid_input(format!(
                "expected a {} object in response",
                R::NAME
            ))),
        }
    }

    pub(crate) fn http(&self) -> &Arc<HttpHelper> {
        &self.http
    }
}

impl<R: Updatable> Object<R> {
    /// Update fields; `replace` sends a full `PUT` instead of a `PATCH`
    pub fn update(&mut self, data: Map<String, Value>, replace: bool) -> Result<()> {
        if self.http.check_query_parameters() {
            check_update(R::template(), &data)?;
        }
        let uri = self.uri(None);
        let data = Value::Object(data);
        let body = if replace {
            self.http.put(&uri, &data)?
        } else {
            self.http.patch(&uri, &data)?
        };
        if let Value::Object(data) = body.into_json()? {
            self.data = Some(data);
        }
        Ok(())
    }
}

impl<R: Deletable> Object<R> {
    pub fn delete(self) -> Result<()> {
        self.http.delete(&self.uri(None))?;
        Ok(())
    }
}

impl<R: Inferable> Object<R> {
    /// Run an inference on this object
    ///
    /// The server answers with a task id. With a wait configured in
    /// `options` the task is awaited and its data returned; otherwise the
    /// task handle is returned as soon as it is created.
    pub fn inference(&self, inputs: &[ImageInput], options: &InferenceOptions) -> Result<Inference> {
        let payload = format_inputs(inputs, &options.extra)?;
        let body = self
            .http
            .post(&self.uri(Some("inference")), &payload, &RequestOptions::default())?
            .into_json()?;
        let task_id: TaskId = body
            .get("task_id")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| Error::missing_field("task_id"))?;
        debug!(resource = R::NAME, pk = %self.pk, task = %task_id, "inference submitted");

        let mut task = Task::new(task_id);
        let Some(wait_options) = &options.wait else {
            return Ok(Inference::Submitted(task));
        };
        let tasks = Tasks::new(Arc::clone(&self.http));
        wait(&tasks, &mut task, wait_options)?;
        Ok(Inference::Completed(
            task.data().cloned().unwrap_or(Value::Null),
        ))
    }
}
