//! Handler return values and their mapping onto responses.

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::response::Response;

/// What a dispatched handler declares it returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReturnType {
    /// A complete [`Response`], passed through untouched.
    Response,
    /// Plain text, sent as `200 OK` `text/plain`.
    Text,
    /// Nothing, sent as `200 OK` with an empty body.
    Empty,
    /// Any other value, serialized as `200 OK` `application/json`.
    Json,
}

/// A handler's return value after conversion.
#[derive(Debug)]
pub enum Reply {
    Response(Response),
    Text(String),
    Empty,
    Json(Value),
}

impl Reply {
    fn kind(&self) -> ReturnType {
        match self {
            Self::Response(_) => ReturnType::Response,
            Self::Text(_) => ReturnType::Text,
            Self::Empty => ReturnType::Empty,
            Self::Json(_) => ReturnType::Json,
        }
    }

    /// Maps the reply according to the tag its handler declared.
    ///
    /// An empty reply is always accepted (`Option::None`); any other
    /// disagreement between tag and value is a handler fault.
    pub(crate) fn into_response(self, declared: ReturnType) -> Result<Response, Error> {
        let actual = self.kind();
        if actual != declared && actual != ReturnType::Empty {
            return Err(Error::Handler(format!("handler declared {declared:?} but returned {actual:?}")));
        }
        Ok(match self {
            Self::Response(res) => res,
            Self::Text(text) => Response::text(text),
            Self::Empty => Response::ok(),
            Self::Json(value) => Response::json(value),
        })
    }
}

/// Wraps a serializable value so a handler can return it as JSON.
///
/// ```rust
/// # use serde::Serialize;
/// # use trellis::Json;
/// #[derive(Serialize)]
/// struct User { id: u32 }
///
/// async fn show() -> Json<User> { Json(User { id: 7 }) }
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Json<T>(pub T);

/// Conversion of a dispatched handler's return type.
///
/// The associated [`RETURNS`](IntoReply::RETURNS) tag is fixed per type, so
/// the dispatcher knows at registration how every reply will be mapped.
pub trait IntoReply: Send + 'static {
    const RETURNS: ReturnType;

    fn into_reply(self) -> Result<Reply, Error>;
}

impl IntoReply for Response {
    const RETURNS: ReturnType = ReturnType::Response;
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Response(self)) }
}

impl IntoReply for String {
    const RETURNS: ReturnType = ReturnType::Text;
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Text(self)) }
}

impl IntoReply for &'static str {
    const RETURNS: ReturnType = ReturnType::Text;
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Text(self.to_owned())) }
}

impl IntoReply for () {
    const RETURNS: ReturnType = ReturnType::Empty;
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Empty) }
}

impl IntoReply for Value {
    const RETURNS: ReturnType = ReturnType::Json;
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Json(self)) }
}

impl<T: Serialize + Send + 'static> IntoReply for Json<T> {
    const RETURNS: ReturnType = ReturnType::Json;

    fn into_reply(self) -> Result<Reply, Error> {
        serde_json::to_value(self.0)
            .map(Reply::Json)
            .map_err(|e| Error::Codec(e.to_string()))
    }
}

/// `None` replies with an empty `200 OK`.
impl<T: IntoReply> IntoReply for Option<T> {
    const RETURNS: ReturnType = T::RETURNS;

    fn into_reply(self) -> Result<Reply, Error> {
        self.map_or(Ok(Reply::Empty), T::into_reply)
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<Error> + Send + 'static,
{
    const RETURNS: ReturnType = T::RETURNS;

    fn into_reply(self) -> Result<Reply, Error> {
        self.map_err(Into::into)?.into_reply()
    }
}
