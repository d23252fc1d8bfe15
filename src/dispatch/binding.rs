//! Parameter binding: from untyped wire data to typed handler arguments.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{ContentCodecs, ContentType};
use crate::error::Error;
use crate::request::Request;

/// Where a parameter's value comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Source {
    Path,
    Query,
    Body,
    /// Supplied by the framework according to the declared type.
    Injected,
}

/// The declared target type of a parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeTag {
    String,
    Int,
    Long,
    Double,
    Bool,
    Float,
    /// A structured interchange value, converted by the handler.
    Json,
    /// The request itself.
    Request,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String  => "string",
            Self::Int     => "int",
            Self::Long    => "long",
            Self::Double  => "double",
            Self::Bool    => "bool",
            Self::Float   => "float",
            Self::Json    => "json",
            Self::Request => "request",
        })
    }
}

/// Describes one handler parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Binding {
    source: Source,
    name: String,
    ty: TypeTag,
    required: bool,
}

impl Binding {
    pub fn new(source: Source, name: impl Into<String>, ty: TypeTag) -> Self {
        Self { source, name: name.into(), ty, required: true }
    }

    pub fn path(name: impl Into<String>, ty: TypeTag) -> Self {
        Self::new(Source::Path, name, ty)
    }

    pub fn query(name: impl Into<String>, ty: TypeTag) -> Self {
        Self::new(Source::Query, name, ty)
    }

    /// A body parameter. With several body parameters, `name` selects the
    /// field of the decoded body object.
    pub fn body(name: impl Into<String>, ty: TypeTag) -> Self {
        Self::new(Source::Body, name, ty)
    }

    /// The [`Request`] itself.
    pub fn request() -> Self {
        Self::new(Source::Injected, "request", TypeTag::Request)
    }

    /// Lets the parameter stay unbound instead of failing the request.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn source(&self) -> Source { self.source }
    pub fn name(&self) -> &str { &self.name }
    pub fn ty(&self) -> TypeTag { self.ty }
    pub fn is_required(&self) -> bool { self.required }
}

/// A bound argument.
#[derive(Clone, Debug, Default)]
pub enum Arg {
    /// Absent, or present but not coercible to the declared type.
    #[default]
    Missing,
    Str(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    Float(f32),
    Json(Value),
    Request(Box<Request>),
}

impl Arg {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Coerces path/query text. Unparseable numbers become `Missing`.
    fn from_text(raw: &str, ty: TypeTag) -> Self {
        match ty {
            TypeTag::Int => raw.parse().map_or(Self::Missing, Self::Int),
            TypeTag::Long => raw.parse().map_or(Self::Missing, Self::Long),
            TypeTag::Double => raw.parse().map_or(Self::Missing, Self::Double),
            TypeTag::Float => raw.parse().map_or(Self::Missing, Self::Float),
            TypeTag::Bool => Self::Bool(raw.eq_ignore_ascii_case("true")),
            TypeTag::String | TypeTag::Json | TypeTag::Request => Self::Str(raw.to_owned()),
        }
    }

    /// Coerces a decoded body (or body field).
    fn from_value(value: Value, ty: TypeTag) -> Self {
        match (ty, value) {
            (_, Value::Null) => Self::Missing,
            (TypeTag::String, Value::String(s)) => Self::Str(s),
            (TypeTag::String, other) => Self::Str(other.to_string()),
            (TypeTag::Int, v) => v.as_i64().and_then(|n| i32::try_from(n).ok()).map_or(Self::Missing, Self::Int),
            (TypeTag::Long, v) => v.as_i64().map_or(Self::Missing, Self::Long),
            (TypeTag::Double, v) => v.as_f64().map_or(Self::Missing, Self::Double),
            (TypeTag::Float, v) => v.as_f64().map_or(Self::Missing, |n| Self::Float(n as f32)),
            (TypeTag::Bool, v) => v.as_bool().map_or(Self::Missing, Self::Bool),
            (TypeTag::Json | TypeTag::Request, v) => Self::Json(v),
        }
    }
}

/// Types an [`Arg`] can be read back as.
pub trait FromArg: Sized {
    fn from_arg(arg: &Arg) -> Option<Self>;
}

impl FromArg for String {
    fn from_arg(arg: &Arg) -> Option<Self> {
        match arg {
            Arg::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromArg for i32 {
    fn from_arg(arg: &Arg) -> Option<Self> {
        match arg {
            Arg::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromArg for i64 {
    fn from_arg(arg: &Arg) -> Option<Self> {
        match arg {
            Arg::Long(n) => Some(*n),
            Arg::Int(n) => Some(i64::from(*n)),
            _ => None,
        }
    }
}

impl FromArg for f64 {
    fn from_arg(arg: &Arg) -> Option<Self> {
        match arg {
            Arg::Double(n) => Some(*n),
            Arg::Float(n) => Some(f64::from(*n)),
            _ => None,
        }
    }
}

impl FromArg for f32 {
    fn from_arg(arg: &Arg) -> Option<Self> {
        match arg {
            Arg::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromArg for bool {
    fn from_arg(arg: &Arg) -> Option<Self> {
        match arg {
            Arg::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromArg for Value {
    fn from_arg(arg: &Arg) -> Option<Self> {
        match arg {
            Arg::Json(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// The ordered arguments handed to a dispatched handler, one per binding.
#[derive(Clone, Debug, Default)]
pub struct Args {
    slots: Vec<(Binding, Arg)>,
}

impl Args {
    pub fn len(&self) -> usize { self.slots.len() }
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    pub fn arg(&self, index: usize) -> Option<&Arg> {
        self.slots.get(index).map(|(_, arg)| arg)
    }

    fn slot(&self, index: usize) -> Result<&(Binding, Arg), Error> {
        self.slots
            .get(index)
            .ok_or_else(|| Error::binding(&format!("#{index}"), "no parameter declared at this position"))
    }

    /// Reads argument `index` as `T`.
    pub fn get<T: FromArg>(&self, index: usize) -> Result<T, Error> {
        self.opt(index)?.ok_or_else(|| {
            let (binding, _) = &self.slots[index];
            Error::binding(binding.name(), "not bound")
        })
    }

    /// Like [`get`](Args::get), but an unbound argument is `None`.
    pub fn opt<T: FromArg>(&self, index: usize) -> Result<Option<T>, Error> {
        let (binding, arg) = self.slot(index)?;
        if arg.is_missing() {
            return Ok(None);
        }
        T::from_arg(arg).map(Some).ok_or_else(|| {
            Error::binding(
                binding.name(),
                format!("declared as {} but read as {}", binding.ty(), std::any::type_name::<T>()),
            )
        })
    }

    /// Converts a structured argument into `T` through serde.
    pub fn json<T: DeserializeOwned>(&self, index: usize) -> Result<T, Error> {
        let value: Value = self.get(index)?;
        let name = self.slots[index].0.name();
        serde_json::from_value(value).map_err(|e| Error::binding(name, e.to_string()))
    }

    /// The injected request, if a [`Binding::request`] was declared.
    pub fn request(&self) -> Option<&Request> {
        self.slots.iter().find_map(|(_, arg)| match arg {
            Arg::Request(req) => Some(req.as_ref()),
            _ => None,
        })
    }
}

/// Binds every descriptor in order against `req`.
///
/// Fails with [`Error::ParameterBindingFailure`] when a required parameter
/// ends up unbound.
pub(crate) fn bind(bindings: &[Binding], req: &Request, codecs: &ContentCodecs) -> Result<Args, Error> {
    let body_count = bindings.iter().filter(|b| b.source == Source::Body).count();
    let mut body: Option<Value> = None;
    let mut slots = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let arg = match binding.source {
            Source::Path => req
                .param(&binding.name)
                .map_or(Arg::Missing, |raw| Arg::from_text(raw, binding.ty)),
            Source::Query => req
                .query(&binding.name)
                .map_or(Arg::Missing, |raw| Arg::from_text(raw, binding.ty)),
            Source::Body => {
                if body.is_none() {
                    body = decode_body(req, codecs, body_count, &binding.name)?;
                }
                match (&body, body_count) {
                    (None, _) => Arg::Missing,
                    (Some(value), 1) => Arg::from_value(value.clone(), binding.ty),
                    (Some(Value::Object(fields)), _) => fields
                        .get(&binding.name)
                        .cloned()
                        .map_or(Arg::Missing, |v| Arg::from_value(v, binding.ty)),
                    (Some(_), _) => {
                        return Err(Error::binding(&binding.name, "body must be an object to bind several fields"));
                    }
                }
            }
            Source::Injected => match binding.ty {
                TypeTag::Request => Arg::Request(Box::new(req.clone())),
                _ => Arg::Missing,
            },
        };

        if binding.required && arg.is_missing() {
            return Err(Error::binding(
                &binding.name,
                format!("required {:?} parameter is missing or not a valid {}", binding.source, binding.ty),
            ));
        }
        slots.push((binding.clone(), arg));
    }

    Ok(Args { slots })
}

fn decode_body(
    req: &Request,
    codecs: &ContentCodecs,
    body_count: usize,
    name: &str,
) -> Result<Option<Value>, Error> {
    let ct = req.headers().content_type().ok_or(Error::MissingContentType)?;
    if body_count > 1 && ct != ContentType::Json {
        return Err(Error::UnsupportedContentType(ct));
    }
    if let Some(value) = req.body_value() {
        return Ok(Some(value.clone()));
    }
    match req.body() {
        Some(raw) if !raw.is_empty() => match codecs.deserialize(ct, raw) {
            Ok(value) => Ok(Some(value)),
            Err(err @ Error::UnsupportedContentType(_)) => Err(err),
            Err(err) => Err(Error::binding(name, err.to_string())),
        },
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::header::Header;
    use crate::method::Method;
    use crate::request::Params;

    fn with_params(req: Request, pairs: &[(&str, &str)]) -> Request {
        let params: Params = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        req.with_path_params(params)
    }

    #[test]
    fn path_int_is_coerced() {
        let req = with_params(Request::new(Method::Get, "/items/42"), &[("id", "42")]);
        let args = bind(&[Binding::path("id", TypeTag::Int)], &req, &ContentCodecs::new()).unwrap();
        assert_eq!(args.get::<i32>(0).unwrap(), 42);
    }

    #[test]
    fn unparseable_required_number_fails() {
        let req = with_params(Request::new(Method::Get, "/items/abc"), &[("id", "abc")]);
        let err = bind(&[Binding::path("id", TypeTag::Int)], &req, &ContentCodecs::new()).unwrap_err();
        assert!(matches!(err, Error::ParameterBindingFailure { ref name, .. } if name == "id"));
    }

    #[test]
    fn unparseable_optional_number_is_none() {
        let req = Request::new(Method::Get, "/items?limit=lots&flag=TRUE&ratio=0.5");
        let bindings = [
            Binding::query("limit", TypeTag::Long).optional(),
            Binding::query("flag", TypeTag::Bool),
            Binding::query("ratio", TypeTag::Double),
            Binding::query("absent", TypeTag::String).optional(),
        ];
        let args = bind(&bindings, &req, &ContentCodecs::new()).unwrap();
        assert_eq!(args.opt::<i64>(0).unwrap(), None);
        assert!(args.get::<bool>(1).unwrap());
        assert_eq!(args.get::<f64>(2).unwrap(), 0.5);
        assert_eq!(args.opt::<String>(3).unwrap(), None);
    }

    #[derive(Debug, Deserialize)]
    struct NewUser {
        name: String,
        email: String,
    }

    #[test]
    fn single_body_parameter_gets_whole_value() {
        let req = Request::new(Method::Post, "/api/users")
            .with_json(json!({"name": "Ann", "email": "a@b.com"}));
        let args = bind(&[Binding::body("user", TypeTag::Json)], &req, &ContentCodecs::new()).unwrap();
        let user: NewUser = args.json(0).unwrap();
        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "a@b.com");
    }

    #[test]
    fn raw_body_is_decoded_on_demand() {
        let req = Request::new(Method::Post, "/x")
            .with_header(Header::content_type(ContentType::Json))
            .with_body(r#"{"n": 3}"#);
        let args = bind(&[Binding::body("payload", TypeTag::Json)], &req, &ContentCodecs::new()).unwrap();
        assert_eq!(args.get::<Value>(0).unwrap(), json!({"n": 3}));
    }

    #[test]
    fn several_body_parameters_read_named_fields() {
        let req = Request::new(Method::Put, "/x").with_json(json!({"age": 30, "nick": "a", "extra": null}));
        let bindings = [
            Binding::body("age", TypeTag::Int),
            Binding::body("nick", TypeTag::String),
            Binding::body("extra", TypeTag::Json).optional(),
        ];
        let args = bind(&bindings, &req, &ContentCodecs::new()).unwrap();
        assert_eq!(args.get::<i32>(0).unwrap(), 30);
        assert_eq!(args.get::<String>(1).unwrap(), "a");
        assert!(args.arg(2).unwrap().is_missing());
    }

    #[test]
    fn several_body_parameters_need_json() {
        let req = Request::new(Method::Put, "/x")
            .with_header(Header::content_type(ContentType::Text))
            .with_body("a");
        let bindings = [Binding::body("a", TypeTag::String), Binding::body("b", TypeTag::String)];
        let err = bind(&bindings, &req, &ContentCodecs::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedContentType(ContentType::Text)));
    }

    #[test]
    fn body_without_content_type_is_rejected() {
        let req = Request::new(Method::Post, "/x").with_body("{}");
        let err = bind(&[Binding::body("b", TypeTag::Json)], &req, &ContentCodecs::new()).unwrap_err();
        assert!(matches!(err, Error::MissingContentType));
    }

    #[test]
    fn malformed_body_is_a_binding_failure() {
        let req = Request::new(Method::Post, "/x")
            .with_header(Header::content_type(ContentType::Json))
            .with_body("{oops");
        let err = bind(&[Binding::body("b", TypeTag::Json)], &req, &ContentCodecs::new()).unwrap_err();
        assert!(matches!(err, Error::ParameterBindingFailure { .. }));
    }

    #[test]
    fn request_is_injected_by_type_only() {
        let req = Request::new(Method::Get, "/hello");
        let bindings = [Binding::request(), Binding::new(Source::Injected, "clock", TypeTag::Long).optional()];
        let args = bind(&bindings, &req, &ContentCodecs::new()).unwrap();
        assert_eq!(args.request().map(Request::path), Some("/hello"));
        assert!(args.arg(1).unwrap().is_missing());
    }

    #[test]
    fn reading_with_wrong_type_is_reported() {
        let req = Request::new(Method::Get, "/?q=hi");
        let args = bind(&[Binding::query("q", TypeTag::String)], &req, &ContentCodecs::new()).unwrap();
        assert!(matches!(args.get::<i32>(0), Err(Error::ParameterBindingFailure { .. })));
        assert!(args.get::<String>(5).is_err());
    }
}
