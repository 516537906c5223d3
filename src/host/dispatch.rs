//! Routes host requests to core operations by function name

use super::protocol::{decode_buffer, encode_buffer, error_codes, Request, Response};
use crate::config::CoreConfig;
use crate::error::GeomError;
use crate::geometry::{decode, encode};
use crate::ops;
use anyhow::{anyhow, Context};
use serde_json::{json, Map, Value};

enum CallError {
    UnknownFunction,
    InvalidRequest(String),
    Params(anyhow::Error),
    Geom(GeomError),
}

impl From<GeomError> for CallError {
    fn from(e: GeomError) -> Self {
        CallError::Geom(e)
    }
}

impl From<anyhow::Error> for CallError {
    fn from(e: anyhow::Error) -> Self {
        CallError::Params(e)
    }
}

type CallResult = std::result::Result<Value, CallError>;

/// Handle one request
pub fn handle(config: &CoreConfig, request: Request) -> Response {
    let Request { id, function, args } = request;
    tracing::debug!(function = %function, "dispatching request");

    match call(config, &function, &args) {
        Ok(value) => Response::success(id, value),
        Err(CallError::UnknownFunction) => {
            Response::error(id, error_codes::FUNCTION_NOT_FOUND, format!("Function not found: {}", function))
        }
        Err(CallError::InvalidRequest(msg)) => Response::error(id, error_codes::INVALID_REQUEST, msg),
        Err(CallError::Params(e)) => {
            let message = format!("{}: {:#}", function, e);
            tracing::debug!(%message, "invalid params");
            Response::error(id, error_codes::INVALID_PARAMS, message)
        }
        Err(CallError::Geom(e)) => {
            tracing::debug!(function = %function, error = %e, "operation failed");
            Response::geom_error(id, &e)
        }
    }
}

/// Text entry point: one JSON request in, one JSON response out
pub fn handle_json(config: &CoreConfig, text: &str) -> String {
    let response = match serde_json::from_str::<Request>(text) {
        Ok(request) => handle(config, request),
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse request");
            Response::error(None, error_codes::PARSE_ERROR, format!("Failed to parse request: {}", e))
        }
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to serialize response");
        format!(
            r#"{{"id":null,"error":{{"code":{},"message":"failed to serialize response"}}}}"#,
            error_codes::INTERNAL_ERROR
        )
    })
}

/// Named arguments of one call
struct Args<'a> {
    map: &'a Map<String, Value>,
    limit: usize,
}

impl<'a> Args<'a> {
    fn get(&self, name: &str) -> anyhow::Result<&'a Value> {
        self.map
            .get(name)
            .ok_or_else(|| anyhow!("missing argument `{}`", name))
    }

    fn geom(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        let text = self
            .get(name)?
            .as_str()
            .ok_or_else(|| anyhow!("argument `{}` must be a base64 string", name))?;
        decode_buffer(text, self.limit).with_context(|| format!("argument `{}`", name))
    }

    /// Missing and `null` both mean absent
    fn opt_geom(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        match self.map.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.geom(name).map(Some),
        }
    }

    fn geom_list(&self, name: &str) -> anyhow::Result<Vec<Option<Vec<u8>>>> {
        let items = self
            .get(name)?
            .as_array()
            .ok_or_else(|| anyhow!("argument `{}` must be an array", name))?;
        items
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::Null => Ok(None),
                Value::String(s) => decode_buffer(s, self.limit)
                    .map(Some)
                    .with_context(|| format!("argument `{}[{}]`", name, i)),
                _ => Err(anyhow!("argument `{}[{}]` must be a base64 string or null", name, i)),
            })
            .collect()
    }

    fn f64(&self, name: &str) -> anyhow::Result<f64> {
        self.get(name)?
            .as_f64()
            .ok_or_else(|| anyhow!("argument `{}` must be a number", name))
    }

    fn f64_or(&self, name: &str, default: f64) -> anyhow::Result<f64> {
        match self.map.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(_) => self.f64(name),
        }
    }

    fn opt_usize(&self, name: &str) -> anyhow::Result<Option<usize>> {
        match self.map.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_u64()
                .map(|n| Some(n as usize))
                .ok_or_else(|| anyhow!("argument `{}` must be a non-negative integer", name)),
        }
    }
}

fn buffer(bytes: &[u8]) -> Value {
    Value::String(encode_buffer(bytes))
}

fn opt_buffer(bytes: Option<Vec<u8>>) -> Value {
    bytes.map_or(Value::Null, |b| buffer(&b))
}

/// Constructor output, with a cached bbox when configured
fn constructed(config: &CoreConfig, bytes: Vec<u8>) -> Result<Value, CallError> {
    if config.autocache_bbox {
        Ok(buffer(&ops::add_bbox(&bytes)?))
    } else {
        Ok(buffer(&bytes))
    }
}

fn call(config: &CoreConfig, function: &str, args: &Value) -> CallResult {
    let empty = Map::new();
    let map = match args {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(CallError::InvalidRequest("args must be an object".to_string())),
    };
    let a = Args {
        map,
        limit: config.max_request_bytes,
    };

    let value = match function {
        // Dimensionality
        "force_2d" => buffer(&ops::force_2d(&a.geom("geom")?)?),
        "force_3dz" => buffer(&ops::force_3dz(&a.geom("geom")?)?),
        "force_3dm" => buffer(&ops::force_3dm(&a.geom("geom")?)?),
        "force_4d" => buffer(&ops::force_4d(&a.geom("geom")?)?),

        // Collections
        "force_multi" => buffer(&ops::force_multi(&a.geom("geom")?)?),
        "force_collection" => buffer(&ops::force_collection(&a.geom("geom")?)?),
        "collect" => {
            let left = a.opt_geom("a")?;
            let right = a.opt_geom("b")?;
            opt_buffer(ops::collect(left.as_deref(), right.as_deref())?)
        }
        "collect_many" => {
            let list = a.geom_list("geoms")?;
            let refs: Vec<Option<&[u8]>> = list.iter().map(|g| g.as_deref()).collect();
            opt_buffer(ops::collect_many(&refs)?)
        }

        // Measures
        "area" => json!(ops::area(&a.geom("geom")?)?),
        "length2d" => json!(ops::length2d(&a.geom("geom")?)?),
        "length" => json!(ops::length(&a.geom("geom")?)?),
        "perimeter2d" => json!(ops::perimeter2d(&a.geom("geom")?)?),
        "perimeter" => json!(ops::perimeter(&a.geom("geom")?)?),
        "npoints" => json!(ops::npoints(&a.geom("geom")?)?),
        "nrings" => json!(ops::nrings(&a.geom("geom")?)?),
        "min_distance2d" => json!(ops::min_distance2d(&a.geom("a")?, &a.geom("b")?)?),
        "point_inside_circle" => json!(ops::point_inside_circle(
            &a.geom("geom")?,
            a.f64("cx")?,
            a.f64("cy")?,
            a.f64("r")?
        )?),

        // Coordinate edits
        "translate" => buffer(&ops::translate(
            &a.geom("geom")?,
            a.f64_or("dx", 0.0)?,
            a.f64_or("dy", 0.0)?,
            a.f64_or("dz", 0.0)?,
        )?),
        "reverse" => buffer(&ops::reverse(&a.geom("geom")?)?),
        "force_rhr" => buffer(&ops::force_rhr(&a.geom("geom")?)?),
        "segmentize2d" => buffer(&ops::segmentize2d(&a.geom("geom")?, a.f64("max_len")?)?),

        // Constructors
        "make_point" => constructed(config, ops::make_point(a.f64("x")?, a.f64("y")?)?)?,
        "make_point_3dz" => constructed(config, ops::make_point_3dz(a.f64("x")?, a.f64("y")?, a.f64("z")?)?)?,
        "make_point_3dm" => constructed(config, ops::make_point_3dm(a.f64("x")?, a.f64("y")?, a.f64("m")?)?)?,
        "make_point_4d" => constructed(
            config,
            ops::make_point_4d(a.f64("x")?, a.f64("y")?, a.f64("z")?, a.f64("m")?)?,
        )?,
        "make_line" => constructed(config, ops::make_line(&a.geom("a")?, &a.geom("b")?)?)?,
        "make_line_many" => {
            let list = a.geom_list("geoms")?;
            let refs: Vec<Option<&[u8]>> = list.iter().map(|g| g.as_deref()).collect();
            match ops::make_line_many(&refs)? {
                Some(bytes) => constructed(config, bytes)?,
                None => Value::Null,
            }
        }
        "line_from_multipoint" => constructed(config, ops::line_from_multipoint(&a.geom("geom")?)?)?,
        "make_polygon" => {
            let shell = a.geom("shell")?;
            let holes: Vec<Vec<u8>> = match a.map.get("holes") {
                None | Some(Value::Null) => Vec::new(),
                Some(_) => a
                    .geom_list("holes")?
                    .into_iter()
                    .enumerate()
                    .map(|(i, h)| h.ok_or_else(|| anyhow!("argument `holes[{}]` is null", i)))
                    .collect::<anyhow::Result<_>>()?,
            };
            let refs: Vec<&[u8]> = holes.iter().map(|h| h.as_slice()).collect();
            constructed(config, ops::make_polygon(&shell, &refs)?)?
        }
        "add_point" => constructed(
            config,
            ops::add_point(&a.geom("line")?, &a.geom("point")?, a.opt_usize("position")?)?,
        )?,

        // Bounding boxes
        "box" => json!(ops::to_box(&a.geom("geom")?)?),
        "has_bbox" => json!(ops::has_bbox(&a.geom("geom")?)?),
        "add_bbox" => buffer(&ops::add_bbox(&a.geom("geom")?)?),
        "drop_bbox" => buffer(&ops::drop_bbox(&a.geom("geom")?)?),
        "envelope" => buffer(&ops::envelope(&a.geom("geom")?)?),
        "expand" => buffer(&ops::expand(&a.geom("geom")?, a.f64("d")?)?),

        // Introspection
        "ndims" => json!(ops::ndims(&a.geom("geom")?)?),
        "zmflag" => json!(ops::zmflag(&a.geom("geom")?)?),
        "geometry_type" => json!(ops::geometry_type(&a.geom("geom")?)?),
        "srid" => json!(ops::srid(&a.geom("geom")?)?),
        "num_geometries" => json!(ops::num_geometries(&a.geom("geom")?)?),
        "is_empty" => json!(ops::is_empty(&a.geom("geom")?)?),
        "mem_size" => json!(ops::mem_size(&a.geom("geom")?)?),
        "summary" => json!(ops::summary(&a.geom("geom")?)?),
        "same" => json!(ops::same(&a.geom("a")?, &a.geom("b")?)?),
        "decode" => serde_json::to_value(decode(&a.geom("geom")?)?).context("serializing geometry tree")?,
        "noop" => buffer(&encode(&decode(&a.geom("geom")?)?)?),
        "lib_version" => json!(ops::lib_version()),
        "autocache_bbox" => json!(config.autocache_bbox),

        _ => return Err(CallError::UnknownFunction),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(function: &str, args: Value) -> Request {
        Request {
            id: Some(json!(7)),
            function: function.to_string(),
            args,
        }
    }

    #[test]
    fn test_unknown_function() {
        let resp = handle(&CoreConfig::default(), request("centroid", json!({})));
        assert_eq!(resp.error.map(|e| e.code), Some(error_codes::FUNCTION_NOT_FOUND));
    }

    #[test]
    fn test_missing_argument_is_invalid_params() {
        let resp = handle(&CoreConfig::default(), request("area", json!({})));
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
        assert!(err.message.contains("geom"), "{}", err.message);
    }

    #[test]
    fn test_constructor_caches_bbox_when_configured() {
        let on = handle(&CoreConfig::default(), request("make_point", json!({"x": 1.0, "y": 2.0})));
        let text = on.result.unwrap();
        let bytes = decode_buffer(text.as_str().unwrap(), 1024).unwrap();
        assert!(ops::has_bbox(&bytes).unwrap());

        let config = CoreConfig {
            autocache_bbox: false,
            ..CoreConfig::default()
        };
        let off = handle(&config, request("make_point", json!({"x": 1.0, "y": 2.0})));
        let bytes = decode_buffer(off.result.unwrap().as_str().unwrap(), 1024).unwrap();
        assert!(!ops::has_bbox(&bytes).unwrap());
    }

    #[test]
    fn test_core_error_maps_to_kind_code() {
        let resp = handle(&CoreConfig::default(), request("area", json!({"geom": encode_buffer(&[0x90])})));
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::MALFORMED_GEOMETRY);
    }

    #[test]
    fn test_non_object_args() {
        let resp = handle(&CoreConfig::default(), request("area", json!([1, 2])));
        assert_eq!(resp.error.map(|e| e.code), Some(error_codes::INVALID_REQUEST));
    }
}
