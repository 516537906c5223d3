// Host boundary: JSON text in, JSON text out, buffers as base64
use geoserial::host::{encode_buffer, error_codes, handle_json};
use geoserial::{ops, CoreConfig};
use serde_json::{json, Value};

fn call(config: &CoreConfig, request: Value) -> Value {
    let reply = handle_json(config, &request.to_string());
    serde_json::from_str(&reply).expect("reply is always JSON")
}

fn point(x: f64, y: f64) -> String {
    encode_buffer(&ops::make_point(x, y).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_through_host() {
        let config = CoreConfig::default();
        let reply = call(
            &config,
            json!({"id": 7, "function": "min_distance2d", "args": {"a": point(0.0, 0.0), "b": point(3.0, 4.0)}}),
        );
        println!("reply: {}", reply);
        assert_eq!(reply["id"], json!(7));
        assert_eq!(reply["result"], json!(5.0));
        assert!(reply.get("error").is_none());
    }

    #[test]
    fn test_absent_inputs_give_null_result() {
        let config = CoreConfig::default();
        let reply = call(&config, json!({"id": 1, "function": "collect", "args": {"a": null, "b": null}}));
        assert!(reply.get("error").is_none());
        // absence is a value, not a failure
        assert_eq!(reply.get("result"), Some(&Value::Null));
    }

    #[test]
    fn test_collect_buffer_roundtrips_base64() {
        let config = CoreConfig::default();
        let reply = call(
            &config,
            json!({"id": 2, "function": "collect", "args": {"a": point(0.0, 0.0), "b": point(1.0, 1.0)}}),
        );
        let merged = reply["result"].as_str().expect("buffer result");
        let reply = call(&config, json!({"id": 3, "function": "geometry_type", "args": {"geom": merged}}));
        assert_eq!(reply["result"], json!("MultiPoint"));
    }

    #[test]
    fn test_srid_conflict_maps_to_code() {
        let config = CoreConfig::default();
        let a = geoserial::encode(
            &geoserial::GeometryNode::point(geoserial::Dims::Xy, geoserial::Coord::xy(0.0, 0.0)).with_srid(Some(4326)),
        )
        .unwrap();
        let b = geoserial::encode(
            &geoserial::GeometryNode::point(geoserial::Dims::Xy, geoserial::Coord::xy(0.0, 0.0)).with_srid(Some(26910)),
        )
        .unwrap();
        let reply = call(
            &config,
            json!({"id": 4, "function": "collect", "args": {"a": encode_buffer(&a), "b": encode_buffer(&b)}}),
        );
        assert!(reply.get("result").is_none());
        assert_eq!(reply["error"]["code"], json!(error_codes::INCOMPATIBLE_REFERENCE_SYSTEMS));
    }

    #[test]
    fn test_garbage_never_panics() {
        let config = CoreConfig::default();
        let reply: Value = serde_json::from_str(&handle_json(&config, "not json at all")).unwrap();
        assert_eq!(reply["error"]["code"], json!(error_codes::PARSE_ERROR));

        // kind nibble 0 is not a geometry
        let reply = call(&config, json!({"id": 5, "function": "area", "args": {"geom": encode_buffer(&[0x00, 0, 0, 0])}}));
        assert_eq!(reply["error"]["code"], json!(error_codes::MALFORMED_GEOMETRY));

        let reply = call(&config, json!({"id": 6, "function": "area", "args": {"geom": "%%%"}}));
        assert_eq!(reply["error"]["code"], json!(error_codes::INVALID_PARAMS));
    }

    #[test]
    fn test_request_size_limit() {
        let config = CoreConfig { max_request_bytes: 8, ..CoreConfig::default() };
        let line = ops::make_line(&ops::make_point(0.0, 0.0).unwrap(), &ops::make_point(1.0, 1.0).unwrap()).unwrap();
        let reply = call(&config, json!({"id": 8, "function": "npoints", "args": {"geom": encode_buffer(&line)}}));
        assert_eq!(reply["error"]["code"], json!(error_codes::INVALID_PARAMS));
    }
}
