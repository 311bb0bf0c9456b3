//! util - Collection helpers for scripts and the scratch buffer
//!
//! Usage in Rhai:
//! ```rhai
//! util::chunk(util::range(0, 10), 3)   // [[0, 1, 2], [3, 4, 5], [6, 7, 8], [9]]
//! util::tally(util::words(text))       // #{"a": 2, "b": 1}
//! ```

use std::collections::HashSet;

use rhai::{Array, Dynamic, EvalAltResult, Map};

/// Largest array scripts may build; also set as the engines' array limit
pub const MAX_ARRAY_SIZE: usize = 1_000_000;

/// Pretty JSON for structured values, falling back to the display form for
/// values serde cannot express (function pointers, custom types)
pub fn to_pretty_json(value: &Dynamic) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn identity_key(value: &Dynamic) -> String {
    format!("{}:{}", value.type_name(), value)
}

pub fn create_module() -> rhai::Module {
    let mut module = rhai::Module::new();

    // range(start: i64, end: i64) -> Array
    module.set_native_fn(
        "range",
        |start: i64, end: i64| -> Result<Array, Box<EvalAltResult>> {
            let len = i128::from(end) - i128::from(start);
            if len > MAX_ARRAY_SIZE as i128 {
                return Err(format!("range of {len} items exceeds {MAX_ARRAY_SIZE}").into());
            }
            Ok((start..end).map(Dynamic::from).collect())
        },
    );

    // chunk(items: Array, size: i64) -> Array
    module.set_native_fn(
        "chunk",
        |items: Array, size: i64| -> Result<Array, Box<EvalAltResult>> {
            if size <= 0 {
                return Err(format!("chunk size must be positive, got {size}").into());
            }
            Ok(items
                .chunks(size as usize)
                .map(|chunk| Dynamic::from_array(chunk.to_vec()))
                .collect())
        },
    );

    // uniq(items: Array) -> Array, first occurrence wins
    module.set_native_fn(
        "uniq",
        |items: Array| -> Result<Array, Box<EvalAltResult>> {
            let mut seen = HashSet::new();
            Ok(items
                .into_iter()
                .filter(|item| seen.insert(identity_key(item)))
                .collect())
        },
    );

    // flatten(items: Array) -> Array, one level deep
    module.set_native_fn(
        "flatten",
        |items: Array| -> Result<Array, Box<EvalAltResult>> {
            let mut flat = Array::new();
            for item in items {
                if item.is_array() {
                    flat.extend(item.into_array().unwrap_or_default());
                } else {
                    flat.push(item);
                }
            }
            Ok(flat)
        },
    );

    // zip(left: Array, right: Array) -> Array of pairs
    module.set_native_fn(
        "zip",
        |left: Array, right: Array| -> Result<Array, Box<EvalAltResult>> {
            Ok(left
                .into_iter()
                .zip(right)
                .map(|(a, b)| Dynamic::from_array(vec![a, b]))
                .collect())
        },
    );

    // sum(items: Array) -> i64 or f64
    module.set_native_fn(
        "sum",
        |items: Array| -> Result<Dynamic, Box<EvalAltResult>> {
            let mut int_total: i64 = 0;
            let mut float_total: f64 = 0.0;
            let mut saw_float = false;
            for item in &items {
                if let Ok(n) = item.as_int() {
                    int_total = int_total.wrapping_add(n);
                } else if let Ok(f) = item.as_float() {
                    float_total += f;
                    saw_float = true;
                } else {
                    return Err(format!("cannot sum a value of type {}", item.type_name()).into());
                }
            }
            if saw_float {
                Ok(Dynamic::from_float(float_total + int_total as f64))
            } else {
                Ok(Dynamic::from_int(int_total))
            }
        },
    );

    // words(text: &str) -> Array
    module.set_native_fn(
        "words",
        |text: &str| -> Result<Array, Box<EvalAltResult>> {
            Ok(text
                .split_whitespace()
                .map(|word| Dynamic::from(word.to_string()))
                .collect())
        },
    );

    // tally(items: Array) -> Map of display form to count
    module.set_native_fn(
        "tally",
        |items: Array| -> Result<Map, Box<EvalAltResult>> {
            let mut counts = Map::new();
            for item in items {
                let entry = counts
                    .entry(item.to_string().into())
                    .or_insert(Dynamic::from_int(0));
                let next = entry.as_int().unwrap_or(0) + 1;
                *entry = Dynamic::from_int(next);
            }
            Ok(counts)
        },
    );

    // pretty(value) -> String
    module.set_native_fn(
        "pretty",
        |value: Dynamic| -> Result<String, Box<EvalAltResult>> { Ok(to_pretty_json(&value)) },
    );

    module
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_json(script: &str) -> serde_json::Value {
        let mut engine = rhai::Engine::new();
        engine.register_static_module("util", create_module().into());
        let value = engine.eval::<Dynamic>(script).unwrap();
        serde_json::to_value(&value).unwrap()
    }

    #[test]
    fn range_and_chunk() {
        assert_eq!(
            eval_json("util::chunk(util::range(0, 5), 2)"),
            serde_json::json!([[0, 1], [2, 3], [4]])
        );
    }

    #[test]
    fn oversized_range_is_an_error() {
        let mut engine = rhai::Engine::new();
        engine.register_static_module("util", create_module().into());
        let err = engine.eval::<Dynamic>("util::range(0, 10000000000)").unwrap_err();
        assert!(err.to_string().contains("exceeds"));
        assert!(engine.eval::<Dynamic>("util::range(5, 0)").is_ok());
    }

    #[test]
    fn chunk_rejects_zero_size() {
        let mut engine = rhai::Engine::new();
        engine.register_static_module("util", create_module().into());
        assert!(engine.eval::<Dynamic>("util::chunk([1, 2], 0)").is_err());
    }

    #[test]
    fn uniq_keeps_first_occurrence() {
        assert_eq!(
            eval_json(r#"util::uniq([1, "1", 1, "a", "a"])"#),
            serde_json::json!([1, "1", "a"])
        );
    }

    #[test]
    fn flatten_one_level() {
        assert_eq!(
            eval_json("util::flatten([1, [2, [3]], 4])"),
            serde_json::json!([1, 2, [3], 4])
        );
    }

    #[test]
    fn zip_stops_at_shorter() {
        assert_eq!(
            eval_json(r#"util::zip([1, 2, 3], ["a", "b"])"#),
            serde_json::json!([[1, "a"], [2, "b"]])
        );
    }

    #[test]
    fn sum_ints_and_floats() {
        assert_eq!(eval_json("util::sum([1, 2, 3])"), serde_json::json!(6));
        assert_eq!(eval_json("util::sum([1, 0.5])"), serde_json::json!(1.5));
    }

    #[test]
    fn tally_words() {
        assert_eq!(
            eval_json(r#"util::tally(util::words("a b  a\nc"))"#),
            serde_json::json!({"a": 2, "b": 1, "c": 1})
        );
    }

    #[test]
    fn pretty_uses_two_space_indent() {
        let value = Dynamic::from_array(vec![Dynamic::from_int(1)]);
        assert_eq!(to_pretty_json(&value), "[\n  1\n]");
    }
}
