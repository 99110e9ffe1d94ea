use serde::Deserialize;
use serde_json::Value;

use crate::types::RawTrade;

/// `{ "code": "...", "data": [...] }` wrapper of the agg-trades endpoint.
///
/// `code` and `data` stay untyped so drift in either cannot fail the whole
/// page; the server has sent `code` both as a string and as a number.
#[derive(Debug, Deserialize)]
pub struct TradesEnvelope {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeInfoEnvelope {
    #[serde(default)]
    pub data: Option<ExchangeInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
}

/// Maps one element of `data` onto a [`RawTrade`].
///
/// Keys follow the Binance short form (`a`, `p`, `q`) with the long names as
/// fallbacks. Non-object elements yield `None`.
pub fn raw_trade_from_value(v: &Value) -> Option<RawTrade> {
    let obj = v.as_object()?;
    let field = |short: &str, long: &str| obj.get(short).or_else(|| obj.get(long));

    Some(RawTrade {
        id: field("a", "lastId").and_then(as_u64),
        price: field("p", "price").and_then(as_text),
        quantity: field("q", "qty").and_then(as_text),
    })
}

fn as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_keys_and_string_numbers() {
        let v = json!({ "a": 42, "p": "0.0123", "q": "100", "T": 1 });
        assert_eq!(
            raw_trade_from_value(&v),
            Some(RawTrade::new(42, "0.0123", "100"))
        );
    }

    #[test]
    fn long_keys_and_json_numbers() {
        let v = json!({ "lastId": "7", "price": 1.5, "qty": 2 });
        assert_eq!(raw_trade_from_value(&v), Some(RawTrade::new(7, "1.5", "2")));
    }

    #[test]
    fn non_object_elements_are_dropped() {
        assert_eq!(raw_trade_from_value(&json!("garbage")), None);
        assert_eq!(raw_trade_from_value(&json!(null)), None);
    }

    #[test]
    fn envelope_tolerates_missing_data() {
        let env: TradesEnvelope = serde_json::from_str(r#"{"code":"000000"}"#).unwrap();
        assert!(env.data.is_none());
    }

    #[test]
    fn envelope_accepts_numeric_code() {
        let env: TradesEnvelope =
            serde_json::from_str(r#"{"code":0,"data":[{"a":1,"p":"1","q":"1"}]}"#).unwrap();

        assert_eq!(env.code, Some(json!(0)));
        let data = env.data.unwrap();
        assert_eq!(raw_trade_from_value(&data[0]), Some(RawTrade::new(1, "1", "1")));
    }

    #[test]
    fn exchange_info_lists_symbols() {
        let env: ExchangeInfoEnvelope = serde_json::from_str(
            r#"{"data":{"symbols":[{"symbol":"ALPHA_1USDT","status":"TRADING"}]}}"#,
        )
        .unwrap();
        let symbols: Vec<_> = env.data.unwrap().symbols.into_iter().map(|s| s.symbol).collect();
        assert_eq!(symbols, vec!["ALPHA_1USDT".to_string()]);
    }
}
