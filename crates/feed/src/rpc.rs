//! JSON-RPC plumbing shared by the snapshot fetcher and the live channel

use alloy_primitives::{Address, I256, U256};
use serde::Deserialize;
use serde_json::{json, Value};

use pricewall_core::{FeedError, FeedResult};

/// Build a JSON-RPC 2.0 request object.
pub fn request(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

/// One inbound frame: either a call response (`id` set) or a
/// subscription notification (`method`/`params` set).
#[derive(Debug, Deserialize)]
pub struct RpcFrame {
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<SubscriptionParams>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionParams {
    pub subscription: String,
    pub result: Value,
}

/// An EVM log entry as delivered by `eth_subscribe("logs", ...)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
}

/// Split ABI-encoded return/log data into 32-byte words.
pub fn decode_words(data: &str) -> Result<Vec<U256>, String> {
    let hex = data.strip_prefix("0x").unwrap_or(data);
    if hex.is_empty() {
        return Ok(Vec::new());
    }
    if hex.len() % 64 != 0 {
        return Err(format!("data length {} is not word-aligned", hex.len()));
    }

    hex.as_bytes()
        .chunks(64)
        .map(|chunk| {
            let word = std::str::from_utf8(chunk).map_err(|_| "non-ascii hex".to_string())?;
            U256::from_str_radix(word, 16).map_err(|e| format!("bad hex word: {e}"))
        })
        .collect()
}

/// Reinterpret a raw word as a two's-complement signed integer.
pub fn word_to_i256(word: U256) -> I256 {
    I256::from_raw(word)
}

/// Issue one `eth_call` against an HTTP endpoint and return the raw
/// hex-encoded result.
pub async fn eth_call(
    client: &reqwest::Client,
    url: &str,
    to: Address,
    calldata: &str,
) -> FeedResult<String> {
    let body = request(
        1,
        "eth_call",
        json!([{ "to": to.to_string(), "data": calldata }, "latest"]),
    );

    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| FeedError::Fetch(format!("eth_call request failed: {e}")))?;

    let frame: RpcFrame = response
        .json()
        .await
        .map_err(|e| FeedError::Fetch(format!("malformed eth_call response: {e}")))?;

    if let Some(err) = frame.error {
        return Err(FeedError::Fetch(format!(
            "rpc error {}: {}",
            err.code, err.message
        )));
    }

    match frame.result {
        Some(Value::String(hex)) => Ok(hex),
        _ => Err(FeedError::Fetch("eth_call result missing".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(x: U256) -> String {
        format!("{:0>64}", format!("{x:x}"))
    }

    #[test]
    fn decode_words_splits_return_data() {
        // Two words: 5 and 2^96
        let data = format!("0x{}{}", word(U256::from(5u8)), word(U256::from(1u8) << 96));
        let words = decode_words(&data).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], U256::from(5u8));
        assert_eq!(words[1], U256::from(1u8) << 96);
    }

    #[test]
    fn decode_words_rejects_ragged_data() {
        assert!(decode_words("0xabcdef").is_err());
        assert!(decode_words("0x").unwrap().is_empty());
    }

    #[test]
    fn negative_word_roundtrips() {
        let neg = (!U256::from(1_500u64)).wrapping_add(U256::from(1u8));
        let signed = word_to_i256(neg);
        assert!(signed.is_negative());
        assert_eq!(signed.unsigned_abs(), U256::from(1_500u64));
    }

    #[test]
    fn frame_parses_both_shapes() {
        let response: RpcFrame =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"result":"0x1"}"#).unwrap();
        assert_eq!(response.id, Some(7));
        assert!(response.method.is_none());

        let notification: RpcFrame = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"eth_subscription",
                "params":{"subscription":"0xcd0c3e8af590364c09d0fa6a1210faf5",
                          "result":{"address":"0x1","topics":[],"data":"0x"}}}"#,
        )
        .unwrap();
        assert!(notification.id.is_none());
        assert_eq!(notification.method.as_deref(), Some("eth_subscription"));
    }
}
