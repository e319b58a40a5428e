//! One-shot pool state reads over HTTP JSON-RPC
//!
//! Fetches the pool's current price slot or reserves, runs the price
//! derivation, and timestamps the result at receipt. No retry here;
//! retry policy belongs to the session controller.

use chrono::Utc;
use tracing::debug;

use pricewall_core::{
    derive_price, FeedError, FeedResult, PoolModel, PoolState, PriceSnapshot, TokenPairConfig,
};

use crate::rpc;

/// `slot0()`
pub const SLOT0_SELECTOR: &str = "0x3850c7bd";
/// `getReserves()`
pub const GET_RESERVES_SELECTOR: &str = "0x0902f1ac";

/// Read the pool's raw state with a single `eth_call`.
pub async fn fetch_pool_state(
    client: &reqwest::Client,
    http_url: &str,
    pair: &TokenPairConfig,
) -> FeedResult<PoolState> {
    match pair.model {
        PoolModel::SqrtPriceX96 => {
            let raw = rpc::eth_call(client, http_url, pair.pool, SLOT0_SELECTOR).await?;
            let words = rpc::decode_words(&raw).map_err(FeedError::Fetch)?;
            let sqrt_price_x96 = words
                .first()
                .copied()
                .ok_or_else(|| FeedError::Fetch("empty slot0 response".to_string()))?;
            Ok(PoolState::Slot0 { sqrt_price_x96 })
        }
        PoolModel::ReservePair => {
            let raw = rpc::eth_call(client, http_url, pair.pool, GET_RESERVES_SELECTOR).await?;
            let words = rpc::decode_words(&raw).map_err(FeedError::Fetch)?;
            if words.len() < 2 {
                return Err(FeedError::Fetch(format!(
                    "getReserves returned {} words",
                    words.len()
                )));
            }
            Ok(PoolState::Reserves {
                reserve0: words[0],
                reserve1: words[1],
            })
        }
    }
}

/// Fetch the pool state and derive the pair's initial price.
pub async fn fetch_snapshot(
    client: &reqwest::Client,
    http_url: &str,
    pair: &TokenPairConfig,
) -> FeedResult<PriceSnapshot> {
    let state = fetch_pool_state(client, http_url, pair).await?;
    let price = derive_price(&state, pair)?;
    debug!(pair = %pair.id, price, "snapshot fetched");

    Ok(PriceSnapshot {
        price,
        observed_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn word(x: U256) -> String {
        format!("{:0>64}", format!("{x:x}"))
    }

    #[test]
    fn slot0_word_layout() {
        // slot0() returns 7 words; only the first one matters here
        let sqrt = U256::from(22360u64) << 96;
        let mut data = String::from("0x");
        data.push_str(&word(sqrt));
        for _ in 0..6 {
            data.push_str(&word(U256::ZERO));
        }

        let words = rpc::decode_words(&data).unwrap();
        assert_eq!(words.len(), 7);
        assert_eq!(words[0], sqrt);
    }

    #[test]
    fn reserves_word_layout() {
        // getReserves() returns (reserve0, reserve1, blockTimestampLast)
        let data = format!(
            "0x{}{}{}",
            word(U256::from(1_000u64)),
            word(U256::from(2_000u64)),
            word(U256::from(1_700_000_000u64)),
        );
        let words = rpc::decode_words(&data).unwrap();
        assert_eq!(words[0], U256::from(1_000u64));
        assert_eq!(words[1], U256::from(2_000u64));
    }
}
