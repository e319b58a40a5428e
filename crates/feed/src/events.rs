//! Pool event decoding and trade classification

use alloy_primitives::{I256, U256};

use pricewall_core::{format_units, PoolState, Side, TokenPairConfig, TokenSide};

use crate::rpc::{self, LogEntry};

/// `Swap(address,address,int256,int256,uint160,uint128,int24)`
pub const V3_SWAP_TOPIC: &str =
    "0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67";
/// `Swap(address,uint256,uint256,uint256,uint256,address)`
pub const V2_SWAP_TOPIC: &str =
    "0xd78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822";
/// `Sync(uint112,uint112)`
pub const V2_SYNC_TOPIC: &str =
    "0x1c411e9a96e071241c2f21f7726b17ae89e3cab4c78be50e062b03a9fffbbad1";

/// A decoded pool event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    V3Swap {
        amount0: I256,
        amount1: I256,
        sqrt_price_x96: U256,
    },
    V2Swap {
        amount0_in: U256,
        amount1_in: U256,
        amount0_out: U256,
        amount1_out: U256,
    },
    V2Sync {
        reserve0: U256,
        reserve1: U256,
    },
}

/// Decode a raw log by topic0. Unknown topics and short data come back
/// as `None`; the channel skips them.
pub fn decode_log(log: &LogEntry) -> Option<PoolEvent> {
    let topic0 = log.topics.first()?;
    let words = rpc::decode_words(&log.data).ok()?;

    if topic0.eq_ignore_ascii_case(V3_SWAP_TOPIC) && words.len() >= 3 {
        return Some(PoolEvent::V3Swap {
            amount0: rpc::word_to_i256(words[0]),
            amount1: rpc::word_to_i256(words[1]),
            sqrt_price_x96: words[2],
        });
    }
    if topic0.eq_ignore_ascii_case(V2_SWAP_TOPIC) && words.len() >= 4 {
        return Some(PoolEvent::V2Swap {
            amount0_in: words[0],
            amount1_in: words[1],
            amount0_out: words[2],
            amount1_out: words[3],
        });
    }
    if topic0.eq_ignore_ascii_case(V2_SYNC_TOPIC) && words.len() >= 2 {
        return Some(PoolEvent::V2Sync {
            reserve0: words[0],
            reserve1: words[1],
        });
    }

    None
}

/// Raw pool state carried by a price-bearing event, if any.
pub fn price_state(event: &PoolEvent) -> Option<PoolState> {
    match event {
        PoolEvent::V3Swap { sqrt_price_x96, .. } => Some(PoolState::Slot0 {
            sqrt_price_x96: *sqrt_price_x96,
        }),
        PoolEvent::V2Sync { reserve0, reserve1 } => Some(PoolState::Reserves {
            reserve0: *reserve0,
            reserve1: *reserve1,
        }),
        PoolEvent::V2Swap { .. } => None,
    }
}

/// Classify a trade event into (side, base magnitude, quote magnitude).
///
/// Signs and in/out zeroes are consumed here; the returned amounts are
/// always non-negative human-unit magnitudes.
pub fn classify_trade(event: &PoolEvent, pair: &TokenPairConfig) -> Option<(Side, f64, f64)> {
    let base_decimals = pair.base_meta().decimals;
    let quote_decimals = pair.quote_meta().decimals;

    match event {
        PoolEvent::V3Swap {
            amount0, amount1, ..
        } => {
            let (base, quote) = match pair.base {
                TokenSide::Token0 => (amount0, amount1),
                TokenSide::Token1 => (amount1, amount0),
            };
            if base.is_zero() {
                return None;
            }

            let positive = pair.side_convention.positive_side();
            let side = if base.is_negative() {
                positive.opposite()
            } else {
                positive
            };

            Some((
                side,
                format_units(base.unsigned_abs(), base_decimals),
                format_units(quote.unsigned_abs(), quote_decimals),
            ))
        }
        PoolEvent::V2Swap {
            amount0_in,
            amount1_in,
            amount0_out,
            amount1_out,
        } => {
            let (base_in, base_out, quote_in, quote_out) = match pair.base {
                TokenSide::Token0 => (amount0_in, amount0_out, amount1_in, amount1_out),
                TokenSide::Token1 => (amount1_in, amount1_out, amount0_in, amount0_out),
            };

            // base "in" is zero when the pool paid base tokens out: a buy
            if base_in.is_zero() {
                Some((
                    Side::Buy,
                    format_units(*base_out, base_decimals),
                    format_units(*quote_in, quote_decimals),
                ))
            } else {
                Some((
                    Side::Sell,
                    format_units(*base_in, base_decimals),
                    format_units(*quote_out, quote_decimals),
                ))
            }
        }
        PoolEvent::V2Sync { .. } => None,
    }
}
